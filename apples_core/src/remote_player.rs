use crate::{
    decider::Decider,
    error::{GameError, Result},
    message::menu,
    server::Server,
};

/// Forwards decisions to the connected client named like the player.
pub struct RemotePlayer {
    server: Server,
}

impl RemotePlayer {
    pub fn new(server: Server) -> Self {
        RemotePlayer { server }
    }

    fn ask(&self, identity: &str, title: &str, options: &[String]) -> Result<usize> {
        let answer = self.server.send_and_await_int(identity, &menu(title, options))?;
        usize::try_from(answer).map_err(|_| GameError::InvalidIndex {
            index: answer,
            len: options.len(),
        })
    }
}

impl Decider for RemotePlayer {
    fn choose_answer(&mut self, player: &str, prompt: &str, hand: &[String]) -> Result<usize> {
        self.ask(
            player,
            &format!("The prompt is: {prompt}\nChoose an answer card:"),
            hand,
        )
    }

    fn choose_winner(
        &mut self,
        judge: &str,
        prompt: &str,
        submissions: &[String],
    ) -> Result<usize> {
        self.ask(
            judge,
            &format!("You are the judge. The prompt is: {prompt}\nChoose the winning card:"),
            submissions,
        )
    }
}
