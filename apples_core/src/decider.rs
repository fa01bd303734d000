use crate::{
    error::{GameError, Result},
    player::Role,
    random_bot::RandomBot,
};

/// Answers the two questions a round asks of a seat. Every index refers to
/// the option list passed in.
pub trait Decider {
    fn choose_answer(&mut self, player: &str, prompt: &str, hand: &[String]) -> Result<usize>;

    fn choose_winner(
        &mut self,
        judge: &str,
        prompt: &str,
        submissions: &[String],
    ) -> Result<usize>;
}

/// The person at the terminal. Besides deciding, they are kept informed
/// while others play.
pub trait LocalPrompt: Decider {
    fn show_waiting(&mut self);

    fn show_scoreboard(&mut self, lines: &[String]);

    fn announce_winner(&mut self, name: &str);
}

/// One decision provider per [`Role`].
pub struct Seats {
    bot: Box<dyn Decider>,
    local: Option<Box<dyn LocalPrompt>>,
    remote: Option<Box<dyn Decider>>,
}

impl Default for Seats {
    fn default() -> Self {
        Seats {
            bot: Box::new(RandomBot),
            local: None,
            remote: None,
        }
    }
}

impl Seats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_bot(&mut self, bot: Box<dyn Decider>) {
        self.bot = bot;
    }

    pub fn set_local(&mut self, local: Box<dyn LocalPrompt>) {
        self.local = Some(local);
    }

    pub fn set_remote(&mut self, remote: Box<dyn Decider>) {
        self.remote = Some(remote);
    }

    pub fn has_provider(&self, role: Role) -> bool {
        match role {
            Role::Bot => true,
            Role::LocalHost => self.local.is_some(),
            Role::Remote => self.remote.is_some(),
        }
    }

    pub fn local(&mut self) -> Option<&mut dyn LocalPrompt> {
        self.local
            .as_deref_mut()
            .map(|local| local as &mut dyn LocalPrompt)
    }

    pub fn choose_answer(
        &mut self,
        role: Role,
        player: &str,
        prompt: &str,
        hand: &[String],
    ) -> Result<usize> {
        match role {
            Role::Bot => self.bot.choose_answer(player, prompt, hand),
            Role::LocalHost => self
                .local
                .as_mut()
                .ok_or(GameError::MissingDecider(role))?
                .choose_answer(player, prompt, hand),
            Role::Remote => self
                .remote
                .as_mut()
                .ok_or(GameError::MissingDecider(role))?
                .choose_answer(player, prompt, hand),
        }
    }

    pub fn choose_winner(
        &mut self,
        role: Role,
        judge: &str,
        prompt: &str,
        submissions: &[String],
    ) -> Result<usize> {
        match role {
            Role::Bot => self.bot.choose_winner(judge, prompt, submissions),
            Role::LocalHost => self
                .local
                .as_mut()
                .ok_or(GameError::MissingDecider(role))?
                .choose_winner(judge, prompt, submissions),
            Role::Remote => self
                .remote
                .as_mut()
                .ok_or(GameError::MissingDecider(role))?
                .choose_winner(judge, prompt, submissions),
        }
    }
}
