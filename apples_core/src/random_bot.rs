use rand::Rng;

use crate::{
    decider::Decider,
    error::{GameError, Result},
};

/// Plays and judges uniformly at random.
pub struct RandomBot;

impl RandomBot {
    fn pick(options: &[String]) -> Result<usize> {
        if options.is_empty() {
            return Err(GameError::Internal(
                "bot was asked to choose from nothing".to_string(),
            ));
        }
        Ok(rand::thread_rng().gen_range(0..options.len()))
    }
}

impl Decider for RandomBot {
    fn choose_answer(&mut self, _player: &str, _prompt: &str, hand: &[String]) -> Result<usize> {
        RandomBot::pick(hand)
    }

    fn choose_winner(
        &mut self,
        _judge: &str,
        _prompt: &str,
        submissions: &[String],
    ) -> Result<usize> {
        RandomBot::pick(submissions)
    }
}
