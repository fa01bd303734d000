use log::warn;

use crate::{
    card::Card,
    deck::Deck,
    error::{GameError, Result},
    utils::SliceExtensions,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub player: String,
    pub card: Card,
}

/// The answer cards played during one round, keyed by who played them.
#[derive(Debug, Default)]
pub struct Submissions {
    played: Vec<Submission>,
}

impl Submissions {
    pub fn new() -> Self {
        Submissions { played: vec![] }
    }

    pub fn len(&self) -> usize {
        self.played.len()
    }

    pub fn is_empty(&self) -> bool {
        self.played.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Submission> {
        self.played.iter()
    }

    /// Callers make sure every player submits at most once per round.
    pub fn submit(&mut self, player: &str, card: Card) {
        self.played.push(Submission {
            player: player.to_string(),
            card,
        });
    }

    pub fn shuffle(&mut self) -> Result<()> {
        if self.played.is_empty() {
            return Err(GameError::EmptyRound);
        }
        self.played.multi_pass_shuffle(&mut rand::thread_rng());
        Ok(())
    }

    pub fn display(&self) -> Result<Vec<String>> {
        if self.played.is_empty() {
            return Err(GameError::EmptyRound);
        }
        Ok(self.played.iter().map(|s| s.card.to_string()).collect())
    }

    pub fn get(&self, index: usize) -> Result<&Submission> {
        self.played.get(index).ok_or(GameError::IndexOutOfRange {
            index,
            len: self.played.len(),
        })
    }

    pub fn winner_name(&self, index: usize) -> Result<&str> {
        self.get(index).map(|s| s.player.as_str())
    }

    /// Discards every submitted card into `deck` and empties the round.
    /// Cards the deck refused are handed back.
    pub fn resolve(&mut self, deck: &mut Deck) -> Vec<Card> {
        let mut rejected = vec![];
        for submission in self.played.drain(..) {
            if let Err(err) = deck.discard(submission.card.clone()) {
                warn!("could not discard {}: {}", submission.card, err);
                rejected.push(submission.card);
            }
        }
        rejected
    }
}
