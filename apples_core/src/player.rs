use log::debug;
use strum_macros::Display;

use crate::{
    card::Card,
    deck::Deck,
    error::{GameError, Result},
    utils::VecExtensions,
};

pub const DEFAULT_HAND_CAPACITY: usize = 7;

/// Who makes the decisions for a seat at the board.
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone, Display)]
pub enum Role {
    /// Sits at the terminal running the game.
    #[strum(serialize = "local")]
    LocalHost,
    #[strum(serialize = "bot")]
    Bot,
    /// Reached over a network connection.
    #[strum(serialize = "remote")]
    Remote,
}

#[derive(Debug, Clone)]
pub struct Player {
    name: String,
    role: Role,
    hand: Vec<Card>,
    hand_capacity: usize,
    score_pile: Vec<Card>,
}

impl Player {
    pub fn new(name: &str, role: Role, hand_capacity: usize) -> Self {
        Player {
            name: name.to_string(),
            role,
            hand: vec![],
            hand_capacity,
            score_pile: vec![],
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn hand(&self) -> &[Card] {
        &self.hand
    }

    pub fn hand_texts(&self) -> Vec<String> {
        self.hand.iter().map(|c| c.to_string()).collect()
    }

    pub fn hand_capacity(&self) -> usize {
        self.hand_capacity
    }

    pub fn is_hand_full(&self) -> bool {
        self.hand.len() >= self.hand_capacity
    }

    pub fn score(&self) -> usize {
        self.score_pile.len()
    }

    pub fn score_pile(&self) -> &[Card] {
        &self.score_pile
    }

    /// Draws until the hand is full. Cards drawn before running out of
    /// supply stay in the hand.
    pub fn fill_hand(&mut self, deck: &mut Deck) -> Result<()> {
        while !self.is_hand_full() {
            let card = deck
                .draw_or_recombine()
                .map_err(|_| GameError::InsufficientSupply {
                    player: self.name.clone(),
                })?;
            debug!("{} drew {}", self.name, card);
            self.hand.push(card);
        }
        Ok(())
    }

    pub fn play_card(&mut self, index: usize) -> Result<Card> {
        let len = self.hand.len();
        self.hand.take_at(index).ok_or(GameError::InvalidIndex {
            index: index as i64,
            len,
        })
    }

    /// Scored cards leave the game for good.
    pub fn award_card(&mut self, card: Card) -> usize {
        self.score_pile.push(card);
        self.score()
    }
}
