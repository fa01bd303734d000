pub mod board;
pub mod card;
pub mod client;
pub mod config;
pub mod decider;
pub mod deck;
pub mod error;
pub mod lobby;
pub mod message;
pub mod player;
pub mod random_bot;
pub mod remote_player;
mod round;
pub mod server;
pub mod submissions;
pub mod utils;

#[cfg(test)]
mod fixtures;

pub use round::MAX_CHOICE_ATTEMPTS;
