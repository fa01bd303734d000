use std::{io, path::PathBuf};

use strum_macros::Display;
use thiserror::Error;

use crate::{card::CardType, player::Role};

pub type Result<T, E = GameError> = std::result::Result<T, E>;

/// Coarse classification of every [`GameError`], used by the game loop to
/// decide between re-prompting, one local recovery attempt, or aborting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ErrorKind {
    Configuration,
    Capacity,
    Integrity,
    State,
    Transport,
    Terminal,
    Internal,
}

#[derive(Debug, Error)]
pub enum GameError {
    #[error("could not read resource {path}: {source}")]
    Resource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed card on line {line}: {text:?}")]
    MalformedCard { line: usize, text: String },
    #[error("could not parse configuration {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("deck is empty")]
    EmptyDeck,
    #[error("not enough cards in deck to fill the hand of {player}")]
    InsufficientSupply { player: String },
    #[error("{players} players need {needed} answer cards, the deck holds {available}")]
    TableTooLarge {
        players: usize,
        needed: usize,
        available: usize,
    },

    #[error("name {0:?} is unavailable")]
    NameCollision(String),
    #[error("card type must match deck type: expected {expected}, found {found}")]
    TypeMismatch { expected: CardType, found: CardType },
    #[error("can not change type of non-empty deck")]
    DeckTypeLocked,
    #[error("invalid card index {index}, hand holds {len} cards")]
    InvalidIndex { index: i64, len: usize },
    #[error("index {index} out of bounds, {len} cards were submitted")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("player {0:?} not found")]
    PlayerNotFound(String),

    #[error("not enough players: {count} joined, at least {required} are needed")]
    NotEnoughPlayers { count: usize, required: usize },
    #[error("there are no players")]
    NoPlayers,
    #[error("win threshold has not been computed")]
    ThresholdUnset,
    #[error("there is no winner")]
    NoWinner,
    #[error("no cards played this round")]
    EmptyRound,
    #[error("no submissions to judge")]
    NoSubmissions,
    #[error("no prompt card on the board")]
    NoPrompt,
    #[error("a prompt card is already on the board")]
    PromptAlreadyDrawn,
    #[error("no decision provider attached for {0} players")]
    MissingDecider(Role),

    #[error("did not find online player {0:?}")]
    UnknownPlayer(String),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("malformed response {0:?}")]
    MalformedResponse(String),
    #[error("malformed message {0:?}")]
    MalformedMessage(String),

    #[error("terminal input closed")]
    InputClosed,
    #[error("terminal failure: {0}")]
    Terminal(#[source] io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl GameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GameError::Resource { .. }
            | GameError::MalformedCard { .. }
            | GameError::ConfigParse { .. }
            | GameError::Config(_) => ErrorKind::Configuration,
            GameError::EmptyDeck
            | GameError::InsufficientSupply { .. }
            | GameError::TableTooLarge { .. } => ErrorKind::Capacity,
            GameError::NameCollision(_)
            | GameError::TypeMismatch { .. }
            | GameError::DeckTypeLocked
            | GameError::InvalidIndex { .. }
            | GameError::IndexOutOfRange { .. }
            | GameError::PlayerNotFound(_) => ErrorKind::Integrity,
            GameError::NotEnoughPlayers { .. }
            | GameError::NoPlayers
            | GameError::ThresholdUnset
            | GameError::NoWinner
            | GameError::EmptyRound
            | GameError::NoSubmissions
            | GameError::NoPrompt
            | GameError::PromptAlreadyDrawn
            | GameError::MissingDecider(_) => ErrorKind::State,
            GameError::UnknownPlayer(_)
            | GameError::Transport(_)
            | GameError::MalformedResponse(_)
            | GameError::MalformedMessage(_) => ErrorKind::Transport,
            GameError::InputClosed | GameError::Terminal(_) => ErrorKind::Terminal,
            GameError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// True for choices a human (local or remote) got wrong; those are worth
    /// asking again instead of ending the game.
    pub fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            GameError::InvalidIndex { .. } | GameError::IndexOutOfRange { .. }
        )
    }
}
