use std::path::PathBuf;

use crate::{card::CardType, deck::Deck};

/// Path of a file shipped in the workspace `resources/` directory.
pub fn resource(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("resources")
        .join(name)
}

/// The 100 prompt cards in file order.
pub fn prompt_deck() -> Deck {
    Deck::load(resource("prompts.txt"), CardType::Prompt).unwrap()
}

pub fn answer_deck() -> Deck {
    Deck::load(resource("answers.txt"), CardType::Answer).unwrap()
}
