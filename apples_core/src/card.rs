use std::fmt;

use strum_macros::{Display, EnumIter, EnumString};

#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone, Display, EnumIter, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum CardType {
    /// Revealed by the judge at the start of a round.
    Prompt,
    /// Held in hand and submitted as a match for the prompt.
    Answer,
}

#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct Card {
    card_type: CardType,
    header: String,
    description: String,
}

impl Card {
    pub fn mint(card_type: CardType, header: &str, description: &str) -> Self {
        Card {
            card_type,
            header: header.to_string(),
            description: description.to_string(),
        }
    }

    pub fn card_type(&self) -> CardType {
        self.card_type
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.header, self.description)
    }
}
