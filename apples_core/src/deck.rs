use std::{collections::VecDeque, fs, path::Path};

use log::debug;

use crate::{
    card::{Card, CardType},
    error::{GameError, Result},
    utils::SliceExtensions,
};

/// A typed draw pile together with its discard pile.
///
/// Only [`Deck::insert`] and loading change the number of cards a deck
/// holds; drawing, discarding, shuffling and recombining move cards around.
#[derive(Debug, Clone)]
pub struct Deck {
    card_type: CardType,
    draw: VecDeque<Card>,
    discard: Vec<Card>,
}

impl Deck {
    pub fn new(card_type: CardType) -> Self {
        Deck {
            card_type,
            draw: VecDeque::new(),
            discard: vec![],
        }
    }

    /// Reads a deck resource, one `"<header> - (<description>)"` card per line.
    pub fn load<P: AsRef<Path>>(path: P, card_type: CardType) -> Result<Self> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| GameError::Resource {
            path: path.to_path_buf(),
            source,
        })?;
        let deck = Deck::parse(&source, card_type)?;
        debug!(
            "loaded {} {} cards from {}",
            deck.cards_left(),
            card_type,
            path.display()
        );
        Ok(deck)
    }

    pub fn parse(source: &str, card_type: CardType) -> Result<Self> {
        let mut deck = Deck::new(card_type);
        for (i, line) in source.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            deck.draw.push_back(parse_card(i + 1, line, card_type)?);
        }
        Ok(deck)
    }

    pub fn card_type(&self) -> CardType {
        self.card_type
    }

    pub fn set_card_type(&mut self, card_type: CardType) -> Result<()> {
        if self.total() > 0 {
            return Err(GameError::DeckTypeLocked);
        }
        self.card_type = card_type;
        Ok(())
    }

    pub fn cards_left(&self) -> usize {
        self.draw.len()
    }

    pub fn cards_in_pile(&self) -> usize {
        self.discard.len()
    }

    pub fn total(&self) -> usize {
        self.cards_left() + self.cards_in_pile()
    }

    /// Puts a new card at the bottom of the draw pile.
    pub fn insert(&mut self, card: Card) -> Result<()> {
        self.check_type(&card)?;
        self.draw.push_back(card);
        Ok(())
    }

    pub fn draw(&mut self) -> Result<Card> {
        self.draw.pop_front().ok_or(GameError::EmptyDeck)
    }

    /// Draws, first recombining the discard pile if the draw pile ran dry.
    pub fn draw_or_recombine(&mut self) -> Result<Card> {
        if self.draw.is_empty() && !self.discard.is_empty() {
            debug!(
                "{} deck ran dry, recombining {} discarded cards",
                self.card_type,
                self.discard.len()
            );
            self.recombine_and_shuffle()?;
        }
        self.draw()
    }

    pub fn discard(&mut self, card: Card) -> Result<()> {
        self.check_type(&card)?;
        self.discard.push(card);
        Ok(())
    }

    pub fn shuffle(&mut self) -> Result<()> {
        if self.draw.is_empty() {
            return Err(GameError::EmptyDeck);
        }
        self.draw
            .make_contiguous()
            .multi_pass_shuffle(&mut rand::thread_rng());
        Ok(())
    }

    pub fn recombine_and_shuffle(&mut self) -> Result<()> {
        self.draw.extend(self.discard.drain(..));
        self.shuffle()
    }

    fn check_type(&self, card: &Card) -> Result<()> {
        if card.card_type() != self.card_type {
            return Err(GameError::TypeMismatch {
                expected: self.card_type,
                found: card.card_type(),
            });
        }
        Ok(())
    }
}

fn parse_card(line: usize, text: &str, card_type: CardType) -> Result<Card> {
    let malformed = || GameError::MalformedCard {
        line,
        text: text.to_string(),
    };
    let (header, description) = text.split_once(" - ").ok_or_else(malformed)?;
    let header = header.trim();
    if header.is_empty() {
        return Err(malformed());
    }
    // "(description )" -> "description"
    let description = description
        .trim()
        .trim_start_matches('(')
        .trim_end_matches(')')
        .trim();
    Ok(Card::mint(card_type, header, description))
}
