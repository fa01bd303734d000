use std::str::FromStr;

use itertools::Itertools;
use strum_macros::{Display, EnumString};

use crate::error::{GameError, Result};

#[derive(Debug, PartialEq, Eq, Copy, Clone, Display, EnumString)]
pub enum Verb {
    /// Ask the client to choose; it answers with one integer.
    Play,
    /// Information only, no answer expected.
    Display,
    /// The game is over, the payload names the winner.
    End,
}

/// One protocol message: the verb on the first line, the payload after it.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Message {
    Play(String),
    Display(String),
    End(String),
}

impl Message {
    pub fn new(verb: Verb, payload: &str) -> Self {
        let payload = payload.to_string();
        match verb {
            Verb::Play => Message::Play(payload),
            Verb::Display => Message::Display(payload),
            Verb::End => Message::End(payload),
        }
    }

    pub fn verb(&self) -> Verb {
        match self {
            Message::Play(_) => Verb::Play,
            Message::Display(_) => Verb::Display,
            Message::End(_) => Verb::End,
        }
    }

    pub fn payload(&self) -> &str {
        match self {
            Message::Play(p) | Message::Display(p) | Message::End(p) => p,
        }
    }

    pub fn encode(&self) -> String {
        format!("{}\n{}\n", self.verb(), self.payload())
    }

    pub fn decode(text: &str) -> Result<Self> {
        let body = text.strip_suffix('\n').unwrap_or(text);
        let (verb, payload) = body.split_once('\n').unwrap_or((body, ""));
        let verb = Verb::from_str(verb.trim_end_matches('\r'))
            .map_err(|_| GameError::MalformedMessage(text.to_string()))?;
        Ok(Message::new(verb, payload))
    }
}

pub fn encode_answer(answer: i64) -> String {
    format!("{answer}\n")
}

pub fn decode_answer(text: &str) -> Result<i64> {
    text.trim()
        .parse()
        .map_err(|_| GameError::MalformedResponse(text.to_string()))
}

/// Renders a numbered list of options under a title, one per line.
pub fn menu(title: &str, options: &[String]) -> String {
    std::iter::once(title.to_string())
        .chain(
            options
                .iter()
                .enumerate()
                .map(|(i, option)| format!("[{i}]: {option}")),
        )
        .join("\n")
}
