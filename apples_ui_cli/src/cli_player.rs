use std::{
    io::{self, BufRead, Write},
    str::FromStr,
};

use itertools::Itertools;

use apples_core::{
    decider::{Decider, LocalPrompt},
    error::{GameError, Result},
    lobby,
};

static RULES: &str = "
*** Apples ***
Every round one player is the judge and reveals a prompt card. Everybody else secretly plays the
answer card from their hand that matches the prompt best. The judge sees the answers in random order
and picks the winner, who keeps the prompt card as a point. Hands are refilled and the next player
becomes judge. The first player to collect enough prompt cards wins the game.";

#[derive(Debug, PartialEq)]
enum CliAction {
    Rules,
    Choice(usize),
}

#[derive(Debug, PartialEq, Eq)]
struct ParseActionError;

impl FromStr for CliAction {
    type Err = ParseActionError;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "r" => Ok(CliAction::Rules),
            other => usize::from_str(other)
                .map(CliAction::Choice)
                .map_err(|_| ParseActionError),
        }
    }
}

/// Reads one line from stdin, without its line break.
pub fn read_line(prompt: &str) -> Result<String> {
    print!("{prompt}");
    io::stdout().flush().map_err(GameError::Terminal)?;
    match io::stdin().lock().lines().next() {
        Some(Ok(line)) => Ok(line),
        Some(Err(e)) => Err(GameError::Terminal(e)),
        None => Err(GameError::InputClosed),
    }
}

pub fn ask_name() -> Result<String> {
    loop {
        let name = read_line("Please enter your name: ")?;
        match lobby::validate_name(&name) {
            Ok(()) => return Ok(name.trim().to_string()),
            Err(_) => println!("{name:?} is not available, please choose another name."),
        }
    }
}

/// Asks until a number in `range` is entered.
pub fn ask_number(prompt: &str, range: std::ops::RangeInclusive<usize>) -> Result<usize> {
    loop {
        let line = read_line(prompt)?;
        match usize::from_str(line.trim()) {
            Ok(n) if range.contains(&n) => return Ok(n),
            _ => println!(
                "Please enter a number between {} and {}.",
                range.start(),
                range.end()
            ),
        }
    }
}

/// Asks for any integer, the server decides whether it is a valid choice.
pub fn ask_answer() -> Result<i64> {
    loop {
        let line = read_line(">")?;
        match i64::from_str(line.trim()) {
            Ok(n) => return Ok(n),
            Err(_) => println!("Please enter the number in front of a card."),
        }
    }
}

/// The person at the terminal.
pub struct CliPlayer;

impl CliPlayer {
    fn query_user(&self, title: &str, options: &[String]) -> Result<usize> {
        print!("\n{title}\n");
        loop {
            for (i, option) in options.iter().enumerate() {
                println!("- [{i}]: {option}");
            }
            println!("- [r]: display rules");
            match CliAction::from_str(&read_line(">")?) {
                Ok(CliAction::Rules) => println!("{RULES}"),
                Ok(CliAction::Choice(i)) if i < options.len() => return Ok(i),
                _ => println!("Please choose one of the options."),
            }
        }
    }
}

impl Decider for CliPlayer {
    fn choose_answer(&mut self, _player: &str, prompt: &str, hand: &[String]) -> Result<usize> {
        self.query_user(
            &format!("The prompt is: {prompt}\nChoose the answer card you want to play:"),
            hand,
        )
    }

    fn choose_winner(
        &mut self,
        _judge: &str,
        prompt: &str,
        submissions: &[String],
    ) -> Result<usize> {
        self.query_user(
            &format!("You are the judge. The prompt is: {prompt}\nChoose the winning card:"),
            submissions,
        )
    }
}

impl LocalPrompt for CliPlayer {
    fn show_waiting(&mut self) {
        println!("Waiting for the other players to play their cards...");
    }

    fn show_scoreboard(&mut self, lines: &[String]) {
        println!("================================================");
        println!("{}", lines.iter().join("\n"));
    }

    fn announce_winner(&mut self, name: &str) {
        println!("================================================");
        println!("Winner is {name}");
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use crate::cli_player::{CliAction, ParseActionError};

    #[test]
    fn actions_should_parse_from_user_input() {
        assert_eq!(CliAction::from_str("r"), Ok(CliAction::Rules));
        assert_eq!(CliAction::from_str(" 3 \n"), Ok(CliAction::Choice(3)));
        assert_eq!(CliAction::from_str("-1"), Err(ParseActionError));
        assert_eq!(CliAction::from_str("q"), Err(ParseActionError));
    }
}
