use std::{env, process, str::FromStr};

use log::info;
use tokio::runtime::{Handle, Runtime};

use apples_core::{
    client::Client,
    config::GameConfig,
    error::{GameError, Result},
    lobby,
    message::Message,
    server::Server,
};
use cli_player::{ask_answer, ask_name, ask_number, read_line, CliPlayer};

mod cli_player;

const MAX_REMOTE_PLAYERS: usize = 15;

#[derive(Debug, PartialEq)]
enum MenuItem {
    PlayBots,
    Host,
    Join,
    Exit,
}

impl FromStr for MenuItem {
    type Err = ();
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(MenuItem::PlayBots),
            "2" => Ok(MenuItem::Host),
            "3" => Ok(MenuItem::Join),
            "4" => Ok(MenuItem::Exit),
            _ => Err(()),
        }
    }
}

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    println!("Usage: [CONFIG_FILE]");
    let config = GameConfig::from_args(env::args().skip(1))?;
    let runtime = Runtime::new().map_err(|e| GameError::Internal(e.to_string()))?;

    loop {
        println!("\n*** Apples ***");
        println!("1) Play against bots\n2) Host an online game\n3) Join an online game\n4) Exit");
        match MenuItem::from_str(&read_line(">")?) {
            Ok(MenuItem::PlayBots) => play_offline(&config)?,
            Ok(MenuItem::Host) => host(&config, runtime.handle())?,
            Ok(MenuItem::Join) => join(&config, runtime.handle())?,
            Ok(MenuItem::Exit) => return Ok(()),
            Err(()) => println!("Please choose 1, 2, 3 or 4."),
        }
    }
}

fn play_offline(config: &GameConfig) -> Result<()> {
    let name = ask_name()?;
    let mut board = lobby::offline(config, &name, Box::new(CliPlayer))?;
    board.play()?;
    Ok(())
}

fn host(config: &GameConfig, runtime: &Handle) -> Result<()> {
    let name = ask_name()?;
    // the host takes a seat too
    let seats_left = lobby::max_players(config)?.saturating_sub(1);
    let limit = MAX_REMOTE_PLAYERS
        .min(config.network.max_clients)
        .min(seats_left);
    if limit == 0 {
        println!("The answer deck is too small to host an online game.");
        return Ok(());
    }
    let expected = ask_number(
        &format!("How many online players are you waiting for (1-{limit})? "),
        1..=limit,
    )?;
    let server = Server::host(&config.network, runtime)?;
    println!("Hosting on {}", server.address());

    let mut last = None;
    let mut board = lobby::online(config, &name, Box::new(CliPlayer), server, expected, |n| {
        if last != Some(n) {
            println!("{n} of {expected} players connected...");
            last = Some(n);
        }
    })?;
    board.play()?;
    Ok(())
}

fn join(config: &GameConfig, runtime: &Handle) -> Result<()> {
    let client = Client::connect(&config.network, runtime)?;
    println!("Connecting to {}...", config.network.address());

    loop {
        match client.await_message()? {
            Message::Play(menu) => {
                println!("\n{menu}");
                let answer = ask_answer()?;
                client.respond(answer)?;
            }
            Message::Display(info) => println!("\n{info}"),
            Message::End(winner) => {
                println!("================================================");
                println!("Winner is {winner}");
                client.disconnect();
                info!("game over");
                return Ok(());
            }
        }
    }
}
