use std::time::Duration;

use log::info;

use crate::{
    board::Board,
    card::CardType,
    config::GameConfig,
    deck::Deck,
    decider::LocalPrompt,
    error::{GameError, Result},
    player::{Player, Role},
    server::{Server, ONLINE_PLAYER_PREFIX},
};

pub const BOT_PREFIX: &str = "Bot";
const LOBBY_POLL: Duration = Duration::from_secs(1);

/// Rejects names that could collide with generated bot or online names.
pub fn validate_name(name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() || name.starts_with(BOT_PREFIX) || name.starts_with(ONLINE_PLAYER_PREFIX) {
        return Err(GameError::NameCollision(name.to_string()));
    }
    Ok(())
}

fn answer_supply(config: &GameConfig) -> Result<usize> {
    config.validate()?;
    Ok(Deck::load(&config.answer_deck, CardType::Answer)?.total())
}

/// Most players the configured answer deck can deal a full hand to.
pub fn max_players(config: &GameConfig) -> Result<usize> {
    Ok(answer_supply(config)? / config.hand_capacity)
}

fn check_table_size(players: usize, hand_capacity: usize, available: usize) -> Result<()> {
    let needed = players * hand_capacity;
    if needed > available {
        return Err(GameError::TableTooLarge {
            players,
            needed,
            available,
        });
    }
    Ok(())
}

/// Gathers the players of one game, then deals.
pub struct GameLobby<'a> {
    config: &'a GameConfig,
    board: Board,
}

impl<'a> GameLobby<'a> {
    pub fn new(config: &'a GameConfig) -> Self {
        GameLobby {
            config,
            board: Board::new(),
        }
    }

    pub fn add_local_host(&mut self, name: &str, local: Box<dyn LocalPrompt>) -> Result<()> {
        validate_name(name)?;
        self.board.seats_mut().set_local(local);
        self.add(name.trim(), Role::LocalHost)
    }

    /// Seats every player connected to `server` right now.
    pub fn add_remote_players(&mut self, server: Server) -> Result<()> {
        for identity in server.connected_names() {
            self.add(&identity, Role::Remote)?;
        }
        self.board.attach_network(server);
        Ok(())
    }

    /// Adds bots until the table is big enough.
    pub fn add_bots(&mut self) -> Result<()> {
        let mut next = 0;
        while self.board.count_players() < self.config.min_players {
            let name = format!("{BOT_PREFIX}{next}");
            next += 1;
            if self.board.player(&name).is_ok() {
                continue;
            }
            self.add(&name, Role::Bot)?;
        }
        Ok(())
    }

    /// Loads and shuffles both decks, seats players in random order, deals
    /// and picks the first judge.
    pub fn start(mut self) -> Result<Board> {
        let board = &mut self.board;
        board.load_prompt_deck(&self.config.prompt_deck)?;
        board.load_answer_deck(&self.config.answer_deck)?;
        board.shuffle_prompt_deck()?;
        board.shuffle_answer_deck()?;
        board.shuffle_players()?;
        check_table_size(
            board.count_players(),
            self.config.hand_capacity,
            board.answer_deck().total(),
        )?;
        board.fill_hands()?;
        board.initialize_judge()?;
        board.compute_win_threshold()?;
        info!(
            "starting game with {}",
            board
                .players()
                .iter()
                .map(Player::name)
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(self.board)
    }

    fn add(&mut self, name: &str, role: Role) -> Result<()> {
        self.board
            .add_player(Player::new(name, role, self.config.hand_capacity))
    }
}

/// The local host against bots.
pub fn offline(config: &GameConfig, name: &str, local: Box<dyn LocalPrompt>) -> Result<Board> {
    let mut lobby = GameLobby::new(config);
    lobby.add_local_host(name, local)?;
    lobby.add_bots()?;
    lobby.start()
}

/// Waits for `expected_remote` players to connect, reporting the count to
/// `progress` while waiting, then fills the rest of the table with bots.
/// A table the answer deck can not deal to is refused before waiting.
pub fn online<F>(
    config: &GameConfig,
    name: &str,
    local: Box<dyn LocalPrompt>,
    server: Server,
    expected_remote: usize,
    progress: F,
) -> Result<Board>
where
    F: FnMut(usize),
{
    let seats = (expected_remote + 1).max(config.min_players);
    check_table_size(seats, config.hand_capacity, answer_supply(config)?)?;
    server.wait_for_players(expected_remote, LOBBY_POLL, progress);
    let mut lobby = GameLobby::new(config);
    lobby.add_local_host(name, local)?;
    lobby.add_remote_players(server)?;
    lobby.add_bots()?;
    lobby.start()
}

/// Bots only.
pub fn simulation(config: &GameConfig) -> Result<Board> {
    let mut lobby = GameLobby::new(config);
    lobby.add_bots()?;
    lobby.start()
}
