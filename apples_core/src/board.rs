use std::path::Path;

use log::{debug, info};
use rand::Rng;
use strum_macros::Display;

use crate::{
    card::{Card, CardType},
    decider::Seats,
    deck::Deck,
    error::{GameError, Result},
    player::Player,
    remote_player::RemotePlayer,
    server::Server,
    submissions::Submissions,
    utils::SliceExtensions,
};

pub const MIN_PLAYERS: usize = 4;
pub const MIN_WIN_THRESHOLD: usize = 4;
const WIN_THRESHOLD_BASE: usize = 12;

#[derive(Debug, PartialEq, Eq, Copy, Clone, Display)]
pub enum Phase {
    Setup,
    RoundStart,
    Collecting,
    Judging,
    Scoring,
    Cleanup,
    GameOver,
}

/// Everything on the table: players in turn order, both decks, the prompt
/// being played for and the answers submitted to it.
pub struct Board {
    pub(crate) players: Vec<Player>,
    pub(crate) judge: usize,
    pub(crate) answers: Deck,
    pub(crate) prompts: Deck,
    pub(crate) current_prompt: Option<Card>,
    pub(crate) submissions: Submissions,
    win_threshold: Option<usize>,
    pub(crate) phase: Phase,
    pub(crate) round: usize,
    pub(crate) seats: Seats,
    pub(crate) network: Option<Server>,
}

impl Default for Board {
    fn default() -> Self {
        Board {
            players: vec![],
            judge: 0,
            answers: Deck::new(CardType::Answer),
            prompts: Deck::new(CardType::Prompt),
            current_prompt: None,
            submissions: Submissions::new(),
            win_threshold: None,
            phase: Phase::Setup,
            round: 0,
            seats: Seats::new(),
            network: None,
        }
    }
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seats_mut(&mut self) -> &mut Seats {
        &mut self.seats
    }

    /// Routes remote players' decisions through `server` and keeps them
    /// informed as rounds progress.
    pub fn attach_network(&mut self, server: Server) {
        self.seats
            .set_remote(Box::new(RemotePlayer::new(server.clone())));
        self.network = Some(server);
    }

    pub fn network(&self) -> Option<&Server> {
        self.network.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn round(&self) -> usize {
        self.round
    }

    // Players ----------------------------------------------------------------

    /// The win threshold has to be computed again afterwards.
    pub fn add_player(&mut self, player: Player) -> Result<()> {
        if self.players.iter().any(|p| p.name() == player.name()) {
            return Err(GameError::NameCollision(player.name().to_string()));
        }
        debug!("{} joined as {} player", player.name(), player.role());
        self.players.push(player);
        self.win_threshold = None;
        Ok(())
    }

    pub fn count_players(&self) -> usize {
        self.players.len()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, name: &str) -> Result<&Player> {
        self.players
            .iter()
            .find(|p| p.name() == name)
            .ok_or_else(|| GameError::PlayerNotFound(name.to_string()))
    }

    fn player_mut(&mut self, name: &str) -> Result<&mut Player> {
        self.players
            .iter_mut()
            .find(|p| p.name() == name)
            .ok_or_else(|| GameError::PlayerNotFound(name.to_string()))
    }

    pub fn players_hand(&self, name: &str) -> Result<Vec<String>> {
        self.player(name).map(Player::hand_texts)
    }

    pub fn all_hands_full(&self) -> bool {
        self.players.iter().all(Player::is_hand_full)
    }

    pub fn fill_hands(&mut self) -> Result<()> {
        for player in self.players.iter_mut() {
            player.fill_hand(&mut self.answers)?;
        }
        Ok(())
    }

    pub fn shuffle_players(&mut self) -> Result<()> {
        if self.players.is_empty() {
            return Err(GameError::NoPlayers);
        }
        self.players.multi_pass_shuffle(&mut rand::thread_rng());
        Ok(())
    }

    pub fn display_scoreboard(&self) -> Vec<String> {
        self.players
            .iter()
            .map(|p| format!("{}: {}", p.name(), p.score()))
            .collect()
    }

    pub fn award_score(&mut self, name: &str, card: Card) -> Result<usize> {
        let player = self.player_mut(name)?;
        let score = player.award_card(card);
        info!("{name} now has {score} points");
        Ok(score)
    }

    // Judge ------------------------------------------------------------------

    pub fn initialize_judge(&mut self) -> Result<()> {
        if self.players.is_empty() {
            return Err(GameError::NoPlayers);
        }
        self.judge = rand::thread_rng().gen_range(0..self.players.len());
        debug!("{} judges first", self.players[self.judge].name());
        Ok(())
    }

    pub fn rotate_judge(&mut self) {
        if self.players.is_empty() {
            return;
        }
        self.judge = (self.judge + 1) % self.players.len();
    }

    pub fn current_judge_name(&self) -> Result<&str> {
        self.players
            .get(self.judge)
            .map(Player::name)
            .ok_or(GameError::NoPlayers)
    }

    // Decks ------------------------------------------------------------------

    pub fn load_answer_deck<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.answers = Deck::load(path, CardType::Answer)?;
        info!("loaded {} answer cards", self.answers.total());
        Ok(())
    }

    pub fn load_prompt_deck<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.prompts = Deck::load(path, CardType::Prompt)?;
        info!("loaded {} prompt cards", self.prompts.total());
        Ok(())
    }

    pub fn set_answer_deck(&mut self, deck: Deck) -> Result<()> {
        check_deck_type(&deck, CardType::Answer)?;
        self.answers = deck;
        Ok(())
    }

    pub fn set_prompt_deck(&mut self, deck: Deck) -> Result<()> {
        check_deck_type(&deck, CardType::Prompt)?;
        self.prompts = deck;
        Ok(())
    }

    pub fn answer_deck(&self) -> &Deck {
        &self.answers
    }

    pub fn prompt_deck(&self) -> &Deck {
        &self.prompts
    }

    pub fn shuffle_answer_deck(&mut self) -> Result<()> {
        self.answers.shuffle()
    }

    pub fn shuffle_prompt_deck(&mut self) -> Result<()> {
        self.prompts.shuffle()
    }

    // Prompt -----------------------------------------------------------------

    pub fn draw_prompt(&mut self) -> Result<&Card> {
        if self.current_prompt.is_some() {
            return Err(GameError::PromptAlreadyDrawn);
        }
        let card = self.prompts.draw_or_recombine()?;
        debug!("drew prompt {card}");
        Ok(self.current_prompt.insert(card))
    }

    pub fn current_prompt(&self) -> Option<&Card> {
        self.current_prompt.as_ref()
    }

    pub fn pick_up_prompt(&mut self) -> Result<Card> {
        self.current_prompt.take().ok_or(GameError::NoPrompt)
    }

    // Winning ----------------------------------------------------------------

    pub fn compute_win_threshold(&mut self) -> Result<usize> {
        let count = self.players.len();
        if count < MIN_PLAYERS {
            return Err(GameError::NotEnoughPlayers {
                count,
                required: MIN_PLAYERS,
            });
        }
        let threshold = WIN_THRESHOLD_BASE
            .saturating_sub(count)
            .max(MIN_WIN_THRESHOLD);
        info!("first to {threshold} points wins");
        self.win_threshold = Some(threshold);
        Ok(threshold)
    }

    pub fn win_threshold(&self) -> Option<usize> {
        self.win_threshold
    }

    pub fn game_winner(&self) -> Result<bool> {
        let threshold = self.win_threshold.ok_or(GameError::ThresholdUnset)?;
        Ok(self.players.iter().any(|p| p.score() >= threshold))
    }

    /// First player in turn order to reach the threshold.
    pub fn who_won(&self) -> Result<&Player> {
        let threshold = self.win_threshold.ok_or(GameError::ThresholdUnset)?;
        self.players
            .iter()
            .find(|p| p.score() >= threshold)
            .ok_or(GameError::NoWinner)
    }

    pub fn submissions(&self) -> &Submissions {
        &self.submissions
    }
}

fn check_deck_type(deck: &Deck, expected: CardType) -> Result<()> {
    if deck.card_type() != expected {
        return Err(GameError::TypeMismatch {
            expected,
            found: deck.card_type(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use crate::{
        board::{Board, Phase},
        card::{Card, CardType},
        deck::Deck,
        error::GameError,
        fixtures,
        player::{Player, Role},
    };

    fn board_of(count: usize) -> Board {
        let mut board = Board::new();
        for i in 0..count {
            board
                .add_player(Player::new(&format!("Bot{i}"), Role::Bot, 7))
                .unwrap();
        }
        board
    }

    #[test]
    fn new_board_should_be_in_setup() {
        let board = Board::new();

        assert_eq!(board.phase(), Phase::Setup);
        assert_eq!(board.count_players(), 0);
        assert!(board.current_prompt().is_none());
        assert_eq!(board.win_threshold(), None);
    }

    #[test]
    fn add_player_should_reject_a_duplicate_name() {
        let mut board = board_of(2);

        let result = board.add_player(Player::new("Bot1", Role::LocalHost, 7));

        assert!(matches!(result, Err(GameError::NameCollision(name)) if name == "Bot1"));
        assert_eq!(board.count_players(), 2);
    }

    #[test]
    fn win_threshold_should_follow_the_player_count() {
        let expected = [(4, 8), (5, 7), (6, 6), (7, 5), (8, 4), (9, 4), (12, 4)];

        for (count, threshold) in expected {
            assert_eq!(board_of(count).compute_win_threshold().unwrap(), threshold);
        }
    }

    #[test]
    fn win_threshold_should_require_four_players() {
        let mut board = board_of(3);

        assert!(matches!(
            board.compute_win_threshold(),
            Err(GameError::NotEnoughPlayers {
                count: 3,
                required: 4
            })
        ));
    }

    #[test]
    fn adding_a_player_should_invalidate_the_threshold() {
        let mut board = board_of(4);
        board.compute_win_threshold().unwrap();

        board
            .add_player(Player::new("Late", Role::Bot, 7))
            .unwrap();

        assert_eq!(board.win_threshold(), None);
        assert!(matches!(board.game_winner(), Err(GameError::ThresholdUnset)));
    }

    #[test]
    fn rotate_judge_should_visit_every_player_before_repeating() {
        for count in 1..=6 {
            let mut board = board_of(count);
            board.initialize_judge().unwrap();
            let mut seen = HashSet::new();
            let mut previous = board.current_judge_name().unwrap().to_string();
            seen.insert(previous.clone());

            for _ in 1..count {
                board.rotate_judge();
                let judge = board.current_judge_name().unwrap().to_string();
                assert!(count == 1 || judge != previous);
                seen.insert(judge.clone());
                previous = judge;
            }
            assert_eq!(seen.len(), count);

            board.rotate_judge();
            assert!(seen.contains(board.current_judge_name().unwrap()));
        }
    }

    #[test]
    fn initialize_judge_should_pick_every_player_eventually() {
        let mut board = board_of(4);
        let mut seen = HashSet::new();

        for _ in 0..200 {
            board.initialize_judge().unwrap();
            seen.insert(board.current_judge_name().unwrap().to_string());
        }

        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn judge_operations_should_fail_without_players() {
        let mut board = Board::new();

        assert!(matches!(board.initialize_judge(), Err(GameError::NoPlayers)));
        assert!(matches!(board.current_judge_name(), Err(GameError::NoPlayers)));
        assert!(matches!(board.shuffle_players(), Err(GameError::NoPlayers)));
        board.rotate_judge();
    }

    #[test]
    fn draw_prompt_should_hold_one_prompt_at_a_time() {
        let mut board = Board::new();
        board.set_prompt_deck(fixtures::prompt_deck()).unwrap();

        assert_eq!(board.draw_prompt().unwrap().header(), "Absurd");
        assert!(matches!(
            board.draw_prompt(),
            Err(GameError::PromptAlreadyDrawn)
        ));

        let prompt = board.pick_up_prompt().unwrap();
        assert_eq!(prompt.description(), "ridiculous, senseless, foolish");
        assert!(matches!(board.pick_up_prompt(), Err(GameError::NoPrompt)));
    }

    #[test]
    fn set_deck_should_reject_a_deck_of_the_wrong_type() {
        let mut board = Board::new();

        let result = board.set_answer_deck(Deck::new(CardType::Prompt));

        assert!(matches!(
            result,
            Err(GameError::TypeMismatch {
                expected: CardType::Answer,
                found: CardType::Prompt
            })
        ));
    }

    #[test]
    fn fill_hands_should_deal_to_capacity() {
        let mut board = board_of(4);
        board.set_answer_deck(fixtures::answer_deck()).unwrap();
        let total = board.answer_deck().total();

        board.fill_hands().unwrap();

        assert!(board.all_hands_full());
        assert_eq!(board.answer_deck().total(), total - 4 * 7);
        assert_eq!(board.players_hand("Bot2").unwrap().len(), 7);
    }

    #[test]
    fn winner_should_be_the_first_player_over_the_threshold() {
        let mut board = board_of(8);
        board.compute_win_threshold().unwrap();
        assert!(!board.game_winner().unwrap());
        assert!(matches!(board.who_won(), Err(GameError::NoWinner)));

        for i in 0..4 {
            let prompt = Card::mint(CardType::Prompt, &format!("Prompt{i}"), "test");
            board.award_score("Bot5", prompt.clone()).unwrap();
            board.award_score("Bot3", prompt).unwrap();
        }

        assert!(board.game_winner().unwrap());
        assert_eq!(board.who_won().unwrap().name(), "Bot3");
        assert_eq!(
            board.display_scoreboard()[3..6],
            ["Bot3: 4", "Bot4: 0", "Bot5: 4"]
        );
    }

    #[test]
    fn award_score_should_fail_for_an_unknown_player() {
        let mut board = board_of(4);

        let result = board.award_score("Nobody", Card::mint(CardType::Prompt, "Absurd", "x"));

        assert!(matches!(result, Err(GameError::PlayerNotFound(_))));
    }
}
