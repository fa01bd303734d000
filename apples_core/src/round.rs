use log::{debug, info, warn};

use crate::{
    board::{Board, Phase},
    card::Card,
    error::{GameError, Result},
    message::menu,
    player::Role,
    submissions::Submissions,
};

/// A person gets one more try after an invalid choice.
pub const MAX_CHOICE_ATTEMPTS: usize = 2;

impl Board {
    /// Plays rounds until somebody reaches the win threshold and returns the
    /// winner's name. Remote players are disconnected afterwards, also when
    /// the game ends in an error.
    pub fn play(&mut self) -> Result<String> {
        let result = self.run_game();
        if let (Err(err), Some(server)) = (&result, &self.network) {
            warn!("game aborted: {err}");
            server.close();
        }
        result
    }

    fn run_game(&mut self) -> Result<String> {
        while !self.game_over()? {
            let scoreboard = self.display_scoreboard();
            if let Some(local) = self.seats.local() {
                local.show_scoreboard(&scoreboard);
            }
            let winner = self.play_round()?;
            info!("round {} went to {winner}", self.round);
        }

        self.phase = Phase::GameOver;
        let winner = self.who_won()?.name().to_string();
        info!("{winner} won the game");
        if let Some(local) = self.seats.local() {
            local.announce_winner(&winner);
        }
        if let Some(server) = &self.network {
            server.announce(&winner)?;
            server.close();
        }
        Ok(winner)
    }

    fn game_over(&mut self) -> Result<bool> {
        match self.game_winner() {
            Err(GameError::ThresholdUnset) => {
                warn!("win threshold was not computed, computing it now");
                self.compute_win_threshold()?;
                self.game_winner()
            }
            result => result,
        }
    }

    /// Runs a single round from drawing the prompt to rotating the judge and
    /// returns the name of the round's winner.
    ///
    /// A failed round leaves the table ready for the next one: the prompt
    /// and the answers collected so far are discarded and hands refilled.
    /// The judge keeps the seat.
    pub fn play_round(&mut self) -> Result<String> {
        let result = self.run_round();
        if result.is_err() {
            self.abandon_round();
        }
        result
    }

    fn run_round(&mut self) -> Result<String> {
        self.start_round()?;
        self.choose_cards()?;
        let index = self.judge_submissions()?;
        let winner = self.score_round(index)?;
        self.clean_up()?;
        Ok(winner)
    }

    fn abandon_round(&mut self) {
        if let Some(prompt) = self.current_prompt.take() {
            if let Err(err) = self.prompts.discard(prompt) {
                warn!("could not discard the prompt of round {}: {err}", self.round);
            }
        }
        let rejected = self.submissions.resolve(&mut self.answers);
        if !rejected.is_empty() {
            warn!("{} submitted cards left the game", rejected.len());
        }
        if let Err(err) = self.fill_hands() {
            warn!("could not refill hands after round {}: {err}", self.round);
        }
    }

    fn start_round(&mut self) -> Result<()> {
        self.phase = Phase::RoundStart;
        self.round += 1;
        let prompt = self.draw_prompt()?.to_string();
        let judge = self.current_judge_name()?.to_string();
        debug!("round {} starts, {judge} judges {prompt}", self.round);
        self.inform(&format!(
            "Round {}: {judge} is the judge.\nThe prompt is: {prompt}",
            self.round
        ))
    }

    fn choose_cards(&mut self) -> Result<()> {
        self.phase = Phase::Collecting;
        self.submissions = Submissions::new();
        let prompt = self.prompt_text()?;
        if let Some(local) = self.seats.local() {
            local.show_waiting();
        }

        for seat in 0..self.players.len() {
            if seat == self.judge {
                continue;
            }
            let card = self.obtain_answer(seat, &prompt)?;
            let name = self.players[seat].name().to_string();
            debug!("{name} played {card}");
            self.submissions.submit(&name, card);
        }

        // hides who played what from the judge
        self.submissions.shuffle()
    }

    fn obtain_answer(&mut self, seat: usize, prompt: &str) -> Result<Card> {
        let player = &self.players[seat];
        let (role, name, hand) = (player.role(), player.name().to_string(), player.hand_texts());

        let mut attempt = 1;
        loop {
            let played = self
                .seats
                .choose_answer(role, &name, prompt, &hand)
                .and_then(|index| self.players[seat].play_card(index));
            match played {
                Ok(card) => return Ok(card),
                Err(err) => retry_or_escalate(role, &name, attempt, err)?,
            }
            attempt += 1;
        }
    }

    fn judge_submissions(&mut self) -> Result<usize> {
        self.phase = Phase::Judging;
        if self.submissions.is_empty() {
            return Err(GameError::NoSubmissions);
        }
        let prompt = self.prompt_text()?;
        let options = self.submissions.display()?;
        self.inform(&menu(&format!("Submissions for {prompt}:"), &options))?;

        let judge = &self.players[self.judge];
        let (role, name) = (judge.role(), judge.name().to_string());

        let mut attempt = 1;
        loop {
            let chosen = self
                .seats
                .choose_winner(role, &name, &prompt, &options)
                .and_then(|index| {
                    if index < options.len() {
                        Ok(index)
                    } else {
                        Err(GameError::IndexOutOfRange {
                            index,
                            len: options.len(),
                        })
                    }
                });
            match chosen {
                Ok(index) => return Ok(index),
                Err(err) => retry_or_escalate(role, &name, attempt, err)?,
            }
            attempt += 1;
        }
    }

    fn score_round(&mut self, index: usize) -> Result<String> {
        self.phase = Phase::Scoring;
        let winning = self.submissions.get(index)?;
        let (winner, card) = (winning.player.clone(), winning.card.to_string());
        let prompt = self.pick_up_prompt()?;
        let score = self.award_score(&winner, prompt)?;
        self.inform(&format!(
            "{winner} won the round with {card} and now has {score} points."
        ))?;
        Ok(winner)
    }

    fn clean_up(&mut self) -> Result<()> {
        self.phase = Phase::Cleanup;
        let rejected = self.submissions.resolve(&mut self.answers);
        if !rejected.is_empty() {
            warn!("{} submitted cards left the game", rejected.len());
        }
        self.fill_hands()?;
        self.rotate_judge();
        Ok(())
    }

    fn prompt_text(&self) -> Result<String> {
        self.current_prompt
            .as_ref()
            .map(Card::to_string)
            .ok_or(GameError::NoPrompt)
    }

    fn inform(&self, info: &str) -> Result<()> {
        match &self.network {
            Some(server) => server.broadcast(info),
            None => Ok(()),
        }
    }
}

/// `Ok` means the seat should be asked again.
fn retry_or_escalate(role: Role, name: &str, attempt: usize, err: GameError) -> Result<()> {
    if !err.is_user_recoverable() {
        return Err(err);
    }
    if role == Role::Bot {
        return Err(GameError::Internal(format!(
            "{name} made an impossible choice: {err}"
        )));
    }
    if attempt >= MAX_CHOICE_ATTEMPTS {
        return Err(err);
    }
    warn!("{name} made an invalid choice ({err}), asking again");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, collections::VecDeque, rc::Rc};

    use crate::{
        board::{Board, Phase},
        decider::{Decider, LocalPrompt},
        error::{GameError, Result},
        fixtures,
        player::{Player, Role},
    };

    fn board_with(roles: &[(&str, Role)]) -> Board {
        let mut board = Board::new();
        for (name, role) in roles {
            board.add_player(Player::new(name, *role, 7)).unwrap();
        }
        board.set_prompt_deck(fixtures::prompt_deck()).unwrap();
        board.set_answer_deck(fixtures::answer_deck()).unwrap();
        board.fill_hands().unwrap();
        board
    }

    fn bots(count: usize) -> Board {
        let names: Vec<String> = (0..count).map(|i| format!("Bot{i}")).collect();
        let roles: Vec<(&str, Role)> = names.iter().map(|n| (n.as_str(), Role::Bot)).collect();
        board_with(&roles)
    }

    fn cards_in_play(board: &Board) -> usize {
        board.answer_deck().total()
            + board.players().iter().map(|p| p.hand().len()).sum::<usize>()
            + board.submissions().len()
    }

    fn prompts_in_play(board: &Board) -> usize {
        board.prompt_deck().total()
            + board.current_prompt().map_or(0, |_| 1)
            + board.players().iter().map(|p| p.score()).sum::<usize>()
    }

    #[test]
    fn four_bots_should_play_until_someone_wins() {
        let mut board = bots(4);
        board.shuffle_players().unwrap();
        board.initialize_judge().unwrap();
        let threshold = board.compute_win_threshold().unwrap();
        let answers = cards_in_play(&board);
        let prompts = prompts_in_play(&board);
        assert_eq!(prompts, 100);

        while !board.game_winner().unwrap() {
            let judge = board.current_judge_name().unwrap().to_string();
            let winner = board.play_round().unwrap();

            assert_ne!(winner, judge);
            assert_ne!(board.current_judge_name().unwrap(), judge);
            assert!(board.all_hands_full());
            assert!(board.current_prompt().is_none());
            assert_eq!(cards_in_play(&board), answers);
            assert_eq!(prompts_in_play(&board), prompts);
        }

        let winner = board.who_won().unwrap();
        assert!(winner.score() >= threshold);
        assert_eq!(board.phase(), Phase::Cleanup);
    }

    #[test]
    fn play_should_recompute_a_missing_threshold_once() {
        let mut board = bots(5);
        board.initialize_judge().unwrap();

        let winner = board.play().unwrap();

        assert_eq!(board.win_threshold(), Some(7));
        assert!(board.player(&winner).unwrap().score() >= 7);
        assert_eq!(board.phase(), Phase::GameOver);
    }

    #[test]
    fn play_should_fail_when_the_threshold_can_not_be_computed() {
        let mut board = bots(3);

        let result = board.play();

        assert!(matches!(result, Err(GameError::NotEnoughPlayers { .. })));
    }

    #[test]
    fn local_host_should_be_kept_informed() {
        let mut board = board_with(&[
            ("Alice", Role::LocalHost),
            ("Bot0", Role::Bot),
            ("Bot1", Role::Bot),
            ("Bot2", Role::Bot),
        ]);
        let log = Rc::new(RefCell::new(vec![]));
        board
            .seats_mut()
            .set_local(Box::new(ScriptedPrompt::new(vec![], log.clone())));
        board.compute_win_threshold().unwrap();

        let winner = board.play().unwrap();

        let log = log.borrow();
        assert!(log.iter().any(|e| e == "scoreboard Alice: 0"));
        assert!(log.iter().any(|e| e == "waiting"));
        assert_eq!(log.last().unwrap(), &format!("winner {winner}"));
    }

    #[test]
    fn local_choice_should_be_asked_again_once() {
        let mut board = board_with(&[
            ("Alice", Role::LocalHost),
            ("Bot0", Role::Bot),
            ("Bot1", Role::Bot),
            ("Bot2", Role::Bot),
        ]);
        let log = Rc::new(RefCell::new(vec![]));
        board.seats_mut().set_local(Box::new(ScriptedPrompt::new(
            vec![Ok(99), Ok(2)],
            log.clone(),
        )));
        board.judge = 1;
        let third = board.players_hand("Alice").unwrap()[2].clone();

        board.play_round().unwrap();

        assert_eq!(log.borrow().iter().filter(|e| *e == "answer").count(), 2);
        let hand = board.players_hand("Alice").unwrap();
        assert_eq!(hand.len(), 7);
        assert!(!hand.contains(&third));
    }

    #[test]
    fn second_invalid_local_choice_should_surface() {
        let mut board = board_with(&[
            ("Alice", Role::LocalHost),
            ("Bot0", Role::Bot),
            ("Bot1", Role::Bot),
            ("Bot2", Role::Bot),
        ]);
        let log = Rc::new(RefCell::new(vec![]));
        board.seats_mut().set_local(Box::new(ScriptedPrompt::new(
            vec![Ok(7), Ok(8), Ok(0)],
            log.clone(),
        )));
        board.judge = 1;

        let result = board.play_round();

        assert!(matches!(
            result,
            Err(GameError::InvalidIndex { index: 8, len: 7 })
        ));
        assert_eq!(board.players_hand("Alice").unwrap().len(), 7);
    }

    #[test]
    fn invalid_judgement_should_be_asked_again_once() {
        let mut board = board_with(&[
            ("Alice", Role::LocalHost),
            ("Bot0", Role::Bot),
            ("Bot1", Role::Bot),
            ("Bot2", Role::Bot),
        ]);
        let log = Rc::new(RefCell::new(vec![]));
        board.seats_mut().set_local(Box::new(ScriptedPrompt::new(
            vec![Ok(3), Ok(1)],
            log.clone(),
        )));
        board.judge = 0;

        let winner = board.play_round().unwrap();

        assert_eq!(log.borrow().iter().filter(|e| *e == "winner?").count(), 2);
        assert_eq!(board.player(&winner).unwrap().score(), 1);
        assert_eq!(board.current_judge_name().unwrap(), "Bot0");
    }

    #[test]
    fn bot_making_an_invalid_choice_should_be_an_internal_error() {
        let mut board = bots(4);
        board
            .seats_mut()
            .set_bot(Box::new(ScriptedDecider::new(vec![Ok(42)])));

        let result = board.play_round();

        assert!(matches!(result, Err(GameError::Internal(_))));
    }

    #[test]
    fn player_without_a_decider_should_stop_the_round() {
        let mut board = board_with(&[
            ("online player 0", Role::Remote),
            ("Bot0", Role::Bot),
            ("Bot1", Role::Bot),
            ("Bot2", Role::Bot),
        ]);
        board.judge = 1;

        let result = board.play_round();

        assert!(matches!(
            result,
            Err(GameError::MissingDecider(Role::Remote))
        ));
    }

    #[test]
    fn remote_seat_should_decide_for_remote_players() {
        let mut board = board_with(&[
            ("online player 0", Role::Remote),
            ("online player 1", Role::Remote),
            ("Bot0", Role::Bot),
            ("Bot1", Role::Bot),
        ]);
        board.seats_mut().set_remote(Box::new(ScriptedDecider::new(vec![
            Ok(0),
            Ok(0),
        ])));
        board.judge = 0;
        let first = board.players_hand("online player 1").unwrap()[0].clone();

        let winner = board.play_round().unwrap();

        assert_eq!(board.player(&winner).unwrap().score(), 1);
        assert_ne!(board.players_hand("online player 1").unwrap()[0], first);
    }

    #[test]
    fn transport_failure_should_not_be_retried() {
        let mut board = board_with(&[
            ("online player 0", Role::Remote),
            ("Bot0", Role::Bot),
            ("Bot1", Role::Bot),
            ("Bot2", Role::Bot),
        ]);
        board.seats_mut().set_remote(Box::new(ScriptedDecider::new(vec![
            Err(GameError::Transport("connection lost".to_string())),
            Ok(0),
        ])));
        board.judge = 1;

        let result = board.play_round();

        assert!(matches!(result, Err(GameError::Transport(_))));
    }

    #[test]
    fn failed_round_should_leave_the_table_playable() {
        let mut board = board_with(&[
            ("Bot0", Role::Bot),
            ("Bot1", Role::Bot),
            ("Bot2", Role::Bot),
            ("online player 0", Role::Remote),
        ]);
        board.seats_mut().set_remote(Box::new(ScriptedDecider::new(vec![
            Ok(99),
            Ok(99),
        ])));
        board.judge = 0;
        let answers = cards_in_play(&board);
        let prompts = prompts_in_play(&board);

        let failed = board.play_round();

        assert!(matches!(
            failed,
            Err(GameError::InvalidIndex { index: 99, len: 7 })
        ));
        assert!(board.current_prompt().is_none());
        assert!(board.submissions().is_empty());
        assert_eq!(board.prompt_deck().cards_in_pile(), 1);
        assert!(board.all_hands_full());
        assert_eq!(cards_in_play(&board), answers);
        assert_eq!(prompts_in_play(&board), prompts);
        assert_eq!(board.current_judge_name().unwrap(), "Bot0");

        let winner = board.play_round().unwrap();

        assert_eq!(board.player(&winner).unwrap().score(), 1);
        assert_eq!(cards_in_play(&board), answers);
        assert_eq!(prompts_in_play(&board), prompts);
    }

    #[test]
    fn judging_without_submissions_should_fail() {
        let mut board = bots(4);
        board.draw_prompt().unwrap();

        assert!(matches!(
            board.judge_submissions(),
            Err(GameError::NoSubmissions)
        ));
    }

    // Infra ----------------------------------------------------------------

    /// Hands out the scripted answers in order, falling back to 0.
    struct ScriptedDecider {
        script: VecDeque<Result<usize>>,
    }

    impl ScriptedDecider {
        fn new(script: Vec<Result<usize>>) -> Self {
            ScriptedDecider {
                script: script.into(),
            }
        }

        fn next(&mut self) -> Result<usize> {
            self.script.pop_front().unwrap_or(Ok(0))
        }
    }

    impl Decider for ScriptedDecider {
        fn choose_answer(&mut self, _player: &str, _prompt: &str, _hand: &[String]) -> Result<usize> {
            self.next()
        }

        fn choose_winner(
            &mut self,
            _judge: &str,
            _prompt: &str,
            _submissions: &[String],
        ) -> Result<usize> {
            self.next()
        }
    }

    struct ScriptedPrompt {
        decider: ScriptedDecider,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl ScriptedPrompt {
        fn new(script: Vec<Result<usize>>, log: Rc<RefCell<Vec<String>>>) -> Self {
            ScriptedPrompt {
                decider: ScriptedDecider::new(script),
                log,
            }
        }
    }

    impl Decider for ScriptedPrompt {
        fn choose_answer(&mut self, player: &str, prompt: &str, hand: &[String]) -> Result<usize> {
            self.log.borrow_mut().push("answer".to_string());
            self.decider.choose_answer(player, prompt, hand)
        }

        fn choose_winner(
            &mut self,
            judge: &str,
            prompt: &str,
            submissions: &[String],
        ) -> Result<usize> {
            self.log.borrow_mut().push("winner?".to_string());
            self.decider.choose_winner(judge, prompt, submissions)
        }
    }

    impl LocalPrompt for ScriptedPrompt {
        fn show_waiting(&mut self) {
            self.log.borrow_mut().push("waiting".to_string());
        }

        fn show_scoreboard(&mut self, lines: &[String]) {
            self.log
                .borrow_mut()
                .extend(lines.iter().map(|l| format!("scoreboard {l}")));
        }

        fn announce_winner(&mut self, name: &str) {
            self.log.borrow_mut().push(format!("winner {name}"));
        }
    }
}
