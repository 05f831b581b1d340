use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{info, warn};

use crate::game::{FetchOutcome, GameSession, GuessOutcome, RoundId, RoundPhase};
use crate::leaderboard::{RoundWin, RoundWonSink};
use crate::notify::{ToastKind, ToastQueue};
use crate::roster::{greet, Greeting, UserRoster};
use crate::runtime::{GameEvent, RoundTimer};
use crate::word_source::{FetchError, WordRequester};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    NamePrompt,
    Playing,
}

/// Everything the app talks to outside the game rules
pub struct Collaborators {
    pub words: Box<dyn WordRequester>,
    pub roster: Box<dyn UserRoster>,
    pub wins: Box<dyn RoundWonSink>,
}

/// Presentation state around a [`GameSession`]: the input field, toasts, the
/// round clock, and the key bindings. All mutation happens on the loop thread.
pub struct App {
    pub state: AppState,
    pub session: GameSession,
    pub player: Option<String>,
    pub input: String,
    pub toasts: ToastQueue,
    pub timer: RoundTimer,
    collaborators: Collaborators,
    should_quit: bool,
}

impl App {
    /// Starts the first round right away; the word arrives while the player types a name
    pub fn new(collaborators: Collaborators, toast_duration: Duration, now: Instant) -> Self {
        let mut app = Self {
            state: AppState::NamePrompt,
            session: GameSession::new(),
            player: None,
            input: String::new(),
            toasts: ToastQueue::new(toast_duration),
            timer: RoundTimer::default(),
            collaborators,
            should_quit: false,
        };
        app.new_round(now);
        app
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn handle_event(&mut self, event: GameEvent, now: Instant) {
        match event {
            GameEvent::Key(key) => self.on_key(key, now),
            GameEvent::Tick | GameEvent::Resize => self.on_tick(now),
            GameEvent::WordFetched { round, result } => self.on_word_fetched(round, result, now),
        }
    }

    pub fn on_tick(&mut self, now: Instant) {
        for _ in 0..self.timer.poll(now) {
            self.session.tick();
        }
        self.toasts.prune(now);
    }

    pub fn on_key(&mut self, key: KeyEvent, now: Instant) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match (key.code, ctrl) {
            (KeyCode::Esc, _) | (KeyCode::Char('c'), true) => {
                self.should_quit = true;
                return;
            }
            _ => {}
        }

        match self.state {
            AppState::NamePrompt => match key.code {
                KeyCode::Enter => self.submit_name(now),
                KeyCode::Backspace => {
                    self.input.pop();
                }
                KeyCode::Char(c) if !ctrl => self.input.push(c),
                _ => {}
            },
            AppState::Playing => match (key.code, ctrl) {
                (KeyCode::Char('n'), true) => self.letter_count(now),
                (KeyCode::Char('o'), true) => self.letter_occurrence(now),
                (KeyCode::Char('k'), true) => self.clue(now),
                (KeyCode::Char('r'), true) => self.new_round(now),
                (KeyCode::Enter, _) if self.session.phase() == RoundPhase::Won => self.new_round(now),
                (KeyCode::Enter, _) => self.submit_guess(now),
                (KeyCode::Backspace, _) => {
                    self.input.pop();
                }
                (KeyCode::Char(c), false) => self.input.push(c),
                _ => {}
            },
        }
    }

    /// Confirm the typed name; an empty name keeps the prompt open
    pub fn submit_name(&mut self, now: Instant) {
        let raw = std::mem::take(&mut self.input);
        let greeting = match greet(self.collaborators.roster.as_mut(), &raw) {
            Ok(greeting) => greeting,
            Err(err) => {
                warn!(error = %err, "roster unavailable, greeting as new player");
                Greeting::WelcomeNew(raw.trim().to_string())
            }
        };

        self.toasts.push(&greeting);
        match greeting {
            Greeting::EmptyName => {}
            Greeting::WelcomeBack(name) | Greeting::WelcomeNew(name) => {
                self.player = Some(name);
                self.state = AppState::Playing;
            }
        }
        self.toasts.prune(now);
    }

    pub fn new_round(&mut self, now: Instant) {
        let request = self.session.start_round();
        self.collaborators.words.request_word(request);
        self.timer.start(now);
    }

    pub fn on_word_fetched(
        &mut self,
        round: RoundId,
        result: Result<String, FetchError>,
        now: Instant,
    ) {
        match self.session.apply_word(round, result) {
            Some(FetchOutcome::WordReady) | None => {}
            Some(failed) => self.toasts.push(&failed),
        }
        self.toasts.prune(now);
    }

    pub fn submit_guess(&mut self, now: Instant) {
        let guess = std::mem::take(&mut self.input);
        let Some(outcome) = self.session.submit_guess(&guess) else {
            return;
        };

        self.toasts.push(&outcome);
        match outcome {
            GuessOutcome::Correct {
                elapsed_seconds,
                score,
            } => {
                self.timer.stop();
                let win = RoundWin {
                    player: self.player.clone(),
                    word: self.session.secret_word().to_string(),
                    attempts: self.session.attempts(),
                    elapsed_seconds,
                    score,
                };
                self.collaborators.wins.round_won(&win);
            }
            GuessOutcome::LossGameOver { score } => {
                self.timer.stop();
                info!(round = %self.session.round(), score, "starting a new round after loss");
                self.new_round(now);
            }
            GuessOutcome::Incorrect { .. } => {}
            GuessOutcome::NotReady => {
                // keep what was typed so it can be sent once the word arrives
                self.input = guess;
            }
        }
        self.toasts.prune(now);
    }

    pub fn letter_count(&mut self, now: Instant) {
        let outcome = self.session.request_letter_count();
        self.toasts.push(&outcome);
        self.toasts.prune(now);
    }

    /// Asks about the first character in the input field, then clears the field
    pub fn letter_occurrence(&mut self, now: Instant) {
        let letter = self.input.trim().chars().next();
        let outcome = self.session.request_letter_occurrence(letter);
        self.input.clear();
        self.toasts.push(&outcome);
        self.toasts.prune(now);
    }

    pub fn clue(&mut self, now: Instant) {
        let outcome = self.session.request_clue();
        self.toasts.push(&outcome);
        self.toasts.prune(now);
    }

    /// Skip the name prompt, e.g. when the name came from the command line
    pub fn set_player(&mut self, name: &str, now: Instant) {
        self.input = name.to_string();
        self.submit_name(now);
    }

    pub fn notice(&mut self, text: impl Into<String>, kind: ToastKind) {
        self.toasts.push_text(text, kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::TracingSink;
    use crate::roster::MemoryRoster;
    use std::sync::mpsc::{self, Receiver};

    use crate::game::{WordRequest, MAX_ATTEMPTS, STARTING_SCORE};

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn enter() -> KeyEvent {
        KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)
    }

    fn app() -> (App, Receiver<WordRequest>, Instant) {
        let (tx, rx) = mpsc::channel();
        let now = Instant::now();
        let app = App::new(
            Collaborators {
                words: Box::new(tx),
                roster: Box::new(MemoryRoster::default()),
                wins: Box::new(TracingSink),
            },
            Duration::from_secs(2),
            now,
        );
        (app, rx, now)
    }

    fn type_text(app: &mut App, text: &str, now: Instant) {
        for c in text.chars() {
            app.on_key(key(c), now);
        }
    }

    fn playing_with_word(word: &str) -> (App, Receiver<WordRequest>, Instant) {
        let (mut app, rx, now) = app();
        app.set_player("ada", now);
        let request = rx.try_recv().unwrap();
        app.on_word_fetched(request.round, Ok(word.to_string()), now);
        app.toasts.clear();
        (app, rx, now)
    }

    #[test]
    fn starts_round_and_prompts_for_name() {
        let (app, rx, _) = app();
        assert_eq!(app.state, AppState::NamePrompt);
        assert_eq!(rx.try_recv().unwrap().round, app.session.round());
        assert!(app.timer.is_running());
    }

    #[test]
    fn empty_name_keeps_prompt_open() {
        let (mut app, _rx, now) = app();
        type_text(&mut app, "  ", now);
        app.on_key(enter(), now);
        assert_eq!(app.state, AppState::NamePrompt);
        assert_eq!(app.toasts.current().unwrap().text, "Name cannot be empty.");

        type_text(&mut app, "ada", now);
        app.on_key(enter(), now);
        assert_eq!(app.state, AppState::Playing);
        assert_eq!(app.player.as_deref(), Some("ada"));
    }

    #[test]
    fn guess_flow_through_keys() {
        let (mut app, _rx, now) = playing_with_word("apple");
        type_text(&mut app, "pear", now);
        app.on_key(enter(), now);
        assert!(app.input.is_empty());
        assert_eq!(app.session.score(), 90);
        assert_eq!(
            app.toasts.current().unwrap().text,
            "Incorrect! Try again. Score: 90"
        );

        type_text(&mut app, "Apple", now);
        app.on_key(enter(), now);
        assert_eq!(app.session.phase(), RoundPhase::Won);
        assert!(!app.timer.is_running());
    }

    #[test]
    fn enter_after_win_starts_next_round() {
        let (mut app, rx, now) = playing_with_word("apple");
        type_text(&mut app, "apple", now);
        app.on_key(enter(), now);
        let won_round = app.session.round();

        app.on_key(enter(), now);
        let next = rx.try_recv().unwrap();
        assert_ne!(next.round, won_round);
        assert_eq!(app.session.phase(), RoundPhase::AwaitingWord);
        assert!(app.timer.is_running());
    }

    #[test]
    fn loss_restarts_automatically() {
        let (mut app, rx, now) = playing_with_word("apple");
        let first_round = app.session.round();
        for _ in 0..MAX_ATTEMPTS {
            type_text(&mut app, "x", now);
            app.on_key(enter(), now);
        }

        let next = rx.try_recv().unwrap();
        assert_ne!(next.round, first_round);
        assert_eq!(app.session.attempts(), 0);
        assert_eq!(app.session.score(), STARTING_SCORE);
        assert!(!app.toasts.is_empty());
    }

    #[test]
    fn hint_keys() {
        let (mut app, _rx, now) = playing_with_word("apple");
        app.on_key(ctrl('n'), now);
        assert_eq!(
            app.toasts.current().unwrap().text,
            "The secret word has 5 letters. Score: 95"
        );
        app.toasts.clear();

        type_text(&mut app, "pz", now);
        app.on_key(ctrl('o'), now);
        assert!(app.input.is_empty());
        assert_eq!(
            app.toasts.current().unwrap().text,
            "The letter 'p' occurs 2 time(s). Score: 90"
        );
        app.toasts.clear();

        app.on_key(ctrl('o'), now);
        assert_eq!(app.toasts.current().unwrap().text, "Please enter a letter.");
        app.toasts.clear();

        app.on_key(ctrl('k'), now);
        assert_eq!(
            app.toasts.current().unwrap().text,
            "Clue: The word starts with 'a'. Score: 85"
        );
        assert_eq!(app.session.score(), 85);
    }

    #[test]
    fn stale_and_failed_fetches() {
        let (mut app, rx, now) = app();
        let stale = rx.try_recv().unwrap();
        app.new_round(now);
        let current = rx.try_recv().unwrap();

        app.on_word_fetched(stale.round, Ok("stale".into()), now);
        assert!(!app.session.is_word_ready());
        assert!(app.toasts.is_empty());

        app.on_word_fetched(current.round, Err(FetchError::Empty), now);
        assert!(!app.session.is_word_ready());
        assert!(app
            .toasts
            .current()
            .unwrap()
            .text
            .starts_with("Error fetching word"));
    }

    #[test]
    fn guess_before_word_keeps_input() {
        let (mut app, _rx, now) = app();
        app.set_player("ada", now);
        type_text(&mut app, "apple", now);
        app.on_key(enter(), now);
        assert_eq!(app.input, "apple");
        assert_eq!(app.session.attempts(), 0);
    }

    #[test]
    fn ticks_follow_the_round_clock() {
        let (mut app, _rx, now) = playing_with_word("apple");
        app.on_tick(now + Duration::from_millis(3500));
        assert_eq!(app.session.elapsed_seconds(), 3);

        type_text(&mut app, "apple", now);
        app.on_key(enter(), now);
        app.on_tick(now + Duration::from_secs(10));
        assert_eq!(app.session.elapsed_seconds(), 3);
    }

    #[test]
    fn quit_keys() {
        let (mut app, _rx, now) = app();
        app.on_key(ctrl('c'), now);
        assert!(app.should_quit());

        let (mut app, _rx, now) = playing_with_word("apple");
        app.on_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE), now);
        assert!(app.should_quit());
    }
}
