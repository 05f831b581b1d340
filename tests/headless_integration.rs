use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use guessr::app::{App, Collaborators};
use guessr::game::RoundPhase;
use guessr::leaderboard::{RoundWin, RoundWonSink};
use guessr::roster::MemoryRoster;
use guessr::runtime::{FixedTicker, GameEvent, Runner, TestEventSource};
use guessr::word_source::{FetchError, WordFetcher, WordSource};

// Headless integration: App + Runner + the real WordFetcher, with the fetch
// results coming back through the same channel the key events use.

struct ScriptedSource {
    calls: AtomicUsize,
    words: Vec<(Duration, Result<String, FetchError>)>,
}

#[async_trait]
impl WordSource for ScriptedSource {
    async fn fetch_random_word(&self) -> Result<String, FetchError> {
        let idx = self.calls.fetch_add(1, Ordering::SeqCst);
        let (delay, result) = self.words[idx.min(self.words.len() - 1)].clone();
        tokio::time::sleep(delay).await;
        result
    }
}

struct SharedWins(Arc<std::sync::Mutex<Vec<RoundWin>>>);

impl RoundWonSink for SharedWins {
    fn round_won(&mut self, win: &RoundWin) {
        self.0.lock().unwrap().push(win.clone());
    }
}

/// A current-thread runtime on its own thread runs spawned fetches in spawn order
fn background_runtime() -> (tokio::runtime::Handle, tokio::sync::oneshot::Sender<()>) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap();
    let handle = runtime.handle().clone();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    std::thread::spawn(move || {
        let _ = runtime.block_on(stop_rx);
    });
    (handle, stop_tx)
}

fn key(code: KeyCode, modifiers: KeyModifiers) -> GameEvent {
    GameEvent::Key(KeyEvent::new(code, modifiers))
}

fn send_text(tx: &mpsc::Sender<GameEvent>, text: &str) {
    for c in text.chars() {
        tx.send(key(KeyCode::Char(c), KeyModifiers::NONE)).unwrap();
    }
}

/// Drive the loop until `done` holds or the step budget runs out
fn drive<F: Fn(&App) -> bool>(app: &mut App, runner: &Runner<TestEventSource, FixedTicker>, done: F) {
    for _ in 0..400u32 {
        app.handle_event(runner.step(), Instant::now());
        if done(app) {
            return;
        }
    }
}

#[test]
fn headless_round_is_won_through_fetched_word() {
    let (handle, _stop) = background_runtime();
    let (tx, rx) = mpsc::channel();
    let source = Arc::new(ScriptedSource {
        calls: AtomicUsize::new(0),
        words: vec![(Duration::ZERO, Ok("apple".to_string()))],
    });
    let wins = Arc::new(std::sync::Mutex::new(Vec::new()));

    let mut app = App::new(
        Collaborators {
            words: Box::new(WordFetcher::new(handle, source, tx.clone())),
            roster: Box::new(MemoryRoster::default()),
            wins: Box::new(SharedWins(Arc::clone(&wins))),
        },
        Duration::from_secs(2),
        Instant::now(),
    );
    app.set_player("ada", Instant::now());

    let runner = Runner::new(TestEventSource::new(rx), FixedTicker::new(Duration::from_millis(5)));
    drive(&mut app, &runner, |app| app.session.is_word_ready());
    assert_eq!(app.session.phase(), RoundPhase::Active);

    send_text(&tx, "pear");
    tx.send(key(KeyCode::Enter, KeyModifiers::NONE)).unwrap();
    send_text(&tx, "APPLE");
    tx.send(key(KeyCode::Enter, KeyModifiers::NONE)).unwrap();
    drive(&mut app, &runner, |app| app.session.phase() == RoundPhase::Won);

    assert_eq!(app.session.phase(), RoundPhase::Won);
    assert_eq!(app.session.score(), 90);
    let wins = wins.lock().unwrap();
    assert_eq!(wins.len(), 1);
    assert_eq!(wins[0].player.as_deref(), Some("ada"));
    assert_eq!(wins[0].attempts, 2);
    assert_eq!(wins[0].score, 90);
}

#[test]
fn headless_stale_fetch_is_ignored() {
    let (handle, _stop) = background_runtime();
    let (tx, rx) = mpsc::channel();
    // the first request answers late, after a new round has already started
    let source = Arc::new(ScriptedSource {
        calls: AtomicUsize::new(0),
        words: vec![
            (Duration::from_millis(150), Ok("stale".to_string())),
            (Duration::ZERO, Ok("fresh".to_string())),
        ],
    });

    let mut app = App::new(
        Collaborators {
            words: Box::new(WordFetcher::new(handle, source, tx.clone())),
            roster: Box::new(MemoryRoster::default()),
            wins: Box::new(Vec::<RoundWin>::new()),
        },
        Duration::from_secs(2),
        Instant::now(),
    );
    app.set_player("ada", Instant::now());
    tx.send(key(KeyCode::Char('r'), KeyModifiers::CONTROL)).unwrap();

    let runner = Runner::new(TestEventSource::new(rx), FixedTicker::new(Duration::from_millis(5)));
    drive(&mut app, &runner, |app| app.session.is_word_ready());
    assert_eq!(app.session.secret_word(), "fresh");

    // let the late answer arrive and make sure it changes nothing
    let deadline = Instant::now() + Duration::from_millis(400);
    while Instant::now() < deadline {
        app.handle_event(runner.step(), Instant::now());
    }
    assert_eq!(app.session.secret_word(), "fresh");
    assert_eq!(app.session.round().get(), 2);
}

#[test]
fn headless_failed_fetch_can_be_retried() {
    let (handle, _stop) = background_runtime();
    let (tx, rx) = mpsc::channel();
    let source = Arc::new(ScriptedSource {
        calls: AtomicUsize::new(0),
        words: vec![
            (Duration::ZERO, Err(FetchError::Status { code: 503 })),
            (Duration::ZERO, Ok("plum".to_string())),
        ],
    });

    let mut app = App::new(
        Collaborators {
            words: Box::new(WordFetcher::new(handle, source, tx.clone())),
            roster: Box::new(MemoryRoster::default()),
            wins: Box::new(Vec::<RoundWin>::new()),
        },
        Duration::from_secs(2),
        Instant::now(),
    );
    app.set_player("ada", Instant::now());
    app.toasts.clear();

    let runner = Runner::new(TestEventSource::new(rx), FixedTicker::new(Duration::from_millis(5)));
    drive(&mut app, &runner, |app| !app.toasts.is_empty());
    assert!(app
        .toasts
        .current()
        .unwrap()
        .text
        .contains("status 503"));
    assert_eq!(app.session.phase(), RoundPhase::AwaitingWord);

    tx.send(key(KeyCode::Char('r'), KeyModifiers::CONTROL)).unwrap();
    drive(&mut app, &runner, |app| app.session.is_word_ready());
    assert_eq!(app.session.secret_word(), "plum");
}

#[test]
fn headless_timer_counts_whole_seconds() {
    let (word_tx, word_rx) = mpsc::channel();
    let start = Instant::now();
    let mut app = App::new(
        Collaborators {
            words: Box::new(word_tx),
            roster: Box::new(MemoryRoster::default()),
            wins: Box::new(Vec::<RoundWin>::new()),
        },
        Duration::from_secs(2),
        start,
    );
    let request = word_rx.try_recv().unwrap();
    app.handle_event(
        GameEvent::WordFetched {
            round: request.round,
            result: Ok("apple".into()),
        },
        start,
    );

    for ms in (0..=2500).step_by(100) {
        app.handle_event(GameEvent::Tick, start + Duration::from_millis(ms));
    }
    assert_eq!(app.session.elapsed_seconds(), 2);
}
