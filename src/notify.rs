//! Player-facing text for game outcomes, and the short-lived toasts that show it.

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use crate::game::{FetchOutcome, GuessOutcome, Hint, HintOutcome};
use crate::roster::Greeting;

impl fmt::Display for GuessOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuessOutcome::Correct {
                elapsed_seconds,
                score,
            } => write!(f, "Correct! Time: {elapsed_seconds} seconds, Score: {score}"),
            GuessOutcome::Incorrect { score } => write!(f, "Incorrect! Try again. Score: {score}"),
            GuessOutcome::LossGameOver { .. } => write!(f, "Game over! New word will be given."),
            GuessOutcome::NotReady => write!(f, "Secret word not fetched yet. Please try again later."),
        }
    }
}

impl fmt::Display for HintOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HintOutcome::LetterCount { count, score } => {
                write!(f, "The secret word has {count} letters. Score: {score}")
            }
            HintOutcome::LetterOccurrence {
                letter,
                count: 0,
                score,
            } => write!(
                f,
                "The letter '{letter}' does not occur in the word. Score: {score}"
            ),
            HintOutcome::LetterOccurrence {
                letter,
                count,
                score,
            } => write!(
                f,
                "The letter '{letter}' occurs {count} time(s). Score: {score}"
            ),
            HintOutcome::Clue {
                first_letter,
                score,
            } => write!(
                f,
                "Clue: The word starts with '{first_letter}'. Score: {score}"
            ),
            HintOutcome::InsufficientScore { hint } => match hint {
                Hint::LetterCount => write!(f, "Not enough score to ask for the letter count."),
                Hint::LetterOccurrence => write!(f, "Not enough score to ask for a letter."),
                Hint::Clue => write!(f, "Not enough score for a clue."),
            },
            HintOutcome::NotReady => write!(f, "Secret word not fetched yet. Please try again later."),
            HintOutcome::NoLetterGiven => write!(f, "Please enter a letter."),
        }
    }
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchOutcome::WordReady => write!(f, "A new word is ready. Good luck!"),
            FetchOutcome::WordFetchFailed(err) => {
                write!(f, "Error fetching word: {err}. Press Ctrl+R to try again.")
            }
        }
    }
}

impl fmt::Display for Greeting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Greeting::EmptyName => write!(f, "Name cannot be empty."),
            Greeting::WelcomeBack(name) => write!(f, "Welcome back, {name}!"),
            Greeting::WelcomeNew(name) => write!(f, "Hello, {name}! Welcome to the app!"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Info,
    Success,
    Warning,
    Error,
}

pub trait Notify {
    fn toast_kind(&self) -> ToastKind;
}

impl Notify for GuessOutcome {
    fn toast_kind(&self) -> ToastKind {
        match self {
            GuessOutcome::Correct { .. } => ToastKind::Success,
            GuessOutcome::Incorrect { .. } | GuessOutcome::NotReady => ToastKind::Warning,
            GuessOutcome::LossGameOver { .. } => ToastKind::Error,
        }
    }
}

impl Notify for HintOutcome {
    fn toast_kind(&self) -> ToastKind {
        match self {
            HintOutcome::LetterCount { .. }
            | HintOutcome::LetterOccurrence { .. }
            | HintOutcome::Clue { .. } => ToastKind::Info,
            _ => ToastKind::Warning,
        }
    }
}

impl Notify for FetchOutcome {
    fn toast_kind(&self) -> ToastKind {
        match self {
            FetchOutcome::WordReady => ToastKind::Info,
            FetchOutcome::WordFetchFailed(_) => ToastKind::Error,
        }
    }
}

impl Notify for Greeting {
    fn toast_kind(&self) -> ToastKind {
        match self {
            Greeting::EmptyName => ToastKind::Warning,
            _ => ToastKind::Success,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub text: String,
    pub kind: ToastKind,
    shown_at: Option<Instant>,
}

/// Queue of transient messages, shown one at a time for a fixed duration
#[derive(Debug, Clone)]
pub struct ToastQueue {
    queue: VecDeque<Toast>,
    duration: Duration,
}

const MAX_QUEUED: usize = 4;

impl ToastQueue {
    pub fn new(duration: Duration) -> Self {
        Self {
            queue: VecDeque::new(),
            duration,
        }
    }

    pub fn push<N: Notify + fmt::Display>(&mut self, outcome: &N) {
        self.push_text(outcome.to_string(), outcome.toast_kind());
    }

    pub fn push_text(&mut self, text: impl Into<String>, kind: ToastKind) {
        // Drop the oldest waiting toast, never the one on screen
        if self.queue.len() > MAX_QUEUED {
            self.queue.remove(1);
        }
        self.queue.push_back(Toast {
            text: text.into(),
            kind,
            shown_at: None,
        });
    }

    /// Retire the toast on screen once its time is up and start the clock on the next one
    pub fn prune(&mut self, now: Instant) {
        while let Some(front) = self.queue.front_mut() {
            match front.shown_at {
                None => {
                    front.shown_at = Some(now);
                    break;
                }
                Some(at) if now.duration_since(at) >= self.duration => {
                    self.queue.pop_front();
                }
                Some(_) => break,
            }
        }
    }

    pub fn current(&self) -> Option<&Toast> {
        self.queue.front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn clear(&mut self) {
        self.queue.clear();
    }
}
