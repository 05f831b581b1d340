use std::fmt;

use tracing::{debug, info};

use crate::word_source::FetchError;

pub const MAX_ATTEMPTS: u32 = 10;
pub const STARTING_SCORE: i32 = 100;
pub const GUESS_PENALTY: i32 = 10;
pub const HINT_COST: i32 = 5;

/// Identifies one round; every word request is tagged with the round it belongs to
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RoundId(u64);

impl RoundId {
    pub fn next(self) -> Self {
        RoundId(self.0 + 1)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Ask for a new secret word on behalf of `round`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WordRequest {
    pub round: RoundId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum RoundPhase {
    AwaitingWord,
    Active,
    Won,
    LostGameOver,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum_macros::Display)]
pub enum Hint {
    LetterCount,
    LetterOccurrence,
    Clue,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuessOutcome {
    Correct { elapsed_seconds: u32, score: i32 },
    Incorrect { score: i32 },
    LossGameOver { score: i32 },
    /// The secret word has not arrived yet; nothing was counted
    NotReady,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HintOutcome {
    LetterCount {
        count: usize,
        score: i32,
    },
    LetterOccurrence {
        letter: char,
        count: usize,
        score: i32,
    },
    Clue {
        first_letter: char,
        score: i32,
    },
    InsufficientScore {
        hint: Hint,
    },
    NotReady,
    NoLetterGiven,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchOutcome {
    WordReady,
    WordFetchFailed(FetchError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum RoundEnd {
    Won,
    Lost,
}

/// All mutable state of a running game.
///
/// Every operation is synchronous and performs no I/O. Word fetching happens
/// elsewhere: [`GameSession::start_round`] hands back a [`WordRequest`] and the
/// completion comes back through [`GameSession::apply_word`], which drops
/// results that belong to a round that is no longer current.
#[derive(Debug, Clone)]
pub struct GameSession {
    secret_word: String,
    attempts: u32,
    score: i32,
    elapsed_seconds: u32,
    round_active: bool,
    round: RoundId,
    ended: Option<RoundEnd>,
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}

impl GameSession {
    /// A session that has not started its first round yet
    pub fn new() -> Self {
        Self {
            secret_word: String::new(),
            attempts: 0,
            score: STARTING_SCORE,
            elapsed_seconds: 0,
            round_active: false,
            round: RoundId::default(),
            ended: None,
        }
    }

    pub fn start_round(&mut self) -> WordRequest {
        self.round = self.round.next();
        self.secret_word.clear();
        self.attempts = 0;
        self.score = STARTING_SCORE;
        self.elapsed_seconds = 0;
        self.round_active = true;
        self.ended = None;

        info!(round = %self.round, "round started");
        WordRequest { round: self.round }
    }

    /// Apply the result of a word request. Returns `None` when the result is stale.
    pub fn apply_word(
        &mut self,
        round: RoundId,
        result: Result<String, FetchError>,
    ) -> Option<FetchOutcome> {
        if round != self.round {
            debug!(stale = %round, current = %self.round, "discarding stale word");
            return None;
        }

        match result {
            Ok(word) if !word.trim().is_empty() => {
                self.secret_word = word.trim().to_string();
                info!(round = %round, letters = self.secret_word.chars().count(), "secret word ready");
                Some(FetchOutcome::WordReady)
            }
            Ok(_) => {
                self.secret_word.clear();
                Some(FetchOutcome::WordFetchFailed(FetchError::Empty))
            }
            Err(err) => {
                self.secret_word.clear();
                info!(round = %round, error = %err, "word fetch failed");
                Some(FetchOutcome::WordFetchFailed(err))
            }
        }
    }

    pub fn tick(&mut self) {
        if self.round_active {
            self.elapsed_seconds += 1;
        }
    }

    /// Returns `None` once the round is over or the attempt cap is reached.
    pub fn submit_guess(&mut self, text: &str) -> Option<GuessOutcome> {
        if !self.round_active || self.attempts >= MAX_ATTEMPTS {
            debug!(round = %self.round, attempts = self.attempts, "guess ignored");
            return None;
        }
        if self.secret_word.is_empty() {
            return Some(GuessOutcome::NotReady);
        }

        self.attempts += 1;

        if equals_ignore_case(text.trim(), &self.secret_word) {
            self.finish(RoundEnd::Won);
            info!(round = %self.round, attempts = self.attempts, score = self.score, "round won");
            return Some(GuessOutcome::Correct {
                elapsed_seconds: self.elapsed_seconds,
                score: self.score,
            });
        }

        self.score -= GUESS_PENALTY;
        if self.score <= 0 || self.attempts == MAX_ATTEMPTS {
            self.finish(RoundEnd::Lost);
            info!(round = %self.round, attempts = self.attempts, score = self.score, "round lost");
            Some(GuessOutcome::LossGameOver { score: self.score })
        } else {
            debug!(attempts = self.attempts, score = self.score, "incorrect guess");
            Some(GuessOutcome::Incorrect { score: self.score })
        }
    }

    pub fn request_letter_count(&mut self) -> HintOutcome {
        if self.secret_word.is_empty() {
            return HintOutcome::NotReady;
        }
        if !self.charge(Hint::LetterCount) {
            return HintOutcome::InsufficientScore {
                hint: Hint::LetterCount,
            };
        }
        HintOutcome::LetterCount {
            count: self.secret_word.chars().count(),
            score: self.score,
        }
    }

    /// Charges for the answer even when the letter does not occur at all.
    pub fn request_letter_occurrence(&mut self, letter: Option<char>) -> HintOutcome {
        let Some(letter) = letter else {
            return HintOutcome::NoLetterGiven;
        };
        if self.secret_word.is_empty() {
            return HintOutcome::NotReady;
        }
        if !self.charge(Hint::LetterOccurrence) {
            return HintOutcome::InsufficientScore {
                hint: Hint::LetterOccurrence,
            };
        }

        let count = self
            .secret_word
            .chars()
            .filter(|c| c.to_lowercase().eq(letter.to_lowercase()))
            .count();

        HintOutcome::LetterOccurrence {
            letter,
            count,
            score: self.score,
        }
    }

    pub fn request_clue(&mut self) -> HintOutcome {
        let Some(first_letter) = self.secret_word.chars().next() else {
            return HintOutcome::NotReady;
        };
        if !self.charge(Hint::Clue) {
            return HintOutcome::InsufficientScore { hint: Hint::Clue };
        }
        HintOutcome::Clue {
            first_letter,
            score: self.score,
        }
    }

    pub fn phase(&self) -> RoundPhase {
        match (self.round_active, self.ended) {
            (true, _) if self.secret_word.is_empty() => RoundPhase::AwaitingWord,
            (true, _) => RoundPhase::Active,
            (false, Some(RoundEnd::Won)) => RoundPhase::Won,
            (false, Some(RoundEnd::Lost)) => RoundPhase::LostGameOver,
            (false, None) => RoundPhase::AwaitingWord,
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn attempts_left(&self) -> u32 {
        MAX_ATTEMPTS - self.attempts
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn elapsed_seconds(&self) -> u32 {
        self.elapsed_seconds
    }

    pub fn is_round_active(&self) -> bool {
        self.round_active
    }

    pub fn round(&self) -> RoundId {
        self.round
    }

    pub fn secret_word(&self) -> &str {
        &self.secret_word
    }

    pub fn is_word_ready(&self) -> bool {
        !self.secret_word.is_empty()
    }

    fn charge(&mut self, hint: Hint) -> bool {
        if self.score < HINT_COST {
            debug!(%hint, score = self.score, "hint refused");
            return false;
        }
        self.score -= HINT_COST;
        debug!(%hint, score = self.score, "hint purchased");
        true
    }

    fn finish(&mut self, end: RoundEnd) {
        self.round_active = false;
        self.ended = Some(end);
    }

    #[cfg(test)]
    pub(crate) fn set_score(&mut self, score: i32) {
        self.score = score;
    }
}

fn equals_ignore_case(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}
