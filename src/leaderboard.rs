use tracing::info;

/// A finished, won round
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundWin {
    pub player: Option<String>,
    pub word: String,
    pub attempts: u32,
    pub elapsed_seconds: u32,
    pub score: i32,
}

/// Notified whenever a round is won. Nothing is ranked or persisted here;
/// a real leaderboard plugs in behind this trait.
pub trait RoundWonSink {
    fn round_won(&mut self, win: &RoundWin);
}

/// Records wins in the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl RoundWonSink for TracingSink {
    fn round_won(&mut self, win: &RoundWin) {
        info!(
            player = win.player.as_deref().unwrap_or("anonymous"),
            letters = win.word.chars().count(),
            attempts = win.attempts,
            elapsed_secs = win.elapsed_seconds,
            score = win.score,
            "round won"
        );
    }
}

impl RoundWonSink for Vec<RoundWin> {
    fn round_won(&mut self, win: &RoundWin) {
        self.push(win.clone());
    }
}
