use std::{
    io::{self, stdin},
    sync::Arc,
    time::Instant,
};

use anyhow::Context;
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use guessr::{
    app::{App, Collaborators},
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    leaderboard::TracingSink,
    logging,
    notify::ToastKind,
    roster::{MemoryRoster, SqliteRoster, UserRoster},
    runtime::{CrosstermEventSource, EventSource, FixedTicker, Runner, Ticker},
    word_source::{HttpWordSource, WordFetcher},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use tracing::{info, warn};

/// guess the secret word before your score runs out
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Guess a random secret word in ten attempts. Every wrong guess costs 10 points; hints (letter count, letter check, first-letter clue) cost 5."
)]
pub struct Cli {
    /// player name; skips the name prompt
    #[clap(short = 'n', long)]
    name: Option<String>,

    /// word API returning a JSON array of strings
    #[clap(long)]
    api_url: Option<String>,

    /// seconds to wait for the word API
    #[clap(short = 't', long)]
    timeout_secs: Option<u64>,

    /// write the effective settings to the config file
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Command line flags win over the config file
    fn apply(&self, mut config: Config) -> Config {
        if let Some(url) = &self.api_url {
            config.word_api_url = url.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.fetch_timeout_secs = secs;
        }
        config
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    if let Some(log_path) = AppDirs::log_path() {
        // Logging is best-effort; the game runs without it
        let _ = logging::init_file_logging(&log_path);
    }

    let store = FileConfigStore::new();
    let config = cli.apply(store.load());
    if cli.save_config {
        store
            .save(&config)
            .with_context(|| format!("saving config to {}", store.path().display()))?;
    }
    info!(api = %config.word_api_url, timeout_secs = config.fetch_timeout_secs, "starting");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .context("building async runtime")?;

    let events = CrosstermEventSource::new();
    let source = HttpWordSource::new(config.word_api_url.clone(), config.fetch_timeout())
        .context("building HTTP client")?;
    let fetcher = WordFetcher::new(runtime.handle().clone(), Arc::new(source), events.sender());

    let mut roster_warning = None;
    let roster: Box<dyn UserRoster> = match SqliteRoster::open_default() {
        Ok(roster) => Box::new(roster),
        Err(err) => {
            warn!(error = %err, "player roster unavailable, names will not be remembered");
            roster_warning = Some(err);
            Box::new(MemoryRoster::default())
        }
    };

    let now = Instant::now();
    let mut app = App::new(
        Collaborators {
            words: Box::new(fetcher),
            roster,
            wins: Box::new(TracingSink),
        },
        config.toast_duration(),
        now,
    );
    if let Some(err) = roster_warning {
        app.notice(format!("Player names will not be saved: {err}"), ToastKind::Warning);
    }
    if let Some(name) = &cli.name {
        app.set_player(name, now);
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app, Runner::new(events, FixedTicker::default()));

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // In-flight fetches are abandoned
    runtime.shutdown_background();
    info!("bye");

    result
}

fn start_tui<B: Backend, E: EventSource, T: Ticker>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: Runner<E, T>,
) -> anyhow::Result<()> {
    terminal.draw(|f| f.render_widget(&*app, f.area()))?;

    while !app.should_quit() {
        let event = runner.step();
        app.handle_event(event, Instant::now());
        terminal.draw(|f| f.render_widget(&*app, f.area()))?;
    }

    Ok(())
}
