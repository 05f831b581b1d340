// Library surface for the binary, headless/integration tests and reuse.
pub mod app;
pub mod app_dirs;
pub mod config;
pub mod game;
pub mod leaderboard;
pub mod logging;
pub mod notify;
pub mod roster;
pub mod runtime;
pub mod ui;
pub mod util;
pub mod word_source;
