use chrono::Local;
use derive_more::{Display, Error, From};
use rusqlite::{params, Connection};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::app_dirs::AppDirs;

#[derive(Debug, Display, Error, From)]
pub enum RosterError {
    #[display("roster database error: {_0}")]
    Sqlite(rusqlite::Error),
    #[display("roster directory error: {_0}")]
    Io(std::io::Error),
}

/// Set of player names seen on this machine
pub trait UserRoster {
    fn has(&self, name: &str) -> Result<bool, RosterError>;
    fn add(&mut self, name: &str) -> Result<(), RosterError>;
}

/// Database-backed roster
#[derive(Debug)]
pub struct SqliteRoster {
    conn: Connection,
}

impl SqliteRoster {
    /// Open the roster at the default state location
    pub fn open_default() -> Result<Self, RosterError> {
        let path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("guessr.db"));
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RosterError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS usernames (
                name TEXT PRIMARY KEY,
                first_seen TEXT NOT NULL
            )
            "#,
            [],
        )?;

        debug!(path = %path.display(), "roster opened");
        Ok(SqliteRoster { conn })
    }

    /// All known names, oldest first
    pub fn names(&self) -> Result<Vec<String>, RosterError> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM usernames ORDER BY first_seen, name")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut names = Vec::new();
        for name in rows {
            names.push(name?);
        }
        Ok(names)
    }
}

impl UserRoster for SqliteRoster {
    fn has(&self, name: &str) -> Result<bool, RosterError> {
        let exists = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM usernames WHERE name = ?1)",
            [name],
            |row| row.get::<_, bool>(0),
        )?;
        Ok(exists)
    }

    fn add(&mut self, name: &str) -> Result<(), RosterError> {
        self.conn.execute(
            "INSERT OR IGNORE INTO usernames (name, first_seen) VALUES (?1, ?2)",
            params![name, Local::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

/// In-memory roster, used in tests and when the database is unavailable
#[derive(Debug, Default, Clone)]
pub struct MemoryRoster {
    names: HashSet<String>,
}

impl UserRoster for MemoryRoster {
    fn has(&self, name: &str) -> Result<bool, RosterError> {
        Ok(self.names.contains(name))
    }

    fn add(&mut self, name: &str) -> Result<(), RosterError> {
        self.names.insert(name.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Greeting {
    EmptyName,
    WelcomeBack(String),
    WelcomeNew(String),
}

/// Decide how to greet a player, remembering first-time names
pub fn greet(roster: &mut dyn UserRoster, raw_name: &str) -> Result<Greeting, RosterError> {
    let name = raw_name.trim();
    if name.is_empty() {
        return Ok(Greeting::EmptyName);
    }

    if roster.has(name)? {
        info!(player = name, "returning player");
        Ok(Greeting::WelcomeBack(name.to_string()))
    } else {
        roster.add(name)?;
        info!(player = name, "new player");
        Ok(Greeting::WelcomeNew(name.to_string()))
    }
}
