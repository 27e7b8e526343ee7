use rusqlite::{OptionalExtension, Result as SqlResult, params};
use std::path::Path;

use super::database::Database;

/// Key under which the bearer token is persisted.
pub const TOKEN_KEY: &str = "token";

/// Client-local key/value state, such as the persisted session token.
pub struct ClientDatabase {
    db: Database,
}

impl ClientDatabase {
    /// Initialize client database at custom path
    pub fn with_path<P: AsRef<Path>>(path: P) -> SqlResult<Self> {
        let db = Database::new(path)?;
        let client_db = Self { db };
        client_db.init_schema()?;
        Ok(client_db)
    }

    pub fn in_memory() -> SqlResult<Self> {
        let client_db = Self {
            db: Database::in_memory()?,
        };
        client_db.init_schema()?;
        Ok(client_db)
    }

    fn init_schema(&self) -> SqlResult<()> {
        let conn = self.db.connection();
        conn.execute(
            "CREATE TABLE IF NOT EXISTS client_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
            )",
            [],
        )?;
        Ok(())
    }

    pub fn get_value(&self, key: &str) -> SqlResult<Option<String>> {
        let conn = self.db.connection();
        conn.query_row(
            "SELECT value FROM client_state WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
    }

    /// Insert or replace a value
    pub fn set_value(&self, key: &str, value: &str) -> SqlResult<()> {
        let conn = self.db.connection();
        conn.execute(
            "INSERT OR REPLACE INTO client_state (key, value, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now'))",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn remove_value(&self, key: &str) -> SqlResult<()> {
        let conn = self.db.connection();
        conn.execute("DELETE FROM client_state WHERE key = ?1", params![key])?;
        Ok(())
    }
}
