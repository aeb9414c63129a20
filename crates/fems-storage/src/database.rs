//! Database connection and key-value operations

use chrono::Utc;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::Arc;

use crate::migrations::run_migrations;
use crate::Result;

pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for better concurrent performance
        let _: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;

        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock();
        f(&conn)
    }

    pub fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;
        Ok(result)
    }

    pub fn get_value(&self, key: &str) -> Result<Option<String>> {
        self.with_connection(|conn| select(conn, key))
    }

    /// Read several keys under one lock. A concurrent `write_batch` is seen
    /// either whole or not at all.
    pub fn read_batch(&self, keys: &[&str]) -> Result<Vec<Option<String>>> {
        self.with_connection(|conn| keys.iter().map(|key| select(conn, key)).collect())
    }

    pub fn set_value(&self, key: &str, value: &str) -> Result<()> {
        self.with_connection(|conn| upsert(conn, key, value))
    }

    pub fn remove_value(&self, key: &str) -> Result<()> {
        self.with_connection(|conn| {
            conn.execute("DELETE FROM local_storage WHERE key = ?1", [key])?;
            Ok(())
        })
    }

    /// Apply several writes in one transaction.
    ///
    /// `Some(value)` upserts the key, `None` removes it. Readers never see a
    /// partially applied batch.
    pub fn write_batch(&self, entries: &[(&str, Option<&str>)]) -> Result<()> {
        self.transaction(|conn| apply(conn, entries))
    }

    /// Like `write_batch`, but only when every key in `expected` still holds
    /// the given value (`None` meaning absent).
    ///
    /// Returns false, writing nothing, if any of them changed.
    pub fn write_batch_if(
        &self,
        expected: &[(&str, Option<&str>)],
        entries: &[(&str, Option<&str>)],
    ) -> Result<bool> {
        self.transaction(|conn| {
            for (key, value) in expected {
                if select(conn, key)?.as_deref() != *value {
                    return Ok(false);
                }
            }
            apply(conn, entries)?;
            Ok(true)
        })
    }
}

fn select(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM local_storage WHERE key = ?1",
            [key],
            |row| row.get(0),
        )
        .optional()?;
    Ok(value)
}

fn apply(conn: &Connection, entries: &[(&str, Option<&str>)]) -> Result<()> {
    for (key, value) in entries {
        match value {
            Some(value) => upsert(conn, key, value)?,
            None => {
                conn.execute("DELETE FROM local_storage WHERE key = ?1", [*key])?;
            }
        }
    }
    Ok(())
}

fn upsert(conn: &Connection, key: &str, value: &str) -> Result<()> {
    let updated_at = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT OR REPLACE INTO local_storage (key, value, updated_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![key, value, updated_at],
    )?;
    Ok(())
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
        }
    }
}
