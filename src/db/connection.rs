//! Store (component B): connection management and the single
//! per-process serialisation point spec §4.B and §5 require ("every
//! mutation is serialised per-process... via a store-side transaction").

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;

use crate::error::{Error, Result};

use super::migrations;

/// Open a connection to the taskctl database, creating the schema if the
/// file does not yet exist (idempotent — safe to call on every startup).
pub fn open(db_path: &Path) -> Result<Connection> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(db_path)?;
    configure_connection(&conn)?;
    migrations::run_migrations(&conn)?;
    Ok(conn)
}

/// Open a connection without running migrations; fails if the database
/// file does not already exist. Mirrors the teacher's "not initialized"
/// guard for read-only entry points such as the MCP server.
pub fn open_existing(db_path: &Path) -> Result<Connection> {
    if !db_path.exists() {
        return Err(Error::Invalid(format!(
            "no database at {}. Run `taskctl project init` first.",
            db_path.display()
        )));
    }
    let conn = Connection::open(db_path)?;
    configure_connection(&conn)?;
    Ok(conn)
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode=WAL;
         PRAGMA busy_timeout=5000;
         PRAGMA foreign_keys=ON;",
    )?;
    Ok(())
}

/// The single source of truth (spec §5: "no component caches beyond one
/// scheduler invocation"). Every mutation — and every multi-row state
/// transition from §4.I — goes through the mutex held here, which is what
/// makes "serialised per-process" concrete: two threads inside one
/// scheduler invocation (see `scheduler::assign`'s scoped git/forge calls)
/// never interleave their SQL.
pub struct Store {
    conn: Mutex<Connection>,
    pub db_path: PathBuf,
}

impl Store {
    pub fn open(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        let conn = open(&db_path)?;
        Ok(Self { conn: Mutex::new(conn), db_path })
    }

    pub fn open_existing(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        let conn = open_existing(&db_path)?;
        Ok(Self { conn: Mutex::new(conn), db_path })
    }

    /// Acquire the connection for a single statement or read query.
    pub fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("store mutex poisoned")
    }

    /// Run `f` inside a `BEGIN IMMEDIATE` transaction. Commits on `Ok`,
    /// rolls back on `Err`, matching the teacher's manual
    /// BEGIN/COMMIT/ROLLBACK pattern (`cli/task.rs`, `cli/plan.rs`) but
    /// centralised so every caller gets the same atomicity guarantee
    /// ("an external reader never observes a partial transition", §4.B).
    pub fn transaction<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let conn = self.lock();
        conn.execute_batch("BEGIN IMMEDIATE")?;
        match f(&conn) {
            Ok(value) => {
                conn.execute_batch("COMMIT")?;
                Ok(value)
            }
            Err(e) => {
                let _ = conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }
}
