use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// Starting balance for a new user, in cents.
pub const STARTING_CASH: i64 = 10_000_00;

#[derive(Clone)]
pub struct DatabasePool(pub Arc<Mutex<rusqlite::Connection>>);

impl DatabasePool {
    /// Open (or create) the database file at `path` and make sure the schema exists.
    pub fn open(path: &str) -> Result<Self, rusqlite::Error> {
        let conn = rusqlite::Connection::open(path)?;
        Self::init(conn)
    }

    /// A private in-memory database, used by tests.
    pub fn in_memory() -> Result<Self, rusqlite::Error> {
        let conn = rusqlite::Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: rusqlite::Connection) -> Result<Self, rusqlite::Error> {
        conn.pragma_update(None, "foreign_keys", true)?;

        // Initialize schema for users
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    username TEXT NOT NULL UNIQUE,
                    hash TEXT NOT NULL,
                    cash INTEGER NOT NULL DEFAULT {STARTING_CASH}
                )"
            ),
            [],
        )?;

        // Initialize schema for portfolio (current holdings)
        conn.execute(
            "CREATE TABLE IF NOT EXISTS portfolio (
                user_id INTEGER NOT NULL,
                stock_symbol TEXT NOT NULL,
                stock_amount INTEGER NOT NULL CHECK (stock_amount >= 0),
                PRIMARY KEY (user_id, stock_symbol),
                FOREIGN KEY (user_id) REFERENCES users(id)
            )",
            [],
        )?;

        // Initialize schema for history (append-only ledger)
        conn.execute(
            "CREATE TABLE IF NOT EXISTS history (
                id TEXT PRIMARY KEY,
                user_id INTEGER NOT NULL,
                stock_symbol TEXT NOT NULL,
                stock_amount INTEGER NOT NULL,
                stock_price INTEGER NOT NULL,
                total_value INTEGER NOT NULL,
                method TEXT NOT NULL CHECK (method IN ('Buy', 'Sell')),
                timestamp TEXT NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users(id)
            )",
            [],
        )?;

        Ok(Self(Arc::new(Mutex::new(conn))))
    }

    /// Lock the connection for the duration of one operation.
    pub async fn lock(&self) -> MutexGuard<'_, rusqlite::Connection> {
        self.0.lock().await
    }
}
