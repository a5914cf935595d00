use async_trait::async_trait;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum WatchlistError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Storage task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type WatchlistResult<T> = Result<T, WatchlistError>;

/// Durable set of bookmarked movie ids. Each call is atomic on its own;
/// concurrent writers for the same id resolve last-write-wins.
#[async_trait]
pub trait WatchlistStore: Send + Sync {
    /// Idempotent: adding an id twice keeps a single entry.
    async fn add(&self, id: i32) -> WatchlistResult<()>;
    /// No-op when the id is absent.
    async fn remove(&self, id: i32) -> WatchlistResult<()>;
    async fn contains(&self, id: i32) -> WatchlistResult<bool>;
    async fn list_all(&self) -> WatchlistResult<HashSet<i32>>;
}

#[derive(Clone)]
pub struct SqliteWatchlist {
    pool: Pool<SqliteConnectionManager>,
}

impl SqliteWatchlist {
    pub fn open(path: &Path) -> WatchlistResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let manager = SqliteConnectionManager::file(path).with_init(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode = WAL;
                 PRAGMA synchronous = NORMAL;
                 PRAGMA busy_timeout = 5000;",
            )
        });
        let pool = Pool::builder().max_size(4).build(manager)?;
        let store = Self { pool };
        store.migrate()?;
        info!("Watchlist store opened at {}", path.display());
        Ok(store)
    }

    /// Single-connection in-memory store; contents vanish with the pool.
    pub fn open_in_memory() -> WatchlistResult<Self> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .build(manager)?;
        let store = Self { pool };
        store.migrate()?;
        Ok(store)
    }

    fn migrate(&self) -> WatchlistResult<()> {
        let conn = self.pool.get()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS watchlist (
                movie_id INTEGER PRIMARY KEY NOT NULL
            );",
        )?;
        Ok(())
    }

    async fn run<T, F>(&self, op: F) -> WatchlistResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> WatchlistResult<T> {
            let conn = pool.get()?;
            Ok(op(&conn)?)
        })
        .await?
    }
}

#[async_trait]
impl WatchlistStore for SqliteWatchlist {
    async fn add(&self, id: i32) -> WatchlistResult<()> {
        self.run(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO watchlist (movie_id) VALUES (?1)",
                params![id],
            )
            .map(|_| ())
        })
        .await
    }

    async fn remove(&self, id: i32) -> WatchlistResult<()> {
        self.run(move |conn| {
            conn.execute("DELETE FROM watchlist WHERE movie_id = ?1", params![id])
                .map(|_| ())
        })
        .await
    }

    async fn contains(&self, id: i32) -> WatchlistResult<bool> {
        self.run(move |conn| {
            conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM watchlist WHERE movie_id = ?1)",
                params![id],
                |row| row.get(0),
            )
        })
        .await
    }

    async fn list_all(&self) -> WatchlistResult<HashSet<i32>> {
        self.run(|conn| {
            let mut stmt = conn.prepare("SELECT movie_id FROM watchlist")?;
            let rows = stmt.query_map([], |row| row.get::<_, i32>(0))?;
            let ids = rows.collect::<rusqlite::Result<HashSet<i32>>>()?;
            Ok(ids)
        })
        .await
    }
}
