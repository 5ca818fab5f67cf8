//! Database repository - main entry point
//! Delegates to ops modules for actual operations

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite, Transaction};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::Mutex;

use super::{models::*, ops, schema};
use crate::error::{Error, Result};

/// Database connection pool wrapper
#[derive(Debug)]
pub struct Database {
    pool: Pool<Sqlite>,
    /// Serializes writes that read and then rewrite `sort_order`
    write_gate: Mutex<()>,
}

impl Database {
    /// Create and initialize database at the given path
    pub async fn new(db_path: &Path, max_connections: u32) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true)
            // WAL keeps listings readable while a reorder is being written
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect_with(options)
            .await?;

        tracing::info!("Opened song database at {}", db_path.display());
        Self::with_pool(pool).await
    }

    /// Create a private in-memory database, mostly for tests
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);

        // Every connection would get its own empty database, so keep exactly one alive
        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        Self::with_pool(pool).await
    }

    /// Start a transaction that takes the SQLite write lock up front, so a
    /// read-then-write never has to upgrade a stale snapshot
    async fn begin_write(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    async fn with_pool(pool: Pool<Sqlite>) -> Result<Self> {
        schema::run_migrations(&pool).await?;
        Ok(Self {
            pool,
            write_gate: Mutex::new(()),
        })
    }

    // ============ Song Operations ============

    pub async fn find_songs(&self, filter: &SongFilter) -> Result<Vec<DbSong>> {
        ops::find_songs(&self.pool, filter).await
    }

    pub async fn find_song(&self, id: i64) -> Result<Option<DbSong>> {
        ops::find_song(&self.pool, id).await
    }

    pub async fn song_orders(&self) -> Result<Vec<i64>> {
        ops::song_orders(&self.pool).await
    }

    /// Insert a song after the current last one.
    /// The form must already be validated.
    pub async fn insert_song(&self, song: &SongForm) -> Result<DbSong> {
        let _gate = self.write_gate.lock().await;
        let mut tx = self.begin_write().await?;

        if let Some(category_id) = song.category_id {
            ensure_category(&mut *tx, category_id).await?;
        }

        let order = ops::max_song_order_tx(&mut *tx)
            .await?
            .map_or(0, |max| max + 1);
        let id = ops::insert_song_tx(&mut *tx, song, order).await?;
        let created = ops::find_song_tx(&mut *tx, id)
            .await?
            .ok_or_else(|| Error::song_not_found(id))?;

        tx.commit().await?;
        Ok(created)
    }

    /// Replace the editable fields of a song, keeping its position.
    /// The form must already be validated.
    pub async fn update_song(&self, id: i64, song: &SongForm) -> Result<DbSong> {
        let mut tx = self.begin_write().await?;

        if let Some(category_id) = song.category_id {
            ensure_category(&mut *tx, category_id).await?;
        }

        if !ops::update_song_tx(&mut *tx, id, song).await? {
            return Err(Error::song_not_found(id));
        }
        let updated = ops::find_song_tx(&mut *tx, id)
            .await?
            .ok_or_else(|| Error::song_not_found(id))?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Delete a song and close the gap it leaves in the ordering.
    /// Returns the song as it was before deletion.
    pub async fn delete_song(&self, id: i64) -> Result<DbSong> {
        let _gate = self.write_gate.lock().await;
        let mut tx = self.begin_write().await?;

        let song = ops::find_song_tx(&mut *tx, id)
            .await?
            .ok_or_else(|| Error::song_not_found(id))?;

        if !ops::delete_song_tx(&mut *tx, id).await? {
            return Err(Error::song_not_found(id));
        }
        let shifted = ops::shift_orders_after_tx(&mut *tx, song.order).await?;

        tx.commit().await?;
        tracing::debug!(
            "Deleted song {} at position {}, shifted {} songs",
            id,
            song.order,
            shifted
        );
        Ok(song)
    }

    /// Swap a song with its neighbor in the given direction.
    ///
    /// Returns `Ok(false)` when the song is already first (up) or last (down).
    /// Fails with `Conflict` if the neighbor slot is empty, which means the
    /// ordering is no longer dense.
    pub async fn move_song(&self, id: i64, direction: Direction) -> Result<bool> {
        let _gate = self.write_gate.lock().await;
        let mut tx = self.begin_write().await?;

        let song = ops::find_song_tx(&mut *tx, id)
            .await?
            .ok_or_else(|| Error::song_not_found(id))?;
        let count = ops::count_songs_tx(&mut *tx).await?;
        let order = song.order;

        let neighbor_order = match direction {
            Direction::Up if order > 0 => order - 1,
            Direction::Down if order < count - 1 => order + 1,
            _ => {
                tracing::debug!("Song {} is already at the {} boundary", id, direction);
                return Ok(false);
            }
        };

        let Some(neighbor_id) = ops::find_song_id_at_order_tx(&mut *tx, neighbor_order).await?
        else {
            tracing::warn!(
                "No song at position {} while moving song {} {}",
                neighbor_order,
                id,
                direction
            );
            return Err(Error::Conflict(format!(
                "no song at position {neighbor_order}; ordering is not dense"
            )));
        };

        ops::set_song_order_tx(&mut *tx, id, neighbor_order).await?;
        ops::set_song_order_tx(&mut *tx, neighbor_id, order).await?;

        tx.commit().await?;
        Ok(true)
    }

    // ============ Category Operations ============

    pub async fn insert_category(&self, name: &str) -> Result<DbCategory> {
        let id = ops::insert_category(&self.pool, name).await?;
        ops::find_category(&self.pool, id)
            .await?
            .ok_or_else(|| Error::category_not_found(id))
    }

    pub async fn find_categories(&self) -> Result<Vec<DbCategory>> {
        ops::find_categories(&self.pool).await
    }
}

async fn ensure_category(conn: &mut sqlx::SqliteConnection, category_id: i64) -> Result<()> {
    if ops::find_category_tx(conn, category_id).await?.is_none() {
        return Err(Error::validation(
            "category_id",
            format!("unknown category {category_id}"),
        ));
    }
    Ok(())
}
