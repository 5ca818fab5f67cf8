//! Database schema migrations

use sqlx::{Pool, Sqlite};

use crate::error::Result;

/// Run database migrations to create/update schema
pub async fn run_migrations(pool: &Pool<Sqlite>) -> Result<()> {
    // Categories table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE
        );
        "#,
    )
    .execute(pool)
    .await?;

    // Songs table. No UNIQUE on sort_order: SQLite checks it per row, so
    // swaps and bulk shifts would trip it mid-statement.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS songs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            title TEXT NOT NULL CHECK (length(title) > 0),
            artist TEXT NOT NULL CHECK (length(artist) > 0),
            category_id INTEGER,
            sort_order INTEGER NOT NULL CHECK (sort_order >= 0),
            chord_url TEXT,
            created_at INTEGER NOT NULL,
            updated_at INTEGER NOT NULL,
            FOREIGN KEY (category_id) REFERENCES categories(id) ON DELETE SET NULL
        );

        CREATE INDEX IF NOT EXISTS idx_songs_sort_order ON songs(sort_order);
        CREATE INDEX IF NOT EXISTS idx_songs_category ON songs(category_id);
        "#,
    )
    .execute(pool)
    .await?;

    tracing::debug!("Schema migrations applied");
    Ok(())
}
