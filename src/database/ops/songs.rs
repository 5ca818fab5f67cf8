//! Song CRUD and ordering operations

use sqlx::{Pool, QueryBuilder, Sqlite, SqliteConnection};

use super::current_timestamp;
use crate::database::models::SongRow;
use crate::database::{DbSong, SongFilter, SongForm};
use crate::error::Result;

const SELECT_SONGS: &str = r#"
    SELECT s.id, s.title, s.artist, s.category_id, c.name AS category_name,
           s.sort_order, s.chord_url, s.created_at, s.updated_at
    FROM songs s
    LEFT JOIN categories c ON c.id = s.category_id
"#;

/// Get songs matching the filter, ordered by position
pub async fn find_songs(pool: &Pool<Sqlite>, filter: &SongFilter) -> Result<Vec<DbSong>> {
    let mut query = QueryBuilder::<Sqlite>::new(SELECT_SONGS);
    query.push(" WHERE 1 = 1");

    if let Some(category_id) = filter.category_id {
        query.push(" AND s.category_id = ").push_bind(category_id);
    }

    // instr() is case-sensitive, unlike LIKE
    if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
        query
            .push(" AND (instr(s.title, ")
            .push_bind(search.to_string())
            .push(") > 0 OR instr(s.artist, ")
            .push_bind(search.to_string())
            .push(") > 0)");
    }

    query.push(" ORDER BY s.sort_order, s.id");

    let rows = query.build_query_as::<SongRow>().fetch_all(pool).await?;
    Ok(rows.into_iter().map(DbSong::from).collect())
}

/// Get song by id
pub async fn find_song(pool: &Pool<Sqlite>, id: i64) -> Result<Option<DbSong>> {
    let mut conn = pool.acquire().await?;
    find_song_tx(&mut conn, id).await
}

/// Get song by id (transaction version)
pub async fn find_song_tx(conn: &mut SqliteConnection, id: i64) -> Result<Option<DbSong>> {
    let row = sqlx::query_as::<_, SongRow>(&format!("{SELECT_SONGS} WHERE s.id = ?"))
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(row.map(DbSong::from))
}

/// Get the id of the song at a given position (transaction version)
pub async fn find_song_id_at_order_tx(
    conn: &mut SqliteConnection,
    order: i64,
) -> Result<Option<i64>> {
    let id = sqlx::query_scalar("SELECT id FROM songs WHERE sort_order = ? LIMIT 1")
        .bind(order)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(id)
}

/// Count all songs (transaction version)
pub async fn count_songs_tx(conn: &mut SqliteConnection) -> Result<i64> {
    let count = sqlx::query_scalar("SELECT COUNT(*) FROM songs")
        .fetch_one(&mut *conn)
        .await?;
    Ok(count)
}

/// Highest position in use, `None` for an empty catalog (transaction version)
pub async fn max_song_order_tx(conn: &mut SqliteConnection) -> Result<Option<i64>> {
    let max_order: Option<i64> = sqlx::query_scalar("SELECT MAX(sort_order) FROM songs")
        .fetch_one(&mut *conn)
        .await?;
    Ok(max_order)
}

/// Insert a new song at the given position, returns the new song id
pub async fn insert_song_tx(conn: &mut SqliteConnection, song: &SongForm, order: i64) -> Result<i64> {
    let now = current_timestamp();

    let result = sqlx::query(
        r#"
        INSERT INTO songs (title, artist, category_id, sort_order, chord_url, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&song.title)
    .bind(&song.artist)
    .bind(song.category_id)
    .bind(order)
    .bind(&song.chord_url)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Replace the editable fields of a song, leaving its position alone.
/// Returns false if no song has that id.
pub async fn update_song_tx(conn: &mut SqliteConnection, id: i64, song: &SongForm) -> Result<bool> {
    let now = current_timestamp();

    let result = sqlx::query(
        "UPDATE songs SET title = ?, artist = ?, category_id = ?, chord_url = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&song.title)
    .bind(&song.artist)
    .bind(song.category_id)
    .bind(&song.chord_url)
    .bind(now)
    .bind(id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Set the position of a single song. Returns false if no song has that id.
pub async fn set_song_order_tx(conn: &mut SqliteConnection, id: i64, order: i64) -> Result<bool> {
    let result = sqlx::query("UPDATE songs SET sort_order = ? WHERE id = ?")
        .bind(order)
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Move every song after `order` up by one slot, returns the number shifted
pub async fn shift_orders_after_tx(conn: &mut SqliteConnection, order: i64) -> Result<u64> {
    let result = sqlx::query("UPDATE songs SET sort_order = sort_order - 1 WHERE sort_order > ?")
        .bind(order)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected())
}

/// Delete song by id. Returns false if no song has that id.
pub async fn delete_song_tx(conn: &mut SqliteConnection, id: i64) -> Result<bool> {
    let result = sqlx::query("DELETE FROM songs WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// All positions in ascending order, for integrity checks
pub async fn song_orders(pool: &Pool<Sqlite>) -> Result<Vec<i64>> {
    let orders = sqlx::query_scalar("SELECT sort_order FROM songs ORDER BY sort_order")
        .fetch_all(pool)
        .await?;
    Ok(orders)
}
