//! Category operations

use sqlx::{Pool, Sqlite, SqliteConnection};

use crate::database::DbCategory;
use crate::error::Result;

/// Insert a new category, returns the new category id
pub async fn insert_category(pool: &Pool<Sqlite>, name: &str) -> Result<i64> {
    let result = sqlx::query("INSERT INTO categories (name) VALUES (?)")
        .bind(name)
        .execute(pool)
        .await?;

    Ok(result.last_insert_rowid())
}

/// Get all categories
pub async fn find_categories(pool: &Pool<Sqlite>) -> Result<Vec<DbCategory>> {
    let categories =
        sqlx::query_as::<_, DbCategory>("SELECT id, name FROM categories ORDER BY name, id")
            .fetch_all(pool)
            .await?;
    Ok(categories)
}

/// Get category by id
pub async fn find_category(pool: &Pool<Sqlite>, id: i64) -> Result<Option<DbCategory>> {
    let mut conn = pool.acquire().await?;
    find_category_tx(&mut conn, id).await
}

/// Get category by id (transaction version)
pub async fn find_category_tx(conn: &mut SqliteConnection, id: i64) -> Result<Option<DbCategory>> {
    let category = sqlx::query_as::<_, DbCategory>("SELECT id, name FROM categories WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(category)
}
