//! Saved (bookmarked) catalog items

use shared::models::Item;
use shared::util::now_millis;
use sqlx::PgPool;

use crate::error::ServiceResult;

/// The user's saved items, most recently saved first.
pub async fn list(pool: &PgPool, user_id: i64) -> ServiceResult<Vec<Item>> {
    let ids: Vec<i64> = sqlx::query_scalar(
        "SELECT item_id FROM saved_items WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    super::items::find_by_ids(pool, &ids).await
}

/// Saving twice is a no-op.
pub async fn add(pool: &PgPool, user_id: i64, item_id: i64) -> ServiceResult<()> {
    sqlx::query(
        "INSERT INTO saved_items (user_id, item_id, created_at) VALUES ($1, $2, $3) \
         ON CONFLICT (user_id, item_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(item_id)
    .bind(now_millis())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn remove(pool: &PgPool, user_id: i64, item_id: i64) -> ServiceResult<bool> {
    let result = sqlx::query("DELETE FROM saved_items WHERE user_id = $1 AND item_id = $2")
        .bind(user_id)
        .bind(item_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// True when the user has saved anything; used by the user-delete guard.
pub async fn exists_for_user(pool: &PgPool, user_id: i64) -> ServiceResult<bool> {
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM saved_items WHERE user_id = $1)")
            .bind(user_id)
            .fetch_one(pool)
            .await?;
    Ok(exists)
}
