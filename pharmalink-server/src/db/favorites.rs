//! Favorite counterparties

use shared::models::{Role, UserSummary};
use shared::util::now_millis;
use sqlx::PgPool;

use crate::error::ServiceResult;

#[derive(sqlx::FromRow)]
struct FavoriteRow {
    id: i64,
    name: String,
    user_type: String,
    logo_url: String,
    city: String,
    is_active: bool,
    allow_showing_medicines: bool,
    our_companies: Vec<i64>,
    cost_of_deliver: f64,
    invoice_min_total: f64,
    fast_deliver: bool,
    pay_at_deliver: bool,
    include_in_point_system: bool,
    point_for_amount: f64,
    amount_to_get_point: f64,
    points: i64,
}

impl From<FavoriteRow> for UserSummary {
    fn from(r: FavoriteRow) -> Self {
        UserSummary {
            id: r.id,
            name: r.name,
            user_type: Role::parse(&r.user_type).unwrap_or(Role::Normal),
            logo_url: r.logo_url,
            city: r.city,
            is_active: r.is_active,
            allow_showing_medicines: r.allow_showing_medicines,
            our_companies: r.our_companies,
            cost_of_deliver: r.cost_of_deliver,
            invoice_min_total: r.invoice_min_total,
            fast_deliver: r.fast_deliver,
            pay_at_deliver: r.pay_at_deliver,
            include_in_point_system: r.include_in_point_system,
            point_for_amount: r.point_for_amount,
            amount_to_get_point: r.amount_to_get_point,
            points: r.points,
        }
    }
}

/// The user's favorite counterparties, most recently added first.
pub async fn list(pool: &PgPool, user_id: i64) -> ServiceResult<Vec<UserSummary>> {
    let rows: Vec<FavoriteRow> = sqlx::query_as(
        "SELECT u.id, u.name, u.user_type, u.logo_url, u.city, u.is_active, \
         u.allow_showing_medicines, u.our_companies, u.cost_of_deliver, u.invoice_min_total, \
         u.fast_deliver, u.pay_at_deliver, u.include_in_point_system, u.point_for_amount, \
         u.amount_to_get_point, u.points \
         FROM favorites f \
         JOIN users u ON u.id = f.favorite_user_id \
         WHERE f.user_id = $1 \
         ORDER BY f.created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(UserSummary::from).collect())
}

/// Favoriting twice is a no-op.
pub async fn add(pool: &PgPool, user_id: i64, favorite_user_id: i64) -> ServiceResult<()> {
    sqlx::query(
        "INSERT INTO favorites (user_id, favorite_user_id, created_at) VALUES ($1, $2, $3) \
         ON CONFLICT (user_id, favorite_user_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(favorite_user_id)
    .bind(now_millis())
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn remove(pool: &PgPool, user_id: i64, favorite_user_id: i64) -> ServiceResult<bool> {
    let result =
        sqlx::query("DELETE FROM favorites WHERE user_id = $1 AND favorite_user_id = $2")
            .bind(user_id)
            .bind(favorite_user_id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}

/// True when the user appears on either side of a favorite; used by the
/// user-delete guard.
pub async fn exists_for_user(pool: &PgPool, user_id: i64) -> ServiceResult<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM favorites WHERE user_id = $1 OR favorite_user_id = $1)",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}
