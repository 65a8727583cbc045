//! Basket (staging cart) queries

use std::collections::HashMap;

use shared::models::{Basket, BasketCreate, OrderLine, PartyRef};
use shared::util::{now_millis, snowflake_id};
use sqlx::PgPool;

use crate::error::ServiceResult;

#[derive(sqlx::FromRow)]
struct BasketRow {
    id: i64,
    created_at: i64,
    updated_at: i64,
    pharmacy_id: i64,
    pharmacy_name: String,
    pharmacy_city: String,
    warehouse_id: i64,
    warehouse_name: String,
    warehouse_city: String,
}

impl BasketRow {
    fn into_basket(self, items: Vec<OrderLine>) -> Basket {
        Basket {
            id: self.id,
            pharmacy: PartyRef {
                id: self.pharmacy_id,
                name: self.pharmacy_name,
                city: self.pharmacy_city,
            },
            warehouse: PartyRef {
                id: self.warehouse_id,
                name: self.warehouse_name,
                city: self.warehouse_city,
            },
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const BASKET_SELECT: &str = "SELECT b.id, b.created_at, b.updated_at, \
     p.id AS pharmacy_id, p.name AS pharmacy_name, p.city AS pharmacy_city, \
     w.id AS warehouse_id, w.name AS warehouse_name, w.city AS warehouse_city \
     FROM baskets b \
     JOIN users p ON p.id = b.pharmacy_id \
     JOIN users w ON w.id = b.warehouse_id";

async fn lines_for(
    pool: &PgPool,
    basket_ids: &[i64],
) -> ServiceResult<HashMap<i64, Vec<OrderLine>>> {
    if basket_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<(i64, i64, i32, i32)> = sqlx::query_as(
        "SELECT basket_id, item_id, quantity, bonus FROM basket_items \
         WHERE basket_id = ANY($1) ORDER BY basket_id, line_no",
    )
    .bind(basket_ids)
    .fetch_all(pool)
    .await?;

    let mut grouped: HashMap<i64, Vec<OrderLine>> = HashMap::new();
    for (basket_id, item, quantity, bonus) in rows {
        grouped.entry(basket_id).or_default().push(OrderLine {
            item,
            quantity,
            bonus,
        });
    }
    Ok(grouped)
}

/// Baskets scoped to a pharmacy or warehouse; both `None` lists all
/// (admin).
pub async fn list(
    pool: &PgPool,
    pharmacy_id: Option<i64>,
    warehouse_id: Option<i64>,
) -> ServiceResult<Vec<Basket>> {
    let rows: Vec<BasketRow> = match (pharmacy_id, warehouse_id) {
        (Some(id), _) => {
            sqlx::query_as(&format!(
                "{BASKET_SELECT} WHERE b.pharmacy_id = $1 ORDER BY b.created_at DESC"
            ))
            .bind(id)
            .fetch_all(pool)
            .await?
        }
        (None, Some(id)) => {
            sqlx::query_as(&format!(
                "{BASKET_SELECT} WHERE b.warehouse_id = $1 ORDER BY b.created_at DESC"
            ))
            .bind(id)
            .fetch_all(pool)
            .await?
        }
        (None, None) => {
            sqlx::query_as(&format!("{BASKET_SELECT} ORDER BY b.created_at DESC"))
                .fetch_all(pool)
                .await?
        }
    };

    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let mut lines = lines_for(pool, &ids).await?;
    Ok(rows
        .into_iter()
        .map(|r| {
            let items = lines.remove(&r.id).unwrap_or_default();
            r.into_basket(items)
        })
        .collect())
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> ServiceResult<Option<Basket>> {
    let row: Option<BasketRow> = sqlx::query_as(&format!("{BASKET_SELECT} WHERE b.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let mut lines = lines_for(pool, &[id]).await?;
    Ok(Some(row.into_basket(lines.remove(&id).unwrap_or_default())))
}

async fn insert_lines(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    basket_id: i64,
    items: &[OrderLine],
) -> ServiceResult<()> {
    let line_nos: Vec<i32> = (0..items.len() as i32).collect();
    let item_ids: Vec<i64> = items.iter().map(|l| l.item).collect();
    let quantities: Vec<i32> = items.iter().map(|l| l.quantity).collect();
    let bonuses: Vec<i32> = items.iter().map(|l| l.bonus).collect();

    sqlx::query(
        "INSERT INTO basket_items (basket_id, line_no, item_id, quantity, bonus) \
         SELECT $1, * FROM UNNEST($2::int[], $3::bigint[], $4::int[], $5::int[])",
    )
    .bind(basket_id)
    .bind(&line_nos)
    .bind(&item_ids)
    .bind(&quantities)
    .bind(&bonuses)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

/// Create a basket with its lines in one transaction. Returns the new id.
pub async fn create(pool: &PgPool, pharmacy_id: i64, basket: &BasketCreate) -> ServiceResult<i64> {
    let id = snowflake_id();
    let now = now_millis();

    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO baskets (id, pharmacy_id, warehouse_id, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $4)",
    )
    .bind(id)
    .bind(pharmacy_id)
    .bind(basket.warehouse)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    insert_lines(&mut tx, id, &basket.items).await?;

    tx.commit().await?;
    Ok(id)
}

/// Replace all lines wholesale. Returns false when the basket does not
/// exist.
pub async fn replace_lines(pool: &PgPool, id: i64, items: &[OrderLine]) -> ServiceResult<bool> {
    let mut tx = pool.begin().await?;

    let updated: Option<i64> =
        sqlx::query_scalar("UPDATE baskets SET updated_at = $2 WHERE id = $1 RETURNING id")
            .bind(id)
            .bind(now_millis())
            .fetch_optional(&mut *tx)
            .await?;

    if updated.is_none() {
        return Ok(false);
    }

    sqlx::query("DELETE FROM basket_items WHERE basket_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    insert_lines(&mut tx, id, items).await?;

    tx.commit().await?;
    Ok(true)
}

pub async fn delete(pool: &PgPool, id: i64) -> ServiceResult<bool> {
    let result = sqlx::query("DELETE FROM baskets WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// True when the user is a party to any basket; used by the user-delete
/// guard.
pub async fn exists_for_user(pool: &PgPool, user_id: i64) -> ServiceResult<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM baskets WHERE pharmacy_id = $1 OR warehouse_id = $1)",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}
