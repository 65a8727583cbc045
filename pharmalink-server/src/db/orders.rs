//! Order queries
//!
//! Status columns are stored as their kebab-case wire strings; the closed
//! enums in `shared` are the only values ever bound, so parsing on read
//! cannot fail for rows this service wrote.

use shared::models::{
    Order, OrderCreate, OrderLineDetail, OrderLineItem, OrderStatus, OrderStatusUpdate,
    OrderSummary, PartyRef, PharmacyStatus, WarehouseStatus,
};
use shared::util::{now_millis, snowflake_id};
use sqlx::PgPool;

use super::filter::Filter;
use crate::error::ServiceResult;

#[derive(sqlx::FromRow)]
struct OrderSummaryRow {
    id: i64,
    status: String,
    seen_by_admin: bool,
    created_at: i64,
    pharmacy_id: i64,
    pharmacy_name: String,
    pharmacy_city: String,
    warehouse_id: i64,
    warehouse_name: String,
    warehouse_city: String,
}

impl From<OrderSummaryRow> for OrderSummary {
    fn from(r: OrderSummaryRow) -> Self {
        OrderSummary {
            id: r.id,
            pharmacy: PartyRef {
                id: r.pharmacy_id,
                name: r.pharmacy_name,
                city: r.pharmacy_city,
            },
            warehouse: PartyRef {
                id: r.warehouse_id,
                name: r.warehouse_name,
                city: r.warehouse_city,
            },
            status: OrderStatus::parse(&r.status).unwrap_or_default(),
            seen_by_admin: r.seen_by_admin,
            created_at: r.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderDetailRow {
    id: i64,
    status: String,
    warehouse_status: String,
    pharmacy_status: Option<String>,
    seen_by_admin: bool,
    created_at: i64,
    updated_at: i64,
    pharmacy_id: i64,
    pharmacy_name: String,
    pharmacy_city: String,
    warehouse_id: i64,
    warehouse_name: String,
    warehouse_city: String,
}

#[derive(sqlx::FromRow)]
struct OrderLineRow {
    item_id: i64,
    item_name: String,
    formula: String,
    caliber: String,
    price: f64,
    customer_price: f64,
    company_name: Option<String>,
    quantity: i32,
    bonus: i32,
}

impl From<OrderLineRow> for OrderLineDetail {
    fn from(r: OrderLineRow) -> Self {
        OrderLineDetail {
            item: OrderLineItem {
                id: r.item_id,
                name: r.item_name,
                formula: r.formula,
                caliber: r.caliber,
                price: r.price,
                customer_price: r.customer_price,
                company_name: r.company_name,
            },
            quantity: r.quantity,
            bonus: r.bonus,
        }
    }
}

/// Conjunctive list filters; all optional. Dates are millisecond bounds
/// (inclusive from, exclusive to).
#[derive(Debug, Default)]
pub struct OrderListParams {
    pub pharmacy_id: Option<i64>,
    pub warehouse_id: Option<i64>,
    pub pharmacy_name: Option<String>,
    pub warehouse_name: Option<String>,
    pub date_from: Option<i64>,
    pub date_to: Option<i64>,
    pub page: i64,
    pub limit: i64,
}

fn list_filter(params: &OrderListParams) -> Filter {
    let mut f = Filter::new();
    f.eq_i64("o.pharmacy_id", params.pharmacy_id);
    f.eq_i64("o.warehouse_id", params.warehouse_id);
    f.ilike("p.name", params.pharmacy_name.as_deref());
    f.ilike("w.name", params.warehouse_name.as_deref());
    if let Some(from) = params.date_from {
        f.push("o.created_at >= $?", vec![super::filter::Bind::Int(from)]);
    }
    if let Some(to) = params.date_to {
        f.push("o.created_at < $?", vec![super::filter::Bind::Int(to)]);
    }
    f
}

const SUMMARY_SELECT: &str = "SELECT o.id, o.status, o.seen_by_admin, o.created_at, \
     p.id AS pharmacy_id, p.name AS pharmacy_name, p.city AS pharmacy_city, \
     w.id AS warehouse_id, w.name AS warehouse_name, w.city AS warehouse_city \
     FROM orders o \
     JOIN users p ON p.id = o.pharmacy_id \
     JOIN users w ON w.id = o.warehouse_id";

/// Newest-first paginated order list plus the total count under the same
/// filter.
pub async fn list(
    pool: &PgPool,
    params: &OrderListParams,
) -> ServiceResult<(Vec<OrderSummary>, i64)> {
    let filter = list_filter(params);
    let n = filter.arg_count();

    let sql = format!(
        "{SUMMARY_SELECT}{} ORDER BY o.created_at DESC LIMIT ${} OFFSET ${}",
        filter.where_clause(),
        n + 1,
        n + 2
    );
    let rows: Vec<OrderSummaryRow> = filter
        .bind_query_as(sqlx::query_as(&sql))
        .bind(params.limit)
        .bind((params.page - 1) * params.limit)
        .fetch_all(pool)
        .await?;

    let count_sql = format!(
        "SELECT COUNT(*) FROM orders o \
         JOIN users p ON p.id = o.pharmacy_id \
         JOIN users w ON w.id = o.warehouse_id{}",
        filter.where_clause()
    );
    let count: i64 = filter
        .bind_query_scalar(sqlx::query_scalar(&count_sql))
        .fetch_one(pool)
        .await?;

    Ok((rows.into_iter().map(OrderSummary::from).collect(), count))
}

/// Full order with populated parties and lines, in line order.
pub async fn find_by_id(pool: &PgPool, id: i64) -> ServiceResult<Option<Order>> {
    let row: Option<OrderDetailRow> = sqlx::query_as(
        "SELECT o.id, o.status, o.warehouse_status, o.pharmacy_status, o.seen_by_admin, \
         o.created_at, o.updated_at, \
         p.id AS pharmacy_id, p.name AS pharmacy_name, p.city AS pharmacy_city, \
         w.id AS warehouse_id, w.name AS warehouse_name, w.city AS warehouse_city \
         FROM orders o \
         JOIN users p ON p.id = o.pharmacy_id \
         JOIN users w ON w.id = o.warehouse_id \
         WHERE o.id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let lines: Vec<OrderLineRow> = sqlx::query_as(
        "SELECT oi.item_id, i.name AS item_name, i.formula, i.caliber, i.price, \
         i.customer_price, c.name AS company_name, oi.quantity, oi.bonus \
         FROM order_items oi \
         JOIN items i ON i.id = oi.item_id \
         LEFT JOIN users c ON c.id = i.company_id \
         WHERE oi.order_id = $1 \
         ORDER BY oi.line_no",
    )
    .bind(id)
    .fetch_all(pool)
    .await?;

    Ok(Some(Order {
        id: row.id,
        pharmacy: PartyRef {
            id: row.pharmacy_id,
            name: row.pharmacy_name,
            city: row.pharmacy_city,
        },
        warehouse: PartyRef {
            id: row.warehouse_id,
            name: row.warehouse_name,
            city: row.warehouse_city,
        },
        items: lines.into_iter().map(OrderLineDetail::from).collect(),
        status: OrderStatus::parse(&row.status).unwrap_or_default(),
        warehouse_status: WarehouseStatus::parse(&row.warehouse_status).unwrap_or_default(),
        pharmacy_status: row.pharmacy_status.as_deref().and_then(PharmacyStatus::parse),
        seen_by_admin: row.seen_by_admin,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}

/// Create an order with its lines in one transaction. Returns the new id.
pub async fn create(pool: &PgPool, order: &OrderCreate) -> ServiceResult<i64> {
    let id = snowflake_id();
    let now = now_millis();

    let line_nos: Vec<i32> = (0..order.items.len() as i32).collect();
    let item_ids: Vec<i64> = order.items.iter().map(|l| l.item).collect();
    let quantities: Vec<i32> = order.items.iter().map(|l| l.quantity).collect();
    let bonuses: Vec<i32> = order.items.iter().map(|l| l.bonus).collect();

    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO orders (id, pharmacy_id, warehouse_id, status, warehouse_status, \
         seen_by_admin, created_at, updated_at) \
         VALUES ($1, $2, $3, 'pending', 'unread', FALSE, $4, $4)",
    )
    .bind(id)
    .bind(order.pharmacy)
    .bind(order.warehouse)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        "INSERT INTO order_items (order_id, line_no, item_id, quantity, bonus) \
         SELECT $1, * FROM UNNEST($2::int[], $3::bigint[], $4::int[], $5::int[])",
    )
    .bind(id)
    .bind(&line_nos)
    .bind(&item_ids)
    .bind(&quantities)
    .bind(&bonuses)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(id)
}

/// COALESCE partial update of the status channels. Returns false when the
/// order does not exist.
pub async fn update_status(
    pool: &PgPool,
    id: i64,
    update: &OrderStatusUpdate,
) -> ServiceResult<bool> {
    let updated: Option<i64> = sqlx::query_scalar(
        "UPDATE orders SET \
             status = COALESCE($2, status), \
             warehouse_status = COALESCE($3, warehouse_status), \
             pharmacy_status = COALESCE($4, pharmacy_status), \
             seen_by_admin = COALESCE($5, seen_by_admin), \
             updated_at = $6 \
         WHERE id = $1 RETURNING id",
    )
    .bind(id)
    .bind(update.status.map(|s| s.as_str()))
    .bind(update.warehouse_status.map(|s| s.as_str()))
    .bind(update.pharmacy_status.map(|s| s.as_str()))
    .bind(update.seen_by_admin)
    .bind(now_millis())
    .fetch_optional(pool)
    .await?;

    Ok(updated.is_some())
}

pub async fn delete(pool: &PgPool, id: i64) -> ServiceResult<bool> {
    let result = sqlx::query("DELETE FROM orders WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Orders the admin has not yet seen.
pub async fn unread_count_admin(pool: &PgPool) -> ServiceResult<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE NOT seen_by_admin")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Orders a warehouse has not yet read.
pub async fn unread_count_warehouse(pool: &PgPool, warehouse_id: i64) -> ServiceResult<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM orders WHERE warehouse_id = $1 AND warehouse_status = 'unread'",
    )
    .bind(warehouse_id)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

/// Admin batch read-flag. Returns how many orders were marked.
pub async fn mark_seen(pool: &PgPool, order_ids: &[i64]) -> ServiceResult<u64> {
    let result = sqlx::query(
        "UPDATE orders SET seen_by_admin = TRUE, updated_at = $2 WHERE id = ANY($1)",
    )
    .bind(order_ids)
    .bind(now_millis())
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// True when the user is a party to any order; used by the user-delete
/// guard.
pub async fn exists_for_user(pool: &PgPool, user_id: i64) -> ServiceResult<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM orders WHERE pharmacy_id = $1 OR warehouse_id = $1)",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}
