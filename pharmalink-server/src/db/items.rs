//! Catalog item queries
//!
//! Items carry a child table of per-warehouse stocking rows; list and
//! detail reads load the children in one query and group them in memory
//! rather than joining a row per stocking relationship.

use std::collections::HashMap;

use shared::models::{Item, ItemCreate, ItemUpdate, ItemWarehouse, PartyRef};
use shared::util::{now_millis, snowflake_id};
use sqlx::PgPool;

use super::filter::{Bind, Filter};
use crate::error::ServiceResult;

#[derive(sqlx::FromRow)]
struct ItemRow {
    id: i64,
    name: String,
    caliber: String,
    formula: String,
    indication: String,
    composition: String,
    packing: String,
    price: f64,
    customer_price: f64,
    logo_url: String,
    is_active: bool,
    created_at: i64,
    updated_at: i64,
    company_id: Option<i64>,
    company_name: Option<String>,
    company_city: Option<String>,
}

impl ItemRow {
    fn into_item(self, warehouses: Vec<ItemWarehouse>) -> Item {
        let company = match (self.company_id, self.company_name, self.company_city) {
            (Some(id), Some(name), Some(city)) => Some(PartyRef { id, name, city }),
            _ => None,
        };
        Item {
            id: self.id,
            name: self.name,
            company,
            caliber: self.caliber,
            formula: self.formula,
            indication: self.indication,
            composition: self.composition,
            packing: self.packing,
            price: self.price,
            customer_price: self.customer_price,
            logo_url: self.logo_url,
            is_active: self.is_active,
            warehouses,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ItemWarehouseRow {
    item_id: i64,
    warehouse_id: i64,
    warehouse_name: String,
    warehouse_city: String,
    max_qty: i32,
    offer: String,
    points: i32,
}

impl From<ItemWarehouseRow> for ItemWarehouse {
    fn from(r: ItemWarehouseRow) -> Self {
        ItemWarehouse {
            warehouse: PartyRef {
                id: r.warehouse_id,
                name: r.warehouse_name,
                city: r.warehouse_city,
            },
            max_qty: r.max_qty,
            offer: r.offer,
            points: r.points,
        }
    }
}

const ITEM_SELECT: &str = "SELECT i.id, i.name, i.caliber, i.formula, i.indication, \
     i.composition, i.packing, i.price, i.customer_price, i.logo_url, i.is_active, \
     i.created_at, i.updated_at, \
     c.id AS company_id, c.name AS company_name, c.city AS company_city \
     FROM items i \
     LEFT JOIN users c ON c.id = i.company_id";

/// Load stocking rows for a set of items, grouped by item id.
async fn warehouses_for(
    pool: &PgPool,
    item_ids: &[i64],
) -> ServiceResult<HashMap<i64, Vec<ItemWarehouse>>> {
    if item_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<ItemWarehouseRow> = sqlx::query_as(
        "SELECT iw.item_id, w.id AS warehouse_id, w.name AS warehouse_name, \
         w.city AS warehouse_city, iw.max_qty, iw.offer, iw.points \
         FROM item_warehouses iw \
         JOIN users w ON w.id = iw.warehouse_id \
         WHERE iw.item_id = ANY($1) \
         ORDER BY w.name",
    )
    .bind(item_ids)
    .fetch_all(pool)
    .await?;

    let mut grouped: HashMap<i64, Vec<ItemWarehouse>> = HashMap::new();
    for row in rows {
        grouped
            .entry(row.item_id)
            .or_default()
            .push(ItemWarehouse::from(row));
    }
    Ok(grouped)
}

async fn hydrate(pool: &PgPool, rows: Vec<ItemRow>) -> ServiceResult<Vec<Item>> {
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let mut warehouses = warehouses_for(pool, &ids).await?;
    Ok(rows
        .into_iter()
        .map(|r| {
            let w = warehouses.remove(&r.id).unwrap_or_default();
            r.into_item(w)
        })
        .collect())
}

/// Conjunctive list filters; all optional.
#[derive(Debug, Default)]
pub struct ItemListParams {
    pub company_id: Option<i64>,
    pub warehouse_id: Option<i64>,
    pub item_name: Option<String>,
    pub company_name: Option<String>,
    pub warehouse_name: Option<String>,
    pub is_active: Option<bool>,
    /// Only items stocked by this warehouse
    pub in_warehouse: Option<i64>,
    /// Only items not stocked by this warehouse
    pub out_warehouse: Option<i64>,
    pub page: i64,
    pub limit: i64,
}

fn list_filter(params: &ItemListParams) -> Filter {
    let mut f = Filter::new();
    f.eq_i64("i.company_id", params.company_id);
    if let Some(id) = params.warehouse_id {
        f.push(
            "EXISTS (SELECT 1 FROM item_warehouses iw WHERE iw.item_id = i.id AND iw.warehouse_id = $?)",
            vec![Bind::Int(id)],
        );
    }
    f.ilike("i.name", params.item_name.as_deref());
    f.ilike("c.name", params.company_name.as_deref());
    if let Some(name) = &params.warehouse_name {
        f.push(
            "EXISTS (SELECT 1 FROM item_warehouses iw JOIN users w ON w.id = iw.warehouse_id \
             WHERE iw.item_id = i.id AND w.name ILIKE $?)",
            vec![Bind::Text(format!("%{name}%"))],
        );
    }
    f.eq_bool("i.is_active", params.is_active);
    if let Some(id) = params.in_warehouse {
        f.push(
            "EXISTS (SELECT 1 FROM item_warehouses iw WHERE iw.item_id = i.id AND iw.warehouse_id = $?)",
            vec![Bind::Int(id)],
        );
    }
    if let Some(id) = params.out_warehouse {
        f.push(
            "NOT EXISTS (SELECT 1 FROM item_warehouses iw WHERE iw.item_id = i.id AND iw.warehouse_id = $?)",
            vec![Bind::Int(id)],
        );
    }
    f
}

/// Paginated item list plus the total count under the same filter.
pub async fn list(pool: &PgPool, params: &ItemListParams) -> ServiceResult<(Vec<Item>, i64)> {
    let filter = list_filter(params);
    let n = filter.arg_count();

    let sql = format!(
        "{ITEM_SELECT}{} ORDER BY i.name LIMIT ${} OFFSET ${}",
        filter.where_clause(),
        n + 1,
        n + 2
    );
    let rows: Vec<ItemRow> = filter
        .bind_query_as(sqlx::query_as(&sql))
        .bind(params.limit)
        .bind((params.page - 1) * params.limit)
        .fetch_all(pool)
        .await?;

    let count_sql = format!(
        "SELECT COUNT(*) FROM items i LEFT JOIN users c ON c.id = i.company_id{}",
        filter.where_clause()
    );
    let count: i64 = filter
        .bind_query_scalar(sqlx::query_scalar(&count_sql))
        .fetch_one(pool)
        .await?;

    Ok((hydrate(pool, rows).await?, count))
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> ServiceResult<Option<Item>> {
    let row: Option<ItemRow> = sqlx::query_as(&format!("{ITEM_SELECT} WHERE i.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => Ok(hydrate(pool, vec![row]).await?.into_iter().next()),
        None => Ok(None),
    }
}

/// Load several items preserving the order of the requested ids; missing
/// ids are skipped.
pub async fn find_by_ids(pool: &PgPool, ids: &[i64]) -> ServiceResult<Vec<Item>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows: Vec<ItemRow> = sqlx::query_as(&format!("{ITEM_SELECT} WHERE i.id = ANY($1)"))
        .bind(ids)
        .fetch_all(pool)
        .await?;

    let mut items = hydrate(pool, rows).await?;
    let position: HashMap<i64, usize> = ids.iter().enumerate().map(|(n, &id)| (id, n)).collect();
    items.sort_by_key(|item| position.get(&item.id).copied().unwrap_or(usize::MAX));
    Ok(items)
}

pub async fn create(pool: &PgPool, item: &ItemCreate) -> ServiceResult<i64> {
    let id = snowflake_id();
    let now = now_millis();

    sqlx::query(
        "INSERT INTO items (id, name, company_id, caliber, formula, indication, composition, \
         packing, price, customer_price, logo_url, is_active, created_at, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $13)",
    )
    .bind(id)
    .bind(&item.name)
    .bind(item.company)
    .bind(&item.caliber)
    .bind(&item.formula)
    .bind(&item.indication)
    .bind(&item.composition)
    .bind(&item.packing)
    .bind(item.price)
    .bind(item.customer_price)
    .bind(&item.logo_url)
    .bind(item.is_active)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(id)
}

/// Partial update via COALESCE. Returns false when the item does not
/// exist.
pub async fn update(pool: &PgPool, id: i64, update: &ItemUpdate) -> ServiceResult<bool> {
    let updated: Option<i64> = sqlx::query_scalar(
        "UPDATE items SET \
             name = COALESCE($2, name), \
             caliber = COALESCE($3, caliber), \
             formula = COALESCE($4, formula), \
             indication = COALESCE($5, indication), \
             composition = COALESCE($6, composition), \
             packing = COALESCE($7, packing), \
             price = COALESCE($8, price), \
             customer_price = COALESCE($9, customer_price), \
             logo_url = COALESCE($10, logo_url), \
             is_active = COALESCE($11, is_active), \
             updated_at = $12 \
         WHERE id = $1 RETURNING id",
    )
    .bind(id)
    .bind(update.name.as_deref())
    .bind(update.caliber.as_deref())
    .bind(update.formula.as_deref())
    .bind(update.indication.as_deref())
    .bind(update.composition.as_deref())
    .bind(update.packing.as_deref())
    .bind(update.price)
    .bind(update.customer_price)
    .bind(update.logo_url.as_deref())
    .bind(update.is_active)
    .bind(now_millis())
    .fetch_optional(pool)
    .await?;

    Ok(updated.is_some())
}

pub async fn set_active(pool: &PgPool, id: i64, is_active: bool) -> ServiceResult<bool> {
    let result = sqlx::query("UPDATE items SET is_active = $2, updated_at = $3 WHERE id = $1")
        .bind(id)
        .bind(is_active)
        .bind(now_millis())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Stock an item at a warehouse. Re-adding an existing relationship
/// refreshes its max quantity.
pub async fn add_warehouse(
    pool: &PgPool,
    item_id: i64,
    warehouse_id: i64,
    max_qty: i32,
) -> ServiceResult<()> {
    sqlx::query(
        "INSERT INTO item_warehouses (item_id, warehouse_id, max_qty, offer, points) \
         VALUES ($1, $2, $3, '', 0) \
         ON CONFLICT (item_id, warehouse_id) DO UPDATE SET max_qty = EXCLUDED.max_qty",
    )
    .bind(item_id)
    .bind(warehouse_id)
    .bind(max_qty)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn remove_warehouse(
    pool: &PgPool,
    item_id: i64,
    warehouse_id: i64,
) -> ServiceResult<bool> {
    let result =
        sqlx::query("DELETE FROM item_warehouses WHERE item_id = $1 AND warehouse_id = $2")
            .bind(item_id)
            .bind(warehouse_id)
            .execute(pool)
            .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn set_max_qty(
    pool: &PgPool,
    item_id: i64,
    warehouse_id: i64,
    max_qty: i32,
) -> ServiceResult<bool> {
    let result = sqlx::query(
        "UPDATE item_warehouses SET max_qty = $3 WHERE item_id = $1 AND warehouse_id = $2",
    )
    .bind(item_id)
    .bind(warehouse_id)
    .bind(max_qty)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Set or clear (empty string) the offer label on one stocking row.
pub async fn set_offer(
    pool: &PgPool,
    item_id: i64,
    warehouse_id: i64,
    offer: &str,
) -> ServiceResult<bool> {
    let result = sqlx::query(
        "UPDATE item_warehouses SET offer = $3 WHERE item_id = $1 AND warehouse_id = $2",
    )
    .bind(item_id)
    .bind(warehouse_id)
    .bind(offer)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Set or clear (zero) the loyalty points on one stocking row.
pub async fn set_points(
    pool: &PgPool,
    item_id: i64,
    warehouse_id: i64,
    points: i32,
) -> ServiceResult<bool> {
    let result = sqlx::query(
        "UPDATE item_warehouses SET points = $3 WHERE item_id = $1 AND warehouse_id = $2",
    )
    .bind(item_id)
    .bind(warehouse_id)
    .bind(points)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Active items with a running offer at any warehouse.
pub async fn with_offer(pool: &PgPool) -> ServiceResult<Vec<Item>> {
    let rows: Vec<ItemRow> = sqlx::query_as(&format!(
        "{ITEM_SELECT} WHERE i.is_active AND EXISTS \
         (SELECT 1 FROM item_warehouses iw WHERE iw.item_id = i.id AND iw.offer <> '') \
         ORDER BY i.name"
    ))
    .fetch_all(pool)
    .await?;
    hydrate(pool, rows).await
}

/// Active items granting loyalty points at any warehouse.
pub async fn with_points(pool: &PgPool) -> ServiceResult<Vec<Item>> {
    let rows: Vec<ItemRow> = sqlx::query_as(&format!(
        "{ITEM_SELECT} WHERE i.is_active AND EXISTS \
         (SELECT 1 FROM item_warehouses iw WHERE iw.item_id = i.id AND iw.points > 0) \
         ORDER BY i.name"
    ))
    .fetch_all(pool)
    .await?;
    hydrate(pool, rows).await
}

/// True when the user owns items or stocks any; used by the user-delete
/// guard.
pub async fn exists_for_user(pool: &PgPool, user_id: i64) -> ServiceResult<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM items WHERE company_id = $1) \
         OR EXISTS (SELECT 1 FROM item_warehouses WHERE warehouse_id = $1)",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}
