//! Order endpoints

use axum::extract::{Extension, Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{OrderCreate, OrderStatusUpdate, Role};
use validator::Validate;

use super::{ApiResult, default_limit, default_page};
use crate::auth::ActingUser;
use crate::db;
use crate::lifecycle;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders).post(create_or_update_order))
        .route("/batch-update", post(batch_update_orders))
        .route("/seen", post(mark_orders_seen))
        .route("/unread-count", get(unread_count))
        .route("/{id}", get(get_order).delete(delete_order))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderListQuery {
    pharmacy_id: Option<i64>,
    warehouse_id: Option<i64>,
    pharmacy_name: Option<String>,
    warehouse_name: Option<String>,
    /// Inclusive lower bound, `YYYY-MM-DD`
    date: Option<String>,
    /// Inclusive upper bound, `YYYY-MM-DD`
    date1: Option<String>,
    #[serde(default = "default_page")]
    page: i64,
    #[serde(default = "default_limit")]
    limit: i64,
}

/// Parse a `YYYY-MM-DD` date to midnight-UTC millis, plus `days` days.
fn date_millis(s: &str, days: i64) -> Result<i64, AppError> {
    let date = chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("invalid date: {s}")))?;
    Ok((date + chrono::Days::new(days as u64))
        .and_hms_opt(0, 0, 0)
        .unwrap_or_default()
        .and_utc()
        .timestamp_millis())
}

async fn list_orders(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Query(query): Query<OrderListQuery>,
) -> ApiResult<Value> {
    actor.require(&[Role::Admin, Role::Pharmacy, Role::Warehouse])?;

    let params = db::orders::OrderListParams {
        pharmacy_id: query.pharmacy_id,
        warehouse_id: query.warehouse_id,
        pharmacy_name: query.pharmacy_name,
        warehouse_name: query.warehouse_name,
        date_from: query.date.as_deref().map(|d| date_millis(d, 0)).transpose()?,
        // Upper bound is inclusive of the whole day
        date_to: query.date1.as_deref().map(|d| date_millis(d, 1)).transpose()?,
        page: query.page.max(1),
        limit: query.limit.clamp(1, 100),
    };

    let (orders, count) = db::orders::list(&state.pool, &params).await?;
    Ok(Json(ApiResponse::with_count(
        count,
        json!({ "orders": orders }),
    )))
}

async fn get_order(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Path(id): Path<i64>,
) -> ApiResult<Value> {
    actor.require(&[Role::Admin, Role::Pharmacy, Role::Warehouse])?;

    let order = db::orders::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;

    Ok(Json(ApiResponse::success(json!({ "order": order }))))
}

#[derive(Debug, Deserialize)]
struct OrderPostQuery {
    /// When present the POST is a status update, not a creation
    id: Option<i64>,
}

async fn create_or_update_order(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Query(query): Query<OrderPostQuery>,
    Json(body): Json<Value>,
) -> ApiResult<Value> {
    match query.id {
        Some(order_id) => {
            actor.require(&[Role::Admin, Role::Pharmacy, Role::Warehouse])?;

            let update: OrderStatusUpdate = serde_json::from_value(body)
                .map_err(|e| AppError::validation(format!("invalid status update: {e}")))?;
            if update.is_empty() {
                return Err(AppError::validation("no status field to update"));
            }

            let order =
                lifecycle::apply_status_update(&state.pool, &state.notifier, order_id, update, actor)
                    .await?;
            Ok(Json(ApiResponse::success(json!({ "order": order }))))
        }
        None => {
            actor.require(&[Role::Admin, Role::Pharmacy])?;

            let create: OrderCreate = serde_json::from_value(body)
                .map_err(|e| AppError::validation(format!("invalid order: {e}")))?;
            create
                .validate()
                .map_err(|e| AppError::validation(e.to_string()))?;

            let id = db::orders::create(&state.pool, &create).await?;
            let order = db::orders::find_by_id(&state.pool, id)
                .await?
                .ok_or_else(|| AppError::new(ErrorCode::OrderNotFound))?;

            Ok(Json(ApiResponse::success(json!({ "order": order }))))
        }
    }
}

#[derive(Debug, Deserialize)]
struct BatchUpdateRequest {
    ids: Vec<i64>,
    #[serde(flatten)]
    update: OrderStatusUpdate,
}

/// Apply one status update to many orders. Per-order failures are logged
/// and skipped; the response lists the ids that were updated.
async fn batch_update_orders(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Json(request): Json<BatchUpdateRequest>,
) -> ApiResult<Value> {
    actor.require(&[Role::Admin, Role::Pharmacy, Role::Warehouse])?;

    if request.ids.is_empty() {
        return Err(AppError::validation("no order ids given"));
    }
    if request.update.is_empty() {
        return Err(AppError::validation("no status field to update"));
    }

    let updated = lifecycle::apply_status_update_batch(
        &state.pool,
        &state.notifier,
        &request.ids,
        request.update,
        actor,
    )
    .await;

    Ok(Json(ApiResponse::success(json!({ "updated": updated }))))
}

#[derive(Debug, Deserialize)]
struct MarkSeenRequest {
    ids: Vec<i64>,
}

async fn mark_orders_seen(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Json(request): Json<MarkSeenRequest>,
) -> ApiResult<Value> {
    actor.require(&[Role::Admin])?;

    let marked = db::orders::mark_seen(&state.pool, &request.ids).await?;
    Ok(Json(ApiResponse::success(json!({ "marked": marked }))))
}

async fn unread_count(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
) -> ApiResult<Value> {
    let count = match actor.role {
        Role::Admin => db::orders::unread_count_admin(&state.pool).await?,
        Role::Warehouse => db::orders::unread_count_warehouse(&state.pool, actor.id).await?,
        _ => {
            return Err(AppError::permission_denied(
                "unread count is only available to admins and warehouses",
            ));
        }
    };

    Ok(Json(ApiResponse::success(json!({ "count": count }))))
}

async fn delete_order(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    actor.require(&[Role::Admin])?;

    if !db::orders::delete(&state.pool, id).await? {
        return Err(AppError::new(ErrorCode::OrderNotFound));
    }
    Ok(Json(ApiResponse::ok()))
}
