//! Catalog item endpoints
//!
//! Stocking mutations act on the caller's own warehouse; admins name the
//! warehouse explicitly in the body.

use axum::extract::{Extension, Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{ItemCreate, ItemUpdate, Role};
use validator::Validate;

use super::{ApiResult, default_limit, default_page};
use crate::auth::ActingUser;
use crate::db;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route("/with-offer", get(items_with_offer))
        .route("/with-points", get(items_with_points))
        .route("/{id}", get(get_item).post(update_item))
        .route("/{id}/active", post(set_item_active))
        .route(
            "/{id}/warehouse",
            post(add_item_warehouse).delete(remove_item_warehouse),
        )
        .route("/{id}/warehouse/max-qty", post(set_warehouse_max_qty))
        .route("/{id}/warehouse/offer", post(set_warehouse_offer))
        .route("/{id}/warehouse/points", post(set_warehouse_points))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemListQuery {
    company_id: Option<i64>,
    warehouse_id: Option<i64>,
    item_name: Option<String>,
    company_name: Option<String>,
    warehouse_name: Option<String>,
    is_active: Option<bool>,
    in_warehouse: Option<i64>,
    out_warehouse: Option<i64>,
    #[serde(default = "default_page")]
    page: i64,
    #[serde(default = "default_limit")]
    limit: i64,
}

async fn list_items(
    State(state): State<AppState>,
    Extension(_actor): Extension<ActingUser>,
    Query(query): Query<ItemListQuery>,
) -> ApiResult<Value> {
    let params = db::items::ItemListParams {
        company_id: query.company_id,
        warehouse_id: query.warehouse_id,
        item_name: query.item_name,
        company_name: query.company_name,
        warehouse_name: query.warehouse_name,
        is_active: query.is_active,
        in_warehouse: query.in_warehouse,
        out_warehouse: query.out_warehouse,
        page: query.page.max(1),
        limit: query.limit.clamp(1, 100),
    };

    let (items, count) = db::items::list(&state.pool, &params).await?;
    Ok(Json(ApiResponse::with_count(
        count,
        json!({ "items": items }),
    )))
}

async fn get_item(
    State(state): State<AppState>,
    Extension(_actor): Extension<ActingUser>,
    Path(id): Path<i64>,
) -> ApiResult<Value> {
    let item = db::items::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ItemNotFound))?;
    Ok(Json(ApiResponse::success(json!({ "item": item }))))
}

async fn create_item(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Json(create): Json<ItemCreate>,
) -> ApiResult<Value> {
    actor.require(&[Role::Admin, Role::Company])?;
    create
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let id = db::items::create(&state.pool, &create).await?;
    let item = db::items::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ItemNotFound))?;

    Ok(Json(ApiResponse::success(json!({ "item": item }))))
}

async fn update_item(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Path(id): Path<i64>,
    Json(update): Json<ItemUpdate>,
) -> ApiResult<Value> {
    actor.require(&[Role::Admin, Role::Company])?;

    if !db::items::update(&state.pool, id, &update).await? {
        return Err(AppError::new(ErrorCode::ItemNotFound));
    }
    let item = db::items::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ItemNotFound))?;

    Ok(Json(ApiResponse::success(json!({ "item": item }))))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SetActiveRequest {
    is_active: bool,
}

async fn set_item_active(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Path(id): Path<i64>,
    Json(request): Json<SetActiveRequest>,
) -> ApiResult<()> {
    actor.require(&[Role::Admin, Role::Company])?;

    if !db::items::set_active(&state.pool, id, request.is_active).await? {
        return Err(AppError::new(ErrorCode::ItemNotFound));
    }
    Ok(Json(ApiResponse::ok()))
}

/// Resolve the warehouse a stocking mutation targets: warehouses act on
/// themselves, admins name one.
fn target_warehouse(actor: ActingUser, warehouse: Option<i64>) -> Result<i64, AppError> {
    match actor.role {
        Role::Warehouse => Ok(actor.id),
        Role::Admin => {
            warehouse.ok_or_else(|| AppError::validation("warehouse is required for admins"))
        }
        _ => Err(AppError::permission_denied(
            "only warehouses and admins manage stocking",
        )),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddWarehouseRequest {
    warehouse: Option<i64>,
    #[serde(default)]
    max_qty: i32,
}

async fn add_item_warehouse(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Path(id): Path<i64>,
    Json(request): Json<AddWarehouseRequest>,
) -> ApiResult<()> {
    let warehouse_id = target_warehouse(actor, request.warehouse)?;

    db::items::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ItemNotFound))?;

    db::items::add_warehouse(&state.pool, id, warehouse_id, request.max_qty).await?;
    Ok(Json(ApiResponse::ok()))
}

#[derive(Debug, Deserialize)]
struct WarehouseRequest {
    warehouse: Option<i64>,
}

async fn remove_item_warehouse(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Path(id): Path<i64>,
    Json(request): Json<WarehouseRequest>,
) -> ApiResult<()> {
    let warehouse_id = target_warehouse(actor, request.warehouse)?;

    if !db::items::remove_warehouse(&state.pool, id, warehouse_id).await? {
        return Err(AppError::not_found("Stocking relationship"));
    }
    Ok(Json(ApiResponse::ok()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MaxQtyRequest {
    warehouse: Option<i64>,
    max_qty: i32,
}

async fn set_warehouse_max_qty(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Path(id): Path<i64>,
    Json(request): Json<MaxQtyRequest>,
) -> ApiResult<()> {
    let warehouse_id = target_warehouse(actor, request.warehouse)?;

    if !db::items::set_max_qty(&state.pool, id, warehouse_id, request.max_qty).await? {
        return Err(AppError::not_found("Stocking relationship"));
    }
    Ok(Json(ApiResponse::ok()))
}

#[derive(Debug, Deserialize)]
struct OfferRequest {
    warehouse: Option<i64>,
    /// Empty string clears the offer
    #[serde(default)]
    offer: String,
}

async fn set_warehouse_offer(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Path(id): Path<i64>,
    Json(request): Json<OfferRequest>,
) -> ApiResult<()> {
    let warehouse_id = target_warehouse(actor, request.warehouse)?;

    if !db::items::set_offer(&state.pool, id, warehouse_id, &request.offer).await? {
        return Err(AppError::not_found("Stocking relationship"));
    }
    Ok(Json(ApiResponse::ok()))
}

#[derive(Debug, Deserialize)]
struct PointsRequest {
    warehouse: Option<i64>,
    /// Zero clears the points
    #[serde(default)]
    points: i32,
}

async fn set_warehouse_points(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Path(id): Path<i64>,
    Json(request): Json<PointsRequest>,
) -> ApiResult<()> {
    let warehouse_id = target_warehouse(actor, request.warehouse)?;

    if !db::items::set_points(&state.pool, id, warehouse_id, request.points).await? {
        return Err(AppError::not_found("Stocking relationship"));
    }
    Ok(Json(ApiResponse::ok()))
}

async fn items_with_offer(
    State(state): State<AppState>,
    Extension(_actor): Extension<ActingUser>,
) -> ApiResult<Value> {
    let items = db::items::with_offer(&state.pool).await?;
    Ok(Json(ApiResponse::with_count(
        items.len() as i64,
        json!({ "items": items }),
    )))
}

async fn items_with_points(
    State(state): State<AppState>,
    Extension(_actor): Extension<ActingUser>,
) -> ApiResult<Value> {
    let items = db::items::with_points(&state.pool).await?;
    Ok(Json(ApiResponse::with_count(
        items.len() as i64,
        json!({ "items": items }),
    )))
}
