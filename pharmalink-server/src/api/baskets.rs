//! Basket endpoints
//!
//! Pharmacies own their baskets; warehouses see the baskets staged against
//! them; admins see everything.

use axum::extract::{Extension, Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{Basket, BasketCreate, BasketUpdate, Role};
use validator::Validate;

use super::ApiResult;
use crate::auth::ActingUser;
use crate::db;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_baskets).post(create_basket))
        .route("/{id}", post(update_basket).delete(delete_basket))
}

async fn list_baskets(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
) -> ApiResult<Value> {
    let (pharmacy_id, warehouse_id) = match actor.role {
        Role::Admin => (None, None),
        Role::Pharmacy => (Some(actor.id), None),
        Role::Warehouse => (None, Some(actor.id)),
        _ => {
            return Err(AppError::permission_denied(
                "baskets are only available to pharmacies, warehouses and admins",
            ));
        }
    };

    let baskets = db::baskets::list(&state.pool, pharmacy_id, warehouse_id).await?;
    Ok(Json(ApiResponse::with_count(
        baskets.len() as i64,
        json!({ "baskets": baskets }),
    )))
}

async fn create_basket(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Json(create): Json<BasketCreate>,
) -> ApiResult<Value> {
    actor.require(&[Role::Pharmacy])?;
    create
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let id = db::baskets::create(&state.pool, actor.id, &create).await?;
    let basket = db::baskets::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::BasketNotFound))?;

    Ok(Json(ApiResponse::success(json!({ "basket": basket }))))
}

/// Load a basket and check the actor may touch it.
async fn owned_basket(state: &AppState, actor: ActingUser, id: i64) -> Result<Basket, AppError> {
    let basket = db::baskets::find_by_id(&state.pool, id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::new(ErrorCode::BasketNotFound))?;

    if !actor.is_admin() && basket.pharmacy.id != actor.id {
        return Err(AppError::permission_denied("this basket belongs to another pharmacy"));
    }
    Ok(basket)
}

async fn update_basket(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Path(id): Path<i64>,
    Json(update): Json<BasketUpdate>,
) -> ApiResult<Value> {
    actor.require(&[Role::Admin, Role::Pharmacy])?;
    update
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    owned_basket(&state, actor, id).await?;

    if !db::baskets::replace_lines(&state.pool, id, &update.items).await? {
        return Err(AppError::new(ErrorCode::BasketNotFound));
    }
    let basket = db::baskets::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::BasketNotFound))?;

    Ok(Json(ApiResponse::success(json!({ "basket": basket }))))
}

async fn delete_basket(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    actor.require(&[Role::Admin, Role::Pharmacy])?;

    owned_basket(&state, actor, id).await?;

    if !db::baskets::delete(&state.pool, id).await? {
        return Err(AppError::new(ErrorCode::BasketNotFound));
    }
    Ok(Json(ApiResponse::ok()))
}
