//! User endpoints

use axum::extract::{Extension, Path, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{Value, json};
use shared::error::{ApiResponse, AppError, ErrorCode};
use shared::models::{Role, UserUpdate};

use super::{ApiResult, default_limit, default_page};
use crate::auth::ActingUser;
use crate::db;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/me", get(get_me).post(update_me))
        .route("/companies", get(list_companies))
        .route("/warehouses", get(list_warehouses))
        .route("/push-token", post(add_push_token).delete(remove_push_token))
        .route("/points", post(add_points))
        .route("/points/me", get(my_points))
        .route(
            "/our-companies",
            post(add_our_company).delete(remove_our_company),
        )
        .route("/{id}", get(get_user).post(update_user).delete(delete_user))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserListQuery {
    #[serde(rename = "type")]
    user_type: Option<String>,
    name: Option<String>,
    mobile: Option<String>,
    city: Option<String>,
    address_details: Option<String>,
    is_active: Option<bool>,
    in_section_one: Option<bool>,
    in_section_two: Option<bool>,
    allow_showing_medicines: Option<bool>,
    #[serde(default = "default_page")]
    page: i64,
    #[serde(default = "default_limit")]
    limit: i64,
}

async fn list_users(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Query(query): Query<UserListQuery>,
) -> ApiResult<Value> {
    actor.require(&[Role::Admin])?;

    let params = db::users::UserListParams {
        user_type: query.user_type,
        name: query.name,
        mobile: query.mobile,
        city: query.city,
        address_details: query.address_details,
        is_active: query.is_active,
        in_section_one: query.in_section_one,
        in_section_two: query.in_section_two,
        allow_showing_medicines: query.allow_showing_medicines,
        page: query.page.max(1),
        limit: query.limit.clamp(1, 100),
    };

    let (users, count) = db::users::list(&state.pool, &params).await?;
    Ok(Json(ApiResponse::with_count(
        count,
        json!({ "users": users }),
    )))
}

async fn get_me(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
) -> ApiResult<Value> {
    let user = db::users::find_by_id(&state.pool, actor.id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    Ok(Json(ApiResponse::success(json!({ "user": user }))))
}

async fn update_me(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Json(mut update): Json<UserUpdate>,
) -> ApiResult<Value> {
    // Privileged fields are admin-only even on the self route.
    update.is_active = None;
    update.allow_admin = None;
    update.points = None;

    let user = db::users::update(&state.pool, actor.id, &update)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    Ok(Json(ApiResponse::success(json!({ "user": user }))))
}

async fn get_user(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Path(id): Path<i64>,
) -> ApiResult<Value> {
    if actor.id != id {
        actor.require(&[Role::Admin])?;
    }

    let user = db::users::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    Ok(Json(ApiResponse::success(json!({ "user": user }))))
}

async fn update_user(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Path(id): Path<i64>,
    Json(update): Json<UserUpdate>,
) -> ApiResult<Value> {
    actor.require(&[Role::Admin])?;

    let user = db::users::update(&state.pool, id, &update)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    Ok(Json(ApiResponse::success(json!({ "user": user }))))
}

/// Deleting a user is blocked while any order, item, basket, saved item or
/// favorite still references them.
async fn delete_user(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Path(id): Path<i64>,
) -> ApiResult<()> {
    actor.require(&[Role::Admin])?;

    let linked = db::orders::exists_for_user(&state.pool, id).await?
        || db::items::exists_for_user(&state.pool, id).await?
        || db::baskets::exists_for_user(&state.pool, id).await?
        || db::saved_items::exists_for_user(&state.pool, id).await?
        || db::favorites::exists_for_user(&state.pool, id).await?;
    if linked {
        return Err(AppError::new(ErrorCode::UserHasLinkedRecords));
    }

    if !db::users::delete(&state.pool, id).await? {
        return Err(AppError::new(ErrorCode::UserNotFound));
    }
    Ok(Json(ApiResponse::ok()))
}

async fn list_companies(
    State(state): State<AppState>,
    Extension(_actor): Extension<ActingUser>,
) -> ApiResult<Value> {
    let companies = db::users::companies(&state.pool).await?;
    Ok(Json(ApiResponse::with_count(
        companies.len() as i64,
        json!({ "users": companies }),
    )))
}

/// Non-admin callers only see warehouses in their own city.
async fn list_warehouses(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
) -> ApiResult<Value> {
    let city = if actor.is_admin() {
        None
    } else {
        let me = db::users::find_by_id(&state.pool, actor.id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
        Some(me.city)
    };

    let warehouses = db::users::warehouses(&state.pool, city.as_deref()).await?;
    Ok(Json(ApiResponse::with_count(
        warehouses.len() as i64,
        json!({ "users": warehouses }),
    )))
}

#[derive(Debug, Deserialize)]
struct PushTokenRequest {
    token: String,
}

async fn add_push_token(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Json(request): Json<PushTokenRequest>,
) -> ApiResult<()> {
    if request.token.is_empty() {
        return Err(AppError::validation("push token must not be empty"));
    }
    // Token already registered is not an error; a missing user is.
    if !db::users::add_push_token(&state.pool, actor.id, &request.token).await? {
        return Err(AppError::new(ErrorCode::UserNotFound));
    }
    Ok(Json(ApiResponse::ok()))
}

async fn remove_push_token(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Json(request): Json<PushTokenRequest>,
) -> ApiResult<()> {
    if !db::users::remove_push_token(&state.pool, actor.id, &request.token).await? {
        return Err(AppError::new(ErrorCode::UserNotFound));
    }
    Ok(Json(ApiResponse::ok()))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddPointsRequest {
    user_id: i64,
    points: i64,
}

async fn add_points(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Json(request): Json<AddPointsRequest>,
) -> ApiResult<Value> {
    actor.require(&[Role::Admin])?;

    let points = db::users::add_points(&state.pool, request.user_id, request.points)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    Ok(Json(ApiResponse::success(json!({ "points": points }))))
}

async fn my_points(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
) -> ApiResult<Value> {
    let points = db::users::points(&state.pool, actor.id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::UserNotFound))?;
    Ok(Json(ApiResponse::success(json!({ "points": points }))))
}

#[derive(Debug, Deserialize)]
struct OurCompanyRequest {
    company: i64,
}

async fn add_our_company(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Json(request): Json<OurCompanyRequest>,
) -> ApiResult<()> {
    actor.require(&[Role::Admin, Role::Warehouse])?;

    if !db::users::add_our_company(&state.pool, actor.id, request.company).await? {
        return Err(AppError::new(ErrorCode::UserNotFound));
    }
    Ok(Json(ApiResponse::ok()))
}

async fn remove_our_company(
    State(state): State<AppState>,
    Extension(actor): Extension<ActingUser>,
    Json(request): Json<OurCompanyRequest>,
) -> ApiResult<()> {
    actor.require(&[Role::Admin, Role::Warehouse])?;

    if !db::users::remove_our_company(&state.pool, actor.id, request.company).await? {
        return Err(AppError::new(ErrorCode::UserNotFound));
    }
    Ok(Json(ApiResponse::ok()))
}
