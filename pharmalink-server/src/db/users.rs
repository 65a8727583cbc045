//! User queries
//!
//! Push-token and our-companies mutations use guarded `array_append` /
//! `array_remove` so concurrent token registrations from several devices
//! cannot clobber each other.

use shared::models::{PartyRef, Role, User, UserSummary, UserUpdate};
use sqlx::PgPool;

use super::filter::Filter;
use crate::error::ServiceResult;

const USER_COLUMNS: &str = "id, name, username, user_type, logo_url, is_active, mobile, phone, \
     email, city, address_details, employee_name, certificate_name, allow_admin, \
     allow_showing_medicines, in_section_one, in_section_two, expo_push_tokens, our_companies, \
     cost_of_deliver, invoice_min_total, fast_deliver, pay_at_deliver, include_in_point_system, \
     point_for_amount, amount_to_get_point, points, created_at, updated_at";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: String,
    username: String,
    user_type: String,
    logo_url: String,
    is_active: bool,
    mobile: Vec<String>,
    phone: Vec<String>,
    email: Vec<String>,
    city: String,
    address_details: String,
    employee_name: Option<String>,
    certificate_name: Option<String>,
    allow_admin: bool,
    allow_showing_medicines: bool,
    in_section_one: bool,
    in_section_two: bool,
    expo_push_tokens: Vec<String>,
    our_companies: Vec<i64>,
    cost_of_deliver: f64,
    invoice_min_total: f64,
    fast_deliver: bool,
    pay_at_deliver: bool,
    include_in_point_system: bool,
    point_for_amount: f64,
    amount_to_get_point: f64,
    points: i64,
    created_at: i64,
    updated_at: i64,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        User {
            id: r.id,
            name: r.name,
            username: r.username,
            user_type: Role::parse(&r.user_type).unwrap_or(Role::Normal),
            logo_url: r.logo_url,
            is_active: r.is_active,
            mobile: r.mobile,
            phone: r.phone,
            email: r.email,
            city: r.city,
            address_details: r.address_details,
            employee_name: r.employee_name,
            certificate_name: r.certificate_name,
            allow_admin: r.allow_admin,
            allow_showing_medicines: r.allow_showing_medicines,
            in_section_one: r.in_section_one,
            in_section_two: r.in_section_two,
            expo_push_tokens: r.expo_push_tokens,
            our_companies: r.our_companies,
            cost_of_deliver: r.cost_of_deliver,
            invoice_min_total: r.invoice_min_total,
            fast_deliver: r.fast_deliver,
            pay_at_deliver: r.pay_at_deliver,
            include_in_point_system: r.include_in_point_system,
            point_for_amount: r.point_for_amount,
            amount_to_get_point: r.amount_to_get_point,
            points: r.points,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl From<UserRow> for UserSummary {
    fn from(r: UserRow) -> Self {
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

/// Conjunctive list filters; all optional.
#[derive(Debug, Default)]
pub struct UserListParams {
    pub user_type: Option<String>,
    pub name: Option<String>,
    pub mobile: Option<String>,
    pub city: Option<String>,
    pub address_details: Option<String>,
    pub is_active: Option<bool>,
    pub in_section_one: Option<bool>,
    pub in_section_two: Option<bool>,
    pub allow_showing_medicines: Option<bool>,
    pub page: i64,
    pub limit: i64,
}

fn list_filter(params: &UserListParams) -> Filter {
    let mut f = Filter::new();
    f.eq_text("user_type", params.user_type.as_deref());
    f.ilike("name", params.name.as_deref());
    if let Some(mobile) = &params.mobile {
        f.push(
            "$? = ANY(mobile)",
            vec![super::filter::Bind::Text(mobile.clone())],
        );
    }
    f.ilike("city", params.city.as_deref());
    f.ilike("address_details", params.address_details.as_deref());
    f.eq_bool("is_active", params.is_active);
    f.eq_bool("in_section_one", params.in_section_one);
    f.eq_bool("in_section_two", params.in_section_two);
    f.eq_bool("allow_showing_medicines", params.allow_showing_medicines);
    f
}

/// Paginated user list plus the total count under the same filter.
pub async fn list(pool: &PgPool, params: &UserListParams) -> ServiceResult<(Vec<UserSummary>, i64)> {
    let filter = list_filter(params);
    let n = filter.arg_count();

    let sql = format!(
        "SELECT {USER_COLUMNS} FROM users{} ORDER BY name LIMIT ${} OFFSET ${}",
        filter.where_clause(),
        n + 1,
        n + 2
    );
    let rows: Vec<UserRow> = filter
        .bind_query_as(sqlx::query_as(&sql))
        .bind(params.limit)
        .bind((params.page - 1) * params.limit)
        .fetch_all(pool)
        .await?;

    let count_sql = format!("SELECT COUNT(*) FROM users{}", filter.where_clause());
    let count: i64 = filter
        .bind_query_scalar(sqlx::query_scalar(&count_sql))
        .fetch_one(pool)
        .await?;

    Ok((rows.into_iter().map(UserSummary::from).collect(), count))
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> ServiceResult<Option<User>> {
    let row: Option<UserRow> =
        sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(User::from))
}

/// Partial update via COALESCE; only whitelisted fields can change.
pub async fn update(pool: &PgPool, id: i64, update: &UserUpdate) -> ServiceResult<Option<User>> {
    let sql = format!(
        "UPDATE users SET \
             name = COALESCE($2, name), \
             logo_url = COALESCE($3, logo_url), \
             phone = COALESCE($4, phone), \
             mobile = COALESCE($5, mobile), \
             email = COALESCE($6, email), \
             city = COALESCE($7, city), \
             address_details = COALESCE($8, address_details), \
             employee_name = COALESCE($9, employee_name), \
             certificate_name = COALESCE($10, certificate_name), \
             allow_admin = COALESCE($11, allow_admin), \
             allow_showing_medicines = COALESCE($12, allow_showing_medicines), \
             in_section_one = COALESCE($13, in_section_one), \
             in_section_two = COALESCE($14, in_section_two), \
             is_active = COALESCE($15, is_active), \
             our_companies = COALESCE($16, our_companies), \
             cost_of_deliver = COALESCE($17, cost_of_deliver), \
             invoice_min_total = COALESCE($18, invoice_min_total), \
             fast_deliver = COALESCE($19, fast_deliver), \
             pay_at_deliver = COALESCE($20, pay_at_deliver), \
             include_in_point_system = COALESCE($21, include_in_point_system), \
             point_for_amount = COALESCE($22, point_for_amount), \
             amount_to_get_point = COALESCE($23, amount_to_get_point), \
             points = COALESCE($24, points), \
             updated_at = $25 \
         WHERE id = $1 RETURNING {USER_COLUMNS}"
    );

    let row: Option<UserRow> = sqlx::query_as(&sql)
        .bind(id)
        .bind(update.name.as_deref())
        .bind(update.logo_url.as_deref())
        .bind(update.phone.as_deref())
        .bind(update.mobile.as_deref())
        .bind(update.email.as_deref())
        .bind(update.city.as_deref())
        .bind(update.address_details.as_deref())
        .bind(update.employee_name.as_deref())
        .bind(update.certificate_name.as_deref())
        .bind(update.allow_admin)
        .bind(update.allow_showing_medicines)
        .bind(update.in_section_one)
        .bind(update.in_section_two)
        .bind(update.is_active)
        .bind(update.our_companies.as_deref())
        .bind(update.cost_of_deliver)
        .bind(update.invoice_min_total)
        .bind(update.fast_deliver)
        .bind(update.pay_at_deliver)
        .bind(update.include_in_point_system)
        .bind(update.point_for_amount)
        .bind(update.amount_to_get_point)
        .bind(update.points)
        .bind(shared::util::now_millis())
        .fetch_optional(pool)
        .await?;

    Ok(row.map(User::from))
}

pub async fn delete(pool: &PgPool, id: i64) -> ServiceResult<bool> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn companies(pool: &PgPool) -> ServiceResult<Vec<UserSummary>> {
    let rows: Vec<UserRow> = sqlx::query_as(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE user_type = 'company' AND is_active ORDER BY name"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(UserSummary::from).collect())
}

/// Active warehouses, optionally limited to one city (non-admin callers
/// only see warehouses in their own city).
pub async fn warehouses(pool: &PgPool, city: Option<&str>) -> ServiceResult<Vec<UserSummary>> {
    let rows: Vec<UserRow> = match city {
        Some(city) => {
            sqlx::query_as(&format!(
                "SELECT {USER_COLUMNS} FROM users \
                 WHERE user_type = 'warehouse' AND is_active AND city = $1 ORDER BY name"
            ))
            .bind(city)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query_as(&format!(
                "SELECT {USER_COLUMNS} FROM users \
                 WHERE user_type = 'warehouse' AND is_active ORDER BY name"
            ))
            .fetch_all(pool)
            .await?
        }
    };
    Ok(rows.into_iter().map(UserSummary::from).collect())
}

async fn user_exists(pool: &PgPool, id: i64) -> ServiceResult<bool> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(exists)
}

/// Register a device push token. The guard keeps array semantics set-like
/// under concurrent registrations. Returns false when the user does not
/// exist; an already-registered token is not an error.
pub async fn add_push_token(pool: &PgPool, user_id: i64, token: &str) -> ServiceResult<bool> {
    let result = sqlx::query(
        "UPDATE users SET expo_push_tokens = array_append(expo_push_tokens, $2), updated_at = $3 \
         WHERE id = $1 AND NOT ($2 = ANY(expo_push_tokens))",
    )
    .bind(user_id)
    .bind(token)
    .bind(shared::util::now_millis())
    .execute(pool)
    .await?;
    if result.rows_affected() > 0 {
        return Ok(true);
    }
    // Zero rows is either a duplicate token or a missing user.
    user_exists(pool, user_id).await
}

/// Returns false when the user does not exist (the update matches the row
/// whether or not the token is present).
pub async fn remove_push_token(pool: &PgPool, user_id: i64, token: &str) -> ServiceResult<bool> {
    let result = sqlx::query(
        "UPDATE users SET expo_push_tokens = array_remove(expo_push_tokens, $2), updated_at = $3 \
         WHERE id = $1",
    )
    .bind(user_id)
    .bind(token)
    .bind(shared::util::now_millis())
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Returns false when the user does not exist; an already-partnered
/// company is not an error.
pub async fn add_our_company(pool: &PgPool, user_id: i64, company_id: i64) -> ServiceResult<bool> {
    let result = sqlx::query(
        "UPDATE users SET our_companies = array_append(our_companies, $2), updated_at = $3 \
         WHERE id = $1 AND NOT ($2 = ANY(our_companies))",
    )
    .bind(user_id)
    .bind(company_id)
    .bind(shared::util::now_millis())
    .execute(pool)
    .await?;
    if result.rows_affected() > 0 {
        return Ok(true);
    }
    user_exists(pool, user_id).await
}

/// Returns false when the user does not exist.
pub async fn remove_our_company(
    pool: &PgPool,
    user_id: i64,
    company_id: i64,
) -> ServiceResult<bool> {
    let result = sqlx::query(
        "UPDATE users SET our_companies = array_remove(our_companies, $2), updated_at = $3 \
         WHERE id = $1",
    )
    .bind(user_id)
    .bind(company_id)
    .bind(shared::util::now_millis())
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Add a (possibly negative) delta to the loyalty balance and return the
/// new balance.
pub async fn add_points(pool: &PgPool, user_id: i64, delta: i64) -> ServiceResult<Option<i64>> {
    let points: Option<i64> = sqlx::query_scalar(
        "UPDATE users SET points = points + $2, updated_at = $3 WHERE id = $1 RETURNING points",
    )
    .bind(user_id)
    .bind(delta)
    .bind(shared::util::now_millis())
    .fetch_optional(pool)
    .await?;
    Ok(points)
}

pub async fn points(pool: &PgPool, user_id: i64) -> ServiceResult<Option<i64>> {
    let points: Option<i64> = sqlx::query_scalar("SELECT points FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(points)
}

/// Name/city reference for populating counterparties on orders/baskets.
pub async fn party(pool: &PgPool, id: i64) -> ServiceResult<Option<PartyRef>> {
    let row: Option<(i64, String, String)> =
        sqlx::query_as("SELECT id, name, city FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(|(id, name, city)| PartyRef { id, name, city }))
}

pub async fn push_tokens(pool: &PgPool, user_id: i64) -> ServiceResult<Vec<String>> {
    let tokens: Option<Vec<String>> =
        sqlx::query_scalar("SELECT expo_push_tokens FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
    Ok(tokens.unwrap_or_default())
}

/// Every admin device token, for admin-audience notifications.
pub async fn admin_push_tokens(pool: &PgPool) -> ServiceResult<Vec<String>> {
    let tokens: Vec<String> = sqlx::query_scalar(
        "SELECT unnest(expo_push_tokens) FROM users WHERE user_type = 'admin'",
    )
    .fetch_all(pool)
    .await?;
    Ok(tokens)
}
