//! Database access layer (PostgreSQL via sqlx)
//!
//! One module per aggregate. Functions take a `PgPool` (or transaction)
//! and return domain models from `shared`; SQL stays here, never in
//! handlers.

pub mod baskets;
pub mod favorites;
pub mod filter;
pub mod items;
pub mod orders;
pub mod saved_items;
pub mod users;
