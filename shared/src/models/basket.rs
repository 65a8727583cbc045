//! Basket (staging cart) model

use super::order::{OrderLine, PartyRef};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A pharmacy's staged cart against one warehouse. Lines are replaced
/// wholesale on update; converting a basket into an order is a client-side
/// concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Basket {
    pub id: i64,
    pub pharmacy: PartyRef,
    pub warehouse: PartyRef,
    pub items: Vec<OrderLine>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create-basket payload. The pharmacy is the acting user.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BasketCreate {
    pub warehouse: i64,
    #[validate(length(min = 1, message = "basket must contain at least one line"))]
    #[validate(nested)]
    pub items: Vec<OrderLine>,
}

/// Replace-lines payload for an existing basket.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BasketUpdate {
    #[validate(length(min = 1, message = "basket must contain at least one line"))]
    #[validate(nested)]
    pub items: Vec<OrderLine>,
}
