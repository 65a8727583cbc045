//! Order model and lifecycle status enums
//!
//! Three independent status channels are tracked per order:
//! - `status`: the unified lifecycle state
//! - `warehouse_status` / `pharmacy_status`: legacy per-counterparty
//!   sub-statuses that are set independently and never synchronized with
//!   `status`
//!
//! Each channel maps its values to an optional Arabic notification phrase;
//! values with no phrase never produce a push notification.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Unified order lifecycle status. `Pending` is the implicit initial state
/// and carries no notification phrase. No predecessor validation is applied:
/// any status may replace any other.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirm,
    Shipping,
    Delivery,
    DontServe,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirm => "confirm",
            OrderStatus::Shipping => "shipping",
            OrderStatus::Delivery => "delivery",
            OrderStatus::DontServe => "dont-serve",
        }
    }

    pub fn parse(s: &str) -> Option<OrderStatus> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "confirm" => Some(OrderStatus::Confirm),
            "shipping" => Some(OrderStatus::Shipping),
            "delivery" => Some(OrderStatus::Delivery),
            "dont-serve" => Some(OrderStatus::DontServe),
            _ => None,
        }
    }

    /// Notification phrase for this status. `None` suppresses dispatch.
    pub fn phrase(&self) -> Option<&'static str> {
        match self {
            OrderStatus::Pending => None,
            OrderStatus::Confirm => Some("تم قبول الطلبية"),
            OrderStatus::Shipping => Some("تم شحن الطلبية"),
            OrderStatus::Delivery => Some("تم تسليم الطلبية"),
            OrderStatus::DontServe => Some("تعذر تخديم الطلبية"),
        }
    }
}

/// Warehouse-side sub-status. `Unread` is the initial value and doubles as
/// the warehouse's unread-order marker.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum WarehouseStatus {
    #[default]
    Unread,
    Sent,
    Received,
    Declined,
}

impl WarehouseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarehouseStatus::Unread => "unread",
            WarehouseStatus::Sent => "sent",
            WarehouseStatus::Received => "received",
            WarehouseStatus::Declined => "declined",
        }
    }

    pub fn parse(s: &str) -> Option<WarehouseStatus> {
        match s {
            "unread" => Some(WarehouseStatus::Unread),
            "sent" => Some(WarehouseStatus::Sent),
            "received" => Some(WarehouseStatus::Received),
            "declined" => Some(WarehouseStatus::Declined),
            _ => None,
        }
    }

    pub fn phrase(&self) -> Option<&'static str> {
        match self {
            WarehouseStatus::Unread => None,
            WarehouseStatus::Sent => Some("تم إرسال الطلبية من المستودع"),
            WarehouseStatus::Received => Some("تم استلام الطلبية من قبل المستودع"),
            WarehouseStatus::Declined => Some("تم رفض الطلبية من قبل المستودع"),
        }
    }
}

/// Pharmacy-side sub-status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum PharmacyStatus {
    Sent,
    Received,
}

impl PharmacyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PharmacyStatus::Sent => "sent",
            PharmacyStatus::Received => "received",
        }
    }

    pub fn parse(s: &str) -> Option<PharmacyStatus> {
        match s {
            "sent" => Some(PharmacyStatus::Sent),
            "received" => Some(PharmacyStatus::Received),
            _ => None,
        }
    }

    pub fn phrase(&self) -> Option<&'static str> {
        match self {
            PharmacyStatus::Sent => Some("تم إرسال الطلبية إلى الصيدلية"),
            PharmacyStatus::Received => Some("تم استلام الطلبية من قبل الصيدلية"),
        }
    }
}

/// Populated counterparty reference (name/address only, never the full
/// user record).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyRef {
    pub id: i64,
    pub name: String,
    pub city: String,
}

/// One order line: item reference, quantity and free bonus units.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub item: i64,
    #[validate(range(min = 0))]
    pub quantity: i32,
    #[validate(range(min = 0))]
    pub bonus: i32,
}

/// Item details populated into an order line on the detail endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineItem {
    pub id: i64,
    pub name: String,
    pub formula: String,
    pub caliber: String,
    pub price: f64,
    pub customer_price: f64,
    pub company_name: Option<String>,
}

/// Fully populated order line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineDetail {
    pub item: OrderLineItem,
    pub quantity: i32,
    pub bonus: i32,
}

/// Full order as returned by the detail endpoint and status updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub pharmacy: PartyRef,
    pub warehouse: PartyRef,
    pub items: Vec<OrderLineDetail>,
    pub status: OrderStatus,
    pub warehouse_status: WarehouseStatus,
    pub pharmacy_status: Option<PharmacyStatus>,
    pub seen_by_admin: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Reduced order for list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    pub id: i64,
    pub pharmacy: PartyRef,
    pub warehouse: PartyRef,
    pub status: OrderStatus,
    pub seen_by_admin: bool,
    pub created_at: i64,
}

/// Create-order payload.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderCreate {
    pub pharmacy: i64,
    pub warehouse: i64,
    #[validate(length(min = 1, message = "order must contain at least one line"))]
    #[validate(nested)]
    pub items: Vec<OrderLine>,
}

/// Partial status update. Fields left `None` are unchanged. The three
/// channels are applied and notified independently.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStatusUpdate {
    pub status: Option<OrderStatus>,
    pub warehouse_status: Option<WarehouseStatus>,
    pub pharmacy_status: Option<PharmacyStatus>,
    pub seen_by_admin: Option<bool>,
}

impl OrderStatusUpdate {
    /// True when no field is set (nothing to apply).
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.warehouse_status.is_none()
            && self.pharmacy_status.is_none()
            && self.seen_by_admin.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_form_is_kebab_case() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::DontServe).unwrap(),
            "\"dont-serve\""
        );
        let parsed: OrderStatus = serde_json::from_str("\"shipping\"").unwrap();
        assert_eq!(parsed, OrderStatus::Shipping);
    }

    #[test]
    fn statuses_round_trip_through_storage_form() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Confirm,
            OrderStatus::Shipping,
            OrderStatus::Delivery,
            OrderStatus::DontServe,
        ] {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("cancelled"), None);
    }

    #[test]
    fn initial_states_have_no_phrase() {
        assert!(OrderStatus::Pending.phrase().is_none());
        assert!(WarehouseStatus::Unread.phrase().is_none());
    }

    #[test]
    fn every_notifying_status_has_a_phrase() {
        assert!(OrderStatus::Confirm.phrase().is_some());
        assert!(OrderStatus::Shipping.phrase().is_some());
        assert!(OrderStatus::Delivery.phrase().is_some());
        assert!(OrderStatus::DontServe.phrase().is_some());
        assert!(WarehouseStatus::Sent.phrase().is_some());
        assert!(WarehouseStatus::Declined.phrase().is_some());
        assert!(PharmacyStatus::Sent.phrase().is_some());
        assert!(PharmacyStatus::Received.phrase().is_some());
    }

    #[test]
    fn empty_update_detected() {
        assert!(OrderStatusUpdate::default().is_empty());
        let update = OrderStatusUpdate {
            status: Some(OrderStatus::Confirm),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }

    #[test]
    fn order_create_requires_lines() {
        use validator::Validate;

        let empty = OrderCreate {
            pharmacy: 1,
            warehouse: 2,
            items: vec![],
        };
        assert!(empty.validate().is_err());

        let ok = OrderCreate {
            pharmacy: 1,
            warehouse: 2,
            items: vec![OrderLine {
                item: 3,
                quantity: 5,
                bonus: 1,
            }],
        };
        assert!(ok.validate().is_ok());

        let negative = OrderCreate {
            pharmacy: 1,
            warehouse: 2,
            items: vec![OrderLine {
                item: 3,
                quantity: -1,
                bonus: 0,
            }],
        };
        assert!(negative.validate().is_err());
    }
}
