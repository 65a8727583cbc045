//! Catalog item model

use super::order::PartyRef;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// One stocking relationship between an item and a warehouse.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemWarehouse {
    pub warehouse: PartyRef,
    pub max_qty: i32,
    /// Free-text offer label, empty when no offer is running
    pub offer: String,
    /// Loyalty points granted per unit at this warehouse, 0 when none
    pub points: i32,
}

/// Catalog item owned by a company, optionally stocked by warehouses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub company: Option<PartyRef>,
    pub caliber: String,
    pub formula: String,
    pub indication: String,
    pub composition: String,
    pub packing: String,
    pub price: f64,
    pub customer_price: f64,
    pub logo_url: String,
    pub is_active: bool,
    pub warehouses: Vec<ItemWarehouse>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create-item payload.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ItemCreate {
    #[validate(length(min = 1, message = "item name is required"))]
    pub name: String,
    pub company: i64,
    #[serde(default)]
    pub caliber: String,
    #[serde(default)]
    pub formula: String,
    #[serde(default)]
    pub indication: String,
    #[serde(default)]
    pub composition: String,
    #[serde(default)]
    pub packing: String,
    pub price: f64,
    pub customer_price: f64,
    #[serde(default)]
    pub logo_url: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Partial item update. Fields left `None` are unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemUpdate {
    pub name: Option<String>,
    pub caliber: Option<String>,
    pub formula: Option<String>,
    pub indication: Option<String>,
    pub composition: Option<String>,
    pub packing: Option<String>,
    pub price: Option<f64>,
    pub customer_price: Option<f64>,
    pub logo_url: Option<String>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_create_requires_name() {
        let item = ItemCreate {
            name: String::new(),
            company: 1,
            caliber: String::new(),
            formula: String::new(),
            indication: String::new(),
            composition: String::new(),
            packing: String::new(),
            price: 100.0,
            customer_price: 120.0,
            logo_url: String::new(),
            is_active: true,
        };
        assert!(item.validate().is_err());
    }

    #[test]
    fn item_create_defaults_active() {
        let item: ItemCreate = serde_json::from_str(
            r#"{"name":"Paracetamol","company":7,"price":100.0,"customerPrice":120.0}"#,
        )
        .unwrap();
        assert!(item.is_active);
        assert!(item.caliber.is_empty());
    }
}
