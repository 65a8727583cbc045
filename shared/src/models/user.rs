//! User model and role enum

use serde::{Deserialize, Serialize};

/// Account role controlling visibility and permitted actions.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Pharmacy,
    Warehouse,
    Company,
    Normal,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Pharmacy => "pharmacy",
            Role::Warehouse => "warehouse",
            Role::Company => "company",
            Role::Normal => "normal",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "admin" => Some(Role::Admin),
            "pharmacy" => Some(Role::Pharmacy),
            "warehouse" => Some(Role::Warehouse),
            "company" => Some(Role::Company),
            "normal" => Some(Role::Normal),
            _ => None,
        }
    }

    /// Sender label used in notification text (client locale is Arabic).
    pub fn label(&self) -> &'static str {
        match self {
            Role::Admin => "الإدارة",
            Role::Pharmacy => "الصيدلية",
            Role::Warehouse => "المستودع",
            Role::Company => "الشركة",
            Role::Normal => "مستخدم",
        }
    }
}

/// Full user record as returned by detail endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub name: String,
    pub username: String,
    #[serde(rename = "type")]
    pub user_type: Role,
    pub logo_url: String,
    pub is_active: bool,
    pub mobile: Vec<String>,
    pub phone: Vec<String>,
    pub email: Vec<String>,
    pub city: String,
    pub address_details: String,
    pub employee_name: Option<String>,
    pub certificate_name: Option<String>,
    pub allow_admin: bool,
    pub allow_showing_medicines: bool,
    pub in_section_one: bool,
    pub in_section_two: bool,
    pub expo_push_tokens: Vec<String>,
    pub our_companies: Vec<i64>,
    pub cost_of_deliver: f64,
    pub invoice_min_total: f64,
    pub fast_deliver: bool,
    pub pay_at_deliver: bool,
    pub include_in_point_system: bool,
    pub point_for_amount: f64,
    pub amount_to_get_point: f64,
    pub points: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Reduced user record for list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub user_type: Role,
    pub logo_url: String,
    pub city: String,
    pub is_active: bool,
    pub allow_showing_medicines: bool,
    pub our_companies: Vec<i64>,
    pub cost_of_deliver: f64,
    pub invoice_min_total: f64,
    pub fast_deliver: bool,
    pub pay_at_deliver: bool,
    pub include_in_point_system: bool,
    pub point_for_amount: f64,
    pub amount_to_get_point: f64,
    pub points: i64,
}

/// Allowed fields for profile updates. Anything not listed here cannot be
/// changed through the update endpoints (id, username, role, tokens and
/// timestamps are managed elsewhere).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    pub name: Option<String>,
    pub logo_url: Option<String>,
    pub phone: Option<Vec<String>>,
    pub mobile: Option<Vec<String>>,
    pub email: Option<Vec<String>>,
    pub city: Option<String>,
    pub address_details: Option<String>,
    pub employee_name: Option<String>,
    pub certificate_name: Option<String>,
    pub allow_admin: Option<bool>,
    pub allow_showing_medicines: Option<bool>,
    pub in_section_one: Option<bool>,
    pub in_section_two: Option<bool>,
    pub is_active: Option<bool>,
    pub our_companies: Option<Vec<i64>>,
    pub cost_of_deliver: Option<f64>,
    pub invoice_min_total: Option<f64>,
    pub fast_deliver: Option<bool>,
    pub pay_at_deliver: Option<bool>,
    pub include_in_point_system: Option<bool>,
    pub point_for_amount: Option<f64>,
    pub amount_to_get_point: Option<f64>,
    pub points: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_wire_form() {
        for role in [
            Role::Admin,
            Role::Pharmacy,
            Role::Warehouse,
            Role::Company,
            Role::Normal,
        ] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("guest"), None);
    }

    #[test]
    fn role_serde_is_lowercase() {
        assert_eq!(
            serde_json::to_string(&Role::Warehouse).unwrap(),
            "\"warehouse\""
        );
        let parsed: Role = serde_json::from_str("\"pharmacy\"").unwrap();
        assert_eq!(parsed, Role::Pharmacy);
    }
}
