//! Shipping address types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use modish_core::{AddressId, UserId};

/// Most addresses a user may keep.
pub const MAX_ADDRESSES_PER_USER: i64 = 3;

/// A saved shipping address.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(rename = "addrNo")]
    pub id: AddressId,
    #[serde(skip)]
    pub user_id: UserId,
    pub addr_name: String,
    pub receiver_name: String,
    pub receiver_phone: String,
    pub zipcode: String,
    pub address: String,
    pub addr_detail: Option<String>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of address create/update requests.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRequest {
    #[serde(default)]
    pub addr_name: String,
    #[serde(default)]
    pub receiver_name: String,
    #[serde(default)]
    pub receiver_phone: String,
    #[serde(default)]
    pub zipcode: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub addr_detail: Option<String>,
    #[serde(default)]
    pub is_default: Option<bool>,
}

impl AddressRequest {
    /// Name of the first blank required field, if any.
    #[must_use]
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("addrName", &self.addr_name),
            ("receiverName", &self.receiver_name),
            ("receiverPhone", &self.receiver_phone),
            ("zipcode", &self.zipcode),
            ("address", &self.address),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }

    /// Whether the caller asked for this address to become the default.
    #[must_use]
    pub fn wants_default(&self) -> bool {
        self.is_default.unwrap_or(false)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_request_defaults() {
        let request: AddressRequest = serde_json::from_value(serde_json::json!({
            "addrName": "Home",
            "receiverName": "Kim",
            "receiverPhone": "010-0000-0000",
            "zipcode": "04524",
            "address": "Seoul"
        }))
        .unwrap();

        assert_eq!(request.missing_field(), None);
        assert!(!request.wants_default());
        assert_eq!(request.addr_detail, None);
    }

    #[test]
    fn test_missing_field() {
        let request: AddressRequest =
            serde_json::from_value(serde_json::json!({"addrName": "Home"})).unwrap();
        assert_eq!(request.missing_field(), Some("receiverName"));
    }

    #[test]
    fn test_address_serializes_addr_no() {
        let now = Utc::now();
        let address = Address {
            id: AddressId::new(9),
            user_id: UserId::new(1),
            addr_name: "Home".to_string(),
            receiver_name: "Kim".to_string(),
            receiver_phone: "010".to_string(),
            zipcode: "04524".to_string(),
            address: "Seoul".to_string(),
            addr_detail: None,
            is_default: true,
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(&address).unwrap();
        assert_eq!(json["addrNo"], 9);
        assert_eq!(json["isDefault"], true);
        assert!(json.get("userId").is_none());
    }
}
