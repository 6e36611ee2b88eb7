use std::fmt;

use serde::{Deserialize, Serialize};

/// Device lifecycle state.
///
/// Serialized with the store's column values (`disponible` / `vendido`).
/// The only transition is Available → Sold, performed by sale registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DeviceStatus {
    #[default]
    #[serde(rename = "disponible")]
    Available,
    #[serde(rename = "vendido")]
    Sold,
}

impl DeviceStatus {
    /// Value stored in the `status` / `estado` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Available => "disponible",
            DeviceStatus::Sold => "vendido",
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceStatus::Available => f.write_str("Available"),
            DeviceStatus::Sold => f.write_str("Sold"),
        }
    }
}

/// One phone in stock, identified by IMEI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    /// Assigned by the gateway on creation.
    pub id: String,

    /// Model name as typed at stock entry (e.g. "iPhone 15 Pro Max").
    pub model: String,

    /// IMEI / serial, digits only.
    pub imei: String,

    #[serde(default)]
    pub status: DeviceStatus,

    /// RFC 3339, assigned by the gateway.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl Device {
    pub fn is_available(&self) -> bool {
        self.status == DeviceStatus::Available
    }

    /// Search match used by the inventory listing: case-insensitive on the
    /// model name, plain substring on the IMEI.
    pub fn matches(&self, term: &str) -> bool {
        if term.is_empty() {
            return true;
        }
        self.model.to_lowercase().contains(&term.to_lowercase()) || self.imei.contains(term)
    }
}
