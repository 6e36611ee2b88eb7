use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Sales channel labels offered by the sale form.
///
/// Sales store the channel as free text; this enum only covers the labels
/// the form suggests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Channel {
    #[default]
    Local,
    Facebook,
    Referido,
    WhatsApp,
}

impl Channel {
    pub const ALL: [Channel; 4] = [
        Channel::Local,
        Channel::Facebook,
        Channel::Referido,
        Channel::WhatsApp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Local => "Local",
            Channel::Facebook => "Facebook",
            Channel::Referido => "Referido",
            Channel::WhatsApp => "WhatsApp",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = String;

    /// Case-insensitive match on the form labels.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(Channel::Local),
            "facebook" => Ok(Channel::Facebook),
            "referido" => Ok(Channel::Referido),
            "whatsapp" => Ok(Channel::WhatsApp),
            other => Err(format!(
                "unknown channel \"{other}\" (expected one of: Local, Facebook, Referido, WhatsApp)"
            )),
        }
    }
}

/// One completed transaction for exactly one device.
/// Created once by sale registration, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    /// Assigned by the gateway on creation.
    pub id: String,

    /// The sold device (Device.id).
    pub device_id: String,

    pub client_name: String,

    /// Exactly 10 digits.
    pub client_phone: String,

    pub channel: String,

    /// Down payment (enganche), never negative.
    pub down_payment: Decimal,

    /// RFC 3339, assigned by the gateway.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Validated fields for a sale about to be created.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSale {
    pub device_id: String,
    pub client_name: String,
    pub client_phone: String,
    pub channel: String,
    pub down_payment: Decimal,
}

/// A sale joined with its device's model and IMEI for display and export.
///
/// Model and IMEI are absent when the referenced device is missing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SaleRecord {
    #[serde(flatten)]
    pub sale: Sale,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imei: Option<String>,
}
