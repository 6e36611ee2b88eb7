//! Data gateway: the store that owns devices and sales.
//!
//! The sale workflow and the views only see the [`Gateway`] trait. Two
//! adapters ship with the crate: [`SqlGateway`] over an embedded SQL store
//! and [`RestGateway`] over a PostgREST endpoint.

pub mod rest;
pub mod sql;

use std::sync::Arc;

use thiserror::Error;

use celcontrol_core::{ServiceError, StoreConfig};
use celcontrol_sql::{SQLError, SqliteStore};

use crate::model::{Device, DeviceStatus, NewSale, Sale, SaleRecord};

pub use rest::RestGateway;
pub use sql::SqlGateway;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("decode error: {0}")]
    Decode(String),

    /// The store answered with an error status.
    #[error("rejected by store ({status}): {message}")]
    Rejected { status: u16, message: String },
}

impl From<SQLError> for GatewayError {
    fn from(err: SQLError) -> Self {
        match err {
            SQLError::Connection(msg) => GatewayError::Connection(msg),
            SQLError::Query(msg) | SQLError::Execution(msg) => GatewayError::Query(msg),
            SQLError::Column(msg) => GatewayError::Decode(msg),
        }
    }
}

impl From<GatewayError> for ServiceError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::NotFound(msg) => ServiceError::NotFound(msg),
            other => ServiceError::Gateway(other.to_string()),
        }
    }
}

/// Request/response access to the device and sale records.
///
/// Every call is independent: there is no transaction spanning two calls.
pub trait Gateway: Send + Sync {
    /// All devices, newest first.
    fn list_devices(&self) -> Result<Vec<Device>, GatewayError>;

    /// All sales joined with their device's model/IMEI, newest first.
    fn list_sales(&self) -> Result<Vec<SaleRecord>, GatewayError>;

    /// One device by id, `None` if it does not exist.
    fn get_device(&self, id: &str) -> Result<Option<Device>, GatewayError>;

    /// Store a new device in state Available.
    fn create_device(&self, model: &str, imei: &str) -> Result<Device, GatewayError>;

    /// Store a new sale.
    fn create_sale(&self, sale: &NewSale) -> Result<Sale, GatewayError>;

    /// Set a device's lifecycle state. Unknown ids are a `NotFound` error.
    fn set_device_status(&self, id: &str, status: DeviceStatus) -> Result<(), GatewayError>;
}

/// Open the gateway described by a context's store config.
pub fn open(config: &StoreConfig) -> Result<Box<dyn Gateway>, ServiceError> {
    config.validate()?;
    match config {
        StoreConfig::Sqlite { path } => {
            let store = SqliteStore::open(path)
                .map_err(|e| ServiceError::Gateway(format!("failed to open SQL store: {e}")))?;
            Ok(Box::new(SqlGateway::new(Arc::new(store))?))
        }
        StoreConfig::Rest { url, api_key } => Ok(Box::new(RestGateway::new(url, api_key)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sql_errors_map_to_gateway_errors() {
        assert!(matches!(
            GatewayError::from(SQLError::Connection("locked".into())),
            GatewayError::Connection(_)
        ));
        assert!(matches!(
            GatewayError::from(SQLError::Execution("constraint".into())),
            GatewayError::Query(_)
        ));
    }

    #[test]
    fn gateway_errors_map_to_service_errors() {
        let e: ServiceError = GatewayError::NotFound("devices/x".into()).into();
        assert!(matches!(e, ServiceError::NotFound(_)));

        let e: ServiceError = GatewayError::Rejected {
            status: 401,
            message: "invalid api key".into(),
        }
        .into();
        assert_eq!(e.error_code(), "GATEWAY_ERROR");
        assert!(e.to_string().contains("401"));
    }

    #[test]
    fn open_sqlite_gateway() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::Sqlite {
            path: dir.path().join("shop.sqlite"),
        };
        let gw = open(&config).unwrap();
        assert!(gw.list_devices().unwrap().is_empty());
    }

    #[test]
    fn open_rejects_bad_config() {
        let config = StoreConfig::Rest {
            url: "not-a-url".into(),
            api_key: String::new(),
        };
        assert!(matches!(open(&config), Err(ServiceError::Config(_))));
    }
}
