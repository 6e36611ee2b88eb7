//! Phone-shop stock: devices, sales, and the workflow that ties them.

pub mod audit;
pub mod export;
pub mod gateway;
pub mod model;
pub mod service;
pub mod validate;
pub mod view;

#[cfg(test)]
pub(crate) mod testing;

pub use audit::{Inconsistency, find_inconsistencies};
pub use export::ExportError;
pub use gateway::{Gateway, GatewayError};
pub use service::{SaleError, SaleOutcome, SaleReceipt, StatusRepair, StockService, WorkflowOptions};
pub use validate::{DeviceForm, SaleForm, ValidationError};
pub use view::{StockView, Summary};
