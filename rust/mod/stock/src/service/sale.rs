//! Sale registration.
//!
//! Registering a sale touches two records with no transaction between them:
//!
//! 1. create the sale,
//! 2. mark its device sold.
//!
//! The order is fixed. If step 2 fails the sale already exists while the
//! device still reads as available; that is reported as
//! [`SaleError::PartialSale`] and never as success. The reverse order could
//! leave a sold device with no sale behind it, which hides stock without a
//! trace.

use thiserror::Error;
use tracing::{error, info, warn};

use celcontrol_core::ServiceError;

use crate::gateway::GatewayError;
use crate::model::{DeviceStatus, Sale};
use crate::validate::{SaleForm, ValidationError, validate_sale};

use super::StockService;

/// Knobs for [`StockService::register_sale`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowOptions {
    /// Re-read the device and require it to be available before writing.
    ///
    /// Narrows the double-sell window between two operators; it cannot close
    /// it, since the read and the writes are separate calls.
    pub verify_availability: bool,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            verify_availability: true,
        }
    }
}

/// How a registration attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaleOutcome {
    /// Sale created and device marked sold.
    Completed,
    /// Nothing was changed.
    Failed,
    /// Sale created, device still available. Needs reconciliation.
    Partial,
}

/// A completed registration. Callers reload their view afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleReceipt {
    pub sale: Sale,
}

impl SaleReceipt {
    pub fn outcome(&self) -> SaleOutcome {
        SaleOutcome::Completed
    }
}

#[derive(Error, Debug)]
pub enum SaleError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("device {0} not found")]
    DeviceNotFound(String),

    #[error("device {0} is already sold")]
    DeviceUnavailable(String),

    /// Reading the device or creating the sale failed; nothing was written.
    #[error("sale not recorded: {0}")]
    Gateway(#[source] GatewayError),

    /// The sale exists but its device could not be marked sold.
    #[error(
        "sale {} recorded but device {} is still marked available: {source}",
        .sale.id,
        .sale.device_id
    )]
    PartialSale {
        sale: Sale,
        #[source]
        source: GatewayError,
    },
}

impl SaleError {
    pub fn outcome(&self) -> SaleOutcome {
        match self {
            SaleError::PartialSale { .. } => SaleOutcome::Partial,
            _ => SaleOutcome::Failed,
        }
    }
}

impl From<SaleError> for ServiceError {
    fn from(err: SaleError) -> Self {
        match err {
            SaleError::Validation(e) => e.into(),
            e @ SaleError::DeviceNotFound(_) => ServiceError::NotFound(e.to_string()),
            e @ SaleError::DeviceUnavailable(_) => ServiceError::Conflict(e.to_string()),
            e @ SaleError::Gateway(_) => ServiceError::Gateway(e.to_string()),
            e @ SaleError::PartialSale { .. } => ServiceError::PartialSale(e.to_string()),
        }
    }
}

/// Result of re-applying the sold status to a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusRepair {
    Updated,
    AlreadySold,
}

impl StockService {
    /// Register a sale for an available device.
    ///
    /// Validation failures never reach the gateway. See the module docs for
    /// the partial-failure case.
    pub fn register_sale(&self, form: &SaleForm) -> Result<SaleReceipt, SaleError> {
        let new_sale = validate_sale(form).inspect_err(|e| warn!("sale rejected: {e}"))?;

        if self.options.verify_availability {
            self.ensure_available(&new_sale.device_id)?;
        }

        let sale = self.gateway.create_sale(&new_sale).map_err(|e| {
            warn!("sale for device {} not recorded: {e}", new_sale.device_id);
            SaleError::Gateway(e)
        })?;

        if let Err(source) = self.gateway.set_device_status(&sale.device_id, DeviceStatus::Sold) {
            error!(
                "sale {} recorded but device {} could not be marked sold: {source}",
                sale.id, sale.device_id
            );
            return Err(SaleError::PartialSale { sale, source });
        }

        info!("sale {} registered, device {} sold", sale.id, sale.device_id);
        Ok(SaleReceipt { sale })
    }

    fn ensure_available(&self, device_id: &str) -> Result<(), SaleError> {
        match self.gateway.get_device(device_id) {
            Err(e) => {
                warn!("availability check for device {device_id} failed: {e}");
                Err(SaleError::Gateway(e))
            }
            Ok(None) => {
                warn!("sale rejected: device {device_id} not found");
                Err(SaleError::DeviceNotFound(device_id.to_string()))
            }
            Ok(Some(d)) if !d.is_available() => {
                warn!("sale rejected: device {device_id} is already sold");
                Err(SaleError::DeviceUnavailable(device_id.to_string()))
            }
            Ok(Some(_)) => Ok(()),
        }
    }

    /// Re-apply the sold status to a device left available by a partial sale.
    ///
    /// Safe to repeat. Refuses devices that no sale references, so stock is
    /// never marked sold without a sale behind it.
    pub fn retry_mark_sold(&self, device_id: &str) -> Result<StatusRepair, ServiceError> {
        let device_id = device_id.trim();
        if device_id.is_empty() {
            return Err(ServiceError::Validation("device_id: select a device".into()));
        }

        let device = self
            .gateway
            .get_device(device_id)?
            .ok_or_else(|| ServiceError::NotFound(format!("device {device_id} not found")))?;

        if !device.is_available() {
            info!("device {device_id} already sold, nothing to repair");
            return Ok(StatusRepair::AlreadySold);
        }

        let has_sale = self
            .gateway
            .list_sales()?
            .iter()
            .any(|r| r.sale.device_id == device_id);
        if !has_sale {
            return Err(ServiceError::Conflict(format!(
                "no sale references device {device_id}; refusing to mark it sold"
            )));
        }

        self.gateway.set_device_status(device_id, DeviceStatus::Sold)?;
        info!("device {device_id} marked sold on retry");
        Ok(StatusRepair::Updated)
    }
}
