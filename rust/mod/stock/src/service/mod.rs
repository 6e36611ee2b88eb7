pub mod sale;

use tracing::{info, warn};

use celcontrol_core::ServiceError;

use crate::gateway::Gateway;
use crate::model::{Device, SaleRecord};
use crate::validate::{DeviceForm, validate_device};
use crate::view::StockView;

pub use sale::{SaleError, SaleOutcome, SaleReceipt, StatusRepair, WorkflowOptions};

/// Owns the gateway and runs the stock operations.
pub struct StockService {
    pub(crate) gateway: Box<dyn Gateway>,
    pub(crate) options: WorkflowOptions,
}

impl StockService {
    pub fn new(gateway: Box<dyn Gateway>) -> Self {
        Self {
            gateway,
            options: WorkflowOptions::default(),
        }
    }

    pub fn with_options(mut self, options: WorkflowOptions) -> Self {
        self.options = options;
        self
    }

    // ── Stock entry ──

    /// Register a device into stock. The new device is Available.
    pub fn add_device(&self, form: &DeviceForm) -> Result<Device, ServiceError> {
        if let Err(e) = validate_device(form) {
            warn!("stock entry rejected: {e}");
            return Err(e.into());
        }

        let device = self.gateway.create_device(&form.model, &form.imei)?;
        info!("device {} ({}) added to stock", device.id, device.imei);
        Ok(device)
    }

    // ── Reads ──

    pub fn list_devices(&self) -> Result<Vec<Device>, ServiceError> {
        Ok(self.gateway.list_devices()?)
    }

    pub fn list_sales(&self) -> Result<Vec<SaleRecord>, ServiceError> {
        Ok(self.gateway.list_sales()?)
    }

    /// Load a fresh snapshot of devices and sales.
    pub fn load_view(&self) -> Result<StockView, ServiceError> {
        StockView::load(self.gateway.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DeviceStatus;
    use crate::testing::{FaultyGateway, memory_gateway};

    #[test]
    fn add_device_passes_exact_values() {
        let (gw, calls) = FaultyGateway::wrap(memory_gateway());
        let svc = StockService::new(Box::new(gw));

        let device = svc
            .add_device(&DeviceForm {
                model: "iPhone 15".into(),
                imei: "123456789012".into(),
            })
            .unwrap();

        assert_eq!(device.model, "iPhone 15");
        assert_eq!(device.imei, "123456789012");
        assert_eq!(device.status, DeviceStatus::Available);
        assert_eq!(calls.create_device(), 1);
        assert_eq!(
            calls.last_device_input(),
            Some(("iPhone 15".to_string(), "123456789012".to_string()))
        );
    }

    #[test]
    fn invalid_imei_never_reaches_gateway() {
        let (gw, calls) = FaultyGateway::wrap(memory_gateway());
        let svc = StockService::new(Box::new(gw));

        for imei in ["12345", "abcdefghijkl", "12345678901a", ""] {
            let err = svc
                .add_device(&DeviceForm {
                    model: "Galaxy".into(),
                    imei: imei.into(),
                })
                .unwrap_err();
            assert!(matches!(err, ServiceError::Validation(_)), "imei {imei:?}");
        }
        assert_eq!(calls.create_device(), 0);
    }

    #[test]
    fn gateway_failure_on_add_is_gateway_error() {
        let (gw, calls) = FaultyGateway::wrap(memory_gateway());
        calls.fail_create_device(true);
        let svc = StockService::new(Box::new(gw));

        let err = svc
            .add_device(&DeviceForm {
                model: "Pixel".into(),
                imei: "1234567890".into(),
            })
            .unwrap_err();
        assert_eq!(err.error_code(), "GATEWAY_ERROR");
        assert!(svc.list_devices().unwrap().is_empty());
    }
}
