//! Client-held snapshot of devices and sales.
//!
//! The snapshot is never patched in place: after any write the caller
//! reloads both lists from the gateway.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use celcontrol_core::ServiceError;

use crate::gateway::Gateway;
use crate::model::{Device, DeviceStatus, SaleRecord};

/// Last-fetched devices and sales, newest first.
#[derive(Debug, Clone, Default)]
pub struct StockView {
    devices: Vec<Device>,
    sales: Vec<SaleRecord>,
}

/// Headline figures for the summary screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub available: usize,
    pub sold: usize,
    pub sales: usize,
    pub down_payment_total: Decimal,
}

impl StockView {
    pub fn load(gateway: &dyn Gateway) -> Result<Self, ServiceError> {
        let mut view = Self::default();
        view.refresh(gateway)?;
        Ok(view)
    }

    /// Replace both lists with the gateway's current state.
    ///
    /// On error the previous snapshot is left untouched.
    pub fn refresh(&mut self, gateway: &dyn Gateway) -> Result<(), ServiceError> {
        let devices = gateway.list_devices()?;
        let sales = gateway.list_sales()?;
        debug!("view refreshed: {} devices, {} sales", devices.len(), sales.len());
        self.devices = devices;
        self.sales = sales;
        Ok(())
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn sales(&self) -> &[SaleRecord] {
        &self.sales
    }

    /// Devices whose model (case-insensitive) or IMEI contains `term`.
    pub fn filter_devices(&self, term: &str) -> Vec<&Device> {
        let term = term.trim();
        self.devices.iter().filter(|d| d.matches(term)).collect()
    }

    /// Devices a sale can be registered against.
    pub fn available_devices(&self) -> Vec<&Device> {
        self.devices.iter().filter(|d| d.is_available()).collect()
    }

    pub fn summary(&self) -> Summary {
        let sold = self
            .devices
            .iter()
            .filter(|d| d.status == DeviceStatus::Sold)
            .count();
        Summary {
            available: self.devices.len() - sold,
            sold,
            sales: self.sales.len(),
            down_payment_total: self.sales.iter().map(|r| r.sale.down_payment).sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewSale;
    use crate::testing::{FaultyGateway, memory_gateway};

    fn seeded() -> (StockView, Vec<Device>) {
        let gw = memory_gateway();
        let a = gw.create_device("iPhone 15 Pro", "356789012345678").unwrap();
        let b = gw.create_device("Galaxy A54", "1234567890").unwrap();
        let c = gw.create_device("Moto G84", "9876543210").unwrap();
        for (device, amount) in [(&a, Decimal::new(150000, 2)), (&b, Decimal::new(25050, 2))] {
            gw.create_sale(&NewSale {
                device_id: device.id.clone(),
                client_name: "Cliente".into(),
                client_phone: "5500000000".into(),
                channel: "Local".into(),
                down_payment: amount,
            })
            .unwrap();
            gw.set_device_status(&device.id, DeviceStatus::Sold).unwrap();
        }
        (StockView::load(&gw).unwrap(), vec![a, b, c])
    }

    #[test]
    fn filter_by_model_or_imei() {
        let (view, _) = seeded();
        assert_eq!(view.filter_devices("").len(), 3);
        assert_eq!(view.filter_devices("  ").len(), 3);

        let hits = view.filter_devices("GALAXY");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].model, "Galaxy A54");

        let hits = view.filter_devices("98765");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].model, "Moto G84");

        assert!(view.filter_devices("nokia").is_empty());
    }

    #[test]
    fn available_devices_excludes_sold() {
        let (view, devices) = seeded();
        let available = view.available_devices();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].id, devices[2].id);
    }

    #[test]
    fn summary_figures() {
        let (view, _) = seeded();
        assert_eq!(
            view.summary(),
            Summary {
                available: 1,
                sold: 2,
                sales: 2,
                down_payment_total: Decimal::new(175050, 2),
            }
        );
        assert_eq!(StockView::default().summary().down_payment_total, Decimal::ZERO);
    }

    #[test]
    fn failed_refresh_keeps_previous_snapshot() {
        let inner = memory_gateway();
        inner.create_device("Pixel 8", "1111122222").unwrap();
        let (gw, calls) = FaultyGateway::wrap(inner);

        let mut view = StockView::load(&gw).unwrap();
        calls.fail_reads(true);
        assert!(view.refresh(&gw).is_err());
        assert_eq!(view.devices().len(), 1);
    }
}
