//! Test doubles: an in-memory gateway and a wrapper that counts calls and
//! fails on demand.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use celcontrol_sql::SqliteStore;

use crate::gateway::{Gateway, GatewayError, SqlGateway};
use crate::model::{Device, DeviceStatus, NewSale, Sale, SaleRecord};

pub(crate) fn memory_gateway() -> SqlGateway {
    SqlGateway::new(Arc::new(SqliteStore::open_in_memory().unwrap())).unwrap()
}

/// Shared call log and fault switches for a [`FaultyGateway`].
#[derive(Default)]
pub(crate) struct Calls {
    list_devices: AtomicUsize,
    list_sales: AtomicUsize,
    get_device: AtomicUsize,
    create_device: AtomicUsize,
    create_sale: AtomicUsize,
    set_status: AtomicUsize,
    last_device_input: Mutex<Option<(String, String)>>,

    fail_reads: AtomicBool,
    fail_create_device: AtomicBool,
    fail_create_sale: AtomicBool,
    fail_set_status: AtomicBool,
}

impl Calls {
    pub fn get_device(&self) -> usize {
        self.get_device.load(Ordering::SeqCst)
    }

    pub fn create_device(&self) -> usize {
        self.create_device.load(Ordering::SeqCst)
    }

    pub fn create_sale(&self) -> usize {
        self.create_sale.load(Ordering::SeqCst)
    }

    pub fn set_status(&self) -> usize {
        self.set_status.load(Ordering::SeqCst)
    }

    /// Every gateway call made so far, reads included.
    pub fn total(&self) -> usize {
        self.list_devices.load(Ordering::SeqCst)
            + self.list_sales.load(Ordering::SeqCst)
            + self.get_device()
            + self.create_device()
            + self.create_sale()
            + self.set_status()
    }

    pub fn last_device_input(&self) -> Option<(String, String)> {
        self.last_device_input.lock().unwrap().clone()
    }

    pub fn fail_reads(&self, on: bool) {
        self.fail_reads.store(on, Ordering::SeqCst);
    }

    pub fn fail_create_device(&self, on: bool) {
        self.fail_create_device.store(on, Ordering::SeqCst);
    }

    pub fn fail_create_sale(&self, on: bool) {
        self.fail_create_sale.store(on, Ordering::SeqCst);
    }

    pub fn fail_set_status(&self, on: bool) {
        self.fail_set_status.store(on, Ordering::SeqCst);
    }
}

fn injected(flag: &AtomicBool, what: &str) -> Result<(), GatewayError> {
    if flag.load(Ordering::SeqCst) {
        return Err(GatewayError::Connection(format!("injected failure: {what}")));
    }
    Ok(())
}

/// Gateway wrapper that records calls and injects failures.
pub(crate) struct FaultyGateway<G> {
    inner: G,
    calls: Arc<Calls>,
}

impl<G: Gateway> FaultyGateway<G> {
    pub fn wrap(inner: G) -> (Self, Arc<Calls>) {
        let calls = Arc::new(Calls::default());
        (
            Self {
                inner,
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

impl<G: Gateway> Gateway for FaultyGateway<G> {
    fn list_devices(&self) -> Result<Vec<Device>, GatewayError> {
        self.calls.list_devices.fetch_add(1, Ordering::SeqCst);
        injected(&self.calls.fail_reads, "list_devices")?;
        self.inner.list_devices()
    }

    fn list_sales(&self) -> Result<Vec<SaleRecord>, GatewayError> {
        self.calls.list_sales.fetch_add(1, Ordering::SeqCst);
        injected(&self.calls.fail_reads, "list_sales")?;
        self.inner.list_sales()
    }

    fn get_device(&self, id: &str) -> Result<Option<Device>, GatewayError> {
        self.calls.get_device.fetch_add(1, Ordering::SeqCst);
        injected(&self.calls.fail_reads, "get_device")?;
        self.inner.get_device(id)
    }

    fn create_device(&self, model: &str, imei: &str) -> Result<Device, GatewayError> {
        self.calls.create_device.fetch_add(1, Ordering::SeqCst);
        *self.calls.last_device_input.lock().unwrap() = Some((model.into(), imei.into()));
        injected(&self.calls.fail_create_device, "create_device")?;
        self.inner.create_device(model, imei)
    }

    fn create_sale(&self, sale: &NewSale) -> Result<Sale, GatewayError> {
        self.calls.create_sale.fetch_add(1, Ordering::SeqCst);
        injected(&self.calls.fail_create_sale, "create_sale")?;
        self.inner.create_sale(sale)
    }

    fn set_device_status(&self, id: &str, status: DeviceStatus) -> Result<(), GatewayError> {
        self.calls.set_status.fetch_add(1, Ordering::SeqCst);
        injected(&self.calls.fail_set_status, "set_device_status")?;
        self.inner.set_device_status(id, status)
    }
}
