pub mod device;
pub mod sale;

pub use device::{Device, DeviceStatus};
pub use sale::{Channel, NewSale, Sale, SaleRecord};
