pub mod config;
pub mod error;
pub mod types;

pub use config::StoreConfig;
pub use error::ServiceError;
pub use types::{new_id, now_rfc3339, parse_rfc3339};
