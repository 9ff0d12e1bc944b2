pub mod config;
pub mod error;
pub mod notify;
pub mod store;
pub mod types;

pub use config::AppConfig;
pub use error::{RotationError, RotationResult};
pub use notify::NotificationSink;
pub use store::{Catalog, Registry, StatsStore};
