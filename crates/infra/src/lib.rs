//! Infrastructure layer: store backends, reorder notifiers, configuration.

pub mod config;
pub mod memory;
pub mod notify;
pub mod postgres;
pub mod store;


pub use config::{ClinicConfig, ConfigError};
pub use memory::InMemoryClinicStore;
pub use notify::{BusNotifier, FanoutNotifier, TracingNotifier, WebhookNotifier};
pub use postgres::PgClinicStore;
pub use store::{ClinicStore, SharedStore};
