//! Safiri core — crop-transport USSD menu.
//!
//! Pure domain logic with no database or HTTP dependency. Storage is reached
//! through the port traits in [`ports`]; `safiri_postgres` provides the
//! production adapters and [`memory`] an in-process one.

pub mod committer;
pub mod error;
pub mod memory;
pub mod ports;
pub mod service;
pub mod settings;
pub mod types;
pub mod ussd;

pub use error::SafiriError;
pub use service::UssdService;
pub use settings::UssdSettings;
pub use ussd::{UssdReply, UssdRequest};
