//! safiri_server — axum front end for the crop-transport USSD menu.

pub mod config;
pub mod error;
pub mod handlers;
pub mod router;
