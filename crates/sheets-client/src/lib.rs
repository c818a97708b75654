pub mod auth;
mod client;
pub mod config;
mod error;

pub use auth::{ServiceAccountAuth, ServiceAccountKey, StaticToken, TokenProvider};
pub use client::Client;
pub use config::{Config, SpreadsheetRef};
pub use error::SheetsError;
