mod client;
pub mod config;
pub mod types;

pub use client::{Client, GeminiError, strip_code_fences};
pub use config::Config;
