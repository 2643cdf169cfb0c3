#![warn(clippy::pedantic)]
pub mod client;
pub mod discovery;
pub mod error;
pub mod request;
pub mod types;

pub use client::OpenRouterClient;
pub use discovery::{discover_api_key, API_KEY_ENV_VAR};
pub use error::OpenRouterError;
pub use request::build_request;
pub use types::*;
