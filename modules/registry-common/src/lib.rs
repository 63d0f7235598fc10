pub mod config;
pub mod error;
pub mod session;
pub mod types;
pub mod validation;

pub use config::{AppConfig, LinkCheckPolicy};
pub use error::{RegistryError, Result};
pub use types::*;
pub use validation::{validate_statement, ValidationErrors};
