//! Core utilities: configuration, errors, logging

pub mod config;
pub mod error;
pub mod logging;

// Re-exports for convenience
pub use config::Config;
pub use error::{AppError, AppResult};
pub use logging::{format_size, init_logger, install_panic_hook};
