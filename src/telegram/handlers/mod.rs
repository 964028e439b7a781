//! Telegram bot handler tree configuration
//!
//! The same schema is used in production and by the integration tests.

mod commands;
mod documents;
mod schema;
mod types;

pub use documents::{link_keyboard, send_outcome};
pub use schema::schema;
pub use types::{HandlerDeps, HandlerError};
