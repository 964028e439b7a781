//! Handler types and dependencies

use std::sync::Arc;

use crate::transfer::TransferWorkflow;

/// Error type for handlers
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependencies required by handlers
#[derive(Clone)]
pub struct HandlerDeps {
    pub workflow: Arc<TransferWorkflow>,
}

impl HandlerDeps {
    pub fn new(workflow: Arc<TransferWorkflow>) -> Self {
        Self { workflow }
    }
}
