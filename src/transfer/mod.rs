//! Relaying inbound documents to storage (or straight back to the chat)

pub mod outcome;
pub mod staging;
pub mod workflow;

pub use outcome::{DeliveryConfirmation, TransferFailure, TransferOutcome};
pub use staging::{InboundFile, StagedCopy};
pub use workflow::{store_and_link, ChatTransport, TransferStage, TransferWorkflow};
