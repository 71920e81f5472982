//! Data models for the console client
//!
//! Records mirrored from the backend, live-channel events, notifications and
//! the request/response shapes of the assistant panels.

pub mod assistant;
pub mod event;
pub mod notification;
pub mod session;
pub mod transaction;

// Re-export commonly used types for convenience
pub use assistant::{
    AssistantLogEntry, SummarizeRequest, SummarizeResponse, WikipediaLogEntry,
    WikipediaSearchRequest, WikipediaSearchResponse,
};
pub use event::{InboundEvent, StatusChange};
pub use notification::{NotificationEntry, Severity};
pub use session::{LoginRequest, RegisterRequest, Session, User};
pub use transaction::{
    AsyncProcessResponse, NewTransaction, TransactionFilter, TransactionKind, TransactionPatch,
    TransactionRecord, TransactionStatus,
};
