pub mod client;
pub mod error;

pub use client::TransactionApiClient;
pub use error::ApiError;
