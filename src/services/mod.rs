//! Client-side state and the operations that change it
//!
//! The stores and the connection machine are plain synchronous types; the
//! `*_service` modules holding async functions drive them from commands and
//! background tasks.

pub mod assistant_service;
pub mod auth_service;
pub mod connection_service;
pub mod notification_service;
pub mod reconciliation_service;
pub mod session_service;
pub mod stream_service;
pub mod transaction_service;
pub mod transaction_store;
