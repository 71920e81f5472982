//! Transaction models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::time;

/// Lifecycle status as reported by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pendiente,
    Procesado,
    Fallido,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pendiente => "pendiente",
            TransactionStatus::Procesado => "procesado",
            TransactionStatus::Fallido => "fallido",
        }
    }

    /// Only `procesado` is terminal-successful
    pub fn is_processed(&self) -> bool {
        matches!(self, TransactionStatus::Procesado)
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pendiente" | "pending" => Some(TransactionStatus::Pendiente),
            "procesado" | "processed" => Some(TransactionStatus::Procesado),
            "fallido" | "failed" => Some(TransactionStatus::Fallido),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Deposito,
    Retiro,
    Transferencia,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposito => "deposito",
            TransactionKind::Retiro => "retiro",
            TransactionKind::Transferencia => "transferencia",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "deposito" | "deposit" => Some(TransactionKind::Deposito),
            "retiro" | "withdrawal" => Some(TransactionKind::Retiro),
            "transferencia" | "transfer" => Some(TransactionKind::Transferencia),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One transaction as known to the client.
///
/// Optional fields are absent while a record is provisional, i.e. inserted
/// optimistically after a queued create and not yet refreshed from the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idempotency_key: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(rename = "monto", default)]
    pub amount: Option<Decimal>,
    #[serde(rename = "tipo", default)]
    pub kind: Option<TransactionKind>,
    pub status: TransactionStatus,
    #[serde(default, with = "time::optional")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "time::optional")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, with = "time::optional")]
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub celery_task_id: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl TransactionRecord {
    /// Record for a create that was queued but not processed yet
    pub fn provisional(id: impl Into<String>, task_id: Option<String>) -> Self {
        Self {
            id: id.into(),
            idempotency_key: None,
            user_id: None,
            amount: None,
            kind: None,
            status: TransactionStatus::Pendiente,
            created_at: None,
            updated_at: None,
            processed_at: None,
            celery_task_id: task_id,
            error_message: None,
        }
    }

    /// Client-issued key used when the server has not returned an id yet
    pub fn placeholder_id() -> String {
        format!("local-{}", uuid::Uuid::new_v4())
    }

    pub fn is_placeholder(&self) -> bool {
        self.id.starts_with("local-")
    }

    /// Overlay the fields present in `patch`; absent fields keep their value
    pub fn apply(&mut self, patch: &TransactionPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(updated_at) = patch.updated_at {
            self.updated_at = Some(updated_at);
        }
        if let Some(processed_at) = patch.processed_at {
            self.processed_at = Some(processed_at);
        }
        if let Some(error_message) = &patch.error_message {
            self.error_message = Some(error_message.clone());
        }
    }
}

/// Partial update keyed by transaction id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransactionPatch {
    pub id: String,
    pub status: Option<TransactionStatus>,
    pub updated_at: Option<DateTime<Utc>>,
    pub processed_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl TransactionPatch {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn status(mut self, status: TransactionStatus) -> Self {
        self.status = Some(status);
        self
    }
}

/// Body of both create endpoints
#[derive(Debug, Clone, Serialize)]
pub struct NewTransaction {
    pub user_id: String,
    #[serde(rename = "monto")]
    pub amount: Decimal,
    #[serde(rename = "tipo")]
    pub kind: TransactionKind,
}

/// Response of the queued create endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct AsyncProcessResponse {
    #[serde(default)]
    pub transaction_id: Option<String>,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub status: Option<TransactionStatus>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Query filters for the list endpoint; unset values are not sent
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub user_id: Option<String>,
    pub status: Option<TransactionStatus>,
    pub skip: Option<u32>,
    pub limit: Option<u32>,
}

impl TransactionFilter {
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(user_id) = self.user_id.as_ref().filter(|u| !u.is_empty()) {
            params.push(("user_id", user_id.clone()));
        }
        if let Some(status) = self.status {
            params.push(("tx_status", status.as_str().to_string()));
        }
        if let Some(skip) = self.skip.filter(|s| *s > 0) {
            params.push(("skip", skip.to_string()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        params
    }
}
