//! Live-channel event models

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::transaction::{TransactionPatch, TransactionStatus};
use crate::utils::time;

pub const STATUS_CHANGE: &str = "STATUS_CHANGE";

/// Payload of a `STATUS_CHANGE` push
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StatusChange {
    pub id: String,
    pub status: TransactionStatus,
    #[serde(default, with = "time::optional")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, with = "time::optional")]
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl StatusChange {
    /// Partial record carrying only the fields present in the push
    pub fn to_patch(&self) -> TransactionPatch {
        TransactionPatch {
            id: self.id.clone(),
            status: Some(self.status),
            updated_at: self.updated_at,
            processed_at: self.processed_at,
            error_message: self.error_message.clone(),
        }
    }
}

/// A decoded message from the live channel
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    StatusChange(StatusChange),
    Ignored,
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

impl InboundEvent {
    /// Classify an already JSON-decoded message. Anything that is not a
    /// well-formed status change is `Ignored`.
    pub fn from_value(value: &Value) -> Self {
        let envelope = match Envelope::deserialize(value) {
            Ok(envelope) => envelope,
            Err(_) => return InboundEvent::Ignored,
        };

        match (envelope.kind.as_deref(), envelope.data) {
            (Some(STATUS_CHANGE), Some(data)) if !data.is_null() => {
                match serde_json::from_value::<StatusChange>(data) {
                    Ok(change) => InboundEvent::StatusChange(change),
                    Err(e) => {
                        tracing::debug!("Dropping malformed status change: {}", e);
                        InboundEvent::Ignored
                    }
                }
            }
            _ => InboundEvent::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_change_decodes() {
        let value = json!({
            "type": "STATUS_CHANGE",
            "data": {
                "id": "a1",
                "user_id": "u-1",
                "status": "procesado",
                "monto": 100.0,
                "updated_at": "2024-01-01T00:00:01Z",
                "processed_at": null,
                "error_message": null
            }
        });

        match InboundEvent::from_value(&value) {
            InboundEvent::StatusChange(change) => {
                assert_eq!(change.id, "a1");
                assert_eq!(change.status, TransactionStatus::Procesado);
                let patch = change.to_patch();
                assert!(patch.updated_at.is_some());
                assert!(patch.processed_at.is_none());
                assert!(patch.error_message.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_other_shapes_are_ignored() {
        for value in [
            json!({"type": "HELLO", "data": {}}),
            json!({"type": "STATUS_CHANGE"}),
            json!({"type": "STATUS_CHANGE", "data": null}),
            json!({"type": "STATUS_CHANGE", "data": {"id": "a1", "status": "unknown"}}),
            json!([1, 2, 3]),
            json!("pong"),
        ] {
            assert_eq!(InboundEvent::from_value(&value), InboundEvent::Ignored);
        }
    }
}
