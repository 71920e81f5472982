//! Applies server-pushed status changes to the local transaction list

use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info};

use super::notification_service::NotificationFeed;
use super::transaction_store::TransactionStore;
use crate::models::{InboundEvent, NotificationEntry, Severity, StatusChange, TransactionStatus};
use crate::utils::short_id;

const SHORT_ID_LEN: usize = 8;

/// Severity shown for a pushed status.
///
/// Anything other than `procesado` is reported as an error, `pendiente`
/// included. Kept as the backend UI does it; see DESIGN.md.
pub fn severity_for(status: TransactionStatus) -> Severity {
    if status.is_processed() {
        Severity::Success
    } else {
        Severity::Error
    }
}

pub fn status_message(change: &StatusChange) -> String {
    format!(
        "Transaccion {}... cambio a: {}",
        short_id(&change.id, SHORT_ID_LEN),
        change.status.as_str().to_uppercase()
    )
}

/// Patch the store and push a notification for one inbound message.
///
/// Returns the notification pushed, or `None` when the message is not a
/// status change. The patch is a no-op for unknown ids, but the notification
/// is still emitted.
pub fn reconcile(
    value: &Value,
    store: &mut TransactionStore,
    feed: &mut NotificationFeed,
    now: Instant,
) -> Option<NotificationEntry> {
    let change = match InboundEvent::from_value(value) {
        InboundEvent::StatusChange(change) => change,
        InboundEvent::Ignored => {
            debug!("Ignoring live message: {}", value);
            return None;
        }
    };

    let applied = store.patch_by_id(&change.to_patch());
    info!(
        "Status change {} -> {} ({})",
        change.id,
        change.status,
        if applied { "applied" } else { "not in list" }
    );

    Some(feed.push(severity_for(change.status), status_message(&change), now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TransactionRecord;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn store_with_a1() -> TransactionStore {
        let mut record = TransactionRecord::provisional("a1", None);
        record.amount = Some(dec!(100));
        let mut store = TransactionStore::new();
        store.replace_all(vec![record]);
        store
    }

    #[test]
    fn test_status_change_end_to_end() {
        let mut store = store_with_a1();
        let mut feed = NotificationFeed::default();
        let now = Instant::now();

        let event = json!({
            "type": "STATUS_CHANGE",
            "data": {"id": "a1", "status": "procesado", "updated_at": "2024-01-01T00:00:01Z"}
        });
        let entry = reconcile(&event, &mut store, &mut feed, now).expect("notification");

        let record = store.get("a1").expect("record");
        assert_eq!(record.status, TransactionStatus::Procesado);
        assert_eq!(record.updated_at, Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 1).unwrap()));
        assert_eq!(record.amount, Some(dec!(100)));

        assert_eq!(feed.visible(now).len(), 1);
        assert_eq!(entry.severity, Severity::Success);
        assert!(entry.message.contains("a1"));
        assert!(entry.message.contains("PROCESADO"));
    }

    #[test]
    fn test_message_truncates_id() {
        let mut store = TransactionStore::new();
        let mut feed = NotificationFeed::default();
        let event = json!({
            "type": "STATUS_CHANGE",
            "data": {"id": "3f1c9a1e-7d2b-4000-8000-000000000001", "status": "fallido", "error_message": "Fondos insuficientes"}
        });

        let entry = reconcile(&event, &mut store, &mut feed, Instant::now()).expect("notification");
        assert_eq!(entry.message, "Transaccion 3f1c9a1e... cambio a: FALLIDO");
        assert_eq!(entry.severity, Severity::Error);
        // unknown id: nothing created
        assert!(store.is_empty());
    }

    #[test]
    fn test_pending_push_is_error_severity() {
        assert_eq!(severity_for(TransactionStatus::Pendiente), Severity::Error);
        assert_eq!(severity_for(TransactionStatus::Fallido), Severity::Error);
        assert_eq!(severity_for(TransactionStatus::Procesado), Severity::Success);
    }

    #[test]
    fn test_duplicate_delivery_is_idempotent_on_store() {
        let mut store = store_with_a1();
        let mut feed = NotificationFeed::default();
        let event = json!({
            "type": "STATUS_CHANGE",
            "data": {"id": "a1", "status": "fallido", "error_message": "rechazada"}
        });

        reconcile(&event, &mut store, &mut feed, Instant::now());
        let once = store.snapshot();
        reconcile(&event, &mut store, &mut feed, Instant::now());

        assert_eq!(*store.snapshot(), *once);
        assert_eq!(store.get("a1").and_then(|r| r.error_message.as_deref()), Some("rechazada"));
    }

    #[test]
    fn test_unrecognized_messages_have_no_effect() {
        let mut store = store_with_a1();
        let mut feed = NotificationFeed::default();
        let version = store.version();

        for event in [json!({"type": "HELLO"}), json!({"data": {"id": "a1"}}), json!(42)] {
            assert!(reconcile(&event, &mut store, &mut feed, Instant::now()).is_none());
        }

        assert_eq!(store.version(), version);
        assert!(feed.is_empty());
    }
}
