//! Self-expiring notification queue
//!
//! Entries live for a fixed TTL. Expiry is enforced twice: `visible()` never
//! returns an entry past its deadline, and the runtime schedules a dismiss
//! for each push. Both removal paths tolerate an entry that is already gone.

use chrono::Utc;
use std::time::{Duration, Instant};

use crate::models::{NotificationEntry, Severity};

#[derive(Debug)]
pub struct NotificationFeed {
    entries: Vec<NotificationEntry>,
    ttl: Duration,
    last_id: u64,
}

impl NotificationFeed {
    pub const DEFAULT_TTL: Duration = Duration::from_millis(5000);

    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Vec::new(),
            ttl,
            last_id: 0,
        }
    }

    /// Append a notification that expires `ttl` after `now`
    pub fn push(&mut self, severity: Severity, message: impl Into<String>, now: Instant) -> NotificationEntry {
        let entry = NotificationEntry {
            id: self.next_id(),
            severity,
            message: message.into(),
            created_at: Utc::now(),
            expires_at: now + self.ttl,
        };
        self.entries.push(entry.clone());
        entry
    }

    /// Remove by id. Returns whether anything was removed.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.id != id);
        self.entries.len() != before
    }

    /// Drop every entry whose deadline has passed
    pub fn expire(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|e| !e.is_expired(now));
        before - self.entries.len()
    }

    /// Live entries, oldest first
    pub fn visible(&self, now: Instant) -> Vec<&NotificationEntry> {
        self.entries.iter().filter(|e| !e.is_expired(now)).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Millisecond timestamp, bumped past the previous id on collisions
    fn next_id(&mut self) -> u64 {
        let now_ms = Utc::now().timestamp_millis().max(0) as u64;
        self.last_id = now_ms.max(self.last_id + 1);
        self.last_id
    }
}

impl Default for NotificationFeed {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TTL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_unique_under_rapid_pushes() {
        let mut feed = NotificationFeed::default();
        let now = Instant::now();

        let ids: Vec<u64> = (0..100)
            .map(|i| feed.push(Severity::Info, format!("n{}", i), now).id)
            .collect();

        assert!(ids.windows(2).all(|w| w[1] > w[0]));
        assert_eq!(feed.len(), 100);
    }

    #[test]
    fn test_entry_visible_until_ttl() {
        let mut feed = NotificationFeed::default();
        let t = Instant::now();
        let entry = feed.push(Severity::Success, "ok", t);

        assert_eq!(feed.visible(t).len(), 1);
        assert_eq!(feed.visible(t + Duration::from_millis(4999)).len(), 1);
        assert!(feed.visible(t + Duration::from_millis(5000)).is_empty());
        assert!(feed.visible(t + Duration::from_secs(60)).is_empty());

        assert_eq!(feed.expire(t + Duration::from_millis(5000)), 1);
        assert!(!feed.dismiss(entry.id));
    }

    #[test]
    fn test_dismiss_twice_is_harmless() {
        let mut feed = NotificationFeed::default();
        let now = Instant::now();
        let a = feed.push(Severity::Error, "a", now);
        let b = feed.push(Severity::Warning, "b", now);

        assert!(feed.dismiss(a.id));
        assert!(!feed.dismiss(a.id));

        let remaining: Vec<u64> = feed.visible(now).iter().map(|e| e.id).collect();
        assert_eq!(remaining, vec![b.id]);
    }

    #[test]
    fn test_order_is_append() {
        let mut feed = NotificationFeed::new(Duration::from_secs(1));
        let now = Instant::now();
        feed.push(Severity::Info, "first", now);
        feed.push(Severity::Info, "second", now);

        let messages: Vec<&str> = feed.visible(now).iter().map(|e| e.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second"]);
    }
}
