//! Client-side transaction list
//!
//! Ordered newest first. Readers get an `Arc` snapshot; every mutation goes
//! through `Arc::make_mut`, so a snapshot taken before a mutation never sees
//! it.

use std::sync::Arc;
use tracing::debug;

use crate::models::{TransactionPatch, TransactionRecord};

#[derive(Debug, Default)]
pub struct TransactionStore {
    records: Arc<Vec<TransactionRecord>>,
    version: u64,
    loading: bool,
    last_error: Option<String>,
}

impl TransactionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a full fetch; provisional records not in `records` are dropped
    pub fn replace_all(&mut self, records: Vec<TransactionRecord>) {
        self.records = Arc::new(records);
        self.loading = false;
        self.last_error = None;
        self.bump();
    }

    /// Prepend a record. Duplicate ids are not checked here.
    pub fn insert_newest(&mut self, record: TransactionRecord) {
        Arc::make_mut(&mut self.records).insert(0, record);
        self.bump();
    }

    /// Merge `patch` into the record with the same id, in place.
    ///
    /// Returns `false` and leaves the store untouched when no record has that
    /// id, e.g. a push that beat the optimistic insert or refresh.
    pub fn patch_by_id(&mut self, patch: &TransactionPatch) -> bool {
        let Some(index) = self.records.iter().position(|r| r.id == patch.id) else {
            debug!("Patch for unknown transaction {} ignored", patch.id);
            return false;
        };

        Arc::make_mut(&mut self.records)[index].apply(patch);
        self.bump();
        true
    }

    /// Current contents; cheap to clone and never mutated afterwards
    pub fn snapshot(&self) -> Arc<Vec<TransactionRecord>> {
        Arc::clone(&self.records)
    }

    pub fn get(&self, id: &str) -> Option<&TransactionRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Incremented on every effective mutation
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn set_loading(&mut self) {
        self.loading = true;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Record a failed fetch; contents are kept
    pub fn set_error(&mut self, message: String) {
        self.loading = false;
        self.last_error = Some(message);
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Drop everything, used on logout
    pub fn clear(&mut self) {
        self.replace_all(Vec::new());
    }

    fn bump(&mut self) {
        self.version += 1;
    }
}
