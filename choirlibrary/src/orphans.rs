//! Orphan ledger
//!
//! Storage objects whose removal failed while their row was deleted (or
//! whose row was never inserted). The ledger lives in memory only;
//! [`crate::MediaLibrary::sweep_orphans`] retries the removals.

use chrono::{DateTime, Utc};
use std::sync::Mutex;

/// One storage object left behind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrphanEntry {
    pub path: String,
    pub reason: String,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct OrphanLedger {
    entries: Mutex<Vec<OrphanEntry>>,
}

impl OrphanLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<OrphanEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Records `path`; a path already present keeps its first entry
    pub fn record(&self, path: impl Into<String>, reason: impl Into<String>) {
        let path = path.into();
        let mut entries = self.lock();
        if entries.iter().any(|e| e.path == path) {
            return;
        }
        entries.push(OrphanEntry {
            path,
            reason: reason.into(),
            recorded_at: Utc::now(),
        });
    }

    pub fn entries(&self) -> Vec<OrphanEntry> {
        self.lock().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.lock().iter().map(|e| e.path.clone()).collect()
    }

    /// Drops the entries whose path is in `paths`
    pub fn forget(&self, paths: &[String]) {
        self.lock().retain(|e| !paths.contains(&e.path));
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_forget() {
        let ledger = OrphanLedger::new();
        ledger.record("u/a.mp3", "timeout");
        ledger.record("u/b.mp3", "timeout");
        ledger.record("u/a.mp3", "second failure");

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.entries()[0].reason, "timeout");

        ledger.forget(&["u/a.mp3".to_string()]);
        assert_eq!(ledger.paths(), vec!["u/b.mp3".to_string()]);

        ledger.forget(&ledger.paths());
        assert!(ledger.is_empty());
    }
}
