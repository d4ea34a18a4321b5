//! Media library controller
//!
//! One [`MediaLibrary`] per category keeps the local list of records in sync
//! with the backend. Every mutation returns a [`LibraryChange`] that is
//! applied to the local list without refetching, and every outcome is
//! reported on the notification channel.

use crate::error::{LibraryError, Result};
use crate::models::{Category, ContentRecord, NewContent};
use crate::notify::Notification;
use crate::orphans::OrphanLedger;
use crate::repository::{BackendStore, ObjectStore, RecordRepository};
use crate::upload::{UploadPlan, UploadRequest};
use choirbackend::BackendClient;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

const NOTIFICATION_CAPACITY: usize = 64;

/// Outcome of a successful mutation
#[derive(Debug, Clone, PartialEq)]
pub enum LibraryChange {
    Inserted(ContentRecord),
    Removed(String),
}

/// Applies `change` to a newest-first list
///
/// Insertion keeps the list sorted by `created_at` descending and replaces
/// any record with the same id. Removing an unknown id is a no-op.
pub fn apply_change(records: &mut Vec<ContentRecord>, change: &LibraryChange) {
    match change {
        LibraryChange::Inserted(record) => {
            records.retain(|r| r.id != record.id);
            let at = records.partition_point(|r| r.created_at >= record.created_at);
            records.insert(at, record.clone());
        }
        LibraryChange::Removed(id) => records.retain(|r| &r.id != id),
    }
}

/// Releases the in-flight mark of an item when dropped
struct InFlight<'a> {
    set: &'a Mutex<HashSet<String>>,
    id: String,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.set
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&self.id);
    }
}

/// Controller of one content category
pub struct MediaLibrary<R, S> {
    category: Category,
    records: Arc<R>,
    store: Arc<S>,
    cache: RwLock<Vec<ContentRecord>>,
    in_flight: Mutex<HashSet<String>>,
    disposed: AtomicBool,
    orphans: OrphanLedger,
    notify_tx: broadcast::Sender<Notification>,
}

impl MediaLibrary<BackendStore, BackendStore> {
    /// Controller backed by the BaaS
    pub fn with_backend(category: Category, client: BackendClient) -> Self {
        let store = Arc::new(BackendStore::new(client));
        Self::new(category, store.clone(), store)
    }
}

impl<R, S> MediaLibrary<R, S>
where
    R: RecordRepository,
    S: ObjectStore,
{
    pub fn new(category: Category, records: Arc<R>, store: Arc<S>) -> Self {
        Self {
            category,
            records,
            store,
            cache: RwLock::new(Vec::new()),
            in_flight: Mutex::new(HashSet::new()),
            disposed: AtomicBool::new(false),
            orphans: OrphanLedger::new(),
            notify_tx: broadcast::channel(NOTIFICATION_CAPACITY).0,
        }
    }

    pub fn category(&self) -> Category {
        self.category
    }

    /// Snapshot of the local list, newest first
    pub fn records(&self) -> Vec<ContentRecord> {
        self.read_cache().clone()
    }

    pub fn get(&self, id: &str) -> Option<ContentRecord> {
        self.read_cache().iter().find(|r| r.id == id).cloned()
    }

    /// Records whose title or description contains `query`, ignoring case
    ///
    /// A blank query returns every record. The local list is not modified.
    pub fn filter(&self, query: &str) -> Vec<ContentRecord> {
        let needle = query.trim().to_lowercase();
        let cache = self.read_cache();
        if needle.is_empty() {
            return cache.clone();
        }
        cache
            .iter()
            .filter(|r| r.matches_lowercase(&needle))
            .cloned()
            .collect()
    }

    /// Receives one notification per completed or failed operation
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notify_tx.subscribe()
    }

    pub fn orphans(&self) -> &OrphanLedger {
        &self.orphans
    }

    /// Detaches the controller from its owner
    ///
    /// Operations still running complete on the backend, but their results
    /// are dropped: no cache update, no notification, `Err(Disposed)`.
    pub fn dispose(&self) {
        if !self.disposed.swap(true, Ordering::SeqCst) {
            debug!("{} library disposed", self.category);
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Replaces the local list with the backend content
    ///
    /// On failure the previous list is kept. Returns the number of records.
    pub async fn refresh(&self) -> Result<usize> {
        self.ensure_live()?;

        match self.records.list(self.category).await {
            Ok(mut rows) => {
                self.ensure_live()?;
                rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                let count = rows.len();
                *self.write_cache() = rows;
                debug!("{}: {} records loaded", self.category, count);
                Ok(count)
            }
            Err(e) => {
                self.ensure_live()?;
                error!("Failed to fetch {}: {}", self.category, e);
                self.notify(Notification::error(self.category, "Failed to load content"));
                Err(LibraryError::Fetch(e.to_string()))
            }
        }
    }

    /// Uploads or links a new item and inserts its record
    ///
    /// When the row insert fails after a successful upload, the uploaded
    /// object is removed again; if that also fails the object path goes to
    /// the orphan ledger.
    pub async fn create(&self, input: NewContent, uploader_id: &str) -> Result<LibraryChange> {
        self.ensure_live()?;

        let mut request = match UploadRequest::build(self.category, input, uploader_id) {
            Ok(request) => request,
            Err(e) => {
                warn!("Rejected new {} item: {}", self.category, e);
                self.notify(Notification::error(self.category, e.to_string()));
                return Err(e);
            }
        };

        let uploaded_path = match &mut request.plan {
            UploadPlan::File {
                object_path,
                bytes,
                content_type_header,
                ..
            } => {
                let bytes = std::mem::take(bytes);
                debug!("{}: uploading {} bytes to {}", self.category, bytes.len(), object_path);

                if let Err(e) = self
                    .store
                    .upload(self.category, object_path.as_str(), bytes, *content_type_header)
                    .await
                {
                    self.ensure_live()?;
                    error!("Upload to {}/{} failed: {}", self.category, object_path, e);
                    self.notify(Notification::error(
                        self.category,
                        format!("Failed to upload content: {}", e),
                    ));
                    return Err(LibraryError::Upload(e.to_string()));
                }
                Some(object_path.clone())
            }
            UploadPlan::Link { .. } => None,
        };

        let file_url = uploaded_path
            .as_deref()
            .map(|path| self.store.public_url(self.category, path));
        let draft = request.draft(file_url);

        match self.records.insert(self.category, &draft).await {
            Ok(record) => {
                self.ensure_live()?;
                info!("{}: added '{}' ({})", self.category, record.title, record.id);
                let change = LibraryChange::Inserted(record);
                self.apply(&change);
                self.notify(Notification::success(
                    self.category,
                    "Content uploaded successfully!",
                ));
                Ok(change)
            }
            Err(e) => {
                error!("Insert into {} failed: {}", self.category, e);
                if let Some(path) = uploaded_path {
                    self.roll_back_upload(path).await;
                }
                self.ensure_live()?;
                self.notify(Notification::error(
                    self.category,
                    format!("Failed to upload content: {}", e),
                ));
                Err(LibraryError::Persistence(e.to_string()))
            }
        }
    }

    /// Deletes an item: its storage object first, then its row
    ///
    /// Storage failures do not stop the deletion; the object path goes to
    /// the orphan ledger. If the row deletion fails the record stays in the
    /// local list.
    pub async fn remove(&self, record: &ContentRecord) -> Result<LibraryChange> {
        self.ensure_live()?;
        let _in_flight = self.begin(&record.id)?;

        if record.is_file() {
            match self.store.object_path(self.category, &record.file_url) {
                Some(path) => self.remove_object(path).await,
                None => warn!(
                    "No storage object in bucket {} behind {}",
                    self.category, record.file_url
                ),
            }
        }

        match self.records.delete(self.category, &record.id).await {
            Ok(()) => {
                self.ensure_live()?;
                info!("{}: deleted '{}' ({})", self.category, record.title, record.id);
                let change = LibraryChange::Removed(record.id.clone());
                self.apply(&change);
                self.notify(Notification::success(self.category, "Content deleted"));
                Ok(change)
            }
            Err(e) => {
                self.ensure_live()?;
                error!("Failed to delete {} row {}: {}", self.category, record.id, e);
                self.notify(Notification::error(
                    self.category,
                    format!("Failed to delete content: {}", e),
                ));
                Err(LibraryError::Persistence(e.to_string()))
            }
        }
    }

    /// Retries the removal of every object in the orphan ledger
    ///
    /// Only paths the storage confirms as removed leave the ledger. Returns
    /// their number.
    pub async fn sweep_orphans(&self) -> Result<usize> {
        self.ensure_live()?;

        let paths = self.orphans.paths();
        if paths.is_empty() {
            return Ok(0);
        }

        match self.store.remove(self.category, &paths).await {
            Ok(removed) => {
                let removed: Vec<String> =
                    paths.into_iter().filter(|p| removed.contains(p)).collect();
                self.orphans.forget(&removed);
                info!(
                    "{}: swept {} orphaned objects, {} pending",
                    self.category,
                    removed.len(),
                    self.orphans.len()
                );
                Ok(removed.len())
            }
            Err(e) => {
                warn!("{}: orphan sweep failed: {}", self.category, e);
                Err(LibraryError::Storage(e.to_string()))
            }
        }
    }

    async fn roll_back_upload(&self, path: String) {
        match self
            .store
            .remove(self.category, std::slice::from_ref(&path))
            .await
        {
            Ok(removed) if removed.contains(&path) => {
                debug!("{}: rolled back upload {}", self.category, path)
            }
            Ok(_) => {
                warn!("Rollback of {}/{} not confirmed by storage", self.category, path);
                self.orphans.record(path, "removal not confirmed");
            }
            Err(e) => {
                warn!("Rollback of {}/{} failed: {}", self.category, path, e);
                self.orphans.record(path, e.to_string());
            }
        }
    }

    /// Removes one stored object; unconfirmed removals go to the ledger
    async fn remove_object(&self, path: String) {
        match self
            .store
            .remove(self.category, std::slice::from_ref(&path))
            .await
        {
            Ok(removed) if removed.contains(&path) => {
                debug!("{}: removed {} from storage", self.category, path)
            }
            Ok(_) => {
                warn!(
                    "Removal of {}/{} not confirmed by storage, keeping it for a later sweep",
                    self.category, path
                );
                self.orphans.record(path, "removal not confirmed");
            }
            Err(e) => {
                warn!(
                    "Failed to remove {}/{} from storage, keeping it for a later sweep: {}",
                    self.category, path, e
                );
                self.orphans.record(path, e.to_string());
            }
        }
    }

    fn begin(&self, id: &str) -> Result<InFlight<'_>> {
        let mut set = self
            .in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !set.insert(id.to_string()) {
            return Err(LibraryError::InFlight(id.to_string()));
        }
        Ok(InFlight {
            set: &self.in_flight,
            id: id.to_string(),
        })
    }

    fn ensure_live(&self) -> Result<()> {
        if self.is_disposed() {
            Err(LibraryError::Disposed)
        } else {
            Ok(())
        }
    }

    fn apply(&self, change: &LibraryChange) {
        apply_change(&mut self.write_cache(), change);
    }

    fn notify(&self, notification: Notification) {
        // No receiver is not an error
        let _ = self.notify_tx.send(notification);
    }

    fn read_cache(&self) -> RwLockReadGuard<'_, Vec<ContentRecord>> {
        self.cache.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_cache(&self) -> RwLockWriteGuard<'_, Vec<ContentRecord>> {
        self.cache.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContentKind;
    use chrono::{TimeZone, Utc};

    fn record(id: &str, secs: i64) -> ContentRecord {
        ContentRecord {
            id: id.to_string(),
            title: format!("Item {}", id),
            description: None,
            file_url: format!("https://example.co/{}", id),
            file_name: None,
            content_type: ContentKind::Url,
            created_at: Utc.timestamp_opt(secs, 0).unwrap(),
            uploaded_by: "u".to_string(),
        }
    }

    fn ids(records: &[ContentRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_insert_keeps_newest_first() {
        let mut records = vec![record("c", 300), record("a", 100)];
        apply_change(&mut records, &LibraryChange::Inserted(record("b", 200)));
        assert_eq!(ids(&records), vec!["c", "b", "a"]);

        apply_change(&mut records, &LibraryChange::Inserted(record("d", 400)));
        apply_change(&mut records, &LibraryChange::Inserted(record("z", 50)));
        assert_eq!(ids(&records), vec!["d", "c", "b", "a", "z"]);
    }

    #[test]
    fn test_insert_replaces_same_id() {
        let mut records = vec![record("a", 100)];
        apply_change(&mut records, &LibraryChange::Inserted(record("a", 100)));
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_remove() {
        let mut records = vec![record("b", 200), record("a", 100)];
        apply_change(&mut records, &LibraryChange::Removed("b".into()));
        assert_eq!(ids(&records), vec!["a"]);

        apply_change(&mut records, &LibraryChange::Removed("missing".into()));
        assert_eq!(ids(&records), vec!["a"]);
    }
}
