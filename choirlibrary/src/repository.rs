//! Persistence seams of the media library
//!
//! The controller only sees these two traits. [`BackendStore`] implements
//! both over `choirbackend`; tests use in-memory fakes.

use crate::models::{Category, ContentRecord, RecordDraft};
use async_trait::async_trait;
use choirbackend::{BackendClient, Order};
use tracing::debug;

pub use choirbackend::{Error as BackendError, Result as BackendResult};

/// Rows of the category tables
#[async_trait]
pub trait RecordRepository: Send + Sync {
    /// Every record of `category`, newest first
    async fn list(&self, category: Category) -> BackendResult<Vec<ContentRecord>>;

    /// Inserts a row and returns it with its backend-assigned id and timestamp
    async fn insert(&self, category: Category, draft: &RecordDraft) -> BackendResult<ContentRecord>;

    async fn delete(&self, category: Category, id: &str) -> BackendResult<()>;
}

/// Files of the category buckets
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(
        &self,
        category: Category,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> BackendResult<()>;

    /// Public URL of an object (no request is made)
    fn public_url(&self, category: Category, path: &str) -> String;

    /// Object path behind a public URL of the category bucket
    fn object_path(&self, category: Category, public_url: &str) -> Option<String>;

    /// Removes the objects at `paths` and returns the paths actually removed
    ///
    /// A path missing from the result may still be stored.
    async fn remove(&self, category: Category, paths: &[String]) -> BackendResult<Vec<String>>;
}

/// Backend implementation of both repository traits
#[derive(Debug, Clone)]
pub struct BackendStore {
    client: BackendClient,
}

impl BackendStore {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RecordRepository for BackendStore {
    async fn list(&self, category: Category) -> BackendResult<Vec<ContentRecord>> {
        self.client
            .table(category.table())
            .list_ordered("created_at", Order::Descending)
            .await
    }

    async fn insert(&self, category: Category, draft: &RecordDraft) -> BackendResult<ContentRecord> {
        self.client.table(category.table()).insert(draft).await
    }

    async fn delete(&self, category: Category, id: &str) -> BackendResult<()> {
        self.client.table(category.table()).delete_eq("id", id).await
    }
}

#[async_trait]
impl ObjectStore for BackendStore {
    async fn upload(
        &self,
        category: Category,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> BackendResult<()> {
        self.client
            .bucket(category.bucket())
            .upload(path, bytes, Some(content_type), false)
            .await?;
        Ok(())
    }

    fn public_url(&self, category: Category, path: &str) -> String {
        self.client.bucket(category.bucket()).public_url(path)
    }

    fn object_path(&self, category: Category, public_url: &str) -> Option<String> {
        self.client
            .bucket(category.bucket())
            .object_path_from_public_url(public_url)
    }

    async fn remove(&self, category: Category, paths: &[String]) -> BackendResult<Vec<String>> {
        let removed: Vec<String> = self
            .client
            .bucket(category.bucket())
            .remove(paths)
            .await?
            .into_iter()
            .map(|object| object.name)
            .collect();
        if removed.len() < paths.len() {
            debug!(
                "{}: {} of {} objects not confirmed removed",
                category,
                paths.len() - removed.len(),
                paths.len()
            );
        }
        Ok(removed)
    }
}
