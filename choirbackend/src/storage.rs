//! Object storage buckets
//!
//! Objects live under `/storage/v1/object/{bucket}/{path}`. Public buckets
//! serve them from `/storage/v1/object/public/{bucket}/{path}`, which is the
//! URL stored in content records.

use crate::client::BackendClient;
use crate::error::Result;
use crate::models::{RemovedObject, UploadedObject};
use reqwest::Method;
use serde_json::json;
use tracing::{debug, info};

/// Content type used when the caller does not know the MIME type
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Handle on one storage bucket
#[derive(Debug, Clone)]
pub struct Bucket {
    client: BackendClient,
    name: String,
}

impl Bucket {
    pub(crate) fn new(client: BackendClient, name: impl Into<String>) -> Self {
        Self {
            client,
            name: name.into(),
        }
    }

    /// Bucket name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Uploads `bytes` at `path`
    ///
    /// With `upsert` an existing object at the same path is replaced,
    /// otherwise the backend answers 409 and [`crate::Error::Conflict`] is
    /// returned.
    pub async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
        upsert: bool,
    ) -> Result<UploadedObject> {
        let size = bytes.len();
        let request = self
            .client
            .request(
                Method::POST,
                &format!("/storage/v1/object/{}/{}", self.name, path),
            )
            .header(
                reqwest::header::CONTENT_TYPE,
                content_type.unwrap_or(DEFAULT_CONTENT_TYPE),
            )
            .header("x-upsert", if upsert { "true" } else { "false" })
            .body(bytes);

        let uploaded: UploadedObject = self.client.send_json(request).await?;
        info!("Uploaded {} bytes to {}/{}", size, self.name, path);
        Ok(uploaded)
    }

    /// Public URL of the object at `path`
    ///
    /// Pure string construction: no request is made and the object may not
    /// exist.
    pub fn public_url(&self, path: &str) -> String {
        self.client.url(&format!(
            "/storage/v1/object/public/{}/{}",
            self.name,
            path.trim_start_matches('/')
        ))
    }

    /// Recovers the object path from a public URL of this bucket
    ///
    /// Returns `None` when the URL does not point into this bucket (external
    /// links, other buckets).
    pub fn object_path_from_public_url(&self, public_url: &str) -> Option<String> {
        let marker = format!("/storage/v1/object/public/{}/", self.name);
        let start = public_url.find(&marker)? + marker.len();
        let rest = &public_url[start..];
        let path = rest.split(['?', '#']).next().unwrap_or(rest);

        if path.is_empty() {
            None
        } else {
            Some(path.to_string())
        }
    }

    /// Removes the objects at `paths`
    ///
    /// Returns the objects the backend actually removed. Paths that did not
    /// exist, or that the session may not delete, are absent from the result
    /// and the request still succeeds.
    pub async fn remove(&self, paths: &[String]) -> Result<Vec<RemovedObject>> {
        if paths.is_empty() {
            return Ok(Vec::new());
        }

        let request = self
            .client
            .request(Method::DELETE, &format!("/storage/v1/object/{}", self.name))
            .json(&json!({ "prefixes": paths }));

        let removed: Vec<RemovedObject> = self.client.send_json(request).await?;
        debug!(
            "{}: removed {}/{} objects",
            self.name,
            removed.len(),
            paths.len()
        );
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bucket() -> Bucket {
        BackendClient::builder()
            .base_url("https://project.example.co")
            .build()
            .unwrap()
            .bucket("music")
    }

    #[test]
    fn test_public_url() {
        assert_eq!(
            bucket().public_url("user-1/1700000000000-abc1234.mp3"),
            "https://project.example.co/storage/v1/object/public/music/user-1/1700000000000-abc1234.mp3"
        );
    }

    #[test]
    fn test_object_path_round_trip() {
        let bucket = bucket();
        let url = bucket.public_url("user-1/take.mp3");
        assert_eq!(
            bucket.object_path_from_public_url(&url).as_deref(),
            Some("user-1/take.mp3")
        );
    }

    #[test]
    fn test_object_path_strips_query() {
        assert_eq!(
            bucket()
                .object_path_from_public_url(
                    "https://cdn.example.co/storage/v1/object/public/music/u/a.mp3?download=1"
                )
                .as_deref(),
            Some("u/a.mp3")
        );
    }

    #[test]
    fn test_object_path_other_bucket_or_external() {
        let bucket = bucket();
        assert!(bucket
            .object_path_from_public_url(
                "https://project.example.co/storage/v1/object/public/videos/u/a.mp4"
            )
            .is_none());
        assert!(bucket
            .object_path_from_public_url("https://youtube.com/watch?v=xyz")
            .is_none());
        assert!(bucket
            .object_path_from_public_url(
                "https://project.example.co/storage/v1/object/public/music/"
            )
            .is_none());
    }
}
