//! Wire models returned by the backend services

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Authenticated user as returned by `/auth/v1/user`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    /// Free-form metadata attached at sign-up or through `PUT /auth/v1/user`
    #[serde(default)]
    pub user_metadata: Map<String, Value>,
}

impl AuthUser {
    /// Reads a string entry of the user metadata
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.user_metadata
            .get(key)
            .and_then(|v| v.as_str())
            .filter(|s| !s.trim().is_empty())
    }

    /// `full_name` from the user metadata
    pub fn full_name(&self) -> Option<&str> {
        self.metadata_str("full_name")
    }
}

/// Response of a successful storage upload
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadedObject {
    /// `{bucket}/{path}`
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Id", default)]
    pub id: Option<String>,
}

/// One entry of the storage removal response
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemovedObject {
    pub name: String,
    #[serde(default)]
    pub bucket_id: Option<String>,
}
