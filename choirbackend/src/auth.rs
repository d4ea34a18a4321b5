//! Auth service: the user bound to the session token

use crate::client::BackendClient;
use crate::error::{Error, Result};
use crate::models::AuthUser;
use reqwest::Method;
use serde_json::{json, Map, Value};
use tracing::info;

/// Handle on the `/auth/v1` endpoints
#[derive(Debug, Clone)]
pub struct Auth {
    client: BackendClient,
}

impl Auth {
    pub(crate) fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Returns the user owning the session token
    ///
    /// Fails with [`Error::NotAuthenticated`] without calling the backend
    /// when no token is configured.
    pub async fn current_user(&self) -> Result<AuthUser> {
        if !self.client.has_session() {
            return Err(Error::NotAuthenticated);
        }

        let request = self.client.request(Method::GET, "/auth/v1/user");
        self.client.send_json(request).await
    }

    /// Merges `data` into the user metadata and returns the updated user
    pub async fn update_user_data(&self, data: Map<String, Value>) -> Result<AuthUser> {
        if !self.client.has_session() {
            return Err(Error::NotAuthenticated);
        }

        let request = self
            .client
            .request(Method::PUT, "/auth/v1/user")
            .json(&json!({ "data": data }));

        let user: AuthUser = self.client.send_json(request).await?;
        info!("Updated metadata of user {}", user.id);
        Ok(user)
    }
}
