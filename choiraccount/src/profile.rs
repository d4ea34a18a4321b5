//! Member profile
//!
//! The display name is kept in two places: the auth user metadata
//! (`full_name`) and the `profiles` row of the user. Both are updated
//! together. Avatars are stored in the public `avatars` bucket, one object
//! per user.

use crate::error::{AccountError, Result};
use choirbackend::{AuthUser, BackendClient};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::info;

const PROFILES_TABLE: &str = "profiles";
const AVATARS_BUCKET: &str = "avatars";

/// Image types accepted as avatar
pub const AVATAR_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// One row of the `profiles` table
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Profile {
    pub user_id: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

pub struct ProfileService {
    client: BackendClient,
}

impl ProfileService {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// The `profiles` row of `user_id`, if any
    pub async fn fetch(&self, user_id: &str) -> Result<Option<Profile>> {
        let rows: Vec<Profile> = self
            .client
            .table(PROFILES_TABLE)
            .select_eq("user_id", user_id)
            .await?;
        Ok(rows.into_iter().next())
    }

    /// Sets the display name in the auth metadata, then in the profile row
    ///
    /// Returns the updated auth user.
    pub async fn update_full_name(&self, user: &AuthUser, full_name: &str) -> Result<AuthUser> {
        let full_name = full_name.trim();
        if full_name.is_empty() {
            return Err(AccountError::Validation("Full name is empty".to_string()));
        }

        let mut data = Map::new();
        data.insert("full_name".to_string(), Value::String(full_name.to_string()));
        let updated = self.client.auth().update_user_data(data).await?;

        self.client
            .table(PROFILES_TABLE)
            .update_eq("user_id", &user.id, &json!({ "full_name": full_name }))
            .await?;

        info!("Profile of {} updated", user.id);
        Ok(updated)
    }

    /// Stores `bytes` as the avatar of `user_id` and returns its public URL
    ///
    /// The object lives at `{user_id}/avatar.{ext}` and replaces any previous
    /// avatar with the same extension.
    pub async fn upload_avatar(&self, user_id: &str, file_name: &str, bytes: Vec<u8>) -> Result<String> {
        let ext = avatar_extension(file_name).ok_or_else(|| {
            AccountError::Validation(format!(
                "{} is not an accepted image (accepted: {})",
                file_name,
                AVATAR_EXTENSIONS.join(", ")
            ))
        })?;
        if bytes.is_empty() {
            return Err(AccountError::Validation(format!("{} is empty", file_name)));
        }

        let path = format!("{}/avatar.{}", user_id, ext);
        let bucket = self.client.bucket(AVATARS_BUCKET);
        bucket
            .upload(&path, bytes, Some(avatar_mime(&ext)), true)
            .await?;

        let url = bucket.public_url(&path);
        self.client
            .table(PROFILES_TABLE)
            .update_eq("user_id", user_id, &json!({ "avatar_url": url }))
            .await?;

        info!("Avatar of {} stored at {}", user_id, path);
        Ok(url)
    }
}

fn avatar_extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    (!stem.is_empty() && AVATAR_EXTENSIONS.contains(&ext.as_str())).then_some(ext)
}

fn avatar_mime(ext: &str) -> &'static str {
    match ext {
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "image/jpeg",
    }
}

/// Name shown in greetings: full name, else the local part of the e-mail,
/// else "Member"
pub fn display_name(full_name: Option<&str>, email: Option<&str>) -> String {
    if let Some(name) = full_name.map(str::trim).filter(|n| !n.is_empty()) {
        return name.to_string();
    }
    email
        .and_then(|e| e.split('@').next())
        .filter(|local| !local.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| "Member".to_string())
}

/// Letter shown in the avatar placeholder: first letter of the name, else of
/// the e-mail, else "V"
pub fn display_initial(full_name: Option<&str>, email: Option<&str>) -> String {
    [full_name, email]
        .into_iter()
        .flatten()
        .find_map(|s| s.trim().chars().next())
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_else(|| "V".to_string())
}
