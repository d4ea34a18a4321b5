//! Upload request builder
//!
//! Turns user input into a validated plan: either bytes to store at a fresh
//! object path followed by a row insert, or a row insert pointing at an
//! external link. Nothing here talks to the backend.

use crate::error::{LibraryError, Result};
use crate::models::{Category, ContentKind, ContentSource, NewContent, RecordDraft};
use chrono::Utc;
use rand::Rng;

/// Length of the random token of generated object names
pub const TOKEN_LEN: usize = 7;

const TOKEN_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// What has to happen on the backend for a new item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadPlan {
    /// Store `bytes` at `object_path` in the category bucket, then insert a
    /// row pointing at its public URL
    File {
        object_path: String,
        bytes: Vec<u8>,
        file_name: String,
        content_type_header: &'static str,
    },
    /// Insert a row pointing at `url`
    Link { url: String },
}

/// A validated new item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub category: Category,
    pub title: String,
    pub description: Option<String>,
    pub uploader_id: String,
    pub plan: UploadPlan,
}

impl UploadRequest {
    /// Validates `input` for `category`
    ///
    /// Fails with [`LibraryError::Validation`] when the title is blank, no
    /// file was selected, the file extension is not accepted by the
    /// category, or the link is not an absolute URL with a host.
    pub fn build(category: Category, input: NewContent, uploader_id: &str) -> Result<Self> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(LibraryError::Validation(
                "Please fill in all required fields: title is empty".to_string(),
            ));
        }

        let description = input
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        let plan = match input.source {
            ContentSource::LocalFile { file_name, bytes } => {
                if file_name.trim().is_empty() || bytes.is_empty() {
                    return Err(LibraryError::Validation(
                        "Please fill in all required fields: no file selected".to_string(),
                    ));
                }

                let ext = file_extension(&file_name)
                    .map(str::to_ascii_lowercase)
                    .filter(|ext| category.accepts_extension(ext))
                    .ok_or_else(|| {
                        LibraryError::Validation(format!(
                            "{} is not an accepted {} file (accepted: {})",
                            file_name,
                            category,
                            category.accepted_extensions().join(", ")
                        ))
                    })?;

                UploadPlan::File {
                    object_path: format!("{}/{}.{}", uploader_id, unique_suffix(), ext),
                    content_type_header: mime_for_extension(&ext),
                    bytes,
                    file_name,
                }
            }
            ContentSource::ExternalUrl(raw) => {
                validate_link(&raw)?;
                UploadPlan::Link { url: raw }
            }
        };

        Ok(Self {
            category,
            title: title.to_string(),
            description,
            uploader_id: uploader_id.to_string(),
            plan,
        })
    }

    /// Row to insert once the content is reachable at `file_url`
    ///
    /// For links `file_url` is ignored and the link itself is stored.
    pub fn draft(&self, file_url: Option<String>) -> RecordDraft {
        let (file_url, file_name, content_type) = match &self.plan {
            UploadPlan::File { file_name, .. } => (
                file_url.unwrap_or_default(),
                Some(file_name.clone()),
                ContentKind::File,
            ),
            UploadPlan::Link { url } => (url.clone(), None, ContentKind::Url),
        };

        RecordDraft {
            title: self.title.clone(),
            description: self.description.clone(),
            file_url,
            file_name,
            content_type,
            uploaded_by: self.uploader_id.clone(),
        }
    }
}

fn validate_link(raw: &str) -> Result<()> {
    let invalid = || LibraryError::Validation(format!("Invalid URL: {}", raw));

    if raw.trim() != raw || raw.is_empty() {
        return Err(invalid());
    }
    let parsed = url::Url::parse(raw).map_err(|_| invalid())?;
    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(invalid()),
    }
}

/// Extension of `file_name` without the dot, if any
pub fn file_extension(file_name: &str) -> Option<&str> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        None
    } else {
        Some(ext)
    }
}

/// Default title for a file: its name without the last extension
pub fn title_from_file_name(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() && !ext.contains('/') => {
            stem.to_string()
        }
        _ => file_name.to_string(),
    }
}

/// `{epoch_millis}-{token}` used as the object name of uploads
pub fn unique_suffix() -> String {
    let mut rng = rand::rng();
    let token: String = (0..TOKEN_LEN)
        .map(|_| TOKEN_ALPHABET[rng.random_range(0..TOKEN_ALPHABET.len())] as char)
        .collect();
    format!("{}-{}", Utc::now().timestamp_millis(), token)
}

/// MIME type sent with uploaded bytes
pub fn mime_for_extension(ext: &str) -> &'static str {
    match ext {
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "m4a" => "audio/mp4",
        "aac" => "audio/aac",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "pdf" => "application/pdf",
        "mid" | "midi" => "audio/midi",
        "musicxml" => "application/vnd.recordare.musicxml+xml",
        "mxl" => "application/vnd.recordare.musicxml",
        "txt" => "text/plain",
        "rtf" => "application/rtf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        "odt" => "application/vnd.oasis.opendocument.text",
        _ => "application/octet-stream",
    }
}
