//! Content model: categories, records and new-content input

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Content categories of the portal
///
/// Each category has a table and a public storage bucket of the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Music,
    Scores,
    Videos,
    Images,
    Documents,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Music,
        Category::Scores,
        Category::Videos,
        Category::Images,
        Category::Documents,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Music => "music",
            Category::Scores => "scores",
            Category::Videos => "videos",
            Category::Images => "images",
            Category::Documents => "documents",
        }
    }

    /// Record-store table holding the rows of this category
    pub fn table(self) -> &'static str {
        self.as_str()
    }

    /// Storage bucket holding the files of this category
    pub fn bucket(self) -> &'static str {
        self.as_str()
    }

    /// Capitalized name for display
    pub fn label(self) -> &'static str {
        match self {
            Category::Music => "Music",
            Category::Scores => "Scores",
            Category::Videos => "Videos",
            Category::Images => "Images",
            Category::Documents => "Documents",
        }
    }

    /// One-line summary shown next to the category name
    pub fn summary(self) -> &'static str {
        match self {
            Category::Music => "Audio files and recordings",
            Category::Scores => "Sheet music and arrangements",
            Category::Videos => "Rehearsals and performances",
            Category::Images => "Photos and memories",
            Category::Documents => "Schedules and guidelines",
        }
    }

    /// Lower-case file extensions accepted for upload
    pub fn accepted_extensions(self) -> &'static [&'static str] {
        match self {
            Category::Music => &["mp3", "wav", "m4a", "aac", "ogg", "flac"],
            Category::Scores => &["pdf", "musicxml", "mxl", "mid", "midi", "png", "jpg", "jpeg"],
            Category::Videos => &["mp4", "webm", "mov", "m4v", "mkv"],
            Category::Images => &["jpg", "jpeg", "png", "gif", "webp", "svg"],
            Category::Documents => &[
                "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx", "txt", "odt", "rtf",
            ],
        }
    }

    /// Case-insensitive check of an extension (without the dot)
    pub fn accepts_extension(self, ext: &str) -> bool {
        let ext = ext.to_ascii_lowercase();
        self.accepted_extensions().contains(&ext.as_str())
    }

    /// Music and videos go through the playback session
    pub fn is_playable(self) -> bool {
        matches!(self, Category::Music | Category::Videos)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| {
                format!(
                    "unknown category '{}' (expected one of: music, scores, videos, images, documents)",
                    s
                )
            })
    }
}

/// How a record's `file_url` must be interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// Object in the category bucket
    #[default]
    File,
    /// Arbitrary external link
    Url,
}

/// One row of a category table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub file_url: String,
    #[serde(default)]
    pub file_name: Option<String>,
    /// Absent on rows created before links existed
    #[serde(default)]
    pub content_type: ContentKind,
    pub created_at: DateTime<Utc>,
    pub uploaded_by: String,
}

impl ContentRecord {
    pub fn is_file(&self) -> bool {
        self.content_type == ContentKind::File
    }

    /// Case-insensitive substring match on title and description
    ///
    /// `needle` must already be lower-cased.
    pub(crate) fn matches_lowercase(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(needle))
    }
}

/// Where the content of a new item comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    /// A local file to upload to the category bucket
    LocalFile { file_name: String, bytes: Vec<u8> },
    /// An external link stored as-is
    ExternalUrl(String),
}

/// User input for a new item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContent {
    pub title: String,
    pub description: Option<String>,
    pub source: ContentSource,
}

impl NewContent {
    pub fn file(title: impl Into<String>, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            title: title.into(),
            description: None,
            source: ContentSource::LocalFile {
                file_name: file_name.into(),
                bytes,
            },
        }
    }

    pub fn link(title: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            source: ContentSource::ExternalUrl(url.into()),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Row payload sent to the record store on insert
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordDraft {
    pub title: String,
    pub description: Option<String>,
    pub file_url: String,
    pub file_name: Option<String>,
    pub content_type: ContentKind,
    pub uploaded_by: String,
}
