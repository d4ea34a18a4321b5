//! Where a record plays

use crate::state::Track;
use choirlibrary::{Category, ContentRecord};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackTarget {
    /// Stored file, played by the session
    Local(Track),
    /// External link, opened by the caller (browser, video site)
    External(String),
    /// Category without playback (scores, images, documents)
    NotPlayable,
}

impl PlaybackTarget {
    pub fn for_record(category: Category, record: &ContentRecord) -> Self {
        if record.is_file() {
            if category.is_playable() {
                PlaybackTarget::Local(Track::from(record))
            } else {
                PlaybackTarget::NotPlayable
            }
        } else {
            PlaybackTarget::External(record.file_url.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use choirlibrary::ContentKind;

    fn record(kind: ContentKind, url: &str) -> ContentRecord {
        ContentRecord {
            id: "r".into(),
            title: "Concert Clip".into(),
            description: None,
            file_url: url.into(),
            file_name: (kind == ContentKind::File).then(|| "clip.mp4".to_string()),
            content_type: kind,
            created_at: Utc::now(),
            uploaded_by: "u".into(),
        }
    }

    #[test]
    fn test_targets() {
        let file = record(ContentKind::File, "https://x/videos/u/1-a.mp4");
        assert!(matches!(
            PlaybackTarget::for_record(Category::Videos, &file),
            PlaybackTarget::Local(track) if track.file_name.as_deref() == Some("clip.mp4")
        ));
        assert_eq!(
            PlaybackTarget::for_record(Category::Documents, &file),
            PlaybackTarget::NotPlayable
        );

        let link = record(ContentKind::Url, "https://youtube.com/watch?v=xyz");
        assert_eq!(
            PlaybackTarget::for_record(Category::Videos, &link),
            PlaybackTarget::External("https://youtube.com/watch?v=xyz".into())
        );
    }
}
