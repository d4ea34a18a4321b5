//! Observable state of the playback session

use crate::format::{format_time, progress_percent};
use choirlibrary::ContentRecord;

/// What the session needs to know about a playable record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub file_url: String,
    pub file_name: Option<String>,
}

impl Track {
    /// Second line of the mini player
    pub fn subtitle(&self) -> &str {
        self.description
            .as_deref()
            .filter(|d| !d.is_empty())
            .or(self.file_name.as_deref().filter(|n| !n.is_empty()))
            .unwrap_or("Now Playing")
    }
}

impl From<&ContentRecord> for Track {
    fn from(record: &ContentRecord) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            description: record.description.clone(),
            file_url: record.file_url.clone(),
            file_name: record.file_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// No track loaded
    #[default]
    Idle,
    /// Track loaded, not playing
    Paused,
    /// Track loaded and playing
    Playing,
}

/// Snapshot published on every change of the session
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlayerSnapshot {
    pub state: PlaybackState,
    pub track: Option<Track>,
    /// Seconds
    pub current_time: f64,
    /// Seconds, 0 until the element reports metadata
    pub duration: f64,
}

impl PlayerSnapshot {
    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn is_idle(&self) -> bool {
        self.state == PlaybackState::Idle
    }

    pub fn progress_percent(&self) -> f64 {
        progress_percent(self.current_time, self.duration)
    }

    /// `m:ss / m:ss` line of the mini player
    pub fn time_line(&self) -> String {
        format!(
            "{} / {}",
            format_time(self.current_time),
            format_time(self.duration)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(description: Option<&str>, file_name: Option<&str>) -> Track {
        Track {
            id: "1".into(),
            title: "Anthem".into(),
            description: description.map(String::from),
            file_url: "https://x/a.mp3".into(),
            file_name: file_name.map(String::from),
        }
    }

    #[test]
    fn test_subtitle_fallbacks() {
        assert_eq!(track(Some("Alto part"), Some("a.mp3")).subtitle(), "Alto part");
        assert_eq!(track(None, Some("a.mp3")).subtitle(), "a.mp3");
        assert_eq!(track(Some(""), None).subtitle(), "Now Playing");
    }

    #[test]
    fn test_snapshot_helpers() {
        let snapshot = PlayerSnapshot {
            state: PlaybackState::Playing,
            track: Some(track(None, None)),
            current_time: 45.0,
            duration: 180.0,
        };
        assert!(snapshot.is_playing());
        assert_eq!(snapshot.progress_percent(), 25.0);
        assert_eq!(snapshot.time_line(), "0:45 / 3:00");
        assert!(PlayerSnapshot::default().is_idle());
    }
}
