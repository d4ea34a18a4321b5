//! Media element abstraction
//!
//! A media element plays one source at a time and reports its progress as
//! [`MediaEvent`]s. The playback session drives exactly one element for the
//! whole process.

use crate::error::Result;
use tokio::sync::broadcast;

/// Notifications emitted by a media element
#[derive(Debug, Clone, PartialEq)]
pub enum MediaEvent {
    /// Playback position changed (seconds)
    TimeUpdate(f64),
    /// Duration of the bound source is known (seconds)
    MetadataLoaded { duration: f64 },
    /// Playback reached the end of the source
    Ended,
}

/// Event of one bound source
///
/// `source` is the id returned by the [`MediaElement::set_source`] call that
/// bound the source, so events of a replaced source can be told apart.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceEvent {
    pub source: u64,
    pub event: MediaEvent,
}

/// Transport commands of a media element
///
/// Commands are synchronous and only change the element state; progress is
/// reported asynchronously through [`MediaElement::subscribe`].
pub trait MediaElement: Send + Sync {
    /// Binds a new source, position back to 0, paused
    ///
    /// Returns the id stamped on every event of this source. Ids grow with
    /// each call.
    fn set_source(&self, url: &str) -> Result<u64>;

    /// Starts or resumes playback of the bound source
    fn play(&self) -> Result<()>;

    fn pause(&self) -> Result<()>;

    /// Moves the playback position, clamped to the source bounds
    ///
    /// Returns the position actually reached.
    fn seek(&self, seconds: f64) -> Result<f64>;

    /// Pauses and rewinds to 0, keeping the source
    fn halt(&self) -> Result<()>;

    /// Current position in seconds
    fn position(&self) -> f64;

    /// Duration of the bound source in seconds, once known
    fn duration(&self) -> Option<f64>;

    fn is_playing(&self) -> bool;

    fn subscribe(&self) -> broadcast::Receiver<SourceEvent>;
}
