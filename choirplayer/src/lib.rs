//! # choirplayer - Shared playback session
//!
//! Music and video records play through one [`PlaybackSession`] owned by
//! the application. The session drives a single [`MediaElement`] and mirrors
//! its progress into an observable [`PlayerSnapshot`].
//!
//! ```no_run
//! use choirplayer::{HeadlessElement, PlaybackSession, Track, DEFAULT_TICK};
//! use std::sync::Arc;
//!
//! # async fn demo(track: Track) -> choirplayer::Result<()> {
//! let element = Arc::new(HeadlessElement::with_fixed_duration(DEFAULT_TICK, 180.0));
//! let session = PlaybackSession::start(element);
//! let mut state = session.subscribe();
//!
//! session.play(track)?;
//! while state.changed().await.is_ok() {
//!     let snapshot = state.borrow().clone();
//!     println!("{}", snapshot.time_line());
//!     if !snapshot.is_playing() {
//!         break;
//!     }
//! }
//! session.shutdown();
//! # Ok(())
//! # }
//! ```

pub mod element;
pub mod error;
pub mod format;
pub mod headless;
pub mod session;
pub mod state;
pub mod target;

pub use element::{MediaElement, MediaEvent, SourceEvent};
pub use error::{PlayerError, Result};
pub use format::{format_time, progress_percent};
pub use headless::{DurationProbe, HeadlessElement, DEFAULT_TICK};
pub use session::PlaybackSession;
pub use state::{PlaybackState, PlayerSnapshot, Track};
pub use target::PlaybackTarget;
