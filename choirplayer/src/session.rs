//! Playback session manager
//!
//! The application owns a single [`PlaybackSession`] from start to teardown.
//! It drives one [`MediaElement`], so at most one source plays at a time,
//! and publishes a [`PlayerSnapshot`] on a `watch` channel whenever the
//! transport state or the element progress changes.
//!
//! ```text
//!          play(t)            pause / end of media
//!   Idle ---------> Playing -----------------------> Paused
//!    ^                 ^  <------------------------    |
//!    |                 |      play(same) / toggle      |
//!    +------ stop -----+-------------------------------+
//! ```
//!
//! Events are applied only when they belong to the source bound by the
//! last track switch. Events of a replaced source still queued in the
//! channel are dropped.

use crate::element::{MediaElement, MediaEvent, SourceEvent};
use crate::error::{PlayerError, Result};
use crate::state::{PlaybackState, PlayerSnapshot, Track};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

struct SessionInner {
    element: Arc<dyn MediaElement>,
    state_tx: watch::Sender<PlayerSnapshot>,
    /// Id of the source of the current track; held while switching tracks
    bound: Mutex<Option<u64>>,
    closed: AtomicBool,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl SessionInner {
    fn bound(&self) -> MutexGuard<'_, Option<u64>> {
        self.bound.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn on_event(&self, SourceEvent { source, event }: SourceEvent) {
        let bound = self.bound();
        if *bound != Some(source) {
            trace!("Dropping {:?} of replaced source #{}", event, source);
            return;
        }
        self.state_tx.send_if_modified(|s| {
            if s.state == PlaybackState::Idle {
                return false;
            }
            match event {
                MediaEvent::TimeUpdate(t) => {
                    s.current_time = t;
                    true
                }
                MediaEvent::MetadataLoaded { duration } => {
                    s.duration = duration;
                    true
                }
                MediaEvent::Ended => {
                    if s.state == PlaybackState::Playing {
                        s.state = PlaybackState::Paused;
                        true
                    } else {
                        false
                    }
                }
            }
        });
    }

    /// Reads progress back from the element after events were lost
    fn resync(&self) {
        let bound = self.bound();
        if bound.is_none() {
            return;
        }
        let position = self.element.position();
        let duration = self.element.duration();
        let playing = self.element.is_playing();

        self.state_tx.send_if_modified(|s| {
            if s.state == PlaybackState::Idle {
                return false;
            }
            let before = s.clone();
            s.current_time = position;
            if let Some(duration) = duration {
                s.duration = duration;
            }
            if s.state == PlaybackState::Playing && !playing {
                s.state = PlaybackState::Paused;
            }
            *s != before
        });
    }
}

/// Forwards element events to the session until either side goes away
async fn pump_events(session: Weak<SessionInner>, mut events: broadcast::Receiver<SourceEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => {
                let Some(inner) = session.upgrade() else {
                    break;
                };
                if inner.closed.load(Ordering::SeqCst) {
                    break;
                }
                inner.on_event(event);
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Playback session lagged, {} media events skipped", skipped);
                let Some(inner) = session.upgrade() else {
                    break;
                };
                inner.resync();
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    debug!("Media event pump stopped");
}

/// The single audio/video transport of the application
pub struct PlaybackSession {
    inner: Arc<SessionInner>,
}

impl PlaybackSession {
    /// Creates the session with no track and starts listening to `element`
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(element: Arc<dyn MediaElement>) -> Self {
        let (state_tx, _) = watch::channel(PlayerSnapshot::default());
        let events = element.subscribe();

        let inner = Arc::new(SessionInner {
            element,
            state_tx,
            bound: Mutex::new(None),
            closed: AtomicBool::new(false),
            pump: Mutex::new(None),
        });

        let handle = tokio::spawn(pump_events(Arc::downgrade(&inner), events));
        *inner.pump.lock().unwrap_or_else(|p| p.into_inner()) = Some(handle);

        debug!("Playback session started");
        Self { inner }
    }

    /// Current state
    pub fn snapshot(&self) -> PlayerSnapshot {
        self.inner.state_tx.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<PlayerSnapshot> {
        self.inner.state_tx.subscribe()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Plays `track`
    ///
    /// Another track (or none) is replaced and starts from 0; the current
    /// track resumes from its position.
    pub fn play(&self, track: Track) -> Result<()> {
        self.ensure_open()?;

        let same = self
            .inner
            .state_tx
            .borrow()
            .track
            .as_ref()
            .is_some_and(|current| current.id == track.id);

        if !same {
            let url = track.file_url.clone();
            info!("Loading track '{}' ({})", track.title, track.id);
            let mut bound = self.inner.bound();
            *bound = None;
            self.inner.state_tx.send_modify(|s| {
                s.state = PlaybackState::Paused;
                s.track = Some(track);
                s.current_time = 0.0;
                s.duration = 0.0;
            });
            match self.inner.element.set_source(&url) {
                Ok(source) => *bound = Some(source),
                Err(e) => {
                    drop(bound);
                    self.reset();
                    return Err(e);
                }
            }
        }

        self.inner.element.play()?;
        self.set_state(PlaybackState::Playing);
        Ok(())
    }

    /// Resumes the loaded track
    pub fn resume(&self) -> Result<()> {
        self.ensure_open()?;
        if self.snapshot().is_idle() {
            return Err(PlayerError::Idle);
        }
        self.inner.element.play()?;
        self.set_state(PlaybackState::Playing);
        Ok(())
    }

    /// Pauses playback; no-op unless playing
    pub fn pause(&self) -> Result<()> {
        self.ensure_open()?;
        if !self.snapshot().is_playing() {
            return Ok(());
        }
        self.inner.element.pause()?;
        self.set_state(PlaybackState::Paused);
        Ok(())
    }

    /// Pause when playing, resume when paused, nothing when idle
    pub fn toggle(&self) -> Result<()> {
        match self.snapshot().state {
            PlaybackState::Playing => self.pause(),
            PlaybackState::Paused => self.resume(),
            PlaybackState::Idle => {
                self.ensure_open()?;
                Ok(())
            }
        }
    }

    /// Moves the position of the loaded track; no-op when idle
    pub fn seek(&self, seconds: f64) -> Result<()> {
        self.ensure_open()?;
        if self.snapshot().is_idle() {
            return Ok(());
        }
        let reached = self.inner.element.seek(seconds)?;
        self.inner.state_tx.send_modify(|s| s.current_time = reached);
        Ok(())
    }

    /// Halts playback and unloads the track
    pub fn stop(&self) -> Result<()> {
        self.ensure_open()?;
        if !self.snapshot().is_idle() {
            self.inner.element.halt()?;
            info!("Playback stopped");
        }
        self.reset();
        Ok(())
    }

    /// Stops playback and detaches from the element
    ///
    /// Element events arriving afterwards are discarded. Further commands
    /// fail with [`PlayerError::SessionClosed`].
    pub fn shutdown(&self) {
        if self.inner.closed.load(Ordering::SeqCst) {
            return;
        }
        if let Err(e) = self.stop() {
            warn!("Failed to stop playback on shutdown: {}", e);
        }
        self.inner.closed.store(true, Ordering::SeqCst);
        if let Some(handle) = self.inner.pump.lock().unwrap_or_else(|p| p.into_inner()).take() {
            handle.abort();
        }
        debug!("Playback session shut down");
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            Err(PlayerError::SessionClosed)
        } else {
            Ok(())
        }
    }

    fn set_state(&self, state: PlaybackState) {
        self.inner.state_tx.send_if_modified(|s| {
            if s.state == state {
                false
            } else {
                s.state = state;
                true
            }
        });
    }

    fn reset(&self) {
        let mut bound = self.inner.bound();
        *bound = None;
        self.inner.state_tx.send_modify(|s| *s = PlayerSnapshot::default());
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}
