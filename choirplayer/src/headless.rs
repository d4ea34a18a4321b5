//! Clock-driven media element without audio output
//!
//! Advances a virtual position at a fixed tick while playing, emitting a
//! `TimeUpdate` per tick and `Ended` once the position reaches the
//! duration. The duration of a source comes from a caller-supplied probe;
//! without one the source never ends.

use crate::element::{MediaElement, MediaEvent, SourceEvent};
use crate::error::{PlayerError, Result};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Default tick of the virtual clock
pub const DEFAULT_TICK: Duration = Duration::from_millis(250);

const EVENT_CAPACITY: usize = 64;

/// Returns the duration in seconds of a source URL, if known
pub type DurationProbe = Arc<dyn Fn(&str) -> Option<f64> + Send + Sync>;

#[derive(Debug, Default)]
struct Clock {
    source: Option<String>,
    /// Id of the bound source, bumped by each `set_source`
    source_id: u64,
    position: f64,
    duration: Option<f64>,
    playing: bool,
}

struct HeadlessInner {
    clock: Mutex<Clock>,
    events: broadcast::Sender<SourceEvent>,
    probe: DurationProbe,
    tick: Duration,
}

impl HeadlessInner {
    fn clock(&self) -> MutexGuard<'_, Clock> {
        self.clock.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn emit(&self, source: u64, event: MediaEvent) {
        let _ = self.events.send(SourceEvent { source, event });
    }

    /// Advances the clock by one tick
    fn advance(&self) {
        let mut events = Vec::new();
        let source = {
            let mut clock = self.clock();
            if !clock.playing {
                return;
            }
            clock.position += self.tick.as_secs_f64();
            if let Some(duration) = clock.duration {
                if clock.position >= duration {
                    clock.position = duration;
                    clock.playing = false;
                    events.push(MediaEvent::TimeUpdate(duration));
                    events.push(MediaEvent::Ended);
                }
            }
            if events.is_empty() {
                events.push(MediaEvent::TimeUpdate(clock.position));
            }
            clock.source_id
        };
        for event in events {
            trace!("headless element: {:?}", event);
            self.emit(source, event);
        }
    }
}

async fn run_clock(element: Weak<HeadlessInner>, tick: Duration) {
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // first tick completes immediately
    interval.tick().await;
    loop {
        interval.tick().await;
        match element.upgrade() {
            Some(inner) => inner.advance(),
            None => break,
        }
    }
}

/// Media element driven by a virtual clock
pub struct HeadlessElement {
    inner: Arc<HeadlessInner>,
    ticker: JoinHandle<()>,
}

impl HeadlessElement {
    /// Creates the element and starts its clock
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(tick: Duration, probe: DurationProbe) -> Self {
        let tick = if tick.is_zero() { DEFAULT_TICK } else { tick };
        let inner = Arc::new(HeadlessInner {
            clock: Mutex::new(Clock::default()),
            events: broadcast::channel(EVENT_CAPACITY).0,
            probe,
            tick,
        });
        let ticker = tokio::spawn(run_clock(Arc::downgrade(&inner), tick));
        Self { inner, ticker }
    }

    /// Element whose sources all last `seconds`
    pub fn with_fixed_duration(tick: Duration, seconds: f64) -> Self {
        Self::new(tick, Arc::new(move |_: &str| Some(seconds)))
    }

    pub fn tick(&self) -> Duration {
        self.inner.tick
    }

    pub fn source(&self) -> Option<String> {
        self.inner.clock().source.clone()
    }
}

impl MediaElement for HeadlessElement {
    fn set_source(&self, url: &str) -> Result<u64> {
        if url.trim().is_empty() {
            return Err(PlayerError::Element("empty source".to_string()));
        }
        let duration = (self.inner.probe)(url).filter(|d| d.is_finite() && *d >= 0.0);
        let source = {
            let mut clock = self.inner.clock();
            let source_id = clock.source_id + 1;
            *clock = Clock {
                source: Some(url.to_string()),
                source_id,
                position: 0.0,
                duration,
                playing: false,
            };
            clock.source_id
        };
        debug!("headless element: source #{} {} ({:?}s)", source, url, duration);
        if let Some(duration) = duration {
            self.inner.emit(source, MediaEvent::MetadataLoaded { duration });
        }
        Ok(source)
    }

    fn play(&self) -> Result<()> {
        let (source, restarted) = {
            let mut clock = self.inner.clock();
            if clock.source.is_none() {
                return Err(PlayerError::Element("no source".to_string()));
            }
            let at_end = clock.duration.is_some_and(|d| clock.position >= d);
            if at_end {
                clock.position = 0.0;
            }
            clock.playing = true;
            (clock.source_id, at_end)
        };
        if restarted {
            self.inner.emit(source, MediaEvent::TimeUpdate(0.0));
        }
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        self.inner.clock().playing = false;
        Ok(())
    }

    fn seek(&self, seconds: f64) -> Result<f64> {
        let (source, reached) = {
            let mut clock = self.inner.clock();
            if clock.source.is_none() {
                return Err(PlayerError::Element("no source".to_string()));
            }
            let mut target = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
            if let Some(duration) = clock.duration {
                target = target.min(duration);
            }
            clock.position = target;
            (clock.source_id, target)
        };
        self.inner.emit(source, MediaEvent::TimeUpdate(reached));
        Ok(reached)
    }

    fn halt(&self) -> Result<()> {
        let mut clock = self.inner.clock();
        clock.playing = false;
        clock.position = 0.0;
        Ok(())
    }

    fn position(&self) -> f64 {
        self.inner.clock().position
    }

    fn duration(&self) -> Option<f64> {
        self.inner.clock().duration
    }

    fn is_playing(&self) -> bool {
        self.inner.clock().playing
    }

    fn subscribe(&self) -> broadcast::Receiver<SourceEvent> {
        self.inner.events.subscribe()
    }
}

impl Drop for HeadlessElement {
    fn drop(&mut self) {
        self.ticker.abort();
    }
}
