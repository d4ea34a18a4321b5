//! Playback session against scripted and headless media elements

use choirplayer::{
    HeadlessElement, MediaElement, MediaEvent, PlaybackSession, PlaybackState, PlayerError,
    PlayerSnapshot, SourceEvent, Track,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, watch};

/// Element that records commands and emits events on demand
struct ScriptedElement {
    log: Mutex<Vec<String>>,
    position: Mutex<f64>,
    playing: Mutex<bool>,
    source: Mutex<u64>,
    events: broadcast::Sender<SourceEvent>,
}

impl ScriptedElement {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            log: Mutex::new(Vec::new()),
            position: Mutex::new(0.0),
            playing: Mutex::new(false),
            source: Mutex::new(0),
            events: broadcast::channel(16).0,
        })
    }

    /// Emits `event` for the source currently bound
    fn emit(&self, event: MediaEvent) {
        let source = *self.source.lock().unwrap();
        let _ = self.events.send(SourceEvent { source, event });
    }

    /// Reaches the end of the source without telling anyone
    fn finish_silently(&self, at: f64) {
        *self.position.lock().unwrap() = at;
        *self.playing.lock().unwrap() = false;
    }

    fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn push(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }
}

impl MediaElement for ScriptedElement {
    fn set_source(&self, url: &str) -> choirplayer::Result<u64> {
        *self.position.lock().unwrap() = 0.0;
        *self.playing.lock().unwrap() = false;
        self.push(format!("source {}", url));
        let mut source = self.source.lock().unwrap();
        *source += 1;
        Ok(*source)
    }

    fn play(&self) -> choirplayer::Result<()> {
        *self.playing.lock().unwrap() = true;
        self.push("play".into());
        Ok(())
    }

    fn pause(&self) -> choirplayer::Result<()> {
        *self.playing.lock().unwrap() = false;
        self.push("pause".into());
        Ok(())
    }

    fn seek(&self, seconds: f64) -> choirplayer::Result<f64> {
        let reached = seconds.clamp(0.0, 100.0);
        *self.position.lock().unwrap() = reached;
        self.push(format!("seek {}", reached));
        Ok(reached)
    }

    fn halt(&self) -> choirplayer::Result<()> {
        *self.position.lock().unwrap() = 0.0;
        *self.playing.lock().unwrap() = false;
        self.push("halt".into());
        Ok(())
    }

    fn position(&self) -> f64 {
        *self.position.lock().unwrap()
    }

    fn duration(&self) -> Option<f64> {
        None
    }

    fn is_playing(&self) -> bool {
        *self.playing.lock().unwrap()
    }

    fn subscribe(&self) -> broadcast::Receiver<SourceEvent> {
        self.events.subscribe()
    }
}

fn track(id: &str) -> Track {
    Track {
        id: id.to_string(),
        title: format!("Track {}", id),
        description: None,
        file_url: format!("https://x.co/music/u/{}.mp3", id),
        file_name: Some(format!("{}.mp3", id)),
    }
}

async fn wait_for(
    rx: &mut watch::Receiver<PlayerSnapshot>,
    predicate: impl FnMut(&PlayerSnapshot) -> bool,
) -> PlayerSnapshot {
    tokio::time::timeout(Duration::from_secs(5), rx.wait_for(predicate))
        .await
        .expect("state change in time")
        .expect("session alive")
        .clone()
}

#[tokio::test]
async fn test_play_other_track_replaces_current() {
    let element = ScriptedElement::new();
    let session = PlaybackSession::start(element.clone());

    session.play(track("a")).unwrap();
    session.play(track("b")).unwrap();

    let snapshot = session.snapshot();
    assert_eq!(snapshot.state, PlaybackState::Playing);
    assert_eq!(snapshot.track.unwrap().id, "b");
    assert_eq!(snapshot.current_time, 0.0);
    assert_eq!(
        element.log(),
        vec![
            "source https://x.co/music/u/a.mp3",
            "play",
            "source https://x.co/music/u/b.mp3",
            "play"
        ]
    );
}

#[tokio::test]
async fn test_events_of_replaced_track_are_dropped() {
    let element = ScriptedElement::new();
    let session = PlaybackSession::start(element.clone());

    session.play(track("a")).unwrap();
    element.emit(MediaEvent::TimeUpdate(95.0));
    element.emit(MediaEvent::MetadataLoaded { duration: 100.0 });
    element.emit(MediaEvent::Ended);

    session.play(track("b")).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let snapshot = session.snapshot();
    assert_eq!(snapshot.state, PlaybackState::Playing);
    assert_eq!(snapshot.track.unwrap().id, "b");
    assert_eq!(snapshot.current_time, 0.0);
    assert_eq!(snapshot.duration, 0.0);

    let mut rx = session.subscribe();
    element.emit(MediaEvent::TimeUpdate(3.0));
    wait_for(&mut rx, |s| s.current_time == 3.0).await;
}

#[tokio::test]
async fn test_lost_end_of_media_is_recovered() {
    let element = ScriptedElement::new();
    let session = PlaybackSession::start(element.clone());
    let mut rx = session.subscribe();

    session.play(track("a")).unwrap();
    element.finish_silently(60.0);
    element.emit(MediaEvent::Ended);
    // overflow the 16-event channel before the session reads it
    for _ in 0..20 {
        element.emit(MediaEvent::TimeUpdate(60.0));
    }

    let snapshot = wait_for(&mut rx, |s| s.state == PlaybackState::Paused).await;
    assert_eq!(snapshot.track.unwrap().id, "a");
    assert_eq!(snapshot.current_time, 60.0);
}

#[tokio::test]
async fn test_play_same_track_resumes() {
    let element = ScriptedElement::new();
    let session = PlaybackSession::start(element.clone());
    let mut rx = session.subscribe();

    session.play(track("a")).unwrap();
    element.emit(MediaEvent::TimeUpdate(30.0));
    wait_for(&mut rx, |s| s.current_time == 30.0).await;

    session.pause().unwrap();
    assert_eq!(session.snapshot().state, PlaybackState::Paused);

    session.play(track("a")).unwrap();
    let snapshot = session.snapshot();
    assert_eq!(snapshot.state, PlaybackState::Playing);
    assert_eq!(snapshot.current_time, 30.0);
    assert_eq!(
        element.log(),
        vec!["source https://x.co/music/u/a.mp3", "play", "pause", "play"]
    );
}

#[tokio::test]
async fn test_toggle_and_pause_on_idle_are_noops() {
    let element = ScriptedElement::new();
    let session = PlaybackSession::start(element.clone());

    session.toggle().unwrap();
    session.pause().unwrap();
    session.seek(12.0).unwrap();

    assert_eq!(session.snapshot(), PlayerSnapshot::default());
    assert!(element.log().is_empty());
    assert_eq!(session.resume(), Err(PlayerError::Idle));
}

#[tokio::test]
async fn test_toggle_switches_between_playing_and_paused() {
    let element = ScriptedElement::new();
    let session = PlaybackSession::start(element.clone());

    session.play(track("a")).unwrap();
    session.toggle().unwrap();
    assert_eq!(session.snapshot().state, PlaybackState::Paused);
    session.toggle().unwrap();
    assert_eq!(session.snapshot().state, PlaybackState::Playing);
}

#[tokio::test]
async fn test_seek_uses_position_reached_by_element() {
    let element = ScriptedElement::new();
    let session = PlaybackSession::start(element.clone());

    session.play(track("a")).unwrap();
    session.seek(250.0).unwrap();
    assert_eq!(session.snapshot().current_time, 100.0);

    session.pause().unwrap();
    session.seek(10.0).unwrap();
    let snapshot = session.snapshot();
    assert_eq!(snapshot.current_time, 10.0);
    assert_eq!(snapshot.state, PlaybackState::Paused);
}

#[tokio::test]
async fn test_stop_returns_to_idle() {
    let element = ScriptedElement::new();
    let session = PlaybackSession::start(element.clone());
    let mut rx = session.subscribe();

    session.play(track("a")).unwrap();
    element.emit(MediaEvent::MetadataLoaded { duration: 180.0 });
    element.emit(MediaEvent::TimeUpdate(42.0));
    wait_for(&mut rx, |s| s.duration == 180.0 && s.current_time == 42.0).await;

    session.stop().unwrap();
    assert_eq!(session.snapshot(), PlayerSnapshot::default());
    assert_eq!(element.log().last().map(String::as_str), Some("halt"));
}

#[tokio::test]
async fn test_end_of_media_pauses_and_keeps_track() {
    let element = ScriptedElement::new();
    let session = PlaybackSession::start(element.clone());
    let mut rx = session.subscribe();

    session.play(track("a")).unwrap();
    element.emit(MediaEvent::MetadataLoaded { duration: 60.0 });
    element.emit(MediaEvent::TimeUpdate(60.0));
    element.emit(MediaEvent::Ended);

    let snapshot = wait_for(&mut rx, |s| s.state == PlaybackState::Paused).await;
    assert_eq!(snapshot.track.unwrap().id, "a");
    assert_eq!(snapshot.current_time, 60.0);
    assert_eq!(snapshot.duration, 60.0);
}

#[tokio::test]
async fn test_events_while_idle_are_ignored() {
    let element = ScriptedElement::new();
    let session = PlaybackSession::start(element.clone());

    element.emit(MediaEvent::TimeUpdate(5.0));
    element.emit(MediaEvent::MetadataLoaded { duration: 9.0 });
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(session.snapshot(), PlayerSnapshot::default());
}

#[tokio::test]
async fn test_shutdown_detaches_from_element() {
    let element = ScriptedElement::new();
    let session = PlaybackSession::start(element.clone());

    session.play(track("a")).unwrap();
    session.shutdown();

    assert!(session.is_closed());
    assert_eq!(session.snapshot(), PlayerSnapshot::default());
    assert_eq!(session.play(track("b")), Err(PlayerError::SessionClosed));
    assert_eq!(session.toggle(), Err(PlayerError::SessionClosed));

    element.emit(MediaEvent::TimeUpdate(7.0));
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(session.snapshot().current_time, 0.0);

    // idempotent
    session.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_headless_playback_runs_to_end() {
    let element = Arc::new(HeadlessElement::with_fixed_duration(
        Duration::from_millis(500),
        2.0,
    ));
    let session = PlaybackSession::start(element.clone());
    let mut rx = session.subscribe();

    session.play(track("a")).unwrap();
    let ended = wait_for(&mut rx, |s| s.state == PlaybackState::Paused && s.duration > 0.0).await;

    assert_eq!(ended.duration, 2.0);
    assert_eq!(ended.current_time, 2.0);
    assert_eq!(ended.progress_percent(), 100.0);
    assert!(!element.is_playing());

    session.play(track("a")).unwrap();
    assert!(element.is_playing());
    assert_eq!(element.position(), 0.0);
}
