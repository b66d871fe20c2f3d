use async_trait::async_trait;
use spindle_core::{Track, TrackId};
use spindle_session::{Directive, SessionStore};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("no audio output device available")]
    Unavailable,
    #[error("failed to load {track}: {reason}")]
    Load { track: TrackId, reason: String },
    #[error("device command failed: {0}")]
    Command(String),
}

/// Terminal signals from the output resource. Every event names the track
/// it belongs to so the binding can discard results that finished after
/// the session already moved on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    Loaded { track: TrackId },
    Ended { track: TrackId },
    Failed { track: TrackId, error: String },
}

/// The single real audio-output resource. `load` begins an asynchronous
/// source load and must cancel any load still in flight; completion,
/// natural end and failure are reported on the device's event channel.
#[async_trait]
pub trait AudioDevice: Send {
    async fn load(&mut self, track: &Track) -> Result<(), DeviceError>;
    async fn set_playing(&mut self, playing: bool) -> Result<(), DeviceError>;
    async fn unload(&mut self) -> Result<(), DeviceError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum OutputState {
    Idle,
    Loading,
    Ready,
    Playing,
    Paused,
    Failed,
}

#[derive(Default)]
struct NetIntent {
    target: Option<Target>,
    playing: Option<bool>,
}

enum Target {
    Load(Track),
    Unload,
}

/// Keeps the device eventually consistent with session intent. Owns the
/// device exclusively; the session store only ever hears back through
/// `mark_loaded`, `handle_track_ended` and `report_error`.
pub struct OutputBinding<D: AudioDevice> {
    device: D,
    directives: mpsc::UnboundedReceiver<Directive>,
    events: mpsc::UnboundedReceiver<DeviceEvent>,
    store: SessionStore,
    state: OutputState,
    expected: Option<TrackId>,
    want_playing: bool,
}

impl<D: AudioDevice> OutputBinding<D> {
    pub fn new(
        device: D,
        directives: mpsc::UnboundedReceiver<Directive>,
        events: mpsc::UnboundedReceiver<DeviceEvent>,
        store: SessionStore,
    ) -> Self {
        Self {
            device,
            directives,
            events,
            store,
            state: OutputState::Idle,
            expected: None,
            want_playing: false,
        }
    }

    /// Drives the device for the rest of the process lifetime; exits only
    /// if one of its channels closes, unloading the device on the way out.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                directive = self.directives.recv() => {
                    let Some(first) = directive else { break };
                    let intent = self.coalesce(first);
                    self.apply(intent).await;
                }
                event = self.events.recv() => {
                    let Some(event) = event else { break };
                    self.handle_event(event).await;
                }
            }
        }
        if let Err(err) = self.device.unload().await {
            warn!(error = %err, "device unload on shutdown failed");
        }
    }

    /// Collapses a burst of directives into the net intent: the latest
    /// load target and the latest play/pause flip. Rapid toggles reach
    /// the device as at most one call.
    fn coalesce(&mut self, first: Directive) -> NetIntent {
        let mut intent = NetIntent::default();
        let mut fold = |directive: Directive, intent: &mut NetIntent| match directive {
            Directive::Load { track, resume } => {
                intent.target = Some(Target::Load(track));
                intent.playing = Some(resume);
            }
            Directive::Play => intent.playing = Some(true),
            Directive::Pause => intent.playing = Some(false),
            Directive::Unload => {
                intent.target = Some(Target::Unload);
                intent.playing = None;
            }
        };

        fold(first, &mut intent);
        while let Ok(next) = self.directives.try_recv() {
            fold(next, &mut intent);
        }
        intent
    }

    async fn apply(&mut self, intent: NetIntent) {
        match intent.target {
            Some(Target::Unload) => {
                self.expected = None;
                self.want_playing = false;
                self.state = OutputState::Idle;
                if let Err(err) = self.device.unload().await {
                    warn!(error = %err, "device unload failed");
                }
                return;
            }
            Some(Target::Load(track)) => {
                self.expected = Some(track.id.clone());
                self.want_playing = intent.playing.unwrap_or(self.want_playing);
                self.state = OutputState::Loading;
                debug!(track = %track.id, resume = self.want_playing, "loading");
                if let Err(err) = self.device.load(&track).await {
                    self.fail(err.to_string());
                }
                return;
            }
            None => {}
        }

        if let Some(playing) = intent.playing {
            self.want_playing = playing;
            match self.state {
                OutputState::Ready | OutputState::Playing | OutputState::Paused => {
                    if let Err(err) = self.device.set_playing(playing).await {
                        self.fail(err.to_string());
                        return;
                    }
                    self.state = if playing {
                        OutputState::Playing
                    } else {
                        OutputState::Paused
                    };
                }
                // Still loading (intent resumes once ready), idle, or
                // failed; nothing to tell the device yet.
                _ => {}
            }
        }
    }

    async fn handle_event(&mut self, event: DeviceEvent) {
        match event {
            DeviceEvent::Loaded { track } => {
                if self.is_stale(&track) {
                    debug!(track = %track, "discarding stale load result");
                    return;
                }
                self.store.mark_loaded(&track);
                self.state = OutputState::Ready;
                if self.want_playing {
                    if let Err(err) = self.device.set_playing(true).await {
                        self.fail(err.to_string());
                        return;
                    }
                    self.state = OutputState::Playing;
                } else {
                    self.state = OutputState::Paused;
                }
            }
            DeviceEvent::Ended { track } => {
                if self.is_stale(&track) {
                    debug!(track = %track, "discarding stale end-of-track");
                    return;
                }
                debug!(track = %track, "track ended");
                self.state = OutputState::Ready;
                self.want_playing = false;
                // Advancing (or stopping at the end) is the session's
                // call; a follow-up load directive arrives if there is a
                // next track.
                self.store.handle_track_ended();
            }
            DeviceEvent::Failed { track, error } => {
                if self.is_stale(&track) {
                    debug!(track = %track, error = %error, "discarding stale failure");
                    return;
                }
                self.fail(error);
            }
        }
    }

    fn is_stale(&self, track: &TrackId) -> bool {
        self.expected.as_ref() != Some(track)
    }

    // Errors never advance the queue; the user decides what happens next.
    fn fail(&mut self, error: String) {
        warn!(error = %error, "playback failed");
        self.state = OutputState::Failed;
        self.want_playing = false;
        self.store.report_error(error);
    }
}
