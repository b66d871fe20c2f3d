use crate::{Directive, PlaybackSession};
use spindle_core::{ContextId, EndOfQueue, Track, TrackId};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{mpsc, watch};
use tracing::debug;

/// Read-only projection published to observers after every command.
/// Observers decide "is my list active" and "is my row playing" purely
/// from identities; they never inspect the queue itself.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub current_track: Option<Track>,
    pub context: Option<ContextId>,
    pub is_playing: bool,
    pub playback_error: Option<String>,
    pub position: Option<usize>,
    pub queue_len: usize,
}

impl SessionSnapshot {
    pub fn is_context_active(&self, context: &ContextId) -> bool {
        self.context.as_ref() == Some(context)
    }

    pub fn is_track_current(&self, id: &TrackId) -> bool {
        self.current_track.as_ref().map(|t| &t.id) == Some(id)
    }

    pub fn is_track_playing(&self, id: &TrackId) -> bool {
        self.is_playing && self.is_track_current(id)
    }
}

struct Inner {
    machine: Mutex<PlaybackSession>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    directive_tx: mpsc::UnboundedSender<Directive>,
}

/// Shared handle to the one playback session. Cheap to clone; every UI
/// surface and the output binding hold one. Commands serialize on an
/// internal lock and never await, so a command observed by one surface is
/// fully applied before any other surface's command runs.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

impl SessionStore {
    pub fn new(end_of_queue: EndOfQueue) -> (Self, mpsc::UnboundedReceiver<Directive>) {
        let (directive_tx, directive_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, _) = watch::channel(SessionSnapshot::default());
        let store = Self {
            inner: Arc::new(Inner {
                machine: Mutex::new(PlaybackSession::new(end_of_queue)),
                snapshot_tx,
                directive_tx,
            }),
        };
        (store, directive_rx)
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.snapshot_tx.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.snapshot_tx.borrow().clone()
    }

    pub fn set_current_track(&self, track: Track) {
        debug!(track = %track.id, "set current track");
        self.apply(|m| m.set_current_track(track));
    }

    pub fn set_queue(&self, tracks: Vec<Track>) {
        debug!(len = tracks.len(), "replace queue");
        self.apply(|m| m.set_queue(tracks));
    }

    pub fn set_playlist(&self, tracks: Vec<Track>, context: ContextId) {
        debug!(len = tracks.len(), context = %context, "set playlist");
        self.apply(|m| m.set_playlist(tracks, context));
    }

    pub fn set_queue_and_skip(&self, tracks: Vec<Track>, index: usize) {
        debug!(len = tracks.len(), index, "replace queue and skip");
        self.apply(|m| m.set_queue_and_skip(tracks, index));
    }

    pub fn skip_to_track(&self, index: usize) {
        self.apply(|m| m.skip_to_track(index));
    }

    pub fn play(&self) {
        self.apply(|m| m.play());
    }

    pub fn pause(&self) {
        self.apply(|m| m.pause());
    }

    pub fn toggle_play_pause(&self) {
        self.apply(|m| m.toggle_play_pause());
    }

    pub fn skip_next(&self) {
        self.apply(|m| m.skip_next());
    }

    pub fn skip_previous(&self) {
        self.apply(|m| m.skip_previous());
    }

    pub fn handle_track_ended(&self) {
        self.apply(|m| m.handle_track_ended());
    }

    pub fn report_error(&self, message: impl Into<String>) {
        self.apply(|m| {
            m.report_error(message);
            None
        });
    }

    pub fn mark_loaded(&self, id: &TrackId) {
        self.apply(|m| {
            m.mark_loaded(id);
            None
        });
    }

    fn apply(&self, command: impl FnOnce(&mut PlaybackSession) -> Option<Directive>) {
        let mut machine = self.lock();
        let directive = command(&mut machine);
        let snapshot = SessionSnapshot {
            current_track: machine.current_track().cloned(),
            context: machine.context().cloned(),
            is_playing: machine.is_playing(),
            playback_error: machine.playback_error().map(str::to_string),
            position: machine.position(),
            queue_len: machine.queue_len(),
        };
        drop(machine);

        self.inner.snapshot_tx.send_replace(snapshot);
        if let Some(directive) = directive {
            // The binding may already be gone during shutdown; the session
            // state itself stays consistent either way.
            let _ = self.inner.directive_tx.send(directive);
        }
    }

    fn lock(&self) -> MutexGuard<'_, PlaybackSession> {
        match self.inner.machine.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
