use spindle_core::{ContextId, EndOfQueue, Track, TrackId};

pub mod store;

pub use store::{SessionSnapshot, SessionStore};

/// What the output binding should do after a command. Computed by diffing
/// the current-track identity and play intent across the state change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Load { track: Track, resume: bool },
    Play,
    Pause,
    Unload,
}

/// The one authoritative "now playing" session. Commands never fail and
/// never block; caller misuse (out-of-range skips, play on an empty queue)
/// degrades to a no-op so benign UI races cannot poison the state.
#[derive(Debug)]
pub struct PlaybackSession {
    queue: Vec<Track>,
    position: Option<usize>,
    context: Option<ContextId>,
    is_playing: bool,
    playback_error: Option<String>,
    end_of_queue: EndOfQueue,
}

impl PlaybackSession {
    pub fn new(end_of_queue: EndOfQueue) -> Self {
        Self {
            queue: Vec::new(),
            position: None,
            context: None,
            is_playing: false,
            playback_error: None,
            end_of_queue,
        }
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.queue.get(self.position?)
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn context(&self) -> Option<&ContextId> {
        self.context.as_ref()
    }

    pub fn playback_error(&self) -> Option<&str> {
        self.playback_error.as_deref()
    }

    pub fn position(&self) -> Option<usize> {
        self.position
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Ad-hoc single-track play: the queue becomes just this track and the
    /// context is the track's own id.
    pub fn set_current_track(&mut self, track: Track) -> Option<Directive> {
        let prev = self.before();
        self.context = Some(ContextId::track(&track.id));
        self.queue = vec![track];
        self.position = Some(0);
        self.reconcile(prev)
    }

    /// Replaces queue contents only; position and context are untouched.
    /// Callers that also need a non-zero starting index should prefer
    /// [`PlaybackSession::set_queue_and_skip`], which replaces both in one
    /// step; the two-step `set_queue` + `skip_to_track` contract is kept
    /// for callers that select a starting point later.
    pub fn set_queue(&mut self, tracks: Vec<Track>) -> Option<Directive> {
        let prev = self.before();
        self.queue = tracks;
        self.reconcile(prev)
    }

    /// Starts fresh from a named context (an album, an artist, a chart).
    pub fn set_playlist(&mut self, tracks: Vec<Track>, context: ContextId) -> Option<Directive> {
        let prev = self.before();
        self.position = if tracks.is_empty() { None } else { Some(0) };
        self.queue = tracks;
        self.context = Some(context);
        self.reconcile(prev)
    }

    /// Atomic queue replacement plus jump, closing the gap the two-step
    /// contract leaves open. An out-of-range index clamps to the last
    /// track; the context is untouched.
    pub fn set_queue_and_skip(&mut self, tracks: Vec<Track>, index: usize) -> Option<Directive> {
        let prev = self.before();
        self.position = if tracks.is_empty() {
            None
        } else {
            Some(index.min(tracks.len() - 1))
        };
        self.queue = tracks;
        self.reconcile(prev)
    }

    /// Out-of-range indices are ignored: they arise from benign races
    /// between a click and a queue mutation, not from engine bugs.
    pub fn skip_to_track(&mut self, index: usize) -> Option<Directive> {
        if index >= self.queue.len() {
            return None;
        }
        let prev = self.before();
        self.position = Some(index);
        self.reconcile(prev)
    }

    pub fn play(&mut self) -> Option<Directive> {
        if self.current_track().is_none() {
            return None;
        }
        let prev = self.before();
        self.is_playing = true;
        self.reconcile(prev)
    }

    pub fn pause(&mut self) -> Option<Directive> {
        let prev = self.before();
        self.is_playing = false;
        self.reconcile(prev)
    }

    pub fn toggle_play_pause(&mut self) -> Option<Directive> {
        if self.current_track().is_none() {
            return None;
        }
        let prev = self.before();
        self.is_playing = !self.is_playing;
        self.reconcile(prev)
    }

    pub fn skip_next(&mut self) -> Option<Directive> {
        let pos = self.position?;
        if self.queue.is_empty() {
            return None;
        }
        let prev = self.before();
        if pos + 1 < self.queue.len() {
            self.position = Some(pos + 1);
        } else {
            match self.end_of_queue {
                EndOfQueue::Stop => self.is_playing = false,
                EndOfQueue::Wrap => self.position = Some(0),
            }
        }
        self.reconcile(prev)
    }

    pub fn skip_previous(&mut self) -> Option<Directive> {
        let pos = self.position?;
        if pos == 0 {
            return None;
        }
        let prev = self.before();
        self.position = Some(pos - 1);
        self.reconcile(prev)
    }

    /// Natural end of the current track, reported by the output binding.
    /// Unlike `skip_next`, stopping at the end issues no directive: the
    /// resource already went idle on its own.
    pub fn handle_track_ended(&mut self) -> Option<Directive> {
        let pos = self.position?;
        if self.queue.is_empty() {
            return None;
        }
        if pos + 1 < self.queue.len() {
            self.position = Some(pos + 1);
            return self.current_track().map(|track| Directive::Load {
                track: track.clone(),
                resume: self.is_playing,
            });
        }
        match self.end_of_queue {
            EndOfQueue::Stop => {
                self.is_playing = false;
                None
            }
            EndOfQueue::Wrap => {
                self.position = Some(0);
                // Wrap restarts even a single-track queue, so this always
                // loads rather than diffing on identity.
                self.current_track().map(|track| Directive::Load {
                    track: track.clone(),
                    resume: self.is_playing,
                })
            }
        }
    }

    /// Resource failure write-back. Playback halts until the user acts
    /// again; the queue is never auto-advanced past a broken track.
    pub fn report_error(&mut self, message: impl Into<String>) {
        self.playback_error = Some(message.into());
        self.is_playing = false;
    }

    /// Successful load write-back; clears the last error if the loaded
    /// track is still the current one.
    pub fn mark_loaded(&mut self, id: &TrackId) {
        if self.current_track().map(|t| &t.id) == Some(id) {
            self.playback_error = None;
        }
    }

    fn before(&self) -> (Option<TrackId>, bool) {
        (
            self.current_track().map(|t| t.id.clone()),
            self.is_playing,
        )
    }

    fn reconcile(&self, (prev_id, prev_playing): (Option<TrackId>, bool)) -> Option<Directive> {
        match self.current_track() {
            None => prev_id.map(|_| Directive::Unload),
            Some(curr) if prev_id.as_ref() != Some(&curr.id) => Some(Directive::Load {
                track: curr.clone(),
                resume: self.is_playing,
            }),
            Some(_) if self.is_playing != prev_playing => Some(if self.is_playing {
                Directive::Play
            } else {
                Directive::Pause
            }),
            Some(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Directive, PlaybackSession};
    use spindle_core::{ContextId, EndOfQueue, Track};

    fn tracks(ids: &[&str]) -> Vec<Track> {
        ids.iter().map(|id| Track::new(*id, *id, "Artist")).collect()
    }

    fn session() -> PlaybackSession {
        PlaybackSession::new(EndOfQueue::Stop)
    }

    #[test]
    fn set_current_track_supersedes_queue() {
        let mut s = session();
        s.set_playlist(tracks(&["a", "b", "c"]), ContextId::album("alb"));
        s.play();

        let directive = s.set_current_track(Track::new("x", "X", "Artist"));

        assert_eq!(s.current_track().unwrap().id.as_str(), "x");
        assert_eq!(s.context().unwrap().as_str(), "x");
        assert!(s.is_playing());
        assert!(matches!(
            directive,
            Some(Directive::Load { track, resume: true }) if track.id.as_str() == "x"
        ));
    }

    #[test]
    fn queue_replace_mid_playback_keeps_play_intent() {
        let mut s = session();
        s.set_playlist(tracks(&["a", "b", "c"]), ContextId::top_tracks());
        s.play();

        let directive = s.set_playlist(tracks(&["x", "y"]), ContextId::album("album-1"));

        assert_eq!(s.position(), Some(0));
        assert_eq!(s.queue_len(), 2);
        assert_eq!(s.context().unwrap().as_str(), "album-1");
        assert!(s.is_playing());
        assert!(matches!(
            directive,
            Some(Directive::Load { track, resume: true }) if track.id.as_str() == "x"
        ));
    }

    #[test]
    fn context_isolation() {
        let mut s = session();
        s.set_playlist(tracks(&["a"]), ContextId::album("ctx-a"));
        s.set_playlist(tracks(&["b"]), ContextId::album("ctx-b"));

        assert_eq!(s.context().unwrap(), &ContextId::album("ctx-b"));
        assert_ne!(s.context().unwrap(), &ContextId::album("ctx-a"));
    }

    #[test]
    fn toggle_is_idempotent_in_pairs() {
        let mut s = session();
        s.set_playlist(tracks(&["a"]), ContextId::top_tracks());
        let before = s.is_playing();

        s.toggle_play_pause();
        s.toggle_play_pause();

        assert_eq!(s.is_playing(), before);
    }

    #[test]
    fn toggle_without_current_track_is_a_no_op() {
        let mut s = session();
        assert_eq!(s.toggle_play_pause(), None);
        assert!(!s.is_playing());
    }

    #[test]
    fn skip_to_track_out_of_range_is_ignored() {
        let mut s = session();
        s.set_playlist(tracks(&["a", "b"]), ContextId::top_tracks());

        assert_eq!(s.skip_to_track(2), None);
        assert_eq!(s.skip_to_track(usize::MAX), None);
        assert_eq!(s.position(), Some(0));
    }

    #[test]
    fn play_on_empty_queue_is_a_no_op() {
        let mut s = session();
        assert_eq!(s.play(), None);
        assert!(!s.is_playing());
    }

    #[test]
    fn two_step_queue_then_skip_lands_on_target() {
        let mut s = session();
        s.set_playlist(tracks(&["old"]), ContextId::album("old"));
        s.play();

        let list = tracks(&["a", "b", "c", "d", "e"]);
        s.set_queue(list.clone());
        let directive = s.skip_to_track(3);

        assert_eq!(s.position(), Some(3));
        assert_eq!(s.current_track(), Some(&list[3]));
        assert!(matches!(
            directive,
            Some(Directive::Load { track, .. }) if track.id.as_str() == "d"
        ));
    }

    #[test]
    fn set_queue_and_skip_is_one_step() {
        let mut s = session();
        s.set_playlist(tracks(&["old"]), ContextId::album("alb"));

        let directive = s.set_queue_and_skip(tracks(&["a", "b", "c"]), 2);

        assert_eq!(s.position(), Some(2));
        assert_eq!(s.context().unwrap().as_str(), "alb");
        assert!(matches!(
            directive,
            Some(Directive::Load { track, .. }) if track.id.as_str() == "c"
        ));
    }

    #[test]
    fn set_queue_and_skip_clamps_out_of_range_index() {
        let mut s = session();
        s.set_queue_and_skip(tracks(&["a", "b"]), 99);
        assert_eq!(s.position(), Some(1));

        s.set_queue_and_skip(Vec::new(), 0);
        assert_eq!(s.position(), None);
        assert!(s.current_track().is_none());
    }

    #[test]
    fn natural_end_of_queue_stops_without_wrapping() {
        let mut s = session();
        s.set_queue_and_skip(tracks(&["a", "b"]), 1);
        s.play();

        let directive = s.handle_track_ended();

        assert_eq!(directive, None);
        assert!(!s.is_playing());
        assert_eq!(s.position(), Some(1));
        assert_eq!(s.playback_error(), None);
    }

    #[test]
    fn natural_end_advances_when_queue_remains() {
        let mut s = session();
        s.set_playlist(tracks(&["a", "b"]), ContextId::top_tracks());
        s.play();

        let directive = s.handle_track_ended();

        assert_eq!(s.position(), Some(1));
        assert!(s.is_playing());
        assert!(matches!(
            directive,
            Some(Directive::Load { track, resume: true }) if track.id.as_str() == "b"
        ));
    }

    #[test]
    fn wrap_policy_restarts_from_the_top() {
        let mut s = PlaybackSession::new(EndOfQueue::Wrap);
        s.set_queue_and_skip(tracks(&["a", "b"]), 1);
        s.play();

        let directive = s.handle_track_ended();

        assert_eq!(s.position(), Some(0));
        assert!(s.is_playing());
        assert!(matches!(
            directive,
            Some(Directive::Load { track, resume: true }) if track.id.as_str() == "a"
        ));
    }

    #[test]
    fn wrap_policy_reloads_a_single_track_queue() {
        let mut s = PlaybackSession::new(EndOfQueue::Wrap);
        s.set_current_track(Track::new("only", "Only", "Artist"));
        s.play();

        let directive = s.handle_track_ended();

        assert!(matches!(
            directive,
            Some(Directive::Load { track, .. }) if track.id.as_str() == "only"
        ));
    }

    #[test]
    fn skip_next_stops_at_the_end_under_stop_policy() {
        let mut s = session();
        s.set_queue_and_skip(tracks(&["a", "b"]), 1);
        s.play();

        let directive = s.skip_next();

        assert!(!s.is_playing());
        assert_eq!(s.position(), Some(1));
        assert_eq!(directive, Some(Directive::Pause));
    }

    #[test]
    fn skip_previous_clamps_at_zero() {
        let mut s = session();
        s.set_playlist(tracks(&["a", "b"]), ContextId::top_tracks());

        assert_eq!(s.skip_previous(), None);
        assert_eq!(s.position(), Some(0));

        s.skip_to_track(1);
        s.skip_previous();
        assert_eq!(s.position(), Some(0));
    }

    #[test]
    fn error_is_recorded_and_cleared_on_next_load() {
        let mut s = session();
        s.set_playlist(tracks(&["a", "b"]), ContextId::top_tracks());
        s.play();

        s.report_error("decode failed");
        assert_eq!(s.playback_error(), Some("decode failed"));
        assert!(!s.is_playing());

        s.skip_next();
        let current = s.current_track().unwrap().id.clone();
        s.mark_loaded(&current);
        assert_eq!(s.playback_error(), None);
    }

    #[test]
    fn stale_load_confirmation_does_not_clear_error() {
        let mut s = session();
        s.set_playlist(tracks(&["a", "b"]), ContextId::top_tracks());
        s.report_error("network");

        s.mark_loaded(&Track::new("b", "B", "Artist").id);
        assert_eq!(s.playback_error(), Some("network"));
    }
}
