use async_trait::async_trait;
use futures_util::future::{AbortHandle, Abortable};
use spindle_core::{urls, Track, TrackId};
use spindle_output::{AudioDevice, DeviceError, DeviceEvent};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

/// Stand-in for a real decoder/output stack. Loading is a timer, playing
/// a track is a timer; both abort when superseded, which is exactly the
/// cancellation contract a real backend has to honor.
pub struct SimulatedDevice {
    events: mpsc::UnboundedSender<DeviceEvent>,
    load_latency: Duration,
    track_length: Duration,
    media_base_url: String,
    current: Option<TrackId>,
    pending_load: Option<AbortHandle>,
    end_timer: Option<AbortHandle>,
}

impl SimulatedDevice {
    pub fn new(
        load_latency: Duration,
        track_length: Duration,
        media_base_url: String,
    ) -> (Self, mpsc::UnboundedReceiver<DeviceEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        (
            Self {
                events,
                load_latency,
                track_length,
                media_base_url,
                current: None,
                pending_load: None,
                end_timer: None,
            },
            events_rx,
        )
    }

    fn cancel_pending_load(&mut self) {
        if let Some(handle) = self.pending_load.take() {
            handle.abort();
        }
    }

    fn cancel_end_timer(&mut self) {
        if let Some(handle) = self.end_timer.take() {
            handle.abort();
        }
    }

    fn spawn_after(
        &self,
        delay: Duration,
        event: DeviceEvent,
    ) -> AbortHandle {
        let (handle, registration) = AbortHandle::new_pair();
        let events = self.events.clone();
        tokio::spawn(Abortable::new(
            async move {
                tokio::time::sleep(delay).await;
                let _ = events.send(event);
            },
            registration,
        ));
        handle
    }
}

#[async_trait]
impl AudioDevice for SimulatedDevice {
    async fn load(&mut self, track: &Track) -> Result<(), DeviceError> {
        self.cancel_pending_load();
        self.cancel_end_timer();

        let source = urls::stream_url(&self.media_base_url, &track.id);
        debug!(track = %track.id, %source, "fetching source");

        self.current = Some(track.id.clone());
        self.pending_load = Some(self.spawn_after(
            self.load_latency,
            DeviceEvent::Loaded {
                track: track.id.clone(),
            },
        ));
        Ok(())
    }

    async fn set_playing(&mut self, playing: bool) -> Result<(), DeviceError> {
        self.cancel_end_timer();
        if !playing {
            return Ok(());
        }
        let Some(current) = self.current.clone() else {
            return Err(DeviceError::Command("no source loaded".to_string()));
        };
        // Pausing resets the timer, so a resumed track plays its full
        // length again. Good enough for a simulation.
        self.end_timer = Some(self.spawn_after(
            self.track_length,
            DeviceEvent::Ended { track: current },
        ));
        Ok(())
    }

    async fn unload(&mut self) -> Result<(), DeviceError> {
        self.cancel_pending_load();
        self.cancel_end_timer();
        self.current = None;
        Ok(())
    }
}
