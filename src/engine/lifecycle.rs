//! Reactions to device interruptions, route changes and the app moving
//! between foreground and background.

use log::{debug, info, warn};

use super::Engine;
use super::events::SessionEvent;
use super::session::Phase;

/// Permission from the OS to keep working while not in the foreground.
pub trait BackgroundExecution {
    /// Ask for it. Returns whether it was granted.
    fn begin(&mut self) -> bool;

    /// Give it back.
    fn end(&mut self);
}

impl Engine {
    pub fn handle_session(&mut self, event: SessionEvent) {
        debug!("session event: {event:?}");
        let phase = self.session.active().map(|s| s.phase);

        match event {
            SessionEvent::InterruptionBegan => {
                if phase == Some(Phase::Playing) {
                    info!("output interrupted, pausing");
                    self.pause_rendering(true);
                }
            }
            SessionEvent::InterruptionEnded { should_resume } => {
                self.rebuild_output();
                let interrupted = self.session.active().is_some_and(|s| s.interrupted);
                if should_resume && phase == Some(Phase::Paused) && interrupted {
                    info!("output back, resuming");
                    if let Err(e) = self.play() {
                        warn!("cannot resume after interruption: {e}");
                    }
                }
            }
            SessionEvent::RouteChanged => self.rebuild_output(),
            SessionEvent::EnteredBackground => {
                self.in_background = true;
                self.sync_background();
                if phase == Some(Phase::Playing) {
                    self.ensure_output();
                }
            }
            SessionEvent::EnteredForeground => {
                self.in_background = false;
                self.sync_background();
                self.ensure_output();
            }
        }
    }

    /// Tear the output down and bring it back at the current position,
    /// keeping the current state.
    ///
    /// The segment is rescheduled before the output reopens so the old one
    /// is never realized on the new device. If the device is still missing
    /// the segment stays pending for the next successful `start`.
    fn rebuild_output(&mut self) {
        self.sample_position();
        self.graph.reset_output();

        if let Some(s) = self.session.active_mut() {
            let from = s.frame_at(s.position);
            if let Err(e) = self.graph.schedule_segment(from, s.frames_from(from)) {
                warn!("cannot reschedule after output change: {e}");
                return;
            }
            s.start_frame = from;
            if s.phase == Phase::Playing {
                self.graph.play();
            }
        }

        if let Err(e) = self.graph.start() {
            warn!("cannot reopen output: {e}");
        }
    }

    fn ensure_output(&mut self) {
        if let Err(e) = self.graph.start() {
            warn!("cannot start output: {e}");
        }
    }

    /// Hold continued execution exactly while playing in the background.
    pub(super) fn sync_background(&mut self) {
        let playing = self
            .session
            .active()
            .is_some_and(|s| s.phase == Phase::Playing);
        if self.in_background && playing {
            self.hold_background();
        } else {
            self.release_background();
        }
    }

    fn hold_background(&mut self) {
        if self.background_held {
            return;
        }
        self.background_held = self.background.begin();
        if !self.background_held {
            debug!("background execution was not granted");
        }
    }

    pub(super) fn release_background(&mut self) {
        if self.background_held {
            self.background.end();
            self.background_held = false;
        }
    }
}
