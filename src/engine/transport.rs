//! Transport transitions: load, play, pause, stop, seek, and what happens
//! when a track runs out.

use log::{debug, info, warn};

use super::events::PlayerEvent;
use super::session::{ActiveSession, Phase, Session};
use super::{Engine, EngineError};
use crate::audio::RepeatMode;
use crate::catalog::Track;

/// `previous` restarts the current track instead when past this point.
const RESTART_THRESHOLD_SECS: f64 = 3.0;

impl Engine {
    /// Make `track` the current track, silent and at position 0.
    ///
    /// On failure the previous session is left as it was.
    pub fn load(&mut self, track: Track) -> Result<(), EngineError> {
        self.load_session(track.clone())?;
        self.sync_background();
        self.announce_track(track);
        Ok(())
    }

    /// Load `track` and start it in one transition, so observers see the
    /// new track already playing rather than a `Loaded` step in between.
    pub(super) fn load_playing(&mut self, track: Track) -> Result<(), EngineError> {
        self.load_session(track.clone())?;
        let started = self.graph.start().inspect_err(|e| {
            warn!("cannot start output: {e}");
        });
        if started.is_ok() {
            self.graph.play();
            if let Some(s) = self.session.active_mut() {
                s.phase = Phase::Playing;
            }
        }
        self.sync_background();
        self.announce_track(track);
        started.map_err(EngineError::from)
    }

    /// Replace the session without publishing anything. Only a failure after
    /// the old segment was dropped is announced, as the engine is then idle.
    fn load_session(&mut self, track: Track) -> Result<(), EngineError> {
        let path = self.catalog.resolve(&track).inspect_err(|e| {
            warn!("cannot load {}: {e}", track.title);
        })?;
        let info = self.graph.open(&path).inspect_err(|e| {
            warn!("cannot open {}: {e}", path.display());
        })?;

        let session = ActiveSession::new(track.clone(), info);
        if let Err(e) = self.graph.schedule_segment(0, session.frame_count) {
            warn!("cannot schedule {}: {e}", track.title);
            self.session = Session::Idle;
            self.release_background();
            self.surface.clear();
            self.emit(PlayerEvent::Track(None));
            self.emit(PlayerEvent::State(self.state()));
            return Err(e.into());
        }

        info!(
            "loaded {} ({:.1}s, {} Hz)",
            track.title, session.duration, session.sample_rate
        );
        self.session = Session::Active(session);
        self.catalog.record_recent(&track);
        self.reset_artwork();
        Ok(())
    }

    fn announce_track(&mut self, track: Track) {
        self.publish();
        self.emit(PlayerEvent::Track(Some(track)));
        self.emit(PlayerEvent::State(self.state()));
    }

    /// Start or resume rendering. While already playing this only
    /// republishes now-playing info.
    pub fn play(&mut self) -> Result<(), EngineError> {
        let phase = self
            .session
            .active()
            .map(|s| s.phase)
            .ok_or(EngineError::NoCurrentTrack)?;
        if phase == Phase::Playing {
            self.publish();
            return Ok(());
        }

        self.graph.start().inspect_err(|e| {
            warn!("cannot start output: {e}");
        })?;
        self.graph.play();
        if let Some(s) = self.session.active_mut() {
            s.phase = Phase::Playing;
            s.interrupted = false;
        }
        self.sync_background();
        self.publish();
        self.emit(PlayerEvent::State(self.state()));
        Ok(())
    }

    /// Freeze playback at the current position. Only republishes unless playing.
    pub fn pause(&mut self) -> Result<(), EngineError> {
        let phase = self
            .session
            .active()
            .map(|s| s.phase)
            .ok_or(EngineError::NoCurrentTrack)?;
        if phase != Phase::Playing {
            self.publish();
            return Ok(());
        }
        self.pause_rendering(false);
        Ok(())
    }

    pub(super) fn pause_rendering(&mut self, interrupted: bool) {
        self.sample_position();
        self.graph.pause();
        if let Some(s) = self.session.active_mut() {
            s.phase = Phase::Paused;
            s.interrupted = interrupted;
        }
        self.release_background();
        self.publish();
        self.emit(PlayerEvent::State(self.state()));
    }

    pub fn toggle(&mut self) -> Result<(), EngineError> {
        match self.session.active().map(|s| s.phase) {
            None => Err(EngineError::NoCurrentTrack),
            Some(Phase::Playing) => self.pause(),
            Some(Phase::Loaded | Phase::Paused) => self.play(),
        }
    }

    /// Halt playback and drop the session. Idempotent.
    pub fn stop(&mut self) {
        self.graph.stop();
        self.release_background();
        if matches!(self.session, Session::Idle) {
            return;
        }
        self.session = Session::Idle;
        self.reset_artwork();
        self.surface.clear();
        self.emit(PlayerEvent::Track(None));
        self.emit(PlayerEvent::State(self.state()));
    }

    /// Jump to `secs`, clamped into the track. Keeps the current state.
    pub fn seek(&mut self, secs: f64) -> Result<(), EngineError> {
        let s = self
            .session
            .active_mut()
            .ok_or(EngineError::NoCurrentTrack)?;
        if !(s.duration > 0.0) {
            return Err(EngineError::NothingToSeek);
        }

        let target = s.clamp(secs);
        let from = s.frame_at(target);
        self.graph.schedule_segment(from, s.frames_from(from))?;
        s.start_frame = from;
        s.position = target;
        if s.phase == Phase::Playing {
            self.graph.play();
        }
        let duration = s.duration;

        debug!("seek to {target:.3}s");
        self.publish();
        self.surface.seeked(target);
        self.emit(PlayerEvent::Position {
            elapsed: target,
            duration,
        });
        Ok(())
    }

    pub fn seek_by(&mut self, delta: f64) -> Result<(), EngineError> {
        let position = self
            .session
            .active()
            .map(|s| s.position)
            .ok_or(EngineError::NoCurrentTrack)?;
        self.seek(position + delta)
    }

    /// Load the catalog successor, keeping playback going if it was.
    pub fn next(&mut self) -> Result<(), EngineError> {
        let current = self.current_track().cloned().ok_or(EngineError::NoCurrentTrack)?;
        let next = self
            .catalog
            .track_after(&current)
            .ok_or(EngineError::NoCurrentTrack)?;
        self.switch_to(next)
    }

    /// Restart the current track if it has played for a few seconds,
    /// otherwise load the catalog predecessor.
    pub fn previous(&mut self) -> Result<(), EngineError> {
        let s = self.session.active().ok_or(EngineError::NoCurrentTrack)?;
        if s.position > RESTART_THRESHOLD_SECS {
            return self.seek(0.0);
        }
        let current = s.track.clone();
        let previous = self
            .catalog
            .track_before(&current)
            .ok_or(EngineError::NoCurrentTrack)?;
        self.switch_to(previous)
    }

    fn switch_to(&mut self, track: Track) -> Result<(), EngineError> {
        let was_playing = self.session.active().is_some_and(|s| s.phase == Phase::Playing);
        if was_playing {
            self.load_playing(track)
        } else {
            self.load(track)
        }
    }

    /// The current track reached its end.
    pub(super) fn finish(&mut self) {
        let Some(track) = self.current_track().cloned() else {
            return;
        };
        debug!("finished {}", track.title);

        match (self.repeat_mode, self.auto_advance) {
            // Still playing, so the seek restarts rendering by itself.
            (RepeatMode::Single, _) => {
                if let Err(e) = self.seek(0.0) {
                    warn!("cannot repeat {}: {e}", track.title);
                    self.stop();
                }
            }
            (RepeatMode::All, _) | (RepeatMode::Off, true) => self.advance_from(&track),
            (RepeatMode::Off, false) => self.stop(),
        }
    }

    fn advance_from(&mut self, track: &Track) {
        let Some(next) = self.catalog.track_after(track) else {
            self.stop();
            return;
        };
        if let Err(e) = self.load_playing(next) {
            warn!("auto-advance stopped: {e}");
            self.stop();
        }
    }
}
