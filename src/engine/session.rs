use crate::audio::{PlaybackState, SourceInfo};
use crate::catalog::Track;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Phase {
    Loaded,
    Playing,
    Paused,
}

/// Either nothing is loaded, or exactly one track is.
#[derive(Debug, Default)]
pub(super) enum Session {
    #[default]
    Idle,
    Active(ActiveSession),
}

impl Session {
    pub(super) fn state(&self) -> PlaybackState {
        match self {
            Session::Idle => PlaybackState::Idle,
            Session::Active(s) => match s.phase {
                Phase::Loaded => PlaybackState::Loaded,
                Phase::Playing => PlaybackState::Playing,
                Phase::Paused => PlaybackState::Paused,
            },
        }
    }

    pub(super) fn active(&self) -> Option<&ActiveSession> {
        match self {
            Session::Idle => None,
            Session::Active(s) => Some(s),
        }
    }

    pub(super) fn active_mut(&mut self) -> Option<&mut ActiveSession> {
        match self {
            Session::Idle => None,
            Session::Active(s) => Some(s),
        }
    }
}

#[derive(Debug)]
pub(super) struct ActiveSession {
    pub(super) track: Track,
    pub(super) phase: Phase,
    /// Seconds, always within `[0, duration]`.
    pub(super) position: f64,
    /// Seconds.
    pub(super) duration: f64,
    pub(super) sample_rate: u32,
    pub(super) frame_count: u64,
    /// Absolute frame that the graph's frame counter is relative to.
    pub(super) start_frame: u64,
    /// Set when an interruption, not the user, paused playback.
    pub(super) interrupted: bool,
}

impl ActiveSession {
    pub(super) fn new(track: Track, info: SourceInfo) -> Self {
        Self {
            track,
            phase: Phase::Loaded,
            position: 0.0,
            duration: info.duration_secs(),
            sample_rate: info.sample_rate,
            frame_count: info.frame_count,
            start_frame: 0,
            interrupted: false,
        }
    }

    /// Clamp a requested time into `[0, duration]`; NaN maps to 0.
    pub(super) fn clamp(&self, secs: f64) -> f64 {
        if secs.is_nan() {
            return 0.0;
        }
        secs.clamp(0.0, self.duration)
    }

    /// Absolute frame for a time within the track.
    pub(super) fn frame_at(&self, secs: f64) -> u64 {
        let frame = (self.clamp(secs) * f64::from(self.sample_rate)).round() as u64;
        frame.min(self.frame_count)
    }

    /// Frames left after `from_frame`.
    pub(super) fn frames_from(&self, from_frame: u64) -> u64 {
        self.frame_count.saturating_sub(from_frame)
    }
}
