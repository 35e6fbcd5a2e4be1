//! Audio-related small types.
//!
//! This module defines the enums and value types shared by the playback
//! graph and the engine (repeat mode, playback state, source info, errors).

use std::path::PathBuf;

use thiserror::Error;

/// Lowest gain accepted by the processing stage, in decibels.
pub const MIN_GAIN_DB: f32 = -24.0;
/// Highest gain accepted by the processing stage, in decibels.
pub const MAX_GAIN_DB: f32 = 24.0;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum RepeatMode {
    /// Stop at the end of the track (or advance, when auto-advance is on).
    #[default]
    Off,
    /// Continue with the next catalog track, wrapping at the end.
    All,
    /// Repeat the current track when it ends.
    Single,
}

impl RepeatMode {
    /// Cycle `Off -> All -> Single -> Off`.
    pub fn cycle(self) -> Self {
        match self {
            Self::Off => Self::All,
            Self::All => Self::Single,
            Self::Single => Self::Off,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::All => "all",
            Self::Single => "single",
        }
    }
}

/// Observable state of the player.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Nothing loaded, or fully stopped.
    #[default]
    Idle,
    /// A track and its segment are ready, silent.
    Loaded,
    Playing,
    Paused,
}

/// What the decoder reports about a resource before anything is rendered.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SourceInfo {
    pub sample_rate: u32,
    pub channels: u16,
    pub frame_count: u64,
}

impl SourceInfo {
    /// Length of the whole resource in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.frame_count as f64 / self.sample_rate as f64
    }
}

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("audio output unavailable: {0}")]
    Device(String),
    #[error("failed to open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path:?}: {reason}")]
    Decode { path: PathBuf, reason: String },
    #[error("no source opened")]
    NoSource,
}

/// Clamp a gain request into the supported range. NaN maps to unity gain.
pub fn clamp_gain_db(db: f32) -> f32 {
    if db.is_nan() {
        return 0.0;
    }
    db.clamp(MIN_GAIN_DB, MAX_GAIN_DB)
}

/// Convert decibels to a linear amplitude factor.
pub fn db_to_amplitude(db: f32) -> f32 {
    10f32.powf(clamp_gain_db(db) / 20.0)
}
