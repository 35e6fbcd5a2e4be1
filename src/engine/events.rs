//! Everything that reaches the control path arrives as a `ControlEvent`;
//! everything the engine tells observers leaves as a `PlayerEvent`.

use crate::audio::{PlaybackState, RepeatMode};
use crate::catalog::{Track, TrackId};
use crate::now_playing::ArtworkFetched;

/// Transport commands from the now-playing surface (media keys, MPRIS clients).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RemoteCommand {
    Play,
    Pause,
    TogglePlayPause,
    Stop,
    Next,
    Previous,
    /// Absolute position in seconds.
    SeekTo(f64),
    /// Relative offset in seconds.
    SeekBy(f64),
}

/// Commands from the local keyboard surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UserCommand {
    /// Like `RemoteCommand::TogglePlayPause`, but starts the most recent
    /// (or first) catalog track when nothing is loaded.
    TogglePlayPause,
    Stop,
    Next,
    Previous,
    SeekBy(f64),
    /// Change gain by this many decibels.
    GainBy(f32),
    CycleRepeat,
    ToggleAutoAdvance,
    /// Delete the current track from the catalog.
    RemoveCurrent,
    PlayTrack(TrackId),
}

/// Disruptions reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// The output device went away or was taken by someone else.
    InterruptionBegan,
    InterruptionEnded { should_resume: bool },
    /// The default output device changed.
    RouteChanged,
    EnteredBackground,
    EnteredForeground,
}

#[derive(Debug)]
pub enum ControlEvent {
    Remote(RemoteCommand),
    User(UserCommand),
    Session(SessionEvent),
    Artwork(ArtworkFetched),
    Quit,
}

/// Whether the control loop keeps running after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    State(PlaybackState),
    Track(Option<Track>),
    Position { elapsed: f64, duration: f64 },
    Gain(f32),
    Repeat { mode: RepeatMode, auto_advance: bool },
}
