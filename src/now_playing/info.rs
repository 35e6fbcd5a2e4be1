use std::sync::Arc;

use crate::audio::PlaybackState;
use crate::catalog::TrackId;

/// Cached artwork image for one track.
#[derive(Debug, Clone, PartialEq)]
pub struct Artwork {
    pub track: TrackId,
    pub bytes: Arc<[u8]>,
}

/// What the OS-level "now playing" surface shows.
#[derive(Debug, Clone, PartialEq)]
pub struct NowPlayingInfo {
    pub track: TrackId,
    pub title: String,
    /// Seconds.
    pub elapsed: f64,
    /// Seconds.
    pub duration: f64,
    /// 1.0 while playing, 0.0 otherwise.
    pub rate: f64,
    pub artwork: Option<Artwork>,
    /// Playback state as the surface should label it.
    pub status: PlaybackState,
}

/// A one-way sink for now-playing state.
pub trait NowPlayingSurface {
    fn publish(&mut self, info: &NowPlayingInfo);

    /// Remove everything that was published.
    fn clear(&mut self);

    /// The position jumped to `elapsed` seconds instead of advancing.
    fn seeked(&mut self, elapsed: f64);
}
