//! Mirrors the session onto the now-playing surface and keeps the artwork
//! cache for the current track.

use std::sync::Arc;
use std::thread;

use log::debug;

use super::Engine;
use super::events::ControlEvent;
use super::session::Phase;
use crate::catalog::TrackId;
use crate::now_playing::{Artwork, ArtworkFetched, NowPlayingInfo};

#[derive(Debug, Default)]
pub(super) enum ArtworkState {
    #[default]
    Empty,
    Pending { generation: u64, track: TrackId },
    Ready(Artwork),
    /// Not retried until the track is reloaded or its reference changes.
    Failed(TrackId),
}

impl ArtworkState {
    fn covers(&self, id: TrackId) -> bool {
        match self {
            ArtworkState::Empty => false,
            ArtworkState::Pending { track, .. } | ArtworkState::Failed(track) => *track == id,
            ArtworkState::Ready(artwork) => artwork.track == id,
        }
    }
}

impl Engine {
    /// Push the current session to the surface, or clear it when idle.
    pub(super) fn publish(&mut self) {
        self.request_artwork();

        let Some(s) = self.session.active() else {
            self.surface.clear();
            return;
        };
        let artwork = match &self.artwork {
            ArtworkState::Ready(artwork) if artwork.track == s.track.id => Some(artwork.clone()),
            _ => None,
        };
        let info = NowPlayingInfo {
            track: s.track.id,
            title: s.track.title.clone(),
            elapsed: s.position,
            duration: s.duration,
            rate: if s.phase == Phase::Playing { 1.0 } else { 0.0 },
            artwork,
            status: self.session.state(),
        };
        self.surface.publish(&info);
    }

    /// Forget cached artwork and invalidate any fetch in flight.
    pub(super) fn reset_artwork(&mut self) {
        self.artwork_generation += 1;
        self.artwork = ArtworkState::Empty;
    }

    /// Start a background fetch when the current track has an artwork
    /// reference that is neither cached, in flight, nor known to fail.
    fn request_artwork(&mut self) {
        let Some(track) = self.session.active().map(|s| &s.track) else {
            return;
        };
        let Some(url) = track.artwork.clone() else {
            return;
        };
        if self.artwork.covers(track.id) {
            return;
        }

        let id = track.id;
        self.artwork_generation += 1;
        let generation = self.artwork_generation;
        self.artwork = ArtworkState::Pending {
            generation,
            track: id,
        };

        let fetcher = Arc::clone(&self.fetcher);
        let events = self.events.clone();
        debug!("fetching artwork for {id} from {url}");
        thread::spawn(move || {
            let result = fetcher.fetch(&url);
            let _ = events.send(ControlEvent::Artwork(ArtworkFetched {
                generation,
                track: id,
                result,
            }));
        });
    }

    /// Apply a finished fetch if it still belongs to the current track.
    pub(super) fn apply_artwork(&mut self, fetched: ArtworkFetched) {
        let current = self.session.active().map(|s| s.track.id);
        let expected = matches!(
            self.artwork,
            ArtworkState::Pending { generation, track }
                if generation == fetched.generation && track == fetched.track
        );
        if !expected || current != Some(fetched.track) {
            debug!("discarding stale artwork for {}", fetched.track);
            return;
        }

        match fetched.result {
            Ok(bytes) => {
                self.artwork = ArtworkState::Ready(Artwork {
                    track: fetched.track,
                    bytes: Arc::from(bytes),
                });
                self.publish();
            }
            Err(e) => {
                debug!("artwork for {} unavailable: {e}", fetched.track);
                self.artwork = ArtworkState::Failed(fetched.track);
            }
        }
    }
}
