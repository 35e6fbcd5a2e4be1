//! The playback engine.
//!
//! Owns the session and every collaborator. All mutations run on the thread
//! that owns the `Engine`, fed one `ControlEvent` at a time plus clock ticks.

mod clock;
mod events;
mod lifecycle;
mod publish;
mod session;
mod transport;

use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};

use log::{debug, info, warn};
use thiserror::Error;

use crate::audio::{GraphError, PlaybackGraph, PlaybackState, RepeatMode};
use crate::catalog::{Catalog, CatalogError, Track, TrackId};
use crate::now_playing::{ArtworkFetcher, NowPlayingSurface};

pub use events::{ControlEvent, Flow, PlayerEvent, RemoteCommand, SessionEvent, UserCommand};
pub use lifecycle::BackgroundExecution;

use publish::ArtworkState;
use session::Session;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no track is loaded")]
    NoCurrentTrack,
    #[error("the current track has no length to seek within")]
    NothingToSeek,
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Collaborators handed to the engine at construction.
pub struct EngineParts {
    pub graph: Box<dyn PlaybackGraph>,
    pub surface: Box<dyn NowPlayingSurface>,
    pub catalog: Box<dyn Catalog>,
    pub fetcher: Arc<dyn ArtworkFetcher>,
    pub background: Box<dyn BackgroundExecution>,
    /// Where asynchronous completions (artwork) are posted back to.
    pub events: Sender<ControlEvent>,
}

#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    pub repeat_mode: RepeatMode,
    pub auto_advance: bool,
    pub gain_db: f32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            repeat_mode: RepeatMode::Off,
            auto_advance: true,
            gain_db: 0.0,
        }
    }
}

pub struct Engine {
    graph: Box<dyn PlaybackGraph>,
    surface: Box<dyn NowPlayingSurface>,
    catalog: Box<dyn Catalog>,
    fetcher: Arc<dyn ArtworkFetcher>,
    background: Box<dyn BackgroundExecution>,
    events: Sender<ControlEvent>,

    session: Session,
    repeat_mode: RepeatMode,
    auto_advance: bool,
    gain_db: f32,

    artwork: ArtworkState,
    artwork_generation: u64,
    background_held: bool,
    in_background: bool,
    subscribers: Vec<Sender<PlayerEvent>>,
}

impl Engine {
    pub fn new(parts: EngineParts, options: EngineOptions) -> Self {
        let EngineParts {
            mut graph,
            surface,
            catalog,
            fetcher,
            background,
            events,
        } = parts;
        let gain_db = graph.set_gain_db(options.gain_db);

        Self {
            graph,
            surface,
            catalog,
            fetcher,
            background,
            events,
            session: Session::Idle,
            repeat_mode: options.repeat_mode,
            auto_advance: options.auto_advance,
            gain_db,
            artwork: ArtworkState::Empty,
            artwork_generation: 0,
            background_held: false,
            in_background: false,
            subscribers: Vec::new(),
        }
    }

    /// Dispatch one control event.
    pub fn handle(&mut self, event: ControlEvent) -> Flow {
        match event {
            ControlEvent::Remote(command) => {
                if let Err(e) = self.handle_remote(command) {
                    debug!("remote {command:?} rejected: {e}");
                }
            }
            ControlEvent::User(command) => {
                if let Err(e) = self.handle_user(command) {
                    warn!("{command:?} failed: {e}");
                }
            }
            ControlEvent::Session(event) => self.handle_session(event),
            ControlEvent::Artwork(fetched) => self.apply_artwork(fetched),
            ControlEvent::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    /// Remote commands fail without side effects when nothing is loaded.
    pub fn handle_remote(&mut self, command: RemoteCommand) -> Result<(), EngineError> {
        if self.session.active().is_none() {
            return Err(EngineError::NoCurrentTrack);
        }
        match command {
            RemoteCommand::Play => self.play(),
            RemoteCommand::Pause => self.pause(),
            RemoteCommand::TogglePlayPause => self.toggle(),
            RemoteCommand::Stop => {
                self.stop();
                Ok(())
            }
            RemoteCommand::Next => self.next(),
            RemoteCommand::Previous => self.previous(),
            RemoteCommand::SeekTo(secs) => self.seek(secs),
            RemoteCommand::SeekBy(delta) => self.seek_by(delta),
        }
    }

    pub fn handle_user(&mut self, command: UserCommand) -> Result<(), EngineError> {
        match command {
            UserCommand::TogglePlayPause => {
                if self.session.active().is_none() {
                    return self.resume_catalog();
                }
                self.toggle()
            }
            UserCommand::Stop => {
                self.stop();
                Ok(())
            }
            UserCommand::Next => self.next(),
            UserCommand::Previous => self.previous(),
            UserCommand::SeekBy(delta) => self.seek_by(delta),
            UserCommand::GainBy(step) => {
                self.set_gain_db(self.gain_db + step);
                Ok(())
            }
            UserCommand::CycleRepeat => {
                self.set_repeat_mode(self.repeat_mode.cycle());
                Ok(())
            }
            UserCommand::ToggleAutoAdvance => {
                self.set_auto_advance(!self.auto_advance);
                Ok(())
            }
            UserCommand::RemoveCurrent => {
                let id = self
                    .current_track()
                    .map(|t| t.id)
                    .ok_or(EngineError::NoCurrentTrack)?;
                self.remove_track(id)
            }
            UserCommand::PlayTrack(id) => {
                let track = self.find_track(id)?;
                self.load_playing(track)
            }
        }
    }

    /// Load and play the most recently played track, or the first one.
    fn resume_catalog(&mut self) -> Result<(), EngineError> {
        let tracks = self.catalog.tracks();
        let recent = self.catalog.recent();
        let track = recent
            .iter()
            .find_map(|id| tracks.iter().find(|t| t.id == *id))
            .or_else(|| tracks.first())
            .cloned()
            .ok_or(EngineError::NoCurrentTrack)?;
        self.load_playing(track)
    }

    fn find_track(&self, id: TrackId) -> Result<Track, EngineError> {
        self.catalog
            .tracks()
            .into_iter()
            .find(|t| t.id == id)
            .ok_or(EngineError::Catalog(CatalogError::UnknownTrack(id)))
    }

    pub fn state(&self) -> PlaybackState {
        self.session.state()
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.session.active().map(|s| &s.track)
    }

    /// Elapsed seconds as of the last tick or transition.
    pub fn position(&self) -> f64 {
        self.session.active().map_or(0.0, |s| s.position)
    }

    pub fn duration(&self) -> f64 {
        self.session.active().map_or(0.0, |s| s.duration)
    }

    pub fn repeat_mode(&self) -> RepeatMode {
        self.repeat_mode
    }

    pub fn auto_advance(&self) -> bool {
        self.auto_advance
    }

    pub fn gain_db(&self) -> f32 {
        self.gain_db
    }

    #[cfg(test)]
    pub fn catalog(&self) -> &dyn Catalog {
        self.catalog.as_ref()
    }

    pub fn set_repeat_mode(&mut self, mode: RepeatMode) {
        self.repeat_mode = mode;
        info!("repeat mode: {}", mode.label());
        self.emit_repeat();
    }

    pub fn set_auto_advance(&mut self, enabled: bool) {
        self.auto_advance = enabled;
        info!("auto-advance: {enabled}");
        self.emit_repeat();
    }

    /// Returns the gain actually applied after clamping.
    pub fn set_gain_db(&mut self, db: f32) -> f32 {
        self.gain_db = self.graph.set_gain_db(db);
        self.emit(PlayerEvent::Gain(self.gain_db));
        self.gain_db
    }

    /// Delete a track. Stops playback first if it is the current one.
    pub fn remove_track(&mut self, id: TrackId) -> Result<(), EngineError> {
        let track = self.find_track(id)?;
        if self.current_track().is_some_and(|t| t.id == id) {
            self.stop();
        }
        self.catalog.remove(&track)?;
        info!("removed {}", track.title);
        Ok(())
    }

    /// Observe state, track, position and settings changes.
    pub fn subscribe(&mut self) -> Receiver<PlayerEvent> {
        let (tx, rx) = std::sync::mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    fn emit(&mut self, event: PlayerEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn emit_repeat(&mut self) {
        self.emit(PlayerEvent::Repeat {
            mode: self.repeat_mode,
            auto_advance: self.auto_advance,
        });
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.graph.stop();
        self.release_background();
    }
}
