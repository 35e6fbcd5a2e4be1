use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{
    Arc, Mutex,
    mpsc::{self, Sender},
};

use async_io::block_on;
use log::{debug, warn};
use zbus::object_server::SignalEmitter;
use zbus::{Connection, interface};
use zvariant::{ObjectPath, OwnedValue, Value};

use crate::audio::PlaybackState;
use crate::catalog::TrackId;
use crate::engine::{ControlEvent, RemoteCommand};
use crate::now_playing::{Artwork, NowPlayingInfo, NowPlayingSurface};

const MPRIS_PATH: &str = "/org/mpris/MediaPlayer2";
const BUS_NAME: &str = "org.mpris.MediaPlayer2.cadence";

#[derive(Debug, Default)]
struct SharedState {
    playback: PlaybackState,
    title: Option<String>,
    length_micros: Option<i64>,
    position_micros: i64,
    rate: f64,
    art_url: Option<String>,
    track_id: Option<ObjectPath<'static>>,
}

impl SharedState {
    /// Whether anything announced through `PropertiesChanged` differs.
    /// Position is polled by clients and left out.
    fn announced_differs(&self, other: &SharedState) -> bool {
        self.playback != other.playback
            || self.title != other.title
            || self.length_micros != other.length_micros
            || self.rate != other.rate
            || self.art_url != other.art_url
            || self.track_id != other.track_id
    }
}

/// Work for the D-Bus thread.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Notify {
    Changed,
    /// New position in microseconds.
    Seeked(i64),
}

/// Writes now-playing state for the D-Bus thread and pokes it to emit
/// `PropertiesChanged` or `Seeked`.
pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
    notify: Sender<Notify>,
    art_dir: PathBuf,
    /// Track whose artwork is currently on disk, and its URL.
    art_written: Option<(TrackId, String)>,
}

fn secs_to_micros(secs: f64) -> i64 {
    if !secs.is_finite() {
        return 0;
    }
    (secs.max(0.0) * 1_000_000.0).round() as i64
}

fn insert_value(map: &mut HashMap<String, OwnedValue>, key: &str, value: Value<'_>) {
    if let Ok(v) = OwnedValue::try_from(value) {
        map.insert(key.to_string(), v);
    }
}

fn track_path(id: TrackId) -> Option<ObjectPath<'static>> {
    ObjectPath::try_from(format!("/org/cadence/track/{id}")).ok()
}

impl MprisHandle {
    /// Persist artwork bytes so clients can load them through `mpris:artUrl`.
    fn store_artwork(&mut self, artwork: &Artwork) -> Option<String> {
        if let Some((id, url)) = &self.art_written {
            if *id == artwork.track {
                return Some(url.clone());
            }
        }

        let path = self.art_dir.join(artwork.track.to_string());
        let written =
            fs::create_dir_all(&self.art_dir).and_then(|()| fs::write(&path, &artwork.bytes));
        if let Err(e) = written {
            warn!("cannot cache artwork at {}: {e}", path.display());
            return None;
        }
        let url = format!("file://{}", path.display());
        self.art_written = Some((artwork.track, url.clone()));
        Some(url)
    }
}

impl MprisHandle {
    /// Store `next`; only wake the D-Bus thread when clients would see a
    /// property change.
    fn replace_state(&mut self, next: SharedState) {
        let changed = match self.state.lock() {
            Ok(mut s) => {
                let changed = s.announced_differs(&next);
                *s = next;
                changed
            }
            Err(_) => false,
        };
        if changed {
            let _ = self.notify.send(Notify::Changed);
        }
    }
}

impl NowPlayingSurface for MprisHandle {
    fn publish(&mut self, info: &NowPlayingInfo) {
        let art_url = info.artwork.as_ref().and_then(|a| self.store_artwork(a));
        let next = SharedState {
            playback: info.status,
            title: Some(info.title.clone()),
            length_micros: Some(secs_to_micros(info.duration)),
            position_micros: secs_to_micros(info.elapsed),
            rate: info.rate,
            art_url,
            track_id: track_path(info.track),
        };
        self.replace_state(next);
    }

    fn clear(&mut self) {
        self.replace_state(SharedState::default());
    }

    fn seeked(&mut self, elapsed: f64) {
        let position = secs_to_micros(elapsed);
        if let Ok(mut s) = self.state.lock() {
            s.position_micros = position;
        }
        let _ = self.notify.send(Notify::Seeked(position));
    }
}

struct RootIface {
    tx: Sender<ControlEvent>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {
        // Nothing to raise in a terminal.
    }

    fn quit(&self) {
        let _ = self.tx.send(ControlEvent::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> &str {
        "cadence"
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec![]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    tx: Sender<ControlEvent>,
    state: Arc<Mutex<SharedState>>,
}

impl PlayerIface {
    fn send(&self, command: RemoteCommand) {
        let _ = self.tx.send(ControlEvent::Remote(command));
    }
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        self.send(RemoteCommand::Next);
    }

    fn previous(&self) {
        self.send(RemoteCommand::Previous);
    }

    fn play(&self) {
        self.send(RemoteCommand::Play);
    }

    fn pause(&self) {
        self.send(RemoteCommand::Pause);
    }

    fn play_pause(&self) {
        self.send(RemoteCommand::TogglePlayPause);
    }

    fn stop(&self) {
        self.send(RemoteCommand::Stop);
    }

    /// Relative seek, in microseconds.
    fn seek(&self, offset: i64) {
        self.send(RemoteCommand::SeekBy(offset as f64 / 1_000_000.0));
    }

    /// Absolute seek; ignored unless `track_id` is the current track.
    fn set_position(&self, track_id: ObjectPath<'_>, position: i64) {
        let current = self.state.lock().ok().and_then(|s| s.track_id.clone());
        if current.as_ref().map(|p| p.as_str()) != Some(track_id.as_str()) {
            debug!("SetPosition for stale track {track_id}");
            return;
        }
        self.send(RemoteCommand::SeekTo(position as f64 / 1_000_000.0));
    }

    #[zbus(signal)]
    async fn seeked(emitter: &SignalEmitter<'_>, position: i64) -> zbus::Result<()>;

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        let Ok(s) = self.state.lock() else {
            return "Stopped";
        };
        match s.playback {
            PlaybackState::Idle => "Stopped",
            PlaybackState::Playing => "Playing",
            PlaybackState::Loaded | PlaybackState::Paused => "Paused",
        }
    }

    #[zbus(property)]
    fn rate(&self) -> f64 {
        self.state.lock().map(|s| s.rate).unwrap_or(0.0)
    }

    #[zbus(property)]
    fn minimum_rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    fn maximum_rate(&self) -> f64 {
        1.0
    }

    /// Clients poll this; it is never announced through `PropertiesChanged`.
    #[zbus(property(emits_changed_signal = "false"))]
    fn position(&self) -> i64 {
        self.state.lock().map(|s| s.position_micros).unwrap_or(0)
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        self.state
            .lock()
            .map(|s| s.length_micros.is_some_and(|l| l > 0))
            .unwrap_or(false)
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let mut map = HashMap::new();
        let Ok(s) = self.state.lock() else {
            return map;
        };

        if let Some(id) = &s.track_id {
            insert_value(&mut map, "mpris:trackid", Value::from(id.clone()));
        }
        if let Some(title) = &s.title {
            insert_value(&mut map, "xesam:title", Value::from(title.as_str()));
        }
        if let Some(length) = s.length_micros {
            insert_value(&mut map, "mpris:length", Value::from(length));
        }
        if let Some(url) = &s.art_url {
            insert_value(&mut map, "mpris:artUrl", Value::from(url.as_str()));
        }
        map
    }
}

async fn serve(
    connection: &Connection,
    tx: Sender<ControlEvent>,
    state: Arc<Mutex<SharedState>>,
) -> zbus::Result<()> {
    connection.request_name(BUS_NAME).await?;
    let object_server = connection.object_server();
    object_server
        .at(MPRIS_PATH, RootIface { tx: tx.clone() })
        .await?;
    object_server
        .at(MPRIS_PATH, PlayerIface { tx, state })
        .await?;
    Ok(())
}

async fn emit_changes(connection: &Connection) -> zbus::Result<()> {
    let iface_ref = connection
        .object_server()
        .interface::<_, PlayerIface>(MPRIS_PATH)
        .await?;
    let iface = iface_ref.get().await;
    let emitter = iface_ref.signal_emitter();
    iface.playback_status_changed(emitter).await?;
    iface.metadata_changed(emitter).await?;
    iface.rate_changed(emitter).await?;
    iface.can_seek_changed(emitter).await?;
    Ok(())
}

async fn emit_seeked(connection: &Connection, position: i64) -> zbus::Result<()> {
    let iface_ref = connection
        .object_server()
        .interface::<_, PlayerIface>(MPRIS_PATH)
        .await?;
    PlayerIface::seeked(iface_ref.signal_emitter(), position).await
}

/// Fold a burst of notifications into one property round and the last seek.
fn coalesce(first: Notify, rest: impl Iterator<Item = Notify>) -> (bool, Option<i64>) {
    let mut changed = false;
    let mut seeked = None;
    for notify in std::iter::once(first).chain(rest) {
        match notify {
            Notify::Changed => changed = true,
            Notify::Seeked(position) => seeked = Some(position),
        }
    }
    (changed, seeked)
}

/// Register the MPRIS service on the session bus from a background thread.
///
/// Failures to reach the bus are logged; the returned handle then simply
/// has no listener.
pub fn spawn_mpris(tx: Sender<ControlEvent>, art_dir: PathBuf) -> MprisHandle {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (notify_tx, notify_rx) = mpsc::channel::<Notify>();

    let state_for_thread = Arc::clone(&state);
    std::thread::spawn(move || {
        let connection = match block_on(Connection::session()) {
            Ok(c) => c,
            Err(e) => {
                warn!("MPRIS: failed to connect to session bus: {e}");
                return;
            }
        };
        if let Err(e) = block_on(serve(&connection, tx, state_for_thread)) {
            warn!("MPRIS: failed to register service: {e}");
            return;
        }
        debug!("MPRIS: serving {BUS_NAME}");

        while let Ok(first) = notify_rx.recv() {
            let (changed, seeked) = coalesce(first, notify_rx.try_iter());
            if changed {
                if let Err(e) = block_on(emit_changes(&connection)) {
                    debug!("MPRIS: failed to emit property changes: {e}");
                }
            }
            if let Some(position) = seeked {
                if let Err(e) = block_on(emit_seeked(&connection, position)) {
                    debug!("MPRIS: failed to emit Seeked: {e}");
                }
            }
        }
    });

    MprisHandle {
        state,
        notify: notify_tx,
        art_dir,
        art_written: None,
    }
}

#[cfg(test)]
mod tests;
