use super::*;
use std::sync::mpsc::Receiver;

fn handle(art_dir: PathBuf) -> (MprisHandle, Arc<Mutex<SharedState>>, Receiver<Notify>) {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (notify_tx, notify_rx) = mpsc::channel::<Notify>();
    let handle = MprisHandle {
        state: state.clone(),
        notify: notify_tx,
        art_dir,
        art_written: None,
    };
    (handle, state, notify_rx)
}

fn info(track: TrackId) -> NowPlayingInfo {
    NowPlayingInfo {
        track,
        title: "Test Title".to_string(),
        elapsed: 12.5,
        duration: 1.234_567,
        rate: 1.0,
        artwork: None,
        status: PlaybackState::Playing,
    }
}

fn player(state: Arc<Mutex<SharedState>>) -> (PlayerIface, Receiver<ControlEvent>) {
    let (tx, rx) = mpsc::channel::<ControlEvent>();
    (PlayerIface { tx, state }, rx)
}

#[test]
fn publish_sets_and_clear_resets_shared_state() {
    let dir = tempfile::tempdir().unwrap();
    let (mut handle, state, notify) = handle(dir.path().to_path_buf());
    let id = TrackId::new();

    handle.publish(&info(id));

    {
        let s = state.lock().unwrap();
        assert_eq!(s.title.as_deref(), Some("Test Title"));
        assert_eq!(s.length_micros, Some(1_234_567));
        assert_eq!(s.position_micros, 12_500_000);
        assert_eq!(s.rate, 1.0);
        assert_eq!(s.playback, PlaybackState::Playing);
        assert_eq!(
            s.track_id.as_ref().map(|p| p.as_str().to_string()),
            Some(format!("/org/cadence/track/{id}"))
        );
    }

    handle.clear();
    {
        let s = state.lock().unwrap();
        assert_eq!(s.title, None);
        assert_eq!(s.length_micros, None);
        assert_eq!(s.playback, PlaybackState::Idle);
        assert!(s.track_id.is_none());
    }

    assert_eq!(notify.try_iter().count(), 2);
}

#[test]
fn position_only_updates_do_not_announce_property_changes() {
    let dir = tempfile::tempdir().unwrap();
    let (mut handle, state, notify) = handle(dir.path().to_path_buf());
    let id = TrackId::new();
    let mut playing = info(id);

    handle.publish(&playing);
    playing.elapsed = 12.65;
    handle.publish(&playing);
    playing.elapsed = 12.8;
    handle.publish(&playing);

    assert_eq!(state.lock().unwrap().position_micros, 12_800_000);
    assert_eq!(notify.try_iter().collect::<Vec<_>>(), vec![Notify::Changed]);

    playing.rate = 0.0;
    playing.status = PlaybackState::Paused;
    handle.publish(&playing);
    assert_eq!(notify.try_iter().collect::<Vec<_>>(), vec![Notify::Changed]);

    handle.clear();
    handle.clear();
    assert_eq!(notify.try_iter().count(), 1);
}

#[test]
fn seek_is_announced_with_the_new_position() {
    let dir = tempfile::tempdir().unwrap();
    let (mut handle, state, notify) = handle(dir.path().to_path_buf());
    handle.publish(&info(TrackId::new()));
    let _ = notify.try_iter().count();

    handle.seeked(42.25);

    assert_eq!(state.lock().unwrap().position_micros, 42_250_000);
    assert_eq!(
        notify.try_iter().collect::<Vec<_>>(),
        vec![Notify::Seeked(42_250_000)]
    );
}

#[test]
fn bursts_coalesce_into_one_change_and_the_last_seek() {
    let burst = vec![Notify::Seeked(1), Notify::Changed, Notify::Seeked(2)];
    assert_eq!(
        coalesce(Notify::Changed, burst.into_iter()),
        (true, Some(2))
    );
    assert_eq!(
        coalesce(Notify::Seeked(5), std::iter::empty()),
        (false, Some(5))
    );
}

#[test]
fn artwork_is_written_once_and_exposed_as_file_url() {
    let dir = tempfile::tempdir().unwrap();
    let art_dir = dir.path().join("artwork");
    let (mut handle, state, _notify) = handle(art_dir.clone());
    let id = TrackId::new();
    let mut published = info(id);
    published.artwork = Some(Artwork {
        track: id,
        bytes: Arc::from(vec![1u8, 2, 3]),
    });

    handle.publish(&published);
    let path = art_dir.join(id.to_string());
    assert_eq!(fs::read(&path).unwrap(), vec![1, 2, 3]);
    let url = state.lock().unwrap().art_url.clone().unwrap();
    assert_eq!(url, format!("file://{}", path.display()));

    // A second publish reuses the cached file.
    fs::remove_file(&path).unwrap();
    handle.publish(&published);
    assert!(!path.exists());
    assert_eq!(state.lock().unwrap().art_url.as_deref(), Some(url.as_str()));
}

#[test]
fn playback_status_maps_state_to_mpris_strings() {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (iface, _rx) = player(state.clone());

    for (playback, expected) in [
        (PlaybackState::Idle, "Stopped"),
        (PlaybackState::Loaded, "Paused"),
        (PlaybackState::Playing, "Playing"),
        (PlaybackState::Paused, "Paused"),
    ] {
        state.lock().unwrap().playback = playback;
        assert_eq!(iface.playback_status(), expected);
    }
}

#[test]
fn metadata_includes_expected_keys_when_present() {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (iface, _rx) = player(state.clone());

    {
        let mut s = state.lock().unwrap();
        s.title = Some("Title".to_string());
        s.art_url = Some("file:///tmp/cover.jpg".to_string());
        s.length_micros = Some(42);
        s.track_id = ObjectPath::try_from("/org/cadence/track/1")
            .ok()
            .map(|p| p.to_owned());
    }

    let map = iface.metadata();
    for k in ["mpris:trackid", "xesam:title", "mpris:length", "mpris:artUrl"] {
        assert!(map.contains_key(k), "missing key: {k}");
    }
}

#[test]
fn metadata_is_empty_when_idle() {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (iface, _rx) = player(state);
    assert!(iface.metadata().is_empty());
    assert!(!iface.can_seek());
}

#[test]
fn transport_methods_forward_remote_commands() {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (iface, rx) = player(state);

    iface.play();
    iface.pause();
    iface.play_pause();
    iface.stop();
    iface.next();
    iface.previous();
    iface.seek(-2_500_000);

    let commands: Vec<RemoteCommand> = rx
        .try_iter()
        .map(|ev| match ev {
            ControlEvent::Remote(c) => c,
            other => panic!("unexpected event {other:?}"),
        })
        .collect();
    assert_eq!(
        commands,
        vec![
            RemoteCommand::Play,
            RemoteCommand::Pause,
            RemoteCommand::TogglePlayPause,
            RemoteCommand::Stop,
            RemoteCommand::Next,
            RemoteCommand::Previous,
            RemoteCommand::SeekBy(-2.5),
        ]
    );
}

#[test]
fn set_position_only_applies_to_the_current_track() {
    let state = Arc::new(Mutex::new(SharedState::default()));
    let (iface, rx) = player(state.clone());
    let id = TrackId::new();
    state.lock().unwrap().track_id = track_path(id);

    let stale = ObjectPath::try_from("/org/cadence/track/other").unwrap();
    iface.set_position(stale, 1_000_000);
    assert!(rx.try_recv().is_err());

    let current = track_path(id).unwrap();
    iface.set_position(current, 3_000_000);
    assert!(matches!(
        rx.try_recv(),
        Ok(ControlEvent::Remote(RemoteCommand::SeekTo(t))) if t == 3.0
    ));
}

#[test]
fn root_quit_asks_the_control_loop_to_exit() {
    let (tx, rx) = mpsc::channel::<ControlEvent>();
    let root = RootIface { tx };
    root.quit();
    assert!(matches!(rx.try_recv(), Ok(ControlEvent::Quit)));
}
