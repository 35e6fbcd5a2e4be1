use super::input::{map_event, map_key};
use super::startup::engine_options;
use super::status::{StatusLine, controls_text};
use crate::audio::{PlaybackState, RepeatMode};
use crate::catalog::{Track, TrackId};
use crate::config::{ControlsSettings, RepeatModeSetting, Settings};
use crate::engine::{ControlEvent, PlayerEvent, SessionEvent, UserCommand};
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyEventState, KeyModifiers};
use std::path::PathBuf;

fn press(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn user(event: Option<ControlEvent>) -> Option<UserCommand> {
    match event {
        Some(ControlEvent::User(c)) => Some(c),
        _ => None,
    }
}

fn idle_status() -> StatusLine {
    let mut status = StatusLine::default();
    status.apply(PlayerEvent::Repeat {
        mode: RepeatMode::Off,
        auto_advance: true,
    });
    status
}

#[test]
fn transport_keys_map_to_user_commands() {
    let controls = ControlsSettings::default();
    assert_eq!(
        user(map_key(press(KeyCode::Char(' ')), &controls)),
        Some(UserCommand::TogglePlayPause)
    );
    assert_eq!(
        user(map_key(press(KeyCode::Char('p')), &controls)),
        Some(UserCommand::TogglePlayPause)
    );
    assert_eq!(
        user(map_key(press(KeyCode::Char('s')), &controls)),
        Some(UserCommand::Stop)
    );
    assert_eq!(
        user(map_key(press(KeyCode::Char('l')), &controls)),
        Some(UserCommand::Next)
    );
    assert_eq!(
        user(map_key(press(KeyCode::Char('h')), &controls)),
        Some(UserCommand::Previous)
    );
    assert_eq!(user(map_key(press(KeyCode::Char('x')), &controls)), None);
}

#[test]
fn scrub_and_gain_keys_use_configured_steps() {
    let controls = ControlsSettings {
        scrub_seconds: 10,
        gain_step_db: 2.5,
    };
    assert_eq!(
        user(map_key(press(KeyCode::Char('L')), &controls)),
        Some(UserCommand::SeekBy(10.0))
    );
    assert_eq!(
        user(map_key(press(KeyCode::Char('H')), &controls)),
        Some(UserCommand::SeekBy(-10.0))
    );
    assert_eq!(
        user(map_key(press(KeyCode::Char('+')), &controls)),
        Some(UserCommand::GainBy(2.5))
    );
    assert_eq!(
        user(map_key(press(KeyCode::Char('-')), &controls)),
        Some(UserCommand::GainBy(-2.5))
    );
}

#[test]
fn quit_keys_request_quit() {
    let controls = ControlsSettings::default();
    assert!(matches!(
        map_key(press(KeyCode::Char('q')), &controls),
        Some(ControlEvent::Quit)
    ));
    assert!(matches!(
        map_key(
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
            &controls
        ),
        Some(ControlEvent::Quit)
    ));
}

#[test]
fn focus_changes_map_to_background_and_foreground() {
    let controls = ControlsSettings::default();
    assert!(matches!(
        map_event(Event::FocusLost, &controls),
        Some(ControlEvent::Session(SessionEvent::EnteredBackground))
    ));
    assert!(matches!(
        map_event(Event::FocusGained, &controls),
        Some(ControlEvent::Session(SessionEvent::EnteredForeground))
    ));
}

#[test]
fn key_releases_are_ignored() {
    let controls = ControlsSettings::default();
    let release = KeyEvent {
        code: KeyCode::Char('q'),
        modifiers: KeyModifiers::NONE,
        kind: KeyEventKind::Release,
        state: KeyEventState::NONE,
    };
    assert!(map_event(Event::Key(release), &controls).is_none());
}

#[test]
fn controls_text_includes_scrub_seconds() {
    let text = controls_text(7);
    assert!(text.contains("[H/L] scrub -/+7s"));
    assert!(text.contains("[q] quit"));
}

#[test]
fn status_line_follows_player_events() {
    let mut status = idle_status();
    assert_eq!(
        status.render(),
        "[idle] nothing loaded  repeat:off auto:on gain:+0.0dB"
    );

    status.apply(PlayerEvent::Track(Some(Track {
        id: TrackId::new(),
        title: "Song".into(),
        path: PathBuf::from("song.wav"),
        duration: 185.0,
        artwork: None,
    })));
    status.apply(PlayerEvent::State(PlaybackState::Playing));
    status.apply(PlayerEvent::Position {
        elapsed: 61.7,
        duration: 185.0,
    });
    status.apply(PlayerEvent::Gain(-3.0));
    status.apply(PlayerEvent::Repeat {
        mode: RepeatMode::Single,
        auto_advance: false,
    });

    assert_eq!(
        status.render(),
        "[playing] Song  01:01 / 03:05  repeat:single auto:off gain:-3.0dB"
    );

    let mut out = Vec::new();
    status.draw(&mut out).unwrap();
    assert!(String::from_utf8_lossy(&out).ends_with(&status.render()));
}

#[test]
fn engine_options_come_from_settings() {
    let mut settings = Settings::default();
    settings.playback.repeat_mode = RepeatModeSetting::All;
    settings.playback.auto_advance = false;
    settings.audio.gain_db = -6.0;

    let options = engine_options(&settings);

    assert_eq!(options.repeat_mode, RepeatMode::All);
    assert!(!options.auto_advance);
    assert_eq!(options.gain_db, -6.0);
}

mod command_line {
    use super::super::cli::{Cli, Command, list, remove, set_artwork};
    use crate::catalog::{Catalog, Library, Track, TrackId};
    use clap::{CommandFactory, Parser};
    use std::path::PathBuf;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("cadence").chain(args.iter().copied()))
    }

    fn library_with_track(root: &std::path::Path) -> (Library, Track) {
        let mut library = Library::open(root, 5).unwrap();
        std::fs::write(root.join("media").join("song.wav"), b"data").unwrap();
        let track = Track {
            id: TrackId::new(),
            title: "Song".into(),
            path: PathBuf::from("media/song.wav"),
            duration: 12.0,
            artwork: None,
        };
        library.append(track.clone());
        (library, track)
    }

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_arguments_runs_the_player() {
        let cli = parse(&[]).unwrap();
        assert_eq!(cli.command, None);
        assert_eq!(cli.import, None);
    }

    #[test]
    fn a_plain_argument_is_an_import_directory() {
        let cli = parse(&["/music"]).unwrap();
        assert_eq!(cli.command, None);
        assert_eq!(cli.import, Some(PathBuf::from("/music")));
    }

    #[test]
    fn subcommands_take_track_ids() {
        let id = TrackId::new();
        let text = id.to_string();
        let command = |args: &[&str]| parse(args).unwrap().command;

        assert_eq!(command(&["remove", &text]), Some(Command::Remove { id }));
        assert_eq!(command(&["play", &text]), Some(Command::Play { id }));
        assert_eq!(
            command(&["artwork", &text, "https://covers.test/a.jpg"]),
            Some(Command::Artwork {
                id,
                url: Some("https://covers.test/a.jpg".into())
            })
        );
        assert_eq!(
            command(&["artwork", &text]),
            Some(Command::Artwork { id, url: None })
        );
        assert_eq!(command(&["list"]), Some(Command::List));
    }

    #[test]
    fn bad_arguments_are_reported() {
        assert!(parse(&["remove"]).is_err());
        assert!(parse(&["remove", "not-an-id"]).is_err());
        assert!(parse(&["list", "extra"]).is_err());
        assert!(parse(&["/music", "/more"]).is_err());
        assert_eq!(
            parse(&["--help"]).unwrap_err().kind(),
            clap::error::ErrorKind::DisplayHelp
        );
    }

    #[test]
    fn list_marks_the_most_recent_track() {
        let dir = tempfile::tempdir().unwrap();
        let (mut library, track) = library_with_track(dir.path());
        library.record_recent(&track);

        let mut out = Vec::new();
        list(&library, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with(&format!("* {}", track.id)));
        assert!(text.contains("Song"));
    }

    #[test]
    fn artwork_and_remove_edit_the_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let (mut library, track) = library_with_track(dir.path());

        let title = set_artwork(&mut library, track.id, Some("file:///a.png".into())).unwrap();
        assert_eq!(title, "Song");
        let reopened = Library::open(dir.path(), 5).unwrap();
        assert_eq!(
            reopened.get(track.id).unwrap().artwork.as_deref(),
            Some("file:///a.png")
        );

        assert_eq!(remove(&mut library, track.id).unwrap(), "Song");
        assert!(library.is_empty());
        assert!(!dir.path().join("media/song.wav").exists());
        assert!(remove(&mut library, track.id).is_err());
    }
}

mod control_loop {
    use super::super::event_loop;
    use crate::audio::{RepeatMode, RodioGraph};
    use crate::catalog::Library;
    use crate::engine::{ControlEvent, Engine, EngineOptions, EngineParts, UserCommand};
    use crate::now_playing::{HttpArtworkFetcher, NowPlayingInfo, NowPlayingSurface};
    use crate::platform::NoInhibit;
    use std::sync::{Arc, mpsc};
    use std::time::Duration;

    struct Unobserved;

    impl NowPlayingSurface for Unobserved {
        fn publish(&mut self, _info: &NowPlayingInfo) {}

        fn clear(&mut self) {}

        fn seeked(&mut self, _elapsed: f64) {}
    }

    #[test]
    fn loop_applies_events_until_quit() {
        let dir = tempfile::tempdir().unwrap();
        let library = Library::open(dir.path(), 5).unwrap();
        let (tx, rx) = mpsc::channel();
        let mut engine = Engine::new(
            EngineParts {
                graph: Box::new(RodioGraph::new(0.0)),
                surface: Box::new(Unobserved),
                catalog: Box::new(library),
                fetcher: Arc::new(HttpArtworkFetcher),
                background: Box::new(NoInhibit),
                events: tx.clone(),
            },
            EngineOptions::default(),
        );
        let player_rx = engine.subscribe();

        tx.send(ControlEvent::User(UserCommand::CycleRepeat)).unwrap();
        tx.send(ControlEvent::Quit).unwrap();
        tx.send(ControlEvent::User(UserCommand::CycleRepeat)).unwrap();
        drop(tx);

        let mut out = Vec::new();
        event_loop::run(
            &mut engine,
            &rx,
            &player_rx,
            Duration::from_millis(5),
            &mut out,
        )
        .unwrap();

        assert_eq!(engine.repeat_mode(), RepeatMode::All);
        assert!(String::from_utf8_lossy(&out).contains("repeat:all"));
        // Nothing after the quit was consumed.
        assert!(matches!(
            rx.try_recv(),
            Ok(ControlEvent::User(UserCommand::CycleRepeat))
        ));
    }
}
