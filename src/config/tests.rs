use super::load::{default_config_path, resolve_config_path};
use super::schema::*;
use crate::audio::RepeatMode;
use std::sync::{Mutex, OnceLock};

static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    ENV_LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|e| e.into_inner())
}

struct EnvGuard {
    key: &'static str,
    old: Option<std::ffi::OsString>,
}

impl EnvGuard {
    fn set(key: &'static str, val: &str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::set_var(key, val);
        }
        Self { key, old }
    }

    fn remove(key: &'static str) -> Self {
        let old = std::env::var_os(key);
        unsafe {
            std::env::remove_var(key);
        }
        Self { key, old }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        match self.old.take() {
            Some(v) => unsafe {
                std::env::set_var(self.key, v);
            },
            None => unsafe {
                std::env::remove_var(self.key);
            },
        }
    }
}

#[test]
fn resolve_config_path_prefers_cadence_config_path() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("CADENCE_CONFIG_PATH", "/tmp/cadence-test-config.toml");
    assert_eq!(
        resolve_config_path().unwrap(),
        std::path::PathBuf::from("/tmp/cadence-test-config.toml")
    );
}

#[test]
fn default_config_path_prefers_xdg_config_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_CONFIG_HOME", "/tmp/xdg-config-home");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-should-not-win");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/xdg-config-home")
            .join("cadence")
            .join("config.toml")
    );
}

#[test]
fn default_config_path_falls_back_to_home_dot_config() {
    let _lock = env_lock();
    let _g1 = EnvGuard::remove("XDG_CONFIG_HOME");
    let _g2 = EnvGuard::set("HOME", "/tmp/home-dir");

    let p = default_config_path().unwrap();
    assert_eq!(
        p,
        std::path::PathBuf::from("/tmp/home-dir")
            .join(".config")
            .join("cadence")
            .join("config.toml")
    );
}

#[test]
fn library_root_defaults_under_xdg_data_home() {
    let _lock = env_lock();
    let _g1 = EnvGuard::set("XDG_DATA_HOME", "/tmp/xdg-data");

    let s = Settings::default();
    assert_eq!(
        s.library_root(),
        std::path::PathBuf::from("/tmp/xdg-data").join("cadence")
    );
}

#[test]
fn settings_load_from_config_file_and_parse_repeat_mode_aliases() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[playback]
repeat_mode = "repeat-one"
auto_advance = false

[audio]
tick_interval_ms = 200
gain_db = -6.0

[controls]
scrub_seconds = 9
gain_step_db = 2.0

[session]
device_poll_ms = 0
inhibit_in_background = false

[library]
root = "/tmp/cadence-lib"
recent_limit = 5
extensions = ["mp3"]
recursive = false
include_hidden = true
follow_links = false

[logging]
level = "debug"
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("CADENCE_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::remove("CADENCE__AUDIO__TICK_INTERVAL_MS");

    let s = Settings::load().unwrap();
    assert!(matches!(s.playback.repeat_mode, RepeatModeSetting::Single));
    assert_eq!(RepeatMode::from(s.playback.repeat_mode), RepeatMode::Single);
    assert!(!s.playback.auto_advance);
    assert_eq!(s.audio.tick_interval_ms, 200);
    assert_eq!(s.audio.gain_db, -6.0);
    assert_eq!(s.controls.scrub_seconds, 9);
    assert_eq!(s.controls.gain_step_db, 2.0);
    assert_eq!(s.session.device_poll_ms, 0);
    assert!(!s.session.inhibit_in_background);
    assert_eq!(
        s.library.root.as_deref(),
        Some(std::path::Path::new("/tmp/cadence-lib"))
    );
    assert_eq!(s.library.recent_limit, 5);
    assert_eq!(s.library.extensions, vec!["mp3".to_string()]);
    assert!(!s.library.recursive);
    assert!(s.library.include_hidden);
    assert!(!s.library.follow_links);
    assert_eq!(s.logging.level, "debug");
    assert!(s.validate().is_ok());
}

#[test]
fn settings_env_overrides_config_file() {
    let _lock = env_lock();

    let dir = tempfile::tempdir().unwrap();
    let cfg_path = dir.path().join("config.toml");
    std::fs::write(
        &cfg_path,
        r#"
[audio]
tick_interval_ms = 250
"#,
    )
    .unwrap();

    let _g1 = EnvGuard::set("CADENCE_CONFIG_PATH", cfg_path.to_str().unwrap());
    let _g2 = EnvGuard::set("CADENCE__AUDIO__TICK_INTERVAL_MS", "100");

    let s = Settings::load().unwrap();
    assert_eq!(s.audio.tick_interval_ms, 100);
}

#[test]
fn validate_rejects_zero_recent_limit_and_tiny_tick() {
    let mut s = Settings::default();
    assert!(s.validate().is_ok());

    s.library.recent_limit = 0;
    assert!(s.validate().is_err());

    let mut s = Settings::default();
    s.audio.tick_interval_ms = 1;
    assert!(s.validate().is_err());
}
