use std::path::PathBuf;

use serde::Deserialize;

use crate::audio::RepeatMode;

/// Top-level application settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/cadence/config.toml` or `~/.config/cadence/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `CADENCE__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub audio: AudioSettings,
    pub playback: PlaybackSettings,
    pub library: LibrarySettings,
    pub session: SessionSettings,
    pub controls: ControlsSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Interval of the position clock (milliseconds).
    pub tick_interval_ms: u64,
    /// Initial gain of the processing stage, in decibels (clamped to [-24, +24]).
    pub gain_db: f32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 150,
            gain_db: 0.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// What happens when a track finishes.
    pub repeat_mode: RepeatModeSetting,
    /// Advance to the next catalog track on finish when `repeat_mode` is off.
    pub auto_advance: bool,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            repeat_mode: RepeatModeSetting::Off,
            auto_advance: true,
        }
    }
}

#[derive(Debug, Copy, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RepeatModeSetting {
    #[serde(alias = "none", alias = "no-repeat", alias = "no_loop", alias = "no-loop")]
    Off,
    #[serde(alias = "loop-all", alias = "loop_all", alias = "repeat-all")]
    All,
    #[serde(
        alias = "one",
        alias = "loop-one",
        alias = "loop_one",
        alias = "repeat-one"
    )]
    Single,
}

impl From<RepeatModeSetting> for RepeatMode {
    fn from(s: RepeatModeSetting) -> Self {
        match s {
            RepeatModeSetting::Off => RepeatMode::Off,
            RepeatModeSetting::All => RepeatMode::All,
            RepeatModeSetting::Single => RepeatMode::Single,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Storage root holding `library.toml` and the managed `media/` copies.
    /// Defaults to `$XDG_DATA_HOME/cadence` when unset.
    pub root: Option<PathBuf>,
    /// Maximum length of the recently played list.
    pub recent_limit: usize,
    /// File extensions to treat as audio when importing (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks while importing.
    pub follow_links: bool,
    /// Whether to import hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory recursion depth.
    pub max_depth: Option<usize>,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            root: None,
            recent_limit: 20,
            extensions: vec!["mp3".into(), "flac".into(), "wav".into(), "ogg".into()],
            follow_links: true,
            include_hidden: false,
            recursive: true,
            max_depth: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// How often the default output device is checked for changes (milliseconds).
    /// Set to 0 to disable the device watcher.
    pub device_poll_ms: u64,
    /// Hold a logind idle/sleep inhibitor while playing unfocused.
    pub inhibit_in_background: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            device_poll_ms: 2000,
            inhibit_in_background: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControlsSettings {
    /// Number of seconds to scrub when pressing `H` / `L`.
    pub scrub_seconds: u64,
    /// Gain change per `+` / `-` key press, in decibels.
    pub gain_step_db: f32,
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self {
            scrub_seconds: 5,
            gain_step_db: 1.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default log filter; `RUST_LOG` takes precedence when set.
    pub level: String,
    /// Log file. Defaults to `$XDG_STATE_HOME/cadence/cadence.log`.
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}
