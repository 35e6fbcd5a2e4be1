use std::{env, path::PathBuf};

use super::schema::Settings;

/// Layering, lowest first: struct defaults, the TOML file, then
/// `CADENCE__SECTION__KEY` variables.
impl Settings {
    /// Build settings from the config file (if any) and the environment.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("CADENCE")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.audio.tick_interval_ms < 10 {
            return Err("audio.tick_interval_ms must be >= 10".to_string());
        }
        if !self.audio.gain_db.is_finite() {
            return Err("audio.gain_db must be a finite number".to_string());
        }
        if self.library.recent_limit == 0 {
            return Err("library.recent_limit must be >= 1".to_string());
        }
        if !(self.controls.gain_step_db > 0.0) {
            return Err("controls.gain_step_db must be > 0".to_string());
        }
        Ok(())
    }

    /// Storage root of the track catalog.
    pub fn library_root(&self) -> PathBuf {
        self.library
            .root
            .clone()
            .unwrap_or_else(|| xdg_dir("XDG_DATA_HOME", ".local/share").join("cadence"))
    }

    /// Where artwork images are cached for the now-playing surface.
    pub fn artwork_cache_dir(&self) -> PathBuf {
        xdg_dir("XDG_CACHE_HOME", ".cache")
            .join("cadence")
            .join("artwork")
    }

    /// Destination of the log output.
    pub fn log_file(&self) -> PathBuf {
        self.logging.file.clone().unwrap_or_else(|| {
            xdg_dir("XDG_STATE_HOME", ".local/state")
                .join("cadence")
                .join("cadence.log")
        })
    }
}

/// Resolve the config path from `CADENCE_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("CADENCE_CONFIG_PATH") {
        let p = PathBuf::from(p);
        return Some(p);
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/cadence/config.toml`
/// or `~/.config/cadence/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    let config_home = if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        Some(PathBuf::from(xdg))
    } else if let Some(home) = env::var_os("HOME") {
        Some(PathBuf::from(home).join(".config"))
    } else {
        None
    };

    config_home.map(|d| d.join("cadence").join("config.toml"))
}

/// `$<var>` if set, else `$HOME/<fallback>`, else a relative `<fallback>`.
fn xdg_dir(var: &str, fallback: &str) -> PathBuf {
    if let Some(dir) = env::var_os(var) {
        return PathBuf::from(dir);
    }
    match env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(fallback),
        None => PathBuf::from(fallback),
    }
}
