use std::fs::{self, OpenOptions};

use env_logger::{Builder, Env, Target};

use crate::config;

/// Load settings, falling back to defaults on any problem. The problem is
/// handed back so it can be logged once logging is up.
pub fn load_settings() -> (config::Settings, Option<String>) {
    match config::Settings::load() {
        Ok(s) => match s.validate() {
            Ok(()) => (s, None),
            Err(msg) => (
                config::Settings::default(),
                Some(format!("invalid config, using defaults: {msg}")),
            ),
        },
        // Config is optional; failures should not prevent the app from starting.
        Err(e) => (
            config::Settings::default(),
            Some(format!("failed to load config, using defaults: {e}")),
        ),
    }
}

/// Send log output to the configured file so the terminal stays clean.
/// `RUST_LOG` overrides the configured level.
pub fn init_logging(settings: &config::Settings) {
    let mut builder = Builder::from_env(Env::default().default_filter_or(&settings.logging.level));

    let path = settings.log_file();
    let file = path
        .parent()
        .map_or(Ok(()), fs::create_dir_all)
        .and_then(|()| OpenOptions::new().create(true).append(true).open(&path));
    match file {
        Ok(file) => {
            builder.target(Target::Pipe(Box::new(file)));
        }
        Err(e) => {
            // Nothing sensible to log to; keep the terminal usable.
            eprintln!("cadence: cannot open log file {}: {e}", path.display());
            builder.filter_level(log::LevelFilter::Off);
        }
    }

    let _ = builder.try_init();
}
