use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use std::time::Duration;

use log::warn;

use crate::audio::RodioGraph;
use crate::catalog::{CatalogError, Library, import_dir};
use crate::config;
use crate::engine::{BackgroundExecution, ControlEvent, Engine, EngineOptions, EngineParts};
use crate::mpris::spawn_mpris;
use crate::now_playing::HttpArtworkFetcher;
use crate::platform::{LogindInhibitor, NoInhibit, spawn_device_watcher};

/// Open the catalog and import `dir` into it when given.
pub fn open_library(
    settings: &config::Settings,
    dir: Option<&Path>,
) -> Result<Library, CatalogError> {
    let mut library = Library::open(&settings.library_root(), settings.library.recent_limit)?;

    if let Some(dir) = dir {
        import_dir(&mut library, dir, &settings.library);
    }
    if library.is_empty() {
        warn!("catalog is empty; pass a directory to import");
    }
    Ok(library)
}

pub fn engine_options(settings: &config::Settings) -> EngineOptions {
    EngineOptions {
        repeat_mode: settings.playback.repeat_mode.into(),
        auto_advance: settings.playback.auto_advance,
        gain_db: settings.audio.gain_db,
    }
}

/// Wire the engine to the real output, MPRIS and platform hooks.
pub fn build_engine(
    settings: &config::Settings,
    library: Library,
    tx: &Sender<ControlEvent>,
) -> Engine {
    let background: Box<dyn BackgroundExecution> = if settings.session.inhibit_in_background {
        Box::new(LogindInhibitor::new())
    } else {
        Box::new(NoInhibit)
    };
    let surface = spawn_mpris(tx.clone(), settings.artwork_cache_dir());

    if settings.session.device_poll_ms > 0 {
        spawn_device_watcher(
            tx.clone(),
            Duration::from_millis(settings.session.device_poll_ms),
        );
    }

    Engine::new(
        EngineParts {
            graph: Box::new(RodioGraph::new(settings.audio.gain_db)),
            surface: Box::new(surface),
            catalog: Box::new(library),
            fetcher: Arc::new(HttpArtworkFetcher),
            background,
            events: tx.clone(),
        },
        engine_options(settings),
    )
}
