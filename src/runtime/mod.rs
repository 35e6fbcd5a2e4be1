use std::io::Write;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use clap::Parser;
use crossterm::event::{DisableFocusChange, EnableFocusChange};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use log::{info, warn};

use crate::catalog::TrackId;
use crate::config;
use crate::engine::{ControlEvent, UserCommand};

mod cli;
mod event_loop;
mod input;
mod settings;
mod startup;
mod status;

#[cfg(test)]
mod tests;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = cli::Cli::parse();

    let (settings, config_problem) = settings::load_settings();
    settings::init_logging(&settings);
    if let Some(problem) = config_problem {
        warn!("{problem}");
    }

    match cli.command {
        None => play(&settings, cli.import, None),
        Some(cli::Command::Play { id }) => play(&settings, None, Some(id)),
        Some(cli::Command::List) => {
            let library = startup::open_library(&settings, None)?;
            cli::list(&library, &mut std::io::stdout())?;
            Ok(())
        }
        Some(cli::Command::Remove { id }) => {
            let mut library = startup::open_library(&settings, None)?;
            let title = cli::remove(&mut library, id)?;
            println!("removed {title}");
            Ok(())
        }
        Some(cli::Command::Artwork { id, url }) => {
            let mut library = startup::open_library(&settings, None)?;
            let title = cli::set_artwork(&mut library, id, url)?;
            println!("updated artwork of {title}");
            Ok(())
        }
    }
}

fn play(
    settings: &config::Settings,
    import: Option<PathBuf>,
    track: Option<TrackId>,
) -> Result<(), Box<dyn std::error::Error>> {
    let library = startup::open_library(settings, import.as_deref())?;

    let (control_tx, control_rx) = mpsc::channel::<ControlEvent>();
    let mut engine = startup::build_engine(settings, library, &control_tx);
    let player_rx = engine.subscribe();
    if let Some(id) = track {
        let _ = control_tx.send(ControlEvent::User(UserCommand::PlayTrack(id)));
    }
    info!("cadence started");

    let mut stdout = std::io::stdout();
    println!("{}", status::controls_text(settings.controls.scrub_seconds));
    enable_raw_mode()?;
    execute!(stdout, EnableFocusChange)?;

    input::spawn_input(control_tx, settings.controls.clone());

    let run_result = event_loop::run(
        &mut engine,
        &control_rx,
        &player_rx,
        Duration::from_millis(settings.audio.tick_interval_ms),
        &mut stdout,
    );

    // Release the output and any inhibitor before the terminal is restored.
    drop(engine);
    execute!(stdout, DisableFocusChange)?;
    disable_raw_mode()?;
    writeln!(stdout)?;
    info!("cadence stopped");

    run_result?;
    Ok(())
}
