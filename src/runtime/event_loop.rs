use std::io::Write;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

use log::debug;

use crate::engine::{ControlEvent, Engine, Flow, PlayerEvent};
use crate::runtime::status::StatusLine;

/// Main control loop: the only place the engine is driven from. Applies
/// queued events as they arrive and fires the clock tick every `tick`.
///
/// Returns only on `ControlEvent::Quit`. The engine keeps a sender of its
/// own for artwork completions, so the queue never disconnects.
pub fn run<W: Write>(
    engine: &mut Engine,
    control_rx: &Receiver<ControlEvent>,
    player_rx: &Receiver<PlayerEvent>,
    tick: Duration,
    out: &mut W,
) -> std::io::Result<()> {
    let mut status = StatusLine::new(engine);
    status.draw(out)?;
    let mut next_tick = Instant::now() + tick;

    loop {
        let timeout = next_tick.saturating_duration_since(Instant::now());
        if let Ok(event) = control_rx.recv_timeout(timeout) {
            if engine.handle(event) == Flow::Quit {
                debug!("quit requested");
                break;
            }
        }

        let now = Instant::now();
        if now >= next_tick {
            engine.tick();
            next_tick += tick;
            // Don't try to catch up on ticks missed while busy.
            if next_tick < now {
                next_tick = now + tick;
            }
        }

        let mut changed = false;
        for event in player_rx.try_iter() {
            status.apply(event);
            changed = true;
        }
        if changed {
            status.draw(out)?;
        }
    }

    Ok(())
}
