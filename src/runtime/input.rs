//! Keyboard and focus input, read on its own thread.

use std::sync::mpsc::Sender;
use std::thread;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::warn;

use crate::config::ControlsSettings;
use crate::engine::{ControlEvent, SessionEvent, UserCommand};

/// Translate one key press into a control event.
pub fn map_key(key: KeyEvent, controls: &ControlsSettings) -> Option<ControlEvent> {
    let scrub = controls.scrub_seconds as f64;
    let command = match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            return Some(ControlEvent::Quit);
        }
        KeyCode::Char('q') | KeyCode::Esc => return Some(ControlEvent::Quit),
        KeyCode::Char(' ') | KeyCode::Char('p') => UserCommand::TogglePlayPause,
        KeyCode::Char('s') => UserCommand::Stop,
        KeyCode::Char('l') | KeyCode::Right => UserCommand::Next,
        KeyCode::Char('h') | KeyCode::Left => UserCommand::Previous,
        KeyCode::Char('L') => UserCommand::SeekBy(scrub),
        KeyCode::Char('H') => UserCommand::SeekBy(-scrub),
        KeyCode::Char('+') | KeyCode::Char('=') => UserCommand::GainBy(controls.gain_step_db),
        KeyCode::Char('-') => UserCommand::GainBy(-controls.gain_step_db),
        KeyCode::Char('r') => UserCommand::CycleRepeat,
        KeyCode::Char('a') => UserCommand::ToggleAutoAdvance,
        KeyCode::Char('D') => UserCommand::RemoveCurrent,
        _ => return None,
    };
    Some(ControlEvent::User(command))
}

/// Terminal focus stands in for the app moving between foreground and
/// background.
pub fn map_event(event: Event, controls: &ControlsSettings) -> Option<ControlEvent> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => map_key(key, controls),
        Event::FocusLost => Some(ControlEvent::Session(SessionEvent::EnteredBackground)),
        Event::FocusGained => Some(ControlEvent::Session(SessionEvent::EnteredForeground)),
        _ => None,
    }
}

/// Forward terminal input to the control queue until quit is requested or
/// the queue goes away.
pub fn spawn_input(tx: Sender<ControlEvent>, controls: ControlsSettings) {
    thread::spawn(move || {
        loop {
            let event = match event::read() {
                Ok(ev) => ev,
                Err(e) => {
                    warn!("terminal input failed: {e}");
                    let _ = tx.send(ControlEvent::Quit);
                    return;
                }
            };
            let Some(control) = map_event(event, &controls) else {
                continue;
            };
            let quit = matches!(control, ControlEvent::Quit);
            if tx.send(control).is_err() || quit {
                return;
            }
        }
    });
}
