use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use log::{debug, info};
use rodio::cpal::traits::{DeviceTrait, HostTrait};

use crate::engine::{ControlEvent, SessionEvent};

/// Name of the current default output device, if there is one.
fn default_output_name() -> Option<String> {
    rodio::cpal::default_host()
        .default_output_device()
        .and_then(|d| d.name().ok())
}

/// Map a change of default output device to the session event it implies.
pub(crate) fn classify(previous: Option<&str>, current: Option<&str>) -> Option<SessionEvent> {
    match (previous, current) {
        (Some(_), None) => Some(SessionEvent::InterruptionBegan),
        (None, Some(_)) => Some(SessionEvent::InterruptionEnded {
            should_resume: true,
        }),
        (Some(a), Some(b)) if a != b => Some(SessionEvent::RouteChanged),
        _ => None,
    }
}

/// Poll the default output device and post interruption and route changes
/// to the control queue. The thread exits once the queue is gone.
pub fn spawn_device_watcher(tx: Sender<ControlEvent>, interval: Duration) {
    thread::spawn(move || {
        let mut current = default_output_name();
        debug!("default output device: {current:?}");

        loop {
            thread::sleep(interval);
            let next = default_output_name();
            if let Some(event) = classify(current.as_deref(), next.as_deref()) {
                info!("output device {current:?} -> {next:?}");
                if tx.send(ControlEvent::Session(event)).is_err() {
                    break;
                }
            }
            current = next;
        }
    });
}
