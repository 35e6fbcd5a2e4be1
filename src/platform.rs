//! Platform hooks: output device monitoring and keeping the system awake
//! while playing in the background.

mod device;
mod inhibit;

pub use device::spawn_device_watcher;
pub use inhibit::{LogindInhibitor, NoInhibit};
