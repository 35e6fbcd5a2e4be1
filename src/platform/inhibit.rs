//! Background execution through a logind inhibitor lock.
//!
//! Logind hands back a file descriptor; the lock holds for as long as that
//! descriptor stays open.

use async_io::block_on;
use log::{debug, warn};
use zbus::Connection;
use zvariant::OwnedFd;

use crate::engine::BackgroundExecution;

const WHO: &str = "cadence";
const WHY: &str = "Playing audio in the background";

#[derive(Debug, Default)]
pub struct LogindInhibitor {
    lock: Option<OwnedFd>,
}

impl LogindInhibitor {
    pub fn new() -> Self {
        Self::default()
    }
}

async fn take_lock() -> zbus::Result<OwnedFd> {
    let connection = Connection::system().await?;
    let reply = connection
        .call_method(
            Some("org.freedesktop.login1"),
            "/org/freedesktop/login1",
            Some("org.freedesktop.login1.Manager"),
            "Inhibit",
            &("sleep:idle", WHO, WHY, "block"),
        )
        .await?;
    let fd: OwnedFd = reply.body().deserialize()?;
    Ok(fd)
}

impl BackgroundExecution for LogindInhibitor {
    fn begin(&mut self) -> bool {
        if self.lock.is_some() {
            return true;
        }
        match block_on(take_lock()) {
            Ok(fd) => {
                debug!("sleep inhibitor taken");
                self.lock = Some(fd);
                true
            }
            Err(e) => {
                warn!("cannot inhibit sleep: {e}");
                false
            }
        }
    }

    fn end(&mut self) {
        if self.lock.take().is_some() {
            debug!("sleep inhibitor released");
        }
    }
}

/// Used when background inhibition is turned off in the config.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoInhibit;

impl BackgroundExecution for NoInhibit {
    fn begin(&mut self) -> bool {
        false
    }

    fn end(&mut self) {}
}
