//! Process signal adapter.
//!
//! SIGINT and SIGTERM raise the [`StopFlag`] so the run loop finishes its
//! tick, switches the heater off, darkens the light and flushes telemetry.
//! The handlers are registered before [`listen_for_stop_signals`] returns;
//! a single-threaded tokio runtime on a helper thread waits for them.

use std::io;
use std::thread::{self, JoinHandle};

use log::info;
use tokio::runtime::Builder;

use crate::runner::StopFlag;

#[cfg(unix)]
struct StopSignals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl StopSignals {
    /// Must run inside the runtime context.
    fn register() -> io::Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.interrupt.recv() => "SIGINT",
            _ = self.terminate.recv() => "SIGTERM",
        }
    }
}

#[cfg(not(unix))]
struct StopSignals;

#[cfg(not(unix))]
impl StopSignals {
    fn register() -> io::Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) -> &'static str {
        match tokio::signal::ctrl_c().await {
            Ok(()) => "Ctrl-C",
            Err(e) => {
                log::warn!("Ctrl-C handler unavailable: {}", e);
                std::future::pending().await
            }
        }
    }
}

/// Install the stop handlers and wait for them on a background thread.
pub fn listen_for_stop_signals(stop: StopFlag) -> io::Result<JoinHandle<()>> {
    let runtime = Builder::new_current_thread().enable_io().build()?;
    let mut signals = {
        let _guard = runtime.enter();
        StopSignals::register()?
    };
    thread::Builder::new()
        .name("signals".into())
        .spawn(move || {
            let name = runtime.block_on(signals.recv());
            info!("{} received, stopping", name);
            stop.request();
        })
}
