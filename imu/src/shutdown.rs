//! Cooperative shutdown on SIGINT / SIGTERM.

use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::flag;
use signal_hook::iterator::Signals;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::info;

const TERM_SIGNALS: [i32; 2] = [SIGINT, SIGTERM];

/// Write-once stop flag shared between the signal handler and the loop.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    flag: Arc<AtomicBool>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers SIGINT and SIGTERM.
    ///
    /// The signal handler sets the flag itself. A watcher thread only logs
    /// which signal arrived.
    pub fn install() -> io::Result<Self> {
        let shutdown = Shutdown::new();
        for signal in TERM_SIGNALS {
            flag::register(signal, Arc::clone(&shutdown.flag))?;
        }

        let mut signals = Signals::new(TERM_SIGNALS)?;
        thread::Builder::new()
            .name("signal-watch".to_string())
            .spawn(move || {
                for signal in signals.forever() {
                    info!("Process received signal {}", signal_name(signal));
                }
            })?;
        Ok(shutdown)
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

pub fn signal_name(signal: i32) -> &'static str {
    match signal {
        SIGINT => "SIGINT",
        SIGTERM => "SIGTERM",
        _ => "Unknown",
    }
}
