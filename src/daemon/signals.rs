//! Shutdown signal wiring.
//!
//! The only asynchronous input to the daemon is termination. Each handled
//! signal flips a shared atomic flag; the control loop reads it at tick
//! boundaries, so no state beyond the flag is ever touched from signal
//! context.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
use signal_hook::flag;

use crate::core::errors::{Result, WrError};

/// Register SIGTERM/SIGINT/SIGHUP to set the returned shutdown flag.
pub fn register_shutdown_flag() -> Result<Arc<AtomicBool>> {
    let shutdown = Arc::new(AtomicBool::new(false));
    for sig in [SIGTERM, SIGINT, SIGHUP] {
        flag::register(sig, Arc::clone(&shutdown)).map_err(|e| WrError::Signal {
            details: format!("signal {sig}: {e}"),
        })?;
    }
    Ok(shutdown)
}
