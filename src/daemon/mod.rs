//! Daemon subsystem: roaming control loop and shutdown signal handling.

pub mod loop_main;
pub mod signals;
