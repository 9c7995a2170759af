//! Process plumbing: external command execution and pid-file liveness.

pub mod command;
pub mod pidfile;
