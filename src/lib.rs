//! waveroam — wireless-link roaming supervisor.
//!
//! A long-running control loop that keeps one wireless interface associated
//! with the strongest available access point. Each tick it ensures the WPA
//! supplicant, its event feed, and (optionally) the DHCP client are alive,
//! samples link RSSI, and issues a debounced rescan when the signal is
//! unknown or below the configured threshold. On SIGTERM/SIGINT/SIGHUP it
//! finishes the in-flight tick, terminates the event feed, releases the DHCP
//! lease best-effort, and exits 0.
//!
//! It is not a network manager: SSIDs, credentials, and the WPA/DHCP
//! protocols belong to the supervised daemons.

pub mod cli_app;
pub mod core;
pub mod daemon;
pub mod monitor;
pub mod proc;
pub mod supervise;
