//! Configuration: cadence, filesystem contracts, and collaborator commands.
//!
//! Paths and argv shapes are contracts with the companion daemons
//! (`wpa_supplicant`, `wpa_cli`, `dhcpcd`, `iw`, `systemctl`), not internal
//! choices. Defaults reproduce those conventions exactly; a TOML file can
//! redirect them, which is also how the test suites point the supervisor at
//! scratch directories.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::core::errors::{Result, WrError};

/// Control-loop cadence and wait bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoamConfig {
    /// Delay between control-loop ticks, in milliseconds.
    pub tick_ms: u64,
    /// Minimum gap between consecutive rescan triggers, in milliseconds.
    pub cooldown_ms: u64,
    /// Delay between liveness/readiness polls, in milliseconds.
    pub poll_interval_ms: u64,
    /// Upper bound on waiting for the supplicant control socket, in seconds.
    pub socket_wait_secs: u64,
    /// Upper bound on waiting for a terminated process to exit, in seconds.
    pub terminate_wait_secs: u64,
}

impl Default for RoamConfig {
    fn default() -> Self {
        Self {
            tick_ms: 100,
            cooldown_ms: 1000,
            poll_interval_ms: 1000,
            socket_wait_secs: 60,
            terminate_wait_secs: 30,
        }
    }
}

impl RoamConfig {
    /// Tick delay as a [`Duration`].
    #[must_use]
    pub const fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Rescan cooldown window as a [`Duration`].
    #[must_use]
    pub const fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    /// Poll interval as a [`Duration`].
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Socket-wait bound as a [`Duration`].
    #[must_use]
    pub const fn socket_wait(&self) -> Duration {
        Duration::from_secs(self.socket_wait_secs)
    }

    /// Terminate-wait bound as a [`Duration`].
    #[must_use]
    pub const fn terminate_wait(&self) -> Duration {
        Duration::from_secs(self.terminate_wait_secs)
    }
}

/// Filesystem touchpoints shared with the companion daemons.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding the supplicant control sockets (one per interface)
    /// and the event-feed pid files.
    pub supplicant_run_dir: PathBuf,
    /// Directory where dhcpcd writes its per-interface pid file.
    pub dhcpcd_run_dir: PathBuf,
    /// Action script handed to the event feed.
    pub action_script: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            supplicant_run_dir: PathBuf::from("/var/run/wpa_supplicant"),
            dhcpcd_run_dir: PathBuf::from("/var/run"),
            action_script: PathBuf::from("/etc/wpa_supplicant/dhcpcd.action"),
        }
    }
}

impl PathsConfig {
    /// Supplicant control socket for `interface`.
    #[must_use]
    pub fn supplicant_socket(&self, interface: &str) -> PathBuf {
        self.supplicant_run_dir.join(interface)
    }

    /// Pid file the event feed writes for itself.
    #[must_use]
    pub fn event_feed_pidfile(&self, interface: &str) -> PathBuf {
        self.supplicant_run_dir.join(format!("events-{interface}.pid"))
    }

    /// Pid file dhcpcd writes for itself.
    #[must_use]
    pub fn dhcpcd_pidfile(&self, interface: &str) -> PathBuf {
        self.dhcpcd_run_dir.join(format!("dhcpcd-{interface}.pid"))
    }
}

/// Binaries invoked by the supervisor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandsConfig {
    /// Service manager used to bootstrap the supplicant unit.
    pub systemctl: String,
    /// Supplicant CLI (scan trigger, event-feed launch).
    pub wpa_cli: String,
    /// Kernel wireless link-query tool.
    pub iw: String,
    /// DHCP client binary (start/rebind/release).
    pub dhcpcd: String,
}

impl Default for CommandsConfig {
    fn default() -> Self {
        Self {
            systemctl: "/bin/systemctl".to_string(),
            wpa_cli: "/usr/bin/wpa_cli".to_string(),
            iw: "/usr/sbin/iw".to_string(),
            dhcpcd: "/sbin/dhcpcd".to_string(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Control-loop cadence and wait bounds.
    pub roam: RoamConfig,
    /// Filesystem touchpoints.
    pub paths: PathsConfig,
    /// Collaborator binaries.
    pub commands: CommandsConfig,
}

impl Config {
    /// Load configuration from an optional TOML file.
    ///
    /// `None` yields the built-in defaults. A given path must exist and
    /// parse; both failures are fatal at startup.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path).map_err(|e| WrError::io(path, e))?;
        let config: Self = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the control loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.roam.tick_ms == 0 {
            return Err(WrError::InvalidConfig {
                details: "tick_ms must be at least 1".to_string(),
            });
        }
        if self.roam.poll_interval_ms == 0 {
            return Err(WrError::InvalidConfig {
                details: "poll_interval_ms must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
