//! Idempotent supervision of the companion daemons.
//!
//! Each `ensure_*` operation probes liveness first and only starts the
//! daemon when the probe fails, so back-to-back calls with a healthy daemon
//! issue zero commands. The daemons own their pid files and sockets; this
//! module only reads them.

use std::path::PathBuf;
use std::thread;
use std::time::Instant;

use crate::core::config::Config;
use crate::core::errors::{Result, WrError};
use crate::proc::command::{CommandRunner, run_logged};
use crate::proc::pidfile::pid_running;

/// Supervisor for the supplicant, its event feed, and the DHCP client on one
/// interface.
pub struct DaemonSupervisor<'a> {
    interface: String,
    config: &'a Config,
    runner: &'a dyn CommandRunner,
}

impl<'a> DaemonSupervisor<'a> {
    /// Build a supervisor for `interface`.
    pub fn new(interface: impl Into<String>, config: &'a Config, runner: &'a dyn CommandRunner) -> Self {
        Self {
            interface: interface.into(),
            config,
            runner,
        }
    }

    /// Interface under management.
    #[must_use]
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Pid file the event feed writes for itself.
    #[must_use]
    pub fn event_feed_pidfile(&self) -> PathBuf {
        self.config.paths.event_feed_pidfile(&self.interface)
    }

    /// Ensure the supplicant is up, keyed off its control socket.
    ///
    /// Starts the service-manager unit when the socket is absent, then polls
    /// until it appears or the configured bound elapses.
    pub fn ensure_supplicant(&self) -> Result<()> {
        let socket = self.config.paths.supplicant_socket(&self.interface);
        if socket.exists() {
            return Ok(());
        }
        tracing::info!(interface = %self.interface, "starting wpa_supplicant");
        let argv = vec![
            self.config.commands.systemctl.clone(),
            "start".to_string(),
            format!("wpa_supplicant@{}", self.interface),
        ];
        run_logged(self.runner, &argv, false)?;

        let deadline = Instant::now() + self.config.roam.socket_wait();
        while !socket.exists() {
            if Instant::now() >= deadline {
                return Err(WrError::SocketWaitTimeout {
                    path: socket,
                    waited: self.config.roam.socket_wait(),
                });
            }
            tracing::info!(
                socket = %socket.display(),
                "waiting for wpa_supplicant command socket to appear"
            );
            thread::sleep(self.config.roam.poll_interval());
        }
        Ok(())
    }

    /// Ensure the event feed is up, keyed off its pid record.
    ///
    /// The start is fire-and-forget; the feed writes its own pid file.
    pub fn ensure_event_feed(&self) -> Result<()> {
        let pidfile = self.event_feed_pidfile();
        let (running, _) = pid_running(&pidfile)?;
        if running {
            return Ok(());
        }
        tracing::info!(interface = %self.interface, "starting wpa_supplicant event feed");
        let argv = vec![
            self.config.commands.wpa_cli.clone(),
            "-i".to_string(),
            self.interface.clone(),
            "-a".to_string(),
            self.config.paths.action_script.display().to_string(),
            "-P".to_string(),
            pidfile.display().to_string(),
            "-B".to_string(),
        ];
        run_logged(self.runner, &argv, false)?;
        Ok(())
    }

    /// Ensure the DHCP client is up, keyed off its pid record.
    pub fn ensure_dhcp_client(&self) -> Result<()> {
        let pidfile = self.config.paths.dhcpcd_pidfile(&self.interface);
        let (running, _) = pid_running(&pidfile)?;
        if running {
            return Ok(());
        }
        tracing::info!(interface = %self.interface, "starting dhcpcd");
        let argv = vec![
            self.config.commands.dhcpcd.clone(),
            "-nLNK".to_string(),
            self.interface.clone(),
        ];
        run_logged(self.runner, &argv, false)?;
        Ok(())
    }

    /// Ask a running DHCP client to rebind its lease. No-op when the client
    /// is not alive.
    pub fn rebind_dhcp(&self) -> Result<()> {
        let pidfile = self.config.paths.dhcpcd_pidfile(&self.interface);
        let (running, _) = pid_running(&pidfile)?;
        if !running {
            return Ok(());
        }
        tracing::info!(interface = %self.interface, "rebinding via dhcpcd");
        let argv = vec![
            self.config.commands.dhcpcd.clone(),
            "-n".to_string(),
            self.interface.clone(),
        ];
        run_logged(self.runner, &argv, false)?;
        Ok(())
    }

    /// Release the DHCP lease, best-effort.
    pub fn release_dhcp(&self) -> Result<()> {
        let argv = vec![
            self.config.commands.dhcpcd.clone(),
            "-k".to_string(),
            self.interface.clone(),
        ];
        run_logged(self.runner, &argv, true)?;
        Ok(())
    }

    /// Trigger a rescan through the supplicant CLI.
    pub fn invoke_scan(&self) -> Result<()> {
        let argv = vec![
            self.config.commands.wpa_cli.clone(),
            "-i".to_string(),
            self.interface.clone(),
            "scan".to_string(),
        ];
        run_logged(self.runner, &argv, false)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::DaemonSupervisor;
    use crate::core::config::Config;
    use crate::core::errors::Result;
    use crate::proc::command::{CmdOutcome, CommandRunner};
    use std::cell::RefCell;
    use tempfile::TempDir;

    /// Runner that records every argv and reports success.
    #[derive(Default)]
    struct RecordingRunner {
        calls: RefCell<Vec<Vec<String>>>,
    }

    impl RecordingRunner {
        fn calls(&self) -> Vec<Vec<String>> {
            self.calls.borrow().clone()
        }

        fn count_with(&self, fragment: &str) -> usize {
            self.calls
                .borrow()
                .iter()
                .filter(|argv| argv.iter().any(|a| a.contains(fragment)))
                .count()
        }
    }

    impl CommandRunner for RecordingRunner {
        fn run(&self, argv: &[String]) -> Result<CmdOutcome> {
            self.calls.borrow_mut().push(argv.to_vec());
            Ok(CmdOutcome {
                status: 0,
                output: String::new(),
            })
        }
    }

    fn scratch_config(tmp: &TempDir) -> Config {
        let mut config = Config::default();
        config.paths.supplicant_run_dir = tmp.path().join("wpa");
        config.paths.dhcpcd_run_dir = tmp.path().join("run");
        config.roam.poll_interval_ms = 10;
        config.roam.socket_wait_secs = 0;
        std::fs::create_dir_all(&config.paths.supplicant_run_dir).unwrap();
        std::fs::create_dir_all(&config.paths.dhcpcd_run_dir).unwrap();
        config
    }

    fn write_live_pidfile(path: &std::path::Path) {
        std::fs::write(path, std::process::id().to_string()).unwrap();
    }

    #[test]
    fn ensure_supplicant_is_a_noop_when_socket_exists() {
        let tmp = TempDir::new().unwrap();
        let config = scratch_config(&tmp);
        std::fs::write(config.paths.supplicant_socket("wlan0"), "").unwrap();
        let runner = RecordingRunner::default();

        let supervisor = DaemonSupervisor::new("wlan0", &config, &runner);
        supervisor.ensure_supplicant().unwrap();
        supervisor.ensure_supplicant().unwrap();
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn ensure_supplicant_starts_unit_and_times_out_without_socket() {
        let tmp = TempDir::new().unwrap();
        let config = scratch_config(&tmp);
        let runner = RecordingRunner::default();

        let supervisor = DaemonSupervisor::new("wlan0", &config, &runner);
        let err = supervisor.ensure_supplicant().unwrap_err();
        assert_eq!(err.code(), "WR-2004");
        assert_eq!(runner.count_with("wpa_supplicant@wlan0"), 1);
        assert_eq!(runner.calls()[0][1], "start");
    }

    #[test]
    fn ensure_event_feed_is_idempotent_when_alive() {
        let tmp = TempDir::new().unwrap();
        let config = scratch_config(&tmp);
        write_live_pidfile(&config.paths.event_feed_pidfile("wlan0"));
        let runner = RecordingRunner::default();

        let supervisor = DaemonSupervisor::new("wlan0", &config, &runner);
        supervisor.ensure_event_feed().unwrap();
        supervisor.ensure_event_feed().unwrap();
        assert!(runner.calls().is_empty());
    }

    #[test]
    fn ensure_event_feed_starts_feed_with_contracted_argv() {
        let tmp = TempDir::new().unwrap();
        let config = scratch_config(&tmp);
        let runner = RecordingRunner::default();

        let supervisor = DaemonSupervisor::new("wlan0", &config, &runner);
        supervisor.ensure_event_feed().unwrap();

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        let argv = &calls[0];
        assert_eq!(argv[0], "/usr/bin/wpa_cli");
        assert_eq!(argv[1..3], ["-i".to_string(), "wlan0".to_string()]);
        assert_eq!(argv[3], "-a");
        assert!(argv[6].ends_with("events-wlan0.pid"));
        assert_eq!(argv[7], "-B");
    }

    #[test]
    fn ensure_dhcp_client_starts_only_when_dead() {
        let tmp = TempDir::new().unwrap();
        let config = scratch_config(&tmp);
        let runner = RecordingRunner::default();

        let supervisor = DaemonSupervisor::new("wlan0", &config, &runner);
        supervisor.ensure_dhcp_client().unwrap();
        assert_eq!(runner.count_with("-nLNK"), 1);

        write_live_pidfile(&config.paths.dhcpcd_pidfile("wlan0"));
        supervisor.ensure_dhcp_client().unwrap();
        assert_eq!(runner.count_with("-nLNK"), 1, "no second start while alive");
    }

    #[test]
    fn rebind_is_a_noop_without_running_client() {
        let tmp = TempDir::new().unwrap();
        let config = scratch_config(&tmp);
        let runner = RecordingRunner::default();

        let supervisor = DaemonSupervisor::new("wlan0", &config, &runner);
        supervisor.rebind_dhcp().unwrap();
        assert!(runner.calls().is_empty());

        write_live_pidfile(&config.paths.dhcpcd_pidfile("wlan0"));
        supervisor.rebind_dhcp().unwrap();
        assert_eq!(runner.count_with("-n"), 1);
    }

    #[test]
    fn scan_and_release_use_contracted_argv() {
        let tmp = TempDir::new().unwrap();
        let config = scratch_config(&tmp);
        let runner = RecordingRunner::default();

        let supervisor = DaemonSupervisor::new("wlan0", &config, &runner);
        supervisor.invoke_scan().unwrap();
        supervisor.release_dhcp().unwrap();

        let calls = runner.calls();
        assert_eq!(
            calls[0],
            vec!["/usr/bin/wpa_cli", "-i", "wlan0", "scan"]
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>()
        );
        assert_eq!(
            calls[1],
            vec!["/sbin/dhcpcd", "-k", "wlan0"]
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>()
        );
    }
}
