//! The roaming control loop.
//!
//! Each tick runs three phases strictly in order: ensure the companion
//! daemons are up, sample the link signal, decide whether to rescan. A
//! single tick's tool failures are logged and tolerated; only unexpected
//! probe faults abort the process. Rescans are debounced by a deadline so a
//! run of low-signal ticks issues at most one scan per cooldown window.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;

use crate::core::config::Config;
use crate::core::errors::Result;
use crate::monitor::link::{SignalSample, sample_signal};
use crate::proc::command::CommandRunner;
use crate::proc::pidfile::kill_pid_if_exists;
use crate::supervise::DaemonSupervisor;

/// What a single tick observed and did. Returned for observability and
/// exercised heavily by the test suite.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutcome {
    /// Sampled RSSI, `None` when unknown.
    pub rssi: SignalSample,
    /// Whether this tick issued a rescan.
    pub scanned: bool,
    /// Whether this tick performed the one-shot DHCP rebind.
    pub rebound: bool,
}

/// The roaming controller: supervisor wiring plus the two pieces of mutable
/// loop state (scan deadline, one-shot rebind flag).
pub struct RoamController<'a> {
    supervisor: DaemonSupervisor<'a>,
    runner: &'a dyn CommandRunner,
    config: &'a Config,
    threshold: f64,
    manage_dhcp: bool,
    scan_deadline: Instant,
    first_rebind_done: bool,
}

impl<'a> RoamController<'a> {
    /// Build a controller. The scan deadline starts at construction time so
    /// the first low-signal tick always scans.
    pub fn new(
        supervisor: DaemonSupervisor<'a>,
        runner: &'a dyn CommandRunner,
        config: &'a Config,
        threshold: f64,
        manage_dhcp: bool,
    ) -> Self {
        Self {
            supervisor,
            runner,
            config,
            threshold,
            manage_dhcp,
            scan_deadline: Instant::now(),
            first_rebind_done: false,
        }
    }

    /// Whether the one-shot rebind has fired.
    #[must_use]
    pub const fn first_rebind_done(&self) -> bool {
        self.first_rebind_done
    }

    /// Run one tick at `now`. Fatal probe faults propagate; everything else
    /// is absorbed into the outcome.
    pub fn tick(&mut self, now: Instant) -> Result<TickOutcome> {
        self.ensure_daemons()?;

        let rssi = match sample_signal(
            self.runner,
            &self.config.commands.iw,
            self.supervisor.interface(),
        ) {
            Ok(sample) => sample,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                tracing::warn!(code = e.code(), error = %e, "signal sampling failed");
                None
            }
        };

        let mut outcome = TickOutcome {
            rssi,
            scanned: false,
            rebound: false,
        };

        // One-shot rebind: dhcpcd may have been started before association
        // completed, so the first usable sample triggers a lease refresh.
        if rssi.is_some() && self.manage_dhcp && !self.first_rebind_done {
            match self.supervisor.rebind_dhcp() {
                Ok(()) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => tracing::warn!(code = e.code(), error = %e, "rebind failed"),
            }
            self.first_rebind_done = true;
            outcome.rebound = true;
        }

        let low = rssi.is_none_or(|value| value < self.threshold);
        if low && now >= self.scan_deadline {
            self.scan_deadline = now + self.config.roam.cooldown();
            tracing::info!(
                rssi = ?rssi,
                threshold = self.threshold,
                "signal below threshold, invoking scan"
            );
            match self.supervisor.invoke_scan() {
                Ok(()) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => tracing::warn!(code = e.code(), error = %e, "scan invocation failed"),
            }
            outcome.scanned = true;
        }

        Ok(outcome)
    }

    fn ensure_daemons(&self) -> Result<()> {
        tolerate(self.supervisor.ensure_supplicant())?;
        if self.manage_dhcp {
            tolerate(self.supervisor.ensure_dhcp_client())?;
        }
        tolerate(self.supervisor.ensure_event_feed())?;
        Ok(())
    }

    /// Run ticks until `shutdown` is set, then clean up.
    ///
    /// The in-flight tick always completes; the flag is consulted only at
    /// the loop boundary. Cleanup terminates the event feed and releases the
    /// DHCP lease best-effort.
    pub fn run(&mut self, shutdown: &AtomicBool) -> Result<()> {
        tracing::info!(
            interface = self.supervisor.interface(),
            threshold = self.threshold,
            dhcp = self.manage_dhcp,
            "roam supervisor started"
        );
        while !shutdown.load(Ordering::SeqCst) {
            self.tick(Instant::now())?;
            thread::sleep(self.config.roam.tick());
        }
        tracing::info!("stopping");
        self.shutdown_cleanup();
        Ok(())
    }

    /// Terminate the event feed and release the lease. Never fails: shutdown
    /// must reach exit 0 even when cleanup is only partial.
    pub fn shutdown_cleanup(&self) {
        let pidfile = self.supervisor.event_feed_pidfile();
        match kill_pid_if_exists(
            &pidfile,
            self.config.roam.terminate_wait(),
            self.config.roam.poll_interval(),
        ) {
            Ok((true, pid)) => tracing::info!(pid, "event feed terminated"),
            Ok((false, _)) => tracing::debug!("event feed was not running"),
            Err(e) => tracing::warn!(code = e.code(), error = %e, "event feed did not exit cleanly"),
        }
        if self.manage_dhcp {
            if let Err(e) = self.supervisor.release_dhcp() {
                tracing::warn!(code = e.code(), error = %e, "lease release failed");
            }
        }
    }
}

/// Log-and-continue for per-tick failures; fatal faults pass through.
fn tolerate(result: Result<()>) -> Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(e) if e.is_fatal() => Err(e),
        Err(e) => {
            tracing::warn!(code = e.code(), error = %e, "ensure step failed, retrying next tick");
            Ok(())
        }
    }
}
