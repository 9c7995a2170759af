//! RSSI extraction from `iw <interface> link` output.
//!
//! The absence of a `signal:` line is the normal disassociated/down state and
//! yields no sample; only freshly-printed digits that fail to parse count as
//! a fault, and even that is confined to a warning.

use std::sync::OnceLock;

use regex::Regex;

use crate::core::errors::Result;
use crate::proc::command::{CommandRunner, run_logged};

/// One link-quality observation. `None` means the link is down,
/// disassociated, or the tool printed no signal line.
pub type SignalSample = Option<f64>;

fn signal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Keyword and the literal "dBm" unit are case-sensitive contracts with iw.
    RE.get_or_init(|| Regex::new(r"^signal: ([0-9-]+) dBm").expect("static pattern"))
}

/// Extract the RSSI from raw link-query output. Last matching line wins.
#[must_use]
pub fn parse_signal(output: &str) -> SignalSample {
    let mut rssi = None;
    for line in output.lines() {
        let Some(capture) = signal_re().captures(line.trim()) else {
            continue;
        };
        let digits = &capture[1];
        match digits.parse::<f64>() {
            Ok(value) => rssi = Some(value),
            Err(_) => {
                // Masked in older supervisors; surfaced here but still
                // treated as "no sample".
                tracing::warn!(line = line.trim(), "unparseable rssi digits");
            }
        }
    }
    rssi
}

/// Sample the current signal strength for `interface`.
///
/// Tool failure is logged by the runner and falls through to "no sample";
/// only spawn-level faults propagate.
pub fn sample_signal(
    runner: &dyn CommandRunner,
    iw: &str,
    interface: &str,
) -> Result<SignalSample> {
    let argv = vec![iw.to_string(), interface.to_string(), "link".to_string()];
    let outcome = run_logged(runner, &argv, false)?;
    Ok(parse_signal(&outcome.output))
}
