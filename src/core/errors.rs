//! WR-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, WrError>;

/// Top-level error type for waveroam.
#[derive(Debug, Error)]
pub enum WrError {
    #[error("[WR-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[WR-1002] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[WR-2001] pid file {path} holds no usable pid: {details}")]
    PidParse { path: PathBuf, details: String },

    #[error("[WR-2002] liveness probe failed for pid {pid}: {details}")]
    Probe { pid: i32, details: String },

    #[error("[WR-2003] process {pid} still running after {waited:?}")]
    TerminateTimeout { pid: i32, waited: Duration },

    #[error("[WR-2004] control socket {path} did not appear within {waited:?}")]
    SocketWaitTimeout { path: PathBuf, waited: Duration },

    #[error("[WR-3001] failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("[WR-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[WR-3003] signal handler registration failed: {details}")]
    Signal { details: String },
}

impl WrError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "WR-1001",
            Self::ConfigParse { .. } => "WR-1002",
            Self::PidParse { .. } => "WR-2001",
            Self::Probe { .. } => "WR-2002",
            Self::TerminateTimeout { .. } => "WR-2003",
            Self::SocketWaitTimeout { .. } => "WR-2004",
            Self::Spawn { .. } => "WR-3001",
            Self::Io { .. } => "WR-3002",
            Self::Signal { .. } => "WR-3003",
        }
    }

    /// Whether the error must abort the process rather than be retried on a
    /// later tick. Only unexpected environment faults qualify; everything
    /// else is tolerated by the control loop.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Probe { .. } | Self::InvalidConfig { .. } | Self::ConfigParse { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<toml::de::Error> for WrError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::WrError;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn codes_match_display_prefix() {
        let cases: Vec<WrError> = vec![
            WrError::InvalidConfig {
                details: "bad tick".into(),
            },
            WrError::PidParse {
                path: PathBuf::from("/run/x.pid"),
                details: "empty".into(),
            },
            WrError::Probe {
                pid: 42,
                details: "EPERM".into(),
            },
            WrError::TerminateTimeout {
                pid: 42,
                waited: Duration::from_secs(30),
            },
            WrError::SocketWaitTimeout {
                path: PathBuf::from("/run/wpa"),
                waited: Duration::from_secs(60),
            },
        ];
        for err in cases {
            assert!(
                err.to_string().contains(err.code()),
                "display should embed the code: {err}"
            );
        }
    }

    #[test]
    fn probe_failures_are_fatal_but_timeouts_are_not() {
        let probe = WrError::Probe {
            pid: 1,
            details: "EPERM".into(),
        };
        assert!(probe.is_fatal());

        let timeout = WrError::TerminateTimeout {
            pid: 1,
            waited: Duration::from_secs(1),
        };
        assert!(!timeout.is_fatal());

        let socket = WrError::SocketWaitTimeout {
            path: PathBuf::from("/run/wpa"),
            waited: Duration::from_secs(1),
        };
        assert!(!socket.is_fatal());
    }
}
