//! Remote shell session types and the connection state machine.

use std::path::PathBuf;

use crate::domain::error::ProvisionError;

/// Where and as whom to open a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub identity_file: PathBuf,
}

/// An open, authenticated session.
///
/// `control_path` is the multiplexing socket owned by the master connection;
/// every later command and transfer goes through it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshSession {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub control_path: PathBuf,
}

impl SshSession {
    /// `user@host`, as passed to `ssh`.
    #[must_use]
    pub fn destination(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }
}

/// Result of a single connection attempt.
///
/// The retry loop inspects the tag; it never matches on error messages.
#[derive(Debug)]
pub enum ConnectOutcome<S> {
    Connected(S),
    /// The host is not accepting connections yet. Carries the client's reason.
    RetryableFailure(String),
    /// Anything else: bad credentials, broken client, unusable key.
    FatalFailure(anyhow::Error),
}

/// Remote connection lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    /// Retry budget exhausted. Terminal.
    Failed,
}

impl ConnectionState {
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        use ConnectionState::{Connected, Connecting, Disconnected, Failed};
        matches!(
            (self, next),
            (Disconnected | Connecting, Connecting)
                | (Connecting, Connected | Failed)
                | (Connected, Disconnected)
        )
    }

    /// Move to `next`, rejecting edges the state machine does not have.
    ///
    /// # Errors
    ///
    /// Returns `ProvisionError::InvalidTransition` for a disallowed edge.
    pub fn transition(self, next: Self) -> Result<Self, ProvisionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(ProvisionError::InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}

/// How the retry loop should treat a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Retryable,
    Fatal,
}

/// OpenSSH exits with 255 on any connection-level error.
pub const SSH_CONNECTION_ERROR_EXIT: i32 = 255;

/// Client messages meaning "nothing is listening yet".
const UNREACHABLE_MARKERS: &[&str] = &[
    "Connection refused",
    "No route to host",
    "Connection timed out",
    "Operation timed out",
    "Network is unreachable",
    "Connection reset",
    "Connection closed by",
];

/// Classify a failed `ssh` invocation from its exit code and stderr.
///
/// Only unreachable-host failures are retryable. Authentication and usage
/// errors are fatal even though they share exit code 255.
#[must_use]
pub fn classify_connect_failure(exit_code: Option<i32>, stderr: &str) -> FailureClass {
    if exit_code == Some(SSH_CONNECTION_ERROR_EXIT)
        && UNREACHABLE_MARKERS.iter().any(|m| stderr.contains(m))
    {
        FailureClass::Retryable
    } else {
        FailureClass::Fatal
    }
}
