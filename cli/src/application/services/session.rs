//! Remote session use-cases: connect with bounded retry, and guarded close.

use anyhow::Result;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::application::ports::{KeyStore, RemoteShell};
use crate::application::services::key_pair::KeyPair;
use crate::domain::{
    ConnectOutcome, ConnectionState, Instance, ProvisionConfig, ProvisionError, SshSession,
    SshTarget,
};

/// Open a session to the instance, retrying while the host is unreachable.
///
/// Makes at most `retry_count` attempts with `retry_delay` between them.
/// Only `ConnectOutcome::RetryableFailure` is retried; a fatal outcome
/// propagates on the spot.
///
/// # Errors
///
/// Returns `ProvisionError::MissingAddress` or `ProvisionError::MissingKeyFile`
/// when a precondition fails, `ProvisionError::RetriesExhausted` when every
/// attempt was refused, or the fatal connect error.
pub async fn open_remote_session(
    shell: &impl RemoteShell,
    keys: &impl KeyStore,
    config: &ProvisionConfig,
    key_pair: &KeyPair,
    instance: &Instance,
) -> Result<SshSession> {
    let host = instance
        .public_address
        .as_deref()
        .filter(|a| !a.is_empty())
        .ok_or_else(|| ProvisionError::MissingAddress {
            instance_id: instance.id.clone(),
        })?;
    if !keys.exists(&key_pair.path) {
        return Err(ProvisionError::MissingKeyFile {
            path: key_pair.path.clone(),
        }
        .into());
    }

    let target = SshTarget {
        host: host.to_string(),
        port: config.ssh_port,
        user: config.username.clone(),
        identity_file: key_pair.path.clone(),
    };
    let budget = config.retry_count.max(1);
    let mut state = ConnectionState::Disconnected;
    let mut attempt = 0;

    loop {
        state = state.transition(ConnectionState::Connecting)?;
        attempt += 1;
        info!(
            user = %target.user,
            host = %target.host,
            key_file = %target.identity_file.display(),
            attempt,
            "connecting via SSH"
        );

        match shell.connect(&target).await {
            ConnectOutcome::Connected(session) => {
                state.transition(ConnectionState::Connected)?;
                info!(host = %target.host, attempt, "SSH session established");
                return Ok(session);
            }
            ConnectOutcome::RetryableFailure(reason) => {
                if attempt >= budget {
                    state.transition(ConnectionState::Failed)?;
                    let err = ProvisionError::RetriesExhausted {
                        user: target.user,
                        host: target.host,
                        key_file: target.identity_file,
                        retries: budget,
                    };
                    error!(reason = %reason, "{err}");
                    return Err(err.into());
                }
                warn!(
                    host = %target.host,
                    reason = %reason,
                    retries_remaining = budget - attempt,
                    "unable to connect; will retry in {}s",
                    config.retry_delay.as_secs()
                );
                sleep(config.retry_delay).await;
            }
            ConnectOutcome::FatalFailure(err) => {
                state.transition(ConnectionState::Failed)?;
                return Err(err.context(format!(
                    "connecting to {}@{} using key file {}",
                    target.user,
                    target.host,
                    target.identity_file.display()
                )));
            }
        }
    }
}

/// Release the session, whatever state it is in.
///
/// Safe to call with `None` (no session was ever established) and on a
/// session whose master connection already died. Failures are logged, never
/// returned.
pub async fn close_remote_session(shell: &impl RemoteShell, session: Option<&SshSession>) {
    let Some(session) = session else {
        debug!("no SSH session to close");
        return;
    };
    match shell.disconnect(session).await {
        Ok(()) => info!(host = %session.host, "SSH session closed"),
        Err(e) => warn!(host = %session.host, error = %format!("{e:#}"), "closing SSH session failed"),
    }
}
