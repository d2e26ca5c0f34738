//! Remote command, credential delivery, and app install use-cases.

use std::process::ExitStatus;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::application::ports::{KeyStore, RemoteShell};
use crate::domain::install::{
    app_url, clone_command, file_size_command, install_command, prepare_key_dir_command,
    secure_key_command,
};
use crate::domain::{Instance, ProvisionConfig, ProvisionError, SshSession};

/// Captured output of a successful remote command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Run one shell command on the instance.
///
/// The command is logged before it runs.
///
/// # Errors
///
/// Returns `ProvisionError::RemoteCommandFailed` (with captured stdout and
/// stderr) on a non-zero exit, or the transport error if the command could
/// not be run at all.
pub async fn run_remote(
    shell: &impl RemoteShell,
    session: &SshSession,
    command: &str,
) -> Result<CommandOutput> {
    info!(host = %session.host, command, "running remote command");
    let output = shell
        .exec(session, command)
        .await
        .with_context(|| format!("running `{command}` on {}", session.host))?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    if !output.status.success() {
        return Err(ProvisionError::RemoteCommandFailed {
            command: command.to_string(),
            status: describe_status(output.status),
            stdout,
            stderr,
        }
        .into());
    }
    debug!(command, stdout = %stdout.trim_end(), "remote command succeeded");
    Ok(CommandOutput { stdout, stderr })
}

fn describe_status(status: ExitStatus) -> String {
    status.code().map_or_else(
        || "termination by signal".to_string(),
        |code| format!("exit status {code}"),
    )
}

/// Copy the git hosting key onto the instance.
///
/// Creates the destination directory first and checks the remote byte count
/// against the local file before returning. Not retried.
///
/// # Errors
///
/// Returns `ProvisionError::MissingKeyFile` if the local key is absent,
/// `ProvisionError::IncompleteTransfer` on a size mismatch, or any remote
/// command failure.
pub async fn deliver_credentials(
    shell: &impl RemoteShell,
    keys: &impl KeyStore,
    session: &SshSession,
    config: &ProvisionConfig,
) -> Result<()> {
    let source = &config.credentials.source;
    let destination = config.credentials.destination.as_str();
    if !keys.exists(source) {
        return Err(ProvisionError::MissingKeyFile {
            path: source.clone(),
        }
        .into());
    }
    let expected = keys
        .size(source)
        .with_context(|| format!("reading size of {}", source.display()))?;

    if let Some(cmd) = prepare_key_dir_command(destination) {
        run_remote(shell, session, &cmd).await?;
    }

    info!(
        source = %source.display(),
        destination,
        host = %session.host,
        "copying git key to instance"
    );
    let output = shell
        .upload(session, source, destination)
        .await
        .with_context(|| format!("copying {} to {destination}", source.display()))?;
    if !output.status.success() {
        anyhow::bail!(
            "copying {} to {}:{destination} failed: {}",
            source.display(),
            session.host,
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    let size = run_remote(shell, session, &file_size_command(destination)).await?;
    let actual: u64 = size
        .stdout
        .trim()
        .parse()
        .with_context(|| format!("parsing size of remote {destination}: {:?}", size.stdout))?;
    if actual != expected {
        return Err(ProvisionError::IncompleteTransfer {
            destination: destination.to_string(),
            expected,
            actual,
        }
        .into());
    }

    run_remote(shell, session, &secure_key_command(destination)).await?;
    Ok(())
}

/// Clone the app with the delivered key and run its install procedure.
///
/// Returns the app's externally reachable URL.
///
/// # Errors
///
/// Returns `ProvisionError::MissingAddress` if the instance has no address,
/// or the first failing remote command.
pub async fn install_application(
    shell: &impl RemoteShell,
    session: &SshSession,
    config: &ProvisionConfig,
    instance: &Instance,
) -> Result<String> {
    let address = instance
        .public_address
        .as_deref()
        .filter(|a| !a.is_empty())
        .ok_or_else(|| ProvisionError::MissingAddress {
            instance_id: instance.id.clone(),
        })?;

    run_remote(
        shell,
        session,
        &clone_command(&config.app, &config.credentials.destination),
    )
    .await
    .context("cloning charty")?;
    run_remote(shell, session, &install_command(&config.app))
        .await
        .context("installing charty")?;

    let url = app_url(address, config.app_port);
    info!(url = %url, "charty is available at {url}");
    Ok(url)
}
