//! Infrastructure implementation of the `RemoteShell` port.
//!
//! `OpenSshShell<R>` keeps one multiplexed OpenSSH master connection per
//! session. `connect` starts the master in the background; `exec` and
//! `upload` reuse its control socket, so the key exchange happens once.

use std::path::{Path, PathBuf};
use std::process::Output;

use anyhow::{Context, Result};
use tempfile::TempDir;
use tracing::debug;

use crate::application::ports::{CommandRunner, RemoteShell};
use crate::domain::{
    ConnectOutcome, FailureClass, SshSession, SshTarget, classify_connect_failure,
};
use crate::infra::command_runner::{DEFAULT_CMD_TIMEOUT, DEFAULT_EXEC_TIMEOUT, TokioCommandRunner};

/// Options shared by every `ssh`/`scp` invocation.
///
/// Host keys are not pinned: each run talks to a freshly booted instance
/// whose key has never been seen.
const COMMON_OPTIONS: &[&str] = &[
    "-o",
    "StrictHostKeyChecking=no",
    "-o",
    "UserKnownHostsFile=/dev/null",
    "-o",
    "LogLevel=ERROR",
    "-o",
    "BatchMode=yes",
    "-o",
    "ConnectTimeout=10",
];

/// OpenSSH client driven through a `CommandRunner`.
///
/// `cmd_runner` handles short calls (connect, close); `exec_runner` handles
/// remote commands and transfers, which may run for a long time.
pub struct OpenSshShell<R: CommandRunner> {
    cmd_runner: R,
    exec_runner: R,
    socket_dir: TempDir,
}

impl<R: CommandRunner> OpenSshShell<R> {
    /// Create a shell with explicit runners and a private control socket
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket directory cannot be created.
    pub fn new(cmd_runner: R, exec_runner: R) -> Result<Self> {
        let socket_dir = tempfile::Builder::new()
            .prefix("charty-ssh-")
            .tempdir()
            .context("creating SSH control socket directory")?;
        Ok(Self {
            cmd_runner,
            exec_runner,
            socket_dir,
        })
    }

    /// Control socket path for a target.
    #[must_use]
    pub fn control_path(&self, target: &SshTarget) -> PathBuf {
        self.socket_dir
            .path()
            .join(format!("{}-{}.sock", target.host, target.port))
    }
}

impl OpenSshShell<TokioCommandRunner> {
    /// Convenience constructor for production use.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket directory cannot be created.
    pub fn default_runner() -> Result<Self> {
        Self::new(
            TokioCommandRunner::new(DEFAULT_CMD_TIMEOUT),
            TokioCommandRunner::new(DEFAULT_EXEC_TIMEOUT),
        )
    }
}

impl<R: CommandRunner> RemoteShell for OpenSshShell<R> {
    async fn connect(&self, target: &SshTarget) -> ConnectOutcome<SshSession> {
        let control_path = self.control_path(target);
        let ctl = control_path.to_string_lossy();
        let identity = target.identity_file.to_string_lossy();
        let port = target.port.to_string();
        let destination = format!("{}@{}", target.user, target.host);

        let mut args: Vec<&str> = vec![
            "-M",
            "-S",
            &*ctl,
            "-o",
            "ControlPersist=yes",
            "-f",
            "-N",
            "-p",
            port.as_str(),
            "-i",
            &*identity,
        ];
        args.extend_from_slice(COMMON_OPTIONS);
        args.push(destination.as_str());

        let output = match self.cmd_runner.run("ssh", &args).await {
            Ok(output) => output,
            Err(e) => return ConnectOutcome::FatalFailure(e.context("starting ssh")),
        };
        if output.status.success() {
            debug!(destination = %destination, control_path = %ctl, "master connection up");
            return ConnectOutcome::Connected(SshSession {
                host: target.host.clone(),
                port: target.port,
                user: target.user.clone(),
                control_path,
            });
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        match classify_connect_failure(output.status.code(), &stderr) {
            FailureClass::Retryable => ConnectOutcome::RetryableFailure(stderr),
            FailureClass::Fatal => ConnectOutcome::FatalFailure(anyhow::anyhow!(
                "ssh {destination} failed: {stderr}"
            )),
        }
    }

    async fn exec(&self, session: &SshSession, command: &str) -> Result<Output> {
        let ctl = session.control_path.to_string_lossy();
        let port = session.port.to_string();
        let destination = session.destination();
        let mut args: Vec<&str> = vec!["-S", &*ctl, "-o", "ControlMaster=no", "-p", port.as_str()];
        args.extend_from_slice(COMMON_OPTIONS);
        args.extend_from_slice(&[destination.as_str(), "--", command]);
        self.exec_runner.run("ssh", &args).await
    }

    async fn upload(&self, session: &SshSession, local: &Path, remote: &str) -> Result<Output> {
        let control_option = format!("ControlPath={}", session.control_path.display());
        let port = session.port.to_string();
        let source = local.to_string_lossy();
        let target = format!("{}:{remote}", session.destination());
        let mut args: Vec<&str> = vec![
            "-o",
            control_option.as_str(),
            "-o",
            "ControlMaster=no",
            "-P",
            port.as_str(),
        ];
        args.extend_from_slice(COMMON_OPTIONS);
        args.extend_from_slice(&[&*source, target.as_str()]);
        self.exec_runner.run("scp", &args).await
    }

    async fn disconnect(&self, session: &SshSession) -> Result<()> {
        if !session.control_path.exists() {
            debug!(host = %session.host, "control socket already gone");
            return Ok(());
        }
        let ctl = session.control_path.to_string_lossy();
        let destination = session.destination();
        let output = self
            .cmd_runner
            .run("ssh", &["-S", &*ctl, "-O", "exit", destination.as_str()])
            .await
            .context("stopping SSH master connection")?;
        anyhow::ensure!(
            output.status.success(),
            "ssh -O exit failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
        Ok(())
    }
}
