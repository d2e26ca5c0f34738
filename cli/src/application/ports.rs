//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::Path;
use std::process::Output;

use anyhow::Result;

use crate::domain::{ConnectOutcome, IngressRule, InstanceStatus, SshSession, SshTarget};

// ── Value Types ───────────────────────────────────────────────────────────────

/// Launch parameters for a new compute instance.
pub struct InstanceSpec<'a> {
    /// Instance type, e.g. `"t2.micro"`.
    pub machine_type: &'a str,
    /// Image to boot, e.g. `"ami-95a977ea"`.
    pub image_id: &'a str,
    /// Provider key pair authorised for the login user.
    pub key_name: &'a str,
    /// Security group attached to the primary interface.
    pub security_group_id: &'a str,
}

/// What came back from a key pair creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyPairCreation {
    /// Newly created; carries the PEM private key.
    Created { material: String },
    /// A key pair with that name already exists; no material is returned.
    AlreadyExists,
}

// ── Cloud Port ────────────────────────────────────────────────────────────────

/// Cloud provider operations used by a provisioning run.
#[allow(async_fn_in_trait)]
pub trait CloudProvider {
    /// Create a key pair and return its private key material.
    async fn create_key_pair(&self, key_name: &str) -> Result<KeyPairCreation>;
    /// Look up the account's default VPC, if it has one.
    async fn default_vpc(&self) -> Result<Option<String>>;
    /// Create a security group and return its id.
    async fn create_security_group(
        &self,
        name: &str,
        description: &str,
        vpc_id: &str,
    ) -> Result<String>;
    /// Add inbound rules to a security group.
    async fn authorize_ingress(&self, group_id: &str, rules: &[IngressRule]) -> Result<()>;
    /// Request one instance and return its id.
    async fn run_instance(&self, spec: &InstanceSpec<'_>) -> Result<String>;
    /// Current state and public address of an instance.
    async fn describe_instance(&self, instance_id: &str) -> Result<InstanceStatus>;
}

// ── Remote Shell Port ─────────────────────────────────────────────────────────

/// Remote shell session operations.
#[allow(async_fn_in_trait)]
pub trait RemoteShell {
    /// Make one connection attempt. Never retries on its own.
    async fn connect(&self, target: &SshTarget) -> ConnectOutcome<SshSession>;
    /// Run a shell command on the remote host and capture its output.
    async fn exec(&self, session: &SshSession, command: &str) -> Result<Output>;
    /// Copy a local file to `remote` (relative to the login user's home).
    async fn upload(&self, session: &SshSession, local: &Path, remote: &str) -> Result<Output>;
    /// Tear down the session. Must tolerate an already-closed session.
    async fn disconnect(&self, session: &SshSession) -> Result<()>;
}

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: std::time::Duration,
    ) -> Result<Output>;
}

// ── Local Key Files Port ──────────────────────────────────────────────────────

/// Local private key files.
pub trait KeyStore {
    /// Whether a file exists at `path`.
    fn exists(&self, path: &Path) -> bool;
    /// Size of the file at `path` in bytes.
    fn size(&self, path: &Path) -> Result<u64>;
    /// Write private key material to `path`, readable and writable by the
    /// owner only.
    fn write_private_key(&self, path: &Path, material: &str) -> Result<()>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}
