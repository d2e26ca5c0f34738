//! Application service: the full provisioning run.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.
//! All I/O is routed through injected port traits.

use anyhow::{Context, Result};
use tracing::warn;

use crate::application::ports::{CloudProvider, KeyStore, ProgressReporter, RemoteShell};
use crate::application::services::instance::create_instance;
use crate::application::services::key_pair::{KeyPair, ensure_key_pair};
use crate::application::services::remote::{deliver_credentials, install_application};
use crate::application::services::security_group::ensure_security_group;
use crate::application::services::session::{close_remote_session, open_remote_session};
use crate::domain::{Instance, ProvisionConfig, SecurityGroup, SshSession};

/// Everything a successful run created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionOutcome {
    pub key_pair: KeyPair,
    pub security_group: SecurityGroup,
    pub instance: Instance,
    /// Where the installed app answers.
    pub url: String,
}

/// Provision an instance and install charty on it.
///
/// Steps run strictly in order and each one receives what the previous one
/// created. There is no rollback: if a step fails, provider resources
/// created before it stay live and are listed in a warning.
///
/// # Errors
///
/// Returns the first failing step's error.
pub async fn provision(
    cloud: &impl CloudProvider,
    shell: &impl RemoteShell,
    keys: &impl KeyStore,
    reporter: &impl ProgressReporter,
    config: &ProvisionConfig,
) -> Result<ProvisionOutcome> {
    let mut live = Vec::new();
    let result = run_steps(cloud, shell, keys, reporter, config, &mut live).await;
    if result.is_err() && !live.is_empty() {
        warn!(resources = ?live, "run aborted; provider resources left in place");
        reporter.warn(&format!("left in place: {}", live.join(", ")));
    }
    result
}

async fn run_steps(
    cloud: &impl CloudProvider,
    shell: &impl RemoteShell,
    keys: &impl KeyStore,
    reporter: &impl ProgressReporter,
    config: &ProvisionConfig,
    live: &mut Vec<String>,
) -> Result<ProvisionOutcome> {
    // Step 1: Key pair.
    reporter.step("checking key pair...");
    let key_pair = ensure_key_pair(cloud, keys, config)
        .await
        .context("ensuring key pair")?;
    if key_pair.created {
        live.push(format!("key pair {}", key_pair.name));
        reporter.success(&format!("key pair saved to {}", key_pair.path.display()));
    }

    // Step 2: Security group.
    reporter.step("creating security group...");
    let security_group = ensure_security_group(cloud, config)
        .await
        .context("creating security group")?;
    live.push(format!("security group {}", security_group.id));
    reporter.success(&format!("security group {} created", security_group.id));

    // Step 3: Instance.
    reporter.step("launching instance...");
    let instance = create_instance(cloud, config, &security_group)
        .await
        .context("creating instance")?;
    live.push(format!("instance {}", instance.id));
    reporter.success(&format!(
        "instance {instance} running at {}",
        instance.public_address.as_deref().unwrap_or_default()
    ));

    // Step 4: Session.
    reporter.step("connecting over SSH...");
    let session = open_remote_session(shell, keys, config, &key_pair, &instance)
        .await
        .context("opening SSH session")?;

    // Steps 5-6 run against the open session; it is closed whatever happens.
    let installed = install_over(shell, keys, reporter, config, &session, &instance).await;
    close_remote_session(shell, Some(&session)).await;
    let url = installed?;

    Ok(ProvisionOutcome {
        key_pair,
        security_group,
        instance,
        url,
    })
}

async fn install_over(
    shell: &impl RemoteShell,
    keys: &impl KeyStore,
    reporter: &impl ProgressReporter,
    config: &ProvisionConfig,
    session: &SshSession,
    instance: &Instance,
) -> Result<String> {
    reporter.step("delivering git credentials...");
    deliver_credentials(shell, keys, session, config)
        .await
        .context("delivering credentials")?;

    reporter.step("installing charty...");
    let url = install_application(shell, session, config, instance)
        .await
        .context("installing application")?;
    reporter.success(&format!("charty is available at {url}"));
    Ok(url)
}
