//! Security group use-case: open SSH and the app port to the world.

use anyhow::{Context, Result};
use tracing::info;

use crate::application::ports::CloudProvider;
use crate::domain::{ProvisionConfig, ProvisionError, SecurityGroup, ingress_rules};

/// Create the security group and authorize its ingress rules.
///
/// The network is `network.vpc_id` when configured, otherwise the account's
/// default VPC. Not idempotent: a second run collides on the group name.
///
/// # Errors
///
/// Returns `ProvisionError::NoDefaultNetwork` when no VPC is configured and
/// the account has no default VPC, or any provider error.
pub async fn ensure_security_group(
    cloud: &impl CloudProvider,
    config: &ProvisionConfig,
) -> Result<SecurityGroup> {
    let vpc_id = match &config.network.vpc_id {
        Some(id) => id.clone(),
        None => cloud
            .default_vpc()
            .await
            .context("looking up default VPC")?
            .ok_or(ProvisionError::NoDefaultNetwork)?,
    };

    let group = &config.security_group;
    let id = cloud
        .create_security_group(&group.name, &group.description, &vpc_id)
        .await
        .with_context(|| format!("creating security group '{}' in {vpc_id}", group.name))?;

    let rules = ingress_rules(config);
    cloud
        .authorize_ingress(&id, &rules)
        .await
        .with_context(|| format!("authorizing ingress on {id}"))?;

    info!(
        security_group_id = %id,
        vpc_id = %vpc_id,
        ports = ?rules.iter().map(|r| r.port).collect::<Vec<_>>(),
        "created security group"
    );
    Ok(SecurityGroup { id, vpc_id })
}
