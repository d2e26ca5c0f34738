//! Instance use-case: launch and wait until reachable.

use anyhow::{Context, Result};
use tokio::time::{Instant, sleep};
use tracing::{debug, info};

use crate::application::ports::{CloudProvider, InstanceSpec};
use crate::domain::{Instance, InstanceState, ProvisionConfig, ProvisionError, SecurityGroup};

/// Launch one instance and block until it runs with a public address.
///
/// Polls every `instance_poll_interval` for at most `instance_wait_timeout`.
///
/// # Errors
///
/// Returns `ProvisionError::InstanceAddressTimeout` if no address shows up in
/// time, `ProvisionError::InstanceUnavailable` if the instance stops or
/// terminates while waiting, or any provider error.
pub async fn create_instance(
    cloud: &impl CloudProvider,
    config: &ProvisionConfig,
    security_group: &SecurityGroup,
) -> Result<Instance> {
    let spec = InstanceSpec {
        machine_type: &config.machine_type,
        image_id: &config.image_id,
        key_name: &config.key_name,
        security_group_id: &security_group.id,
    };
    let instance_id = cloud
        .run_instance(&spec)
        .await
        .context("requesting instance")?;
    info!(
        instance_id = %instance_id,
        machine_type = %config.machine_type,
        image_id = %config.image_id,
        "instance requested; waiting for it to run"
    );

    let deadline = Instant::now() + config.instance_wait_timeout;
    loop {
        let status = cloud
            .describe_instance(&instance_id)
            .await
            .with_context(|| format!("describing instance {instance_id}"))?;

        if status.state.is_gone() {
            return Err(ProvisionError::InstanceUnavailable {
                instance_id,
                state: status.state.to_string(),
            }
            .into());
        }

        if let Some(address) = status.reachable_address() {
            info!(instance_id = %instance_id, public_address = %address, "instance running");
            return Ok(Instance {
                public_address: Some(address.to_string()),
                id: instance_id,
                machine_type: config.machine_type.clone(),
                image_id: config.image_id.clone(),
                key_name: config.key_name.clone(),
                security_group_id: security_group.id.clone(),
                state: InstanceState::Running,
            });
        }

        if Instant::now() >= deadline {
            return Err(ProvisionError::InstanceAddressTimeout {
                instance_id,
                timeout_secs: config.instance_wait_timeout.as_secs(),
            }
            .into());
        }

        debug!(instance_id = %instance_id, state = %status.state, "instance not ready");
        sleep(config.instance_poll_interval).await;
    }
}
