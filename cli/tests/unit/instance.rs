//! `create_instance` polling behavior under a paused clock.

use std::time::Duration;

use charty_provision::application::services::instance::create_instance;
use charty_provision::domain::{InstanceState, InstanceStatus, ProvisionError, SecurityGroup};

use crate::mocks::{FakeCloud, test_config};

fn group() -> SecurityGroup {
    SecurityGroup {
        id: "sg-0123".to_string(),
        vpc_id: "vpc-default".to_string(),
    }
}

fn status(state: InstanceState, address: Option<&str>) -> InstanceStatus {
    InstanceStatus {
        state,
        public_address: address.map(str::to_string),
    }
}

#[tokio::test(start_paused = true)]
async fn test_waits_until_running_with_address() {
    let config = test_config();
    let cloud = FakeCloud::with_statuses(vec![
        status(InstanceState::Pending, None),
        status(InstanceState::Running, None),
        status(InstanceState::Running, Some("203.0.113.5")),
    ]);

    let instance = create_instance(&cloud, &config, &group()).await.expect("ok");

    assert_eq!(instance.id, "i-0abc");
    assert_eq!(instance.public_address.as_deref(), Some("203.0.113.5"));
    assert_eq!(instance.state, InstanceState::Running);
    assert_eq!(instance.security_group_id, "sg-0123");
    assert_eq!(*cloud.describe_count.lock().expect("mutex poisoned"), 3);
}

#[tokio::test(start_paused = true)]
async fn test_instance_without_address_times_out() {
    let mut config = test_config();
    config.instance_wait_timeout = Duration::from_secs(30);
    config.instance_poll_interval = Duration::from_secs(5);
    let cloud = FakeCloud::with_statuses(vec![status(InstanceState::Running, None)]);
    let start = tokio::time::Instant::now();

    let err = create_instance(&cloud, &config, &group())
        .await
        .expect_err("must time out");

    assert!(matches!(
        err.downcast_ref::<ProvisionError>(),
        Some(ProvisionError::InstanceAddressTimeout { timeout_secs: 30, .. })
    ));
    assert!(start.elapsed() >= Duration::from_secs(30));
}

#[tokio::test(start_paused = true)]
async fn test_terminated_instance_fails_fast() {
    let config = test_config();
    let cloud = FakeCloud::with_statuses(vec![
        status(InstanceState::Pending, None),
        status(InstanceState::Terminated, None),
    ]);

    let err = create_instance(&cloud, &config, &group())
        .await
        .expect_err("must fail");

    assert!(matches!(
        err.downcast_ref::<ProvisionError>(),
        Some(ProvisionError::InstanceUnavailable { .. })
    ));
    assert_eq!(*cloud.describe_count.lock().expect("mutex poisoned"), 2);
}

#[tokio::test]
async fn test_launch_failure_skips_polling() {
    let config = test_config();
    let mut cloud = FakeCloud::running("203.0.113.5");
    cloud.fail_run_instance = true;

    let err = create_instance(&cloud, &config, &group())
        .await
        .expect_err("must fail");

    assert!(format!("{err:#}").contains("InsufficientInstanceCapacity"));
    assert_eq!(*cloud.describe_count.lock().expect("mutex poisoned"), 0);
}
