//! Security group and ingress rule types.

use crate::domain::config::ProvisionConfig;

/// A security group created for the instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityGroup {
    pub id: String,
    pub vpc_id: String,
}

/// A single inbound permission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngressRule {
    /// IP protocol name as the provider spells it, e.g. `tcp`.
    pub protocol: &'static str,
    pub port: u16,
    pub cidr: String,
}

/// The inbound rules the instance needs: SSH and the app, from anywhere.
#[must_use]
pub fn ingress_rules(config: &ProvisionConfig) -> Vec<IngressRule> {
    [config.ssh_port, config.app_port]
        .into_iter()
        .map(|port| IngressRule {
            protocol: "tcp",
            port,
            cidr: config.cidr_anywhere.clone(),
        })
        .collect()
}
