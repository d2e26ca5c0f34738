//! Infrastructure implementation of the `CloudProvider` port.
//!
//! `AwsCliProvider<R>` drives EC2 through the `aws` CLI with `--output json`,
//! routing every call through a `CommandRunner` so tests can inject canned
//! responses without touching AWS.

use std::process::Output;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::application::ports::{CloudProvider, CommandRunner, InstanceSpec, KeyPairCreation};
use crate::domain::{IngressRule, InstanceState, InstanceStatus};
use crate::infra::command_runner::{DEFAULT_CMD_TIMEOUT, TokioCommandRunner};

/// Error code returned when a key pair name is taken.
const DUPLICATE_KEY_PAIR: &str = "InvalidKeyPair.Duplicate";
/// Error code returned by describe calls that race instance creation.
const INSTANCE_NOT_FOUND: &str = "InvalidInstanceID.NotFound";

/// EC2 through the `aws` command-line client.
pub struct AwsCliProvider<R: CommandRunner> {
    runner: R,
    region: Option<String>,
}

impl<R: CommandRunner> AwsCliProvider<R> {
    /// Create a provider with an explicit runner. `region` overrides the
    /// CLI's configured default.
    pub fn new(runner: R, region: Option<String>) -> Self {
        Self { runner, region }
    }

    async fn ec2(&self, operation: &str, args: &[&str]) -> Result<Output> {
        let mut full = vec!["ec2", operation];
        full.extend_from_slice(args);
        full.extend_from_slice(&["--output", "json"]);
        if let Some(region) = &self.region {
            full.extend_from_slice(&["--region", region]);
        }
        self.runner
            .run("aws", &full)
            .await
            .with_context(|| format!("aws ec2 {operation}"))
    }
}

impl AwsCliProvider<TokioCommandRunner> {
    /// Convenience constructor for production use.
    #[must_use]
    pub fn default_runner(region: Option<String>) -> Self {
        Self::new(TokioCommandRunner::new(DEFAULT_CMD_TIMEOUT), region)
    }
}

impl<R: CommandRunner> CloudProvider for AwsCliProvider<R> {
    async fn create_key_pair(&self, key_name: &str) -> Result<KeyPairCreation> {
        let output = self
            .ec2("create-key-pair", &["--key-name", key_name])
            .await?;
        if !output.status.success() && stderr_of(&output).contains(DUPLICATE_KEY_PAIR) {
            return Ok(KeyPairCreation::AlreadyExists);
        }
        let response: CreateKeyPairResponse = parse("create-key-pair", &output)?;
        Ok(KeyPairCreation::Created {
            material: response.key_material,
        })
    }

    async fn default_vpc(&self) -> Result<Option<String>> {
        let output = self
            .ec2("describe-vpcs", &["--filters", "Name=isDefault,Values=true"])
            .await?;
        let response: DescribeVpcsResponse = parse("describe-vpcs", &output)?;
        Ok(response.vpcs.into_iter().next().map(|v| v.vpc_id))
    }

    async fn create_security_group(
        &self,
        name: &str,
        description: &str,
        vpc_id: &str,
    ) -> Result<String> {
        let output = self
            .ec2(
                "create-security-group",
                &[
                    "--group-name",
                    name,
                    "--description",
                    description,
                    "--vpc-id",
                    vpc_id,
                ],
            )
            .await?;
        let response: CreateSecurityGroupResponse = parse("create-security-group", &output)?;
        Ok(response.group_id)
    }

    async fn authorize_ingress(&self, group_id: &str, rules: &[IngressRule]) -> Result<()> {
        let permissions = ip_permissions_json(rules)?;
        let output = self
            .ec2(
                "authorize-security-group-ingress",
                &["--group-id", group_id, "--ip-permissions", &permissions],
            )
            .await?;
        ensure_success("authorize-security-group-ingress", &output)
    }

    async fn run_instance(&self, spec: &InstanceSpec<'_>) -> Result<String> {
        let output = self
            .ec2(
                "run-instances",
                &[
                    "--image-id",
                    spec.image_id,
                    "--instance-type",
                    spec.machine_type,
                    "--key-name",
                    spec.key_name,
                    "--security-group-ids",
                    spec.security_group_id,
                    "--count",
                    "1",
                ],
            )
            .await?;
        let response: RunInstancesResponse = parse("run-instances", &output)?;
        response
            .instances
            .into_iter()
            .next()
            .map(|i| i.instance_id)
            .ok_or_else(|| anyhow::anyhow!("aws ec2 run-instances returned no instances"))
    }

    async fn describe_instance(&self, instance_id: &str) -> Result<InstanceStatus> {
        let output = self
            .ec2("describe-instances", &["--instance-ids", instance_id])
            .await?;
        // A fresh instance id may not be visible to describe calls yet.
        if !output.status.success() && stderr_of(&output).contains(INSTANCE_NOT_FOUND) {
            return Ok(InstanceStatus {
                state: InstanceState::Pending,
                public_address: None,
            });
        }
        let response: DescribeInstancesResponse = parse("describe-instances", &output)?;
        let record = response
            .reservations
            .into_iter()
            .flat_map(|r| r.instances)
            .find(|i| i.instance_id == instance_id)
            .ok_or_else(|| anyhow::anyhow!("instance {instance_id} not in describe-instances output"))?;
        Ok(InstanceStatus {
            state: record
                .state
                .map_or(InstanceState::Unknown, |s| InstanceState::from_provider(&s.name)),
            public_address: record.public_ip_address,
        })
    }
}

// ── Wire format ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreateKeyPairResponse {
    key_material: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeVpcsResponse {
    #[serde(default)]
    vpcs: Vec<VpcRecord>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct VpcRecord {
    vpc_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreateSecurityGroupResponse {
    group_id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RunInstancesResponse {
    #[serde(default)]
    instances: Vec<InstanceRecord>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeInstancesResponse {
    #[serde(default)]
    reservations: Vec<ReservationRecord>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ReservationRecord {
    #[serde(default)]
    instances: Vec<InstanceRecord>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstanceRecord {
    instance_id: String,
    state: Option<StateRecord>,
    public_ip_address: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StateRecord {
    name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct IpPermission<'a> {
    ip_protocol: &'a str,
    from_port: u16,
    to_port: u16,
    ip_ranges: [IpRange<'a>; 1],
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct IpRange<'a> {
    cidr_ip: &'a str,
}

/// Render ingress rules as the `--ip-permissions` JSON document.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn ip_permissions_json(rules: &[IngressRule]) -> Result<String> {
    let permissions: Vec<IpPermission<'_>> = rules
        .iter()
        .map(|r| IpPermission {
            ip_protocol: r.protocol,
            from_port: r.port,
            to_port: r.port,
            ip_ranges: [IpRange { cidr_ip: &r.cidr }],
        })
        .collect();
    serde_json::to_string(&permissions).context("serializing ip permissions")
}

fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn ensure_success(operation: &str, output: &Output) -> Result<()> {
    anyhow::ensure!(
        output.status.success(),
        "aws ec2 {operation} failed: {}",
        stderr_of(output).trim()
    );
    Ok(())
}

fn parse<T: DeserializeOwned>(operation: &str, output: &Output) -> Result<T> {
    ensure_success(operation, output)?;
    serde_json::from_slice(&output.stdout)
        .with_context(|| format!("parsing aws ec2 {operation} output"))
}
