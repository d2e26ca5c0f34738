//! Provisioning configuration schema.
//!
//! Pure types only: no I/O or async. Loading from
//! disk lives in `crate::infra::config`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ── Defaults ─────────────────────────────────────────────────────────────────

/// Free-tier instance type, so a forgotten instance does not accrue fees.
pub const DEFAULT_MACHINE_TYPE: &str = "t2.micro";
/// Ubuntu 16.04 LTS.
pub const DEFAULT_IMAGE_ID: &str = "ami-95a977ea";
pub const DEFAULT_KEY_NAME: &str = "ops_code_test";
pub const DEFAULT_USERNAME: &str = "ubuntu";
pub const DEFAULT_SSH_PORT: u16 = 22;
pub const DEFAULT_APP_PORT: u16 = 8000;
pub const CIDR_ANYWHERE: &str = "0.0.0.0/0";
pub const DEFAULT_RETRY_COUNT: u32 = 5;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(3);
pub const DEFAULT_INSTANCE_WAIT_TIMEOUT: Duration = Duration::from_secs(300);
pub const DEFAULT_INSTANCE_POLL_INTERVAL: Duration = Duration::from_secs(5);

// ── Config schema ────────────────────────────────────────────────────────────

/// Everything a provisioning run needs, fixed for the lifetime of the run.
///
/// Stored (optionally) in `~/.charty/config.yaml`. Every field has a default,
/// so an empty or missing file yields the stock charty setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionConfig {
    /// EC2 instance type, e.g. `t2.micro`.
    pub machine_type: String,
    /// AMI to boot.
    pub image_id: String,
    /// Provider-side key pair name.
    pub key_name: String,
    /// Local private key for the key pair. `~/` is expanded on load.
    pub key_file: PathBuf,
    /// Login user on the image.
    pub username: String,
    pub ssh_port: u16,
    pub app_port: u16,
    /// Source range for both ingress rules.
    pub cidr_anywhere: String,
    /// Total SSH connection attempts.
    pub retry_count: u32,
    /// Pause between SSH connection attempts.
    #[serde(with = "duration_secs")]
    pub retry_delay: Duration,
    /// How long to wait for the instance to run with a public address.
    #[serde(with = "duration_secs")]
    pub instance_wait_timeout: Duration,
    #[serde(with = "duration_secs")]
    pub instance_poll_interval: Duration,
    /// AWS region; the CLI's own default applies when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    pub security_group: SecurityGroupConfig,
    pub network: NetworkConfig,
    pub credentials: CredentialsConfig,
    pub app: AppConfig,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            machine_type: DEFAULT_MACHINE_TYPE.to_string(),
            image_id: DEFAULT_IMAGE_ID.to_string(),
            key_name: DEFAULT_KEY_NAME.to_string(),
            key_file: PathBuf::from(format!("~/{DEFAULT_KEY_NAME}.pem")),
            username: DEFAULT_USERNAME.to_string(),
            ssh_port: DEFAULT_SSH_PORT,
            app_port: DEFAULT_APP_PORT,
            cidr_anywhere: CIDR_ANYWHERE.to_string(),
            retry_count: DEFAULT_RETRY_COUNT,
            retry_delay: DEFAULT_RETRY_DELAY,
            instance_wait_timeout: DEFAULT_INSTANCE_WAIT_TIMEOUT,
            instance_poll_interval: DEFAULT_INSTANCE_POLL_INTERVAL,
            region: None,
            security_group: SecurityGroupConfig::default(),
            network: NetworkConfig::default(),
            credentials: CredentialsConfig::default(),
            app: AppConfig::default(),
        }
    }
}

impl ProvisionConfig {
    /// Expand leading `~/` in local paths against `home`.
    ///
    /// Remote paths (`credentials.destination`, `app.install_dir`) are left
    /// alone; they are relative to the login user's home on the instance.
    #[must_use]
    pub fn with_home(mut self, home: &Path) -> Self {
        self.key_file = expand_home(&self.key_file, home);
        self.credentials.source = expand_home(&self.credentials.source, home);
        self
    }
}

/// Security group created for the instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityGroupConfig {
    pub name: String,
    pub description: String,
}

impl Default for SecurityGroupConfig {
    fn default() -> Self {
        Self {
            name: "charty".to_string(),
            description: "Charty".to_string(),
        }
    }
}

/// Network the security group is created in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Explicit VPC. When unset the account's default VPC is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vpc_id: Option<String>,
}

/// Git hosting key copied onto the instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialsConfig {
    /// Local private key. `~/` is expanded on load.
    pub source: PathBuf,
    /// Destination relative to the remote user's home.
    pub destination: String,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("~/.ssh/id_rsa"),
            destination: ".ssh/id_rsa".to_string(),
        }
    }
}

/// Where the app comes from and how it is installed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Git URL cloned with the delivered credential.
    pub repository: String,
    /// Checkout directory relative to the remote user's home.
    pub install_dir: String,
    /// Shell command run inside `install_dir`.
    pub install_command: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            repository: "git@github.com:charty/charty.git".to_string(),
            install_dir: "Code/lib".to_string(),
            install_command: "./install.sh".to_string(),
        }
    }
}

/// Replace a leading `~` component of `path` with `home`.
#[must_use]
pub fn expand_home(path: &Path, home: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => home.join(rest),
        Err(_) => path.to_path_buf(),
    }
}

/// (De)serialize a `Duration` as whole seconds.
mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
