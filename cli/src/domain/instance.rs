//! Compute instance as reported by the provider.

use std::fmt;

/// Lifecycle state names used by EC2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceState {
    Pending,
    Running,
    ShuttingDown,
    Terminated,
    Stopping,
    Stopped,
    Unknown,
}

impl InstanceState {
    /// Parse a provider state name. Unrecognised names map to `Unknown`.
    #[must_use]
    pub fn from_provider(name: &str) -> Self {
        match name {
            "pending" => Self::Pending,
            "running" => Self::Running,
            "shutting-down" => Self::ShuttingDown,
            "terminated" => Self::Terminated,
            "stopping" => Self::Stopping,
            "stopped" => Self::Stopped,
            _ => Self::Unknown,
        }
    }

    /// `true` once the instance can no longer reach `Running` without
    /// outside intervention.
    #[must_use]
    pub fn is_gone(self) -> bool {
        matches!(
            self,
            Self::ShuttingDown | Self::Terminated | Self::Stopping | Self::Stopped
        )
    }
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::ShuttingDown => "shutting-down",
            Self::Terminated => "terminated",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
            Self::Unknown => "unknown",
        })
    }
}

/// Point-in-time view of an instance from a describe call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceStatus {
    pub state: InstanceState,
    pub public_address: Option<String>,
}

impl InstanceStatus {
    /// The public address, if the instance is running and has one.
    #[must_use]
    pub fn reachable_address(&self) -> Option<&str> {
        if self.state != InstanceState::Running {
            return None;
        }
        self.public_address.as_deref().filter(|a| !a.is_empty())
    }
}

/// A provisioned instance. Never torn down by this tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instance {
    pub id: String,
    pub machine_type: String,
    pub image_id: String,
    pub key_name: String,
    pub security_group_id: String,
    pub public_address: Option<String>,
    pub state: InstanceState,
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}
