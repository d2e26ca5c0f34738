//! Domain layer: pure types, validation, and command builders.
//!
//! This module has zero imports from `crate::infra`, `crate::application`,
//! `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod error;
pub mod install;
pub mod instance;
pub mod network;
pub mod session;

pub use config::ProvisionConfig;
pub use error::ProvisionError;
pub use instance::{Instance, InstanceState, InstanceStatus};
pub use network::{IngressRule, SecurityGroup, ingress_rules};
pub use session::{
    ConnectOutcome, ConnectionState, FailureClass, SshSession, SshTarget,
    classify_connect_failure,
};
