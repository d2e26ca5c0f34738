//! Typed domain errors.
//!
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator. Callers that need to branch on the failure recover
//! the variant with `anyhow::Error::downcast_ref`.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::session::ConnectionState;

/// Fatal conditions raised by the provisioning pipeline.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error(
        "key pair '{key_name}' already exists in the provider but the local key file {} is missing. \
Delete the key pair or restore the file.",
        .path.display()
    )]
    KeyPairOrphaned { key_name: String, path: PathBuf },

    #[error("no default VPC found. Set network.vpc_id in the configuration.")]
    NoDefaultNetwork,

    #[error("instance {instance_id} had no public address after {timeout_secs}s; aborting")]
    InstanceAddressTimeout {
        instance_id: String,
        timeout_secs: u64,
    },

    #[error("instance {instance_id} entered state '{state}' before becoming reachable")]
    InstanceUnavailable { instance_id: String, state: String },

    #[error("instance {instance_id} has no public address")]
    MissingAddress { instance_id: String },

    #[error("key file {} does not exist", .path.display())]
    MissingKeyFile { path: PathBuf },

    #[error(
        "unable to connect to {user}@{host} using key file {} after {retries} retries; aborting",
        .key_file.display()
    )]
    RetriesExhausted {
        user: String,
        host: String,
        key_file: PathBuf,
        retries: u32,
    },

    #[error("remote command `{command}` failed with {status}\n{stderr}")]
    RemoteCommandFailed {
        command: String,
        status: String,
        stdout: String,
        stderr: String,
    },

    #[error("credential transfer to {destination} incomplete: sent {expected} bytes, found {actual}")]
    IncompleteTransfer {
        destination: String,
        expected: u64,
        actual: u64,
    },

    #[error("invalid connection state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: ConnectionState,
        to: ConnectionState,
    },
}
