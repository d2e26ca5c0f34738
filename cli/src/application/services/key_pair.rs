//! Key pair use-case: make sure the local private key exists.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::application::ports::{CloudProvider, KeyPairCreation, KeyStore};
use crate::domain::{ProvisionConfig, ProvisionError};

/// The local half of a provider key pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyPair {
    pub name: String,
    pub path: PathBuf,
    /// `true` when this run created the provider key pair.
    pub created: bool,
}

/// Ensure the local key file exists, creating the provider key pair if not.
///
/// Idempotent at the file level only: an existing file is trusted without
/// checking the provider.
///
/// # Errors
///
/// Returns `ProvisionError::KeyPairOrphaned` if the provider already has a key
/// pair of that name while the local file is missing, or any provider or
/// filesystem error.
pub async fn ensure_key_pair(
    cloud: &impl CloudProvider,
    keys: &impl KeyStore,
    config: &ProvisionConfig,
) -> Result<KeyPair> {
    let path = config.key_file.clone();
    if keys.exists(&path) {
        debug!(key_file = %path.display(), "key file present");
        return Ok(KeyPair {
            name: config.key_name.clone(),
            path,
            created: false,
        });
    }

    warn!(
        key_file = %path.display(),
        key_name = %config.key_name,
        "key file does not exist; creating key pair and saving to key file"
    );
    let creation = cloud
        .create_key_pair(&config.key_name)
        .await
        .with_context(|| format!("creating key pair '{}'", config.key_name))?;

    match creation {
        KeyPairCreation::Created { mut material } => {
            if !material.ends_with('\n') {
                material.push('\n');
            }
            keys.write_private_key(&path, &material)
                .with_context(|| format!("saving key pair to {}", path.display()))?;
            info!(key_file = %path.display(), key_name = %config.key_name, "created key pair");
            Ok(KeyPair {
                name: config.key_name.clone(),
                path,
                created: true,
            })
        }
        KeyPairCreation::AlreadyExists => Err(ProvisionError::KeyPairOrphaned {
            key_name: config.key_name.clone(),
            path,
        }
        .into()),
    }
}
