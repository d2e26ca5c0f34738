//! Application context: everything a run needs, built once from CLI flags.

use std::path::PathBuf;

use anyhow::Result;

use crate::domain::ProvisionConfig;
use crate::infra::aws::AwsCliProvider;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::config::YamlConfigLoader;
use crate::infra::fs::LocalKeyStore;
use crate::infra::ssh::OpenSshShell;
use crate::output::OutputContext;

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
    /// Explicit config file (`--config` or `CHARTY_CONFIG`).
    pub config: Option<PathBuf>,
}

/// Production adapters plus the loaded, immutable config.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    pub config: ProvisionConfig,
    pub cloud: AwsCliProvider<TokioCommandRunner>,
    pub shell: OpenSshShell<TokioCommandRunner>,
    pub keys: LocalKeyStore,
}

impl AppContext {
    /// Load the config and construct the production adapters.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be found, the config
    /// cannot be loaded, or the SSH socket directory cannot be created.
    pub fn new(flags: &AppFlags) -> Result<Self> {
        let config = YamlConfigLoader::from_home_dir()?.load(flags.config.as_deref())?;
        Ok(Self {
            output: OutputContext::new(flags.no_color, flags.quiet),
            cloud: AwsCliProvider::default_runner(config.region.clone()),
            shell: OpenSshShell::default_runner()?,
            keys: LocalKeyStore,
            config,
        })
    }
}
