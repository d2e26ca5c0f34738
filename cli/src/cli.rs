//! CLI argument parsing with clap derive

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use crate::app::{AppContext, AppFlags};
use crate::application::services::provision::provision;
use crate::output::TerminalReporter;

/// Launch an EC2 instance and install charty on it
#[derive(Parser)]
#[command(name = "charty-provision", version)]
pub struct Cli {
    /// Config file (default: ~/.charty/config.yaml)
    #[arg(long, env = "CHARTY_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress non-error output; only the app URL is printed
    #[arg(short, long)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(
        long,
        env = "NO_COLOR",
        action = clap::ArgAction::SetTrue,
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub no_color: bool,

    /// Log at debug level
    #[arg(short, long, conflicts_with = "quiet")]
    pub verbose: bool,
}

impl Cli {
    /// Default log filter when `RUST_LOG` is unset.
    #[must_use]
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }

    /// Run the provisioning pipeline and print the app URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the context cannot be built or any step fails.
    pub async fn run(self) -> Result<()> {
        let ctx = AppContext::new(&AppFlags {
            no_color: self.no_color,
            quiet: self.quiet,
            config: self.config,
        })?;
        info!(
            machine_type = %ctx.config.machine_type,
            image_id = %ctx.config.image_id,
            key_name = %ctx.config.key_name,
            "starting provisioning run"
        );

        let reporter = TerminalReporter::new(&ctx.output);
        let outcome = provision(&ctx.cloud, &ctx.shell, &ctx.keys, &reporter, &ctx.config).await?;
        ctx.output.url(&outcome.url);
        Ok(())
    }
}
