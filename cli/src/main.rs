//! charty-provision: launch an EC2 instance and install charty on it

use clap::Parser;
use tracing_subscriber::EnvFilter;

use charty_provision::cli::Cli;
use charty_provision::output::log_ansi;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries progress lines and the URL.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level())),
        )
        .with_writer(std::io::stderr)
        .with_ansi(log_ansi(cli.no_color))
        .init();

    if let Err(e) = cli.run().await {
        tracing::error!(error = %format!("{e:#}"), "provisioning failed");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
