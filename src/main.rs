use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use kks::commands;
use kks::config::{Config, Settings};
use kks_core::api::KksCoreBuilder;

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Config::parse_args();

    // Setup logging
    setup_logging(cli.debug);

    // Load settings
    let mut settings =
        Settings::load(cli.config.as_deref()).context("Failed to load settings")?;
    cli.apply_to(&mut settings);
    settings.validate();

    let core = KksCoreBuilder::new(settings).build();
    commands::run(&core, cli.command, &mut std::io::stdout().lock())
}

fn setup_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("kks=debug,kks_core=debug")
    } else {
        EnvFilter::new("kks=warn,kks_core=warn")
    };

    // stdout carries command output only
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
