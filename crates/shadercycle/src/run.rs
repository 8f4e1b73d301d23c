use anyhow::{Context, Result};
use renderer::{check_sources, ProgramName, Renderer, RendererConfig};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::{self, FileConfig};

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

pub fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    tracing::debug!(
        size = ?config.surface_size,
        title = %config.title,
        default = %config.sources.default,
        rainbow = %config.sources.rainbow,
        reflection = %config.sources.reflection,
        "resolved shadercycle configuration"
    );

    if cli.check {
        return check(&config);
    }

    tracing::info!("starting shadercycle window");
    let mut renderer = Renderer::new(config);
    renderer.run()
}

fn load_config(cli: &Cli) -> Result<RendererConfig> {
    let file = match cli.config.as_deref() {
        Some(path) => Some(
            FileConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
        ),
        None => None,
    };
    Ok(config::resolve(cli, file))
}

/// Builds every program offline and prints the uniforms each one exposes.
fn check(config: &RendererConfig) -> Result<()> {
    let report = check_sources(&config.sources).context("shader check failed")?;
    for (name, uniforms) in report {
        println!(
            "{:<10} ok  source={} uniforms=[{}]",
            name.as_str(),
            config.sources.get(name),
            uniforms.join(", ")
        );
    }
    tracing::info!(programs = ProgramName::ALL.len(), "all shader programs compiled and linked");
    Ok(())
}
