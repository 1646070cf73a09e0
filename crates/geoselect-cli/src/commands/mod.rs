//! Command implementations

mod aggregate;
mod config;
mod inspect;
mod join;
mod reproject;
mod select;

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;
use anyhow::{Context, Result};
use geoselect_core::config::LayeredConfig;
use geoselect_core::formats::FormatRegistry;
use geoselect_core::models::{Crs, GeometryLayer};
use std::path::{Path, PathBuf};

/// Execute a CLI command
pub async fn execute(cli: Cli, output: &OutputWriter) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Select(args) => select::execute(args, config, output).await,
        Commands::Reproject(args) => reproject::execute(args, config, output).await,
        Commands::Join(args) => join::execute(args, config, output).await,
        Commands::Aggregate(args) => aggregate::execute(args, config, output).await,
        Commands::Inspect(args) => inspect::execute(args, output).await,
        Commands::Config => config::execute(&config, cli.config.as_deref(), output),
    }
}

/// Defaults, then the config file (when given), then environment variables
fn load_config(path: Option<&Path>) -> Result<LayeredConfig> {
    let config = LayeredConfig::with_defaults();
    let config = match path {
        Some(path) => config
            .load_from_file(path)
            .with_context(|| format!("Failed to load configuration file {}", path.display()))?,
        None => config,
    };
    let config = config.load_from_env();
    tracing::debug!(
        center_crs = %config.center_crs.value,
        distance_unit = ?config.distance_unit.value,
        buffer_segments = config.buffer_segments.value,
        "Resolved configuration"
    );
    Ok(config)
}

async fn load_layer(path: &Path, layer: Option<&str>) -> Result<GeometryLayer> {
    let layer = FormatRegistry::with_defaults().read_layer(path, layer).await?;
    Ok(layer)
}

fn parse_crs(value: &str) -> Result<Crs> {
    let crs = value.parse::<Crs>()?;
    Ok(crs)
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}

fn display_optional(path: &Option<PathBuf>) -> Option<String> {
    path.as_deref().map(display_path)
}
