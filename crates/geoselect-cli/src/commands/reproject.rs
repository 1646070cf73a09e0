use crate::cli::ReprojectArgs;
use crate::commands::{display_path, load_layer, parse_crs};
use crate::output::OutputWriter;
use crate::output_types::ReprojectOutput;
use anyhow::Result;
use geoselect_core::config::{CliConfigOverrides, LayeredConfig};
use geoselect_core::formats::geojson::GeoJsonWriter;
use geoselect_geo::transform::reproject_layer;
use geoselect_geo::ProjReprojector;

pub async fn execute(args: ReprojectArgs, mut config: LayeredConfig, output: &OutputWriter) -> Result<()> {
    config.update_from_cli(CliConfigOverrides {
        overwrite: args.overwrite.then_some(true),
        ..Default::default()
    });

    let target = parse_crs(&args.to)?;
    let layer = load_layer(&args.layer, args.layer_name.as_deref()).await?;
    let reprojected = reproject_layer(&layer, &target, &ProjReprojector)?;

    GeoJsonWriter::new(config.overwrite.value).write(&reprojected, &args.output).await?;

    let result = ReprojectOutput {
        layer: layer.name.clone(),
        from: layer.crs.to_string(),
        to: reprojected.crs.to_string(),
        feature_count: reprojected.len(),
        output: display_path(&args.output),
    };

    if output.is_json() {
        output.result(result)?;
    } else {
        output.kv("Layer", &result.layer);
        output.kv("From", &result.from);
        output.kv("To", &result.to);
        output.success(format!("Wrote {} features to {}", result.feature_count, result.output));
    }

    Ok(())
}
