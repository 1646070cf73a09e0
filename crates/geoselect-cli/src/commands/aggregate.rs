use crate::cli::AggregateArgs;
use crate::commands::{display_path, load_layer};
use crate::output::OutputWriter;
use crate::output_types::AggregateOutput;
use anyhow::Result;
use geoselect_core::config::{CliConfigOverrides, LayeredConfig};
use geoselect_core::formats::geojson::GeoJsonWriter;
use geoselect_geo::{aggregate_points_in_polygons, AggregateSpec};

pub async fn execute(args: AggregateArgs, mut config: LayeredConfig, output: &OutputWriter) -> Result<()> {
    config.update_from_cli(CliConfigOverrides {
        overwrite: args.overwrite.then_some(true),
        ..Default::default()
    });

    let points = load_layer(&args.points, args.points_layer.as_deref()).await?;
    let polygons = load_layer(&args.polygons, args.polygons_layer.as_deref()).await?;

    let spec = AggregateSpec {
        count_column: args.count_column.clone(),
        sum_attribute: args.sum_attribute.clone(),
    };
    let aggregated = aggregate_points_in_polygons(&points, &polygons, &spec)?;

    GeoJsonWriter::new(config.overwrite.value).write(&aggregated, &args.output).await?;

    let result = AggregateOutput {
        polygons: polygons.name.clone(),
        points: points.name.clone(),
        count_column: spec.count_column.clone(),
        polygon_count: aggregated.len(),
        point_count: points.len(),
        output: display_path(&args.output),
    };

    if output.is_json() {
        output.result(result)?;
    } else {
        output.kv("Polygons", format!("{} ({} features)", result.polygons, result.polygon_count));
        output.kv("Points", format!("{} ({} features)", result.points, result.point_count));
        output.success(format!("Wrote '{}' counts to {}", result.count_column, result.output));
    }

    Ok(())
}
