//! Select command implementation

use crate::center::parse_center;
use crate::cli::SelectArgs;
use crate::commands::{display_optional, display_path, load_layer, parse_crs};
use crate::output::OutputWriter;
use crate::output_types::SelectOutput;
use anyhow::Result;
use geo::Geometry;
use geoselect_core::config::{parse_distance_unit, CliConfigOverrides, LayeredConfig};
use geoselect_core::formats::geojson::GeoJsonWriter;
use geoselect_core::models::{Attributes, Distance, Feature, GeometryLayer};
use geoselect_geo::selector::{ScanStrategy, Selection};
use geoselect_geo::SpatialSelector;

pub async fn execute(args: SelectArgs, mut config: LayeredConfig, output: &OutputWriter) -> Result<()> {
    config.update_from_cli(CliConfigOverrides {
        center_crs: args.center_crs.as_deref().map(parse_crs).transpose()?,
        working_crs: args.working_crs.as_deref().map(parse_crs).transpose()?,
        distance_unit: args.unit.as_deref().map(parse_distance_unit).transpose()?,
        buffer_segments: None,
        overwrite: args.overwrite.then_some(true),
    });

    let center = parse_center(&args.center, &config.center_crs.value)?;
    let radius = Distance::new(args.radius, config.distance_unit.value);

    let reference = load_layer(&args.layer, args.layer_name.as_deref()).await?;

    let strategy = if args.indexed { ScanStrategy::Indexed } else { ScanStrategy::Linear };
    let selection = SpatialSelector::new()
        .working_crs(config.working_crs.value.clone())
        .strategy(strategy)
        .select_within_distance(&center, &reference, radius)?;
    let selected = selection.apply(&reference);

    let writer = GeoJsonWriter::new(config.overwrite.value);
    if let Some(path) = &args.output {
        writer.write(&selected, path).await?;
    }
    if let Some(path) = &args.buffer_output {
        let buffer = buffer_layer(&selection, config.buffer_segments.value)?;
        writer.write(&buffer, path).await?;
    }

    let buffer_center = selection.buffer.center();
    let result = SelectOutput {
        layer: reference.name.clone(),
        crs: reference.crs.to_string(),
        frame_crs: selection.frame.to_string(),
        center: [buffer_center.x(), buffer_center.y()],
        radius,
        frame_radius: selection.buffer.radius(),
        selected: selected.len(),
        total: reference.len(),
        feature_ids: selected.iter().map(|f| f.id.to_string()).collect(),
        output: display_optional(&args.output),
        buffer_output: display_optional(&args.buffer_output),
    };

    if output.is_json() {
        output.result(result)?;
    } else {
        output.section("Selection");
        output.kv("Layer", &result.layer);
        output.kv("CRS", &result.crs);
        if selection.frame != reference.crs {
            output.kv("Working CRS", &result.frame_crs);
        }
        output.kv("Center", format!("({:.3}, {:.3})", result.center[0], result.center[1]));
        output.kv("Radius", format!("{} ({} in frame units)", result.radius, result.frame_radius));
        output.kv("Selected", format!("{} of {}", result.selected, result.total));
        if !result.feature_ids.is_empty() {
            output.kv("Features", result.feature_ids.join(", "));
        }
        match &args.output {
            Some(path) => {
                output.success(format!("Wrote {} features to {}", selected.len(), display_path(path)))
            }
            None => output.info("Pass --output to save the selection as GeoJSON"),
        }
        if let Some(path) = &args.buffer_output {
            output.success(format!("Wrote buffer polygon to {}", display_path(path)));
        }
    }

    Ok(())
}

/// Single-feature layer holding the buffer polygon, in the frame CRS
fn buffer_layer(selection: &Selection, segments: usize) -> Result<GeometryLayer> {
    let polygon = selection.buffer.to_polygon(segments)?;

    let mut properties = Attributes::new();
    properties.insert("radius".to_string(), serde_json::json!(selection.buffer.radius()));
    properties.insert("selected".to_string(), serde_json::json!(selection.len()));

    Ok(GeometryLayer::new(
        "buffer",
        selection.frame.clone(),
        vec![Feature::new(0usize, Geometry::Polygon(polygon), properties)],
    ))
}
