//! Inspect command implementation

use crate::cli::InspectArgs;
use crate::commands::load_layer;
use crate::output::OutputWriter;
use crate::output_types::InspectOutput;
use anyhow::Result;
use geoselect_geo::{ProjReprojector, Reprojector};

pub async fn execute(args: InspectArgs, output: &OutputWriter) -> Result<()> {
    let layer = load_layer(&args.layer, args.layer_name.as_deref()).await?;

    let kind = if layer.crs.is_defined() {
        match ProjReprojector.crs_kind(&layer.crs) {
            Ok(kind) => Some(kind),
            Err(e) => {
                tracing::warn!(crs = %layer.crs, "{}", e);
                None
            }
        }
    } else {
        None
    };

    let result = InspectOutput {
        name: layer.name.clone(),
        crs: layer.crs.to_string(),
        crs_defined: layer.crs.is_defined(),
        geographic: kind.map(|k| k.is_geographic()),
        meters_per_unit: kind.and_then(|k| k.meters_per_unit()),
        feature_count: layer.len(),
        null_geometries: layer.null_geometry_count(),
        geometry_types: layer.geometry_types(),
        attributes: layer.attribute_names(),
    };

    if output.is_json() {
        return output.result(result);
    }

    output.section(format!("Layer {}", result.name));
    output.kv("CRS", &result.crs);
    output.kv("Features", result.feature_count);
    if result.null_geometries > 0 {
        output.kv("Without geometry", result.null_geometries);
    }
    let types: Vec<String> = result.geometry_types.iter().map(|t| t.to_string()).collect();
    output.kv("Geometry types", if types.is_empty() { "(none)".to_string() } else { types.join(", ") });
    output.kv("Attributes", result.attributes.join(", "));

    if !result.crs_defined {
        output.warning("Layer has no CRS; it cannot be reprojected or used for selection");
    } else if result.geographic.is_none() {
        output.warning("PROJ cannot classify this CRS; selection will be refused");
    } else if result.geographic == Some(true) {
        output.warning("Geographic CRS; selection by distance needs a projected CRS (see --working-crs)");
    }

    Ok(())
}
