use crate::cli::JoinArgs;
use crate::commands::{display_path, load_layer};
use crate::output::OutputWriter;
use crate::output_types::JoinOutput;
use anyhow::{Context, Result};
use geoselect_core::config::{CliConfigOverrides, LayeredConfig};
use geoselect_core::formats::geojson::GeoJsonWriter;
use geoselect_core::formats::table::read_record_table;
use geoselect_core::join::{join_attributes, JoinMode};

pub async fn execute(args: JoinArgs, mut config: LayeredConfig, output: &OutputWriter) -> Result<()> {
    config.update_from_cli(CliConfigOverrides {
        overwrite: args.overwrite.then_some(true),
        ..Default::default()
    });

    let layer = load_layer(&args.layer, args.layer_name.as_deref()).await?;
    let table = read_record_table(&args.table)
        .await
        .with_context(|| format!("Failed to read record table {}", args.table.display()))?;

    let right_key = args.right_key.clone().unwrap_or_else(|| args.left_key.clone());
    let mode = if args.outer { JoinMode::LeftOuter } else { JoinMode::Inner };
    let (joined, summary) = join_attributes(&layer, &table, &args.left_key, &right_key, mode)?;

    GeoJsonWriter::new(config.overwrite.value).write(&joined, &args.output).await?;

    let result = JoinOutput {
        layer: layer.name.clone(),
        left_key: args.left_key.clone(),
        right_key,
        mode: format!("{:?}", mode),
        matched: summary.matched,
        unmatched: summary.unmatched,
        feature_count: joined.len(),
        output: display_path(&args.output),
    };

    if output.is_json() {
        output.result(result)?;
    } else {
        output.kv("Layer", &result.layer);
        output.kv("Keys", format!("{} = {}", result.left_key, result.right_key));
        output.kv("Matched", result.matched);
        output.kv("Unmatched", result.unmatched);
        if result.matched == 0 {
            output.warning("No feature matched a record; check the key columns and their types");
        }
        output.success(format!("Wrote {} features to {}", result.feature_count, result.output));
    }

    Ok(())
}
