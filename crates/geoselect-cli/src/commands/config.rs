use crate::output::OutputWriter;
use crate::output_types::ConfigEntry;
use anyhow::Result;
use geoselect_core::config::LayeredConfig;
use std::path::Path;

pub fn execute(config: &LayeredConfig, file: Option<&Path>, output: &OutputWriter) -> Result<()> {
    let entries: Vec<ConfigEntry> = config
        .to_inspection_map()
        .into_iter()
        .map(|(key, (value, source))| ConfigEntry::new(key, value, source))
        .collect();

    if output.is_json() {
        return output.result(serde_json::json!({
            "config_file": file.map(|p| p.display().to_string()),
            "settings": entries,
        }));
    }

    output.section("Configuration");
    if let Some(file) = file {
        output.kv("Config file", file.display());
    }
    output.table(entries)
}
