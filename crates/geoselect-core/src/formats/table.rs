//! Attribute tables for joins: a JSON array of flat objects

use std::path::Path;

use crate::error::{GeoselectError, Result};
use crate::models::Attributes;

/// Read a record table such as `[{"GEOID": "42101000100", "income": 51234}, ...]`
pub async fn read_record_table(path: &Path) -> Result<Vec<Attributes>> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| GeoselectError::load(path, format!("cannot read table: {}", e)))?;

    parse_record_table(&content).map_err(|reason| GeoselectError::load(path, reason))
}

pub fn parse_record_table(content: &str) -> std::result::Result<Vec<Attributes>, String> {
    let value: serde_json::Value =
        serde_json::from_str(content).map_err(|e| format!("invalid JSON: {}", e))?;

    let rows = match value {
        serde_json::Value::Array(rows) => rows,
        _ => return Err("expected a JSON array of records".to_string()),
    };

    rows.into_iter()
        .enumerate()
        .map(|(idx, row)| match row {
            serde_json::Value::Object(record) => {
                if let Some((key, _)) =
                    record.iter().find(|(_, v)| v.is_array() || v.is_object())
                {
                    return Err(format!("record {} field '{}' is not a scalar", idx, key));
                }
                Ok(record)
            }
            _ => Err(format!("record {} is not an object", idx)),
        })
        .collect()
}
