//! Attribute join of a layer with a record table on a shared key column

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{GeoselectError, Result};
use crate::models::{Attributes, GeometryLayer};

/// Suffix added to right-hand attributes whose name already exists on the left
pub const COLLISION_SUFFIX: &str = "_right";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum JoinMode {
    /// Drop features without a matching record
    #[default]
    Inner,
    /// Keep unmatched features with their own attributes only
    LeftOuter,
}

/// Comparable form of a scalar key value.
///
/// Numbers compare by value, so `42`, `42.0` and a DBF numeric `42.0` agree.
/// Strings never match numbers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum JoinKey {
    Text(String),
    Number(u64),
    Bool(bool),
}

impl JoinKey {
    fn from_value(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::String(s) => Some(JoinKey::Text(s.clone())),
            serde_json::Value::Bool(b) => Some(JoinKey::Bool(*b)),
            serde_json::Value::Number(n) => {
                let n = n.as_f64()?;
                // +0.0 and -0.0 are the same key
                let n = if n == 0.0 { 0.0 } else { n };
                Some(JoinKey::Number(n.to_bits()))
            }
            _ => None,
        }
    }
}

/// Outcome counts of a join, for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct JoinSummary {
    pub matched: usize,
    pub unmatched: usize,
}

/// Equi-join `layer` with `table` where `left_key` equals `right_key`.
///
/// Returns a new layer; geometry, order and CRS are those of `layer`. When a
/// key occurs more than once in `table` the first record wins.
pub fn join_attributes(
    layer: &GeometryLayer,
    table: &[Attributes],
    left_key: &str,
    right_key: &str,
    mode: JoinMode,
) -> Result<(GeometryLayer, JoinSummary)> {
    if !layer.is_empty() && !layer.iter().any(|f| f.properties.contains_key(left_key)) {
        return Err(GeoselectError::invalid_parameter(
            "left_key",
            left_key,
            format!("no feature of layer '{}' has this attribute", layer.name),
        ));
    }

    if !table.is_empty() && !table.iter().any(|row| row.contains_key(right_key)) {
        return Err(GeoselectError::invalid_parameter(
            "right_key",
            right_key,
            "no record of the table has this attribute",
        ));
    }

    let mut lookup: HashMap<JoinKey, &Attributes> = HashMap::with_capacity(table.len());
    for row in table {
        if let Some(key) = row.get(right_key).and_then(JoinKey::from_value) {
            lookup.entry(key).or_insert(row);
        }
    }

    let mut summary = JoinSummary::default();
    let mut features = Vec::with_capacity(layer.len());

    for feature in layer.iter() {
        let matched = feature
            .property(left_key)
            .and_then(JoinKey::from_value)
            .and_then(|key| lookup.get(&key));

        match (matched, mode) {
            (Some(row), _) => {
                summary.matched += 1;
                features.push(feature.with_properties(merge(&feature.properties, row, right_key)));
            }
            (None, JoinMode::LeftOuter) => {
                summary.unmatched += 1;
                features.push(feature.clone());
            }
            (None, JoinMode::Inner) => summary.unmatched += 1,
        }
    }

    tracing::debug!(
        layer = %layer.name,
        matched = summary.matched,
        unmatched = summary.unmatched,
        ?mode,
        "Joined attributes"
    );

    Ok((layer.derive(features), summary))
}

fn merge(left: &Attributes, right: &Attributes, right_key: &str) -> Attributes {
    let mut merged = left.clone();
    for (name, value) in right.iter().filter(|(name, _)| name.as_str() != right_key) {
        let target = if merged.contains_key(name) { free_name(&merged, name) } else { name.clone() };
        merged.insert(target, value.clone());
    }
    merged
}

/// `<name>_right`, then `<name>_right_2`, `<name>_right_3`... whichever is free
fn free_name(taken: &Attributes, name: &str) -> String {
    let base = format!("{}{}", name, COLLISION_SUFFIX);
    let mut candidate = base.clone();
    let mut n = 2;
    while taken.contains_key(&candidate) {
        candidate = format!("{}_{}", base, n);
        n += 1;
    }
    candidate
}
