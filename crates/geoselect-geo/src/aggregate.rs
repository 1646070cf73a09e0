//! Point-in-polygon aggregation
//!
//! Each polygon receives the number of point features intersecting it, and
//! optionally the sum and mean of a numeric point attribute. The output always
//! has one feature per input polygon, in input order.

use geo::{BoundingRect, Intersects};
use geoselect_core::error::{GeoselectError, Result};
use geoselect_core::models::GeometryLayer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::index::LayerIndex;
use crate::transform::check_crs_match;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateSpec {
    /// Output column holding the point count
    pub count_column: String,
    /// Numeric point attribute to sum and average
    pub sum_attribute: Option<String>,
}

impl Default for AggregateSpec {
    fn default() -> Self {
        Self { count_column: "point_count".to_string(), sum_attribute: None }
    }
}

impl AggregateSpec {
    pub fn with_sum(mut self, attribute: impl Into<String>) -> Self {
        self.sum_attribute = Some(attribute.into());
        self
    }

    fn output_columns(&self) -> Vec<String> {
        let mut columns = vec![self.count_column.clone()];
        if let Some(attribute) = &self.sum_attribute {
            columns.push(format!("{}_sum", attribute));
            columns.push(format!("{}_mean", attribute));
        }
        columns
    }
}

/// Count `points` falling in each feature of `polygons`.
///
/// Both layers must share a CRS. A point on a polygon boundary counts for that
/// polygon. Non-numeric or missing values of the summed attribute are skipped;
/// sum and mean are null when no point contributed a value.
pub fn aggregate_points_in_polygons(
    points: &GeometryLayer,
    polygons: &GeometryLayer,
    spec: &AggregateSpec,
) -> Result<GeometryLayer> {
    check_crs_match(&points.crs, &polygons.crs)?;

    if spec.count_column.trim().is_empty() {
        return Err(GeoselectError::invalid_parameter(
            "count_column",
            &spec.count_column,
            "column name must not be empty",
        ));
    }
    let existing = polygons.attribute_names();
    if let Some(column) = spec.output_columns().into_iter().find(|c| existing.contains(c)) {
        return Err(GeoselectError::invalid_parameter(
            "count_column",
            column,
            format!("already an attribute of layer '{}'", polygons.name),
        ));
    }

    let index = LayerIndex::build(points);

    let features = polygons
        .iter()
        .map(|polygon| {
            let members: Vec<usize> = match &polygon.geometry {
                Some(area) => match area.bounding_rect() {
                    Some(rect) => index
                        .candidates(rect)
                        .into_iter()
                        .filter(|&idx| {
                            points.features[idx]
                                .geometry
                                .as_ref()
                                .is_some_and(|point| area.intersects(point))
                        })
                        .collect(),
                    None => Vec::new(),
                },
                None => Vec::new(),
            };

            let mut properties = polygon.properties.clone();
            properties.insert(spec.count_column.clone(), Value::from(members.len()));

            if let Some(attribute) = &spec.sum_attribute {
                let values: Vec<f64> = members
                    .iter()
                    .filter_map(|&idx| points.features[idx].property(attribute).and_then(Value::as_f64))
                    .collect();

                let (sum, mean) = if values.is_empty() {
                    (Value::Null, Value::Null)
                } else {
                    let sum: f64 = values.iter().sum();
                    (Value::from(sum), Value::from(sum / values.len() as f64))
                };
                properties.insert(format!("{}_sum", attribute), sum);
                properties.insert(format!("{}_mean", attribute), mean);
            }

            polygon.with_properties(properties)
        })
        .collect::<Vec<_>>();

    tracing::info!(
        points = points.len(),
        polygons = polygons.len(),
        column = %spec.count_column,
        "Aggregated points in polygons"
    );

    Ok(polygons.derive(features))
}
