use geo::{BoundingRect, Contains, Geometry, Intersects};
use geoselect_core::models::{GeometryLayer, SpatialPredicate};

/// Evaluate `predicate` between a feature geometry and a filter geometry
pub fn evaluate_predicate(
    geometry: &Geometry<f64>,
    filter: &Geometry<f64>,
    predicate: SpatialPredicate,
) -> bool {
    match predicate {
        SpatialPredicate::Intersects => geometry.intersects(filter),
        // Within means the geometry is completely inside the filter
        SpatialPredicate::Within => filter.contains(geometry),
        SpatialPredicate::Contains => geometry.contains(filter),
        SpatialPredicate::BoundingBox => bounding_boxes_intersect(geometry, filter),
    }
}

fn bounding_boxes_intersect(a: &Geometry<f64>, b: &Geometry<f64>) -> bool {
    match (a.bounding_rect(), b.bounding_rect()) {
        (Some(a), Some(b)) => a.intersects(&b),
        _ => false,
    }
}

/// Indices of features satisfying `predicate`, in layer order.
/// Features without geometry never match.
pub fn matching_indices(
    layer: &GeometryLayer,
    filter: &Geometry<f64>,
    predicate: SpatialPredicate,
) -> Vec<usize> {
    layer
        .iter()
        .enumerate()
        .filter_map(|(idx, feature)| {
            let geometry = feature.geometry.as_ref()?;
            evaluate_predicate(geometry, filter, predicate).then_some(idx)
        })
        .collect()
}

/// New layer with the features of `layer` that satisfy `predicate`
pub fn filter_layer(
    layer: &GeometryLayer,
    filter: &Geometry<f64>,
    predicate: SpatialPredicate,
) -> GeometryLayer {
    layer.subset(&matching_indices(layer, filter, predicate))
}
