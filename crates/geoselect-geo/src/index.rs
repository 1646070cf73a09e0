//! R-tree over feature envelopes

use geo::{BoundingRect, Rect};
use geoselect_core::models::GeometryLayer;
use rstar::{RTree, RTreeObject, AABB};

/// Position of a feature in its layer together with its bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
struct IndexedEnvelope {
    index: usize,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for IndexedEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

fn to_aabb(rect: Rect<f64>) -> AABB<[f64; 2]> {
    AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y])
}

/// Spatial index answering "which features may touch this box".
///
/// Candidates are conservative: every feature that intersects the box is
/// returned, plus possibly some that do not. Features without geometry, or
/// with an empty one, are not indexed.
pub struct LayerIndex {
    tree: RTree<IndexedEnvelope>,
}

impl LayerIndex {
    pub fn build(layer: &GeometryLayer) -> Self {
        let entries: Vec<IndexedEnvelope> = layer
            .iter()
            .enumerate()
            .filter_map(|(index, feature)| {
                let rect = feature.geometry.as_ref()?.bounding_rect()?;
                Some(IndexedEnvelope { index, envelope: to_aabb(rect) })
            })
            .collect();

        tracing::debug!(layer = %layer.name, indexed = entries.len(), "Built spatial index");
        Self { tree: RTree::bulk_load(entries) }
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Layer positions of features whose envelope meets `rect`, ascending
    pub fn candidates(&self, rect: Rect<f64>) -> Vec<usize> {
        let query = to_aabb(rect);
        let mut hits: Vec<usize> =
            self.tree.locate_in_envelope_intersecting(&query).map(|e| e.index).collect();
        hits.sort_unstable();
        hits
    }
}
