//! Selection of reference features within a radius of a center point
//!
//! The center is reprojected into the frame the test runs in (the reference
//! layer's CRS unless a working CRS is set), buffered, and every reference
//! feature is tested against the buffer with an intersects predicate. The
//! result is the ordered subsequence of matching reference features with
//! their original geometry and attributes.

use std::borrow::Cow;

use geoselect_core::error::{GeoselectError, Result};
use geoselect_core::models::{Center, Crs, CrsKind, Distance, GeometryLayer};

use crate::buffer::Buffer;
use crate::index::LayerIndex;
use crate::transform::{reproject_center, reproject_layer, ProjReprojector, Reprojector};

/// How candidate features are enumerated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanStrategy {
    /// Test every feature
    #[default]
    Linear,
    /// Test only features whose envelope meets the buffer's envelope
    Indexed,
}

/// Outcome of a selection, before the reference layer is subset
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Positions of selected features in the reference layer, ascending
    pub indices: Vec<usize>,
    /// The buffer used, expressed in `frame`
    pub buffer: Buffer,
    /// CRS the buffer test was evaluated in
    pub frame: Crs,
}

impl Selection {
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Selected features of `reference`
    pub fn apply(&self, reference: &GeometryLayer) -> GeometryLayer {
        reference.subset(&self.indices)
    }
}

/// Radius selector over a pluggable reprojection backend
#[derive(Debug, Clone, Default)]
pub struct SpatialSelector<R = ProjReprojector> {
    reprojector: R,
    working_crs: Option<Crs>,
    strategy: ScanStrategy,
}

impl SpatialSelector<ProjReprojector> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: Reprojector> SpatialSelector<R> {
    pub fn with_reprojector(reprojector: R) -> Self {
        Self { reprojector, working_crs: None, strategy: ScanStrategy::Linear }
    }

    /// Evaluate the buffer test in `crs` instead of the reference layer's CRS.
    /// Output geometry still comes from the reference layer untouched.
    pub fn working_crs(mut self, crs: Option<Crs>) -> Self {
        self.working_crs = crs;
        self
    }

    pub fn strategy(mut self, strategy: ScanStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Select reference features within `radius` of `center`
    pub fn select(&self, center: &Center, reference: &GeometryLayer, radius: f64) -> Result<GeometryLayer> {
        Ok(self.select_indices(center, reference, radius)?.apply(reference))
    }

    /// Compute which reference features lie within `radius` of `center`.
    ///
    /// `radius` is in the linear unit of the frame CRS. Parameters are checked
    /// before any CRS or geometry work.
    pub fn select_indices(&self, center: &Center, reference: &GeometryLayer, radius: f64) -> Result<Selection> {
        check_parameters(center, radius)?;
        let frame = self.frame(reference);
        self.ensure_projected(&frame, &reference.crs)?;
        self.scan(center, reference, frame, radius)
    }

    /// [`select_indices`](Self::select_indices) with a ground distance.
    ///
    /// The distance is converted to the frame's linear unit, so a radius in
    /// metres selects the same features in a metre and a US-foot frame.
    pub fn select_within_distance(
        &self,
        center: &Center,
        reference: &GeometryLayer,
        distance: Distance,
    ) -> Result<Selection> {
        check_parameters(center, distance.value)?;
        let frame = self.frame(reference);
        let meters_per_unit = self.ensure_projected(&frame, &reference.crs)?;

        let radius = distance.to_meters() / meters_per_unit;
        tracing::debug!(distance = %distance, crs = %frame, radius, "Converted radius to frame units");
        self.scan(center, reference, frame, radius)
    }

    fn frame(&self, reference: &GeometryLayer) -> Crs {
        self.working_crs.clone().unwrap_or_else(|| reference.crs.clone())
    }

    /// Buffering a linear radius in degrees is meaningless, so the frame must be
    /// projected. Returns metres per frame unit.
    fn ensure_projected(&self, frame: &Crs, reference: &Crs) -> Result<f64> {
        if !frame.is_defined() || !reference.is_defined() {
            return Err(GeoselectError::CrsMismatch {
                source_crs: reference.to_string(),
                target_crs: frame.to_string(),
                reason: "reference layer has no CRS; assign one before selecting".to_string(),
            });
        }
        match self.reprojector.crs_kind(frame)? {
            CrsKind::Projected { meters_per_unit } => Ok(meters_per_unit),
            CrsKind::Geographic => Err(GeoselectError::CrsMismatch {
                source_crs: reference.to_string(),
                target_crs: frame.to_string(),
                reason: "selection by distance needs a projected CRS; reproject the reference layer or set a working CRS"
                    .to_string(),
            }),
        }
    }

    fn scan(&self, center: &Center, reference: &GeometryLayer, frame: Crs, radius: f64) -> Result<Selection> {
        let projected = reproject_center(center, &frame, &self.reprojector)?;
        let buffer = Buffer::new(projected.to_point(), radius)?;

        if reference.is_empty() {
            tracing::debug!(layer = %reference.name, "Reference layer is empty");
            return Ok(Selection { indices: Vec::new(), buffer, frame });
        }

        let layer: Cow<'_, GeometryLayer> = if frame == reference.crs {
            Cow::Borrowed(reference)
        } else {
            Cow::Owned(reproject_layer(reference, &frame, &self.reprojector)?)
        };

        let indices = match self.strategy {
            ScanStrategy::Linear => linear_scan(&layer, &buffer),
            ScanStrategy::Indexed => indexed_scan(&layer, &buffer),
        };

        tracing::info!(
            layer = %reference.name,
            crs = %frame,
            center_x = projected.x,
            center_y = projected.y,
            radius,
            strategy = ?self.strategy,
            selected = indices.len(),
            total = reference.len(),
            "Selected features within radius"
        );

        Ok(Selection { indices, buffer, frame })
    }
}

fn check_parameters(center: &Center, radius: f64) -> Result<()> {
    if !radius.is_finite() || radius <= 0.0 {
        return Err(GeoselectError::invalid_parameter(
            "radius",
            radius,
            "must be a positive finite distance",
        ));
    }
    if !center.is_finite() {
        return Err(GeoselectError::invalid_parameter(
            "center",
            format!("({}, {})", center.x, center.y),
            "coordinates must be finite",
        ));
    }
    Ok(())
}

fn linear_scan(layer: &GeometryLayer, buffer: &Buffer) -> Vec<usize> {
    layer
        .iter()
        .enumerate()
        .filter_map(|(idx, feature)| {
            let geometry = feature.geometry.as_ref()?;
            buffer.intersects(geometry).then_some(idx)
        })
        .collect()
}

fn indexed_scan(layer: &GeometryLayer, buffer: &Buffer) -> Vec<usize> {
    let index = LayerIndex::build(layer);
    index
        .candidates(buffer.envelope())
        .into_iter()
        .filter(|&idx| {
            layer.features[idx].geometry.as_ref().is_some_and(|geometry| buffer.intersects(geometry))
        })
        .collect()
}

/// Reference features within `radius` of `center`, reprojecting with PROJ
pub fn select_within_radius(center: &Center, reference: &GeometryLayer, radius: f64) -> Result<GeometryLayer> {
    SpatialSelector::new().select(center, reference, radius)
}

/// [`select_within_radius`] with an explicit reprojection backend
pub fn select_within_radius_with<R: Reprojector + Clone>(
    center: &Center,
    reference: &GeometryLayer,
    radius: f64,
    reprojector: &R,
) -> Result<GeometryLayer> {
    SpatialSelector::with_reprojector(reprojector.clone()).select(center, reference, radius)
}
