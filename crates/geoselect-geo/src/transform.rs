//! CRS transformation of geometries, centers and layers

use geo::{Coord, Geometry, MapCoords};
use geoselect_core::error::{GeoselectError, Result};
use geoselect_core::models::{Center, Crs, CrsKind, GeometryLayer};
use proj::Proj;
use serde_json::Value;

/// Coordinate-level transformation between two fixed CRS
pub trait CoordTransform {
    fn transform(&self, coord: Coord<f64>) -> Result<Coord<f64>>;
}

/// Source of coordinate transformations.
///
/// Implementations only build the per-pair transform; walking geometries is
/// shared by the provided methods.
pub trait Reprojector {
    /// Build a transformation from `from` to `to`
    fn transformer(&self, from: &Crs, to: &Crs) -> Result<Box<dyn CoordTransform>>;

    /// Classify `crs` as geographic or projected, with its linear unit.
    /// A CRS that cannot be classified is a `CrsMismatch`.
    fn crs_kind(&self, crs: &Crs) -> Result<CrsKind>;

    /// Reproject a single geometry. Identical CRS return the geometry unchanged.
    fn reproject(&self, geometry: &Geometry<f64>, from: &Crs, to: &Crs) -> Result<Geometry<f64>> {
        ensure_defined(from, to)?;
        if from == to {
            return Ok(geometry.clone());
        }
        let transform = self.transformer(from, to)?;
        apply(transform.as_ref(), geometry)
    }
}

/// Reprojection backed by PROJ
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjReprojector;

struct ProjTransform {
    proj: Proj,
    from: Crs,
    to: Crs,
}

impl CoordTransform for ProjTransform {
    fn transform(&self, coord: Coord<f64>) -> Result<Coord<f64>> {
        let (x, y) = self
            .proj
            .convert((coord.x, coord.y))
            .map_err(|e| mismatch(&self.from, &self.to, format!("projection failed: {}", e)))?;

        if !x.is_finite() || !y.is_finite() {
            return Err(mismatch(
                &self.from,
                &self.to,
                format!("({}, {}) falls outside the target CRS domain", coord.x, coord.y),
            ));
        }
        Ok(Coord { x, y })
    }
}

impl Reprojector for ProjReprojector {
    fn transformer(&self, from: &Crs, to: &Crs) -> Result<Box<dyn CoordTransform>> {
        let (Some(from_def), Some(to_def)) = (from.proj_definition(), to.proj_definition()) else {
            return Err(mismatch(from, to, "undefined CRS cannot be reprojected"));
        };

        let proj = Proj::new_known_crs(&from_def, &to_def, None).map_err(|e| {
            mismatch(from, to, format!("no transformation available: {}", e))
        })?;

        tracing::debug!(from = %from, to = %to, "Created PROJ transformation");
        Ok(Box::new(ProjTransform { proj, from: from.clone(), to: to.clone() }))
    }

    fn crs_kind(&self, crs: &Crs) -> Result<CrsKind> {
        let unclassified = |reason: String| GeoselectError::CrsMismatch {
            source_crs: crs.to_string(),
            target_crs: crs.to_string(),
            reason,
        };

        let definition = match crs {
            Crs::Undefined => return Err(unclassified("undefined CRS has no coordinate system".into())),
            // Bare PROJ strings describe an operation unless tagged as a CRS
            Crs::Proj(definition) if !definition.contains("+type=crs") => {
                format!("{} +type=crs", definition)
            }
            Crs::Epsg(code) => format!("EPSG:{}", code),
            Crs::Proj(definition) | Crs::Wkt(definition) => definition.clone(),
        };

        let proj = Proj::new(&definition)
            .map_err(|e| unclassified(format!("PROJ does not recognise the CRS: {}", e)))?;
        let projjson = proj
            .to_projjson(Some(false), None, None)
            .map_err(|e| unclassified(format!("cannot describe the CRS: {}", e)))?;
        let document: Value = serde_json::from_str(&projjson)
            .map_err(|e| unclassified(format!("unreadable PROJJSON: {}", e)))?;

        let kind = kind_from_projjson(&document)
            .ok_or_else(|| unclassified("coordinate system has no usable axis unit".into()))?;
        tracing::debug!(crs = %crs, kind = ?kind, "Classified CRS");
        Ok(kind)
    }
}

/// Coordinate system kind of a PROJJSON CRS object, from its first axis unit
fn kind_from_projjson(node: &Value) -> Option<CrsKind> {
    match node.get("type")?.as_str()? {
        "BoundCRS" => kind_from_projjson(node.get("source_crs")?),
        "CompoundCRS" => kind_from_projjson(node.get("components")?.get(0)?),
        _ => {
            let axis = node.get("coordinate_system")?.get("axis")?.get(0)?;
            kind_from_unit(axis.get("unit")?)
        }
    }
}

fn kind_from_unit(unit: &Value) -> Option<CrsKind> {
    match unit {
        Value::String(name) => match name.as_str() {
            "metre" => Some(CrsKind::Projected { meters_per_unit: 1.0 }),
            "degree" | "radian" => Some(CrsKind::Geographic),
            _ => None,
        },
        Value::Object(fields) => match fields.get("type")?.as_str()? {
            "AngularUnit" => Some(CrsKind::Geographic),
            "LinearUnit" => {
                let factor = fields.get("conversion_factor")?.as_f64()?;
                (factor.is_finite() && factor > 0.0).then_some(CrsKind::Projected { meters_per_unit: factor })
            }
            _ => None,
        },
        _ => None,
    }
}

fn mismatch(from: &Crs, to: &Crs, reason: impl Into<String>) -> GeoselectError {
    GeoselectError::CrsMismatch {
        source_crs: from.to_string(),
        target_crs: to.to_string(),
        reason: reason.into(),
    }
}

fn ensure_defined(from: &Crs, to: &Crs) -> Result<()> {
    if !from.is_defined() || !to.is_defined() {
        return Err(mismatch(from, to, "undefined CRS cannot be compared or reprojected"));
    }
    Ok(())
}

fn apply(transform: &dyn CoordTransform, geometry: &Geometry<f64>) -> Result<Geometry<f64>> {
    geometry.try_map_coords(|coord| transform.transform(coord))
}

/// Check if two CRS are the same
pub fn crs_match(a: &Crs, b: &Crs) -> bool {
    a.is_defined() && a == b
}

/// Fail with `CrsMismatch` unless both layers are in the same defined CRS
pub fn check_crs_match(a: &Crs, b: &Crs) -> Result<()> {
    if crs_match(a, b) {
        return Ok(());
    }
    ensure_defined(a, b)?;
    Err(mismatch(a, b, "layers must share a CRS; reproject one of them first"))
}

/// Express `center` in `to`
pub fn reproject_center(center: &Center, to: &Crs, reprojector: &dyn Reprojector) -> Result<Center> {
    let point = reprojector.reproject(&Geometry::Point(center.to_point()), &center.crs, to)?;
    match point {
        Geometry::Point(p) => Ok(Center::new(p.x(), p.y(), to.clone())),
        _ => Err(mismatch(&center.crs, to, "reprojection did not return a point")),
    }
}

/// Reproject every feature of `layer` into `to`.
///
/// The result is a new layer tagged with `to`; features without geometry pass
/// through unchanged. One transformation is built for the whole layer.
pub fn reproject_layer(
    layer: &GeometryLayer,
    to: &Crs,
    reprojector: &dyn Reprojector,
) -> Result<GeometryLayer> {
    ensure_defined(&layer.crs, to)?;
    if &layer.crs == to {
        return Ok(layer.clone());
    }

    let transform = reprojector.transformer(&layer.crs, to)?;
    let features = layer
        .iter()
        .map(|feature| match &feature.geometry {
            Some(geometry) => Ok(feature.with_geometry(Some(apply(transform.as_ref(), geometry)?))),
            None => Ok(feature.clone()),
        })
        .collect::<Result<Vec<_>>>()?;

    tracing::info!(layer = %layer.name, from = %layer.crs, to = %to, features = features.len(), "Reprojected layer");

    Ok(GeometryLayer::new(layer.name.clone(), to.clone(), features))
}
