//! Shapefile format reader
//!
//! A Shapefile is a set of sibling files (.shp, .shx, .dbf, optional .prj).
//! Geometry comes from .shp, attributes from .dbf and the CRS from .prj.

use ::shapefile::dbase::{FieldValue, Record};
use ::shapefile::{PolygonRing, Shape};
use async_trait::async_trait;
use geo::{Coord, Geometry, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use std::path::{Path, PathBuf};

use crate::error::{GeoselectError, Result};
use crate::formats::validation::{check_sidecars, check_source_file};
use crate::formats::{FormatReader, FormatValidation};
use crate::models::{Attributes, Crs, Feature, FeatureId, GeometryLayer};

const REQUIRED_COMPONENTS: [&str; 3] = ["shp", "shx", "dbf"];

/// Shapefile format reader
pub struct ShapefileFormatReader;

#[async_trait]
impl FormatReader for ShapefileFormatReader {
    async fn read(&self, path: &Path) -> Result<GeometryLayer> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || read_shapefile(&path))
            .await
            .map_err(|e| GeoselectError::Serialization(format!("Shapefile reader task failed: {}", e)))?
    }

    fn supported_extensions(&self) -> &[&str] {
        &["shp"]
    }

    fn format_name(&self) -> &str {
        "Shapefile"
    }

    async fn validate(&self, path: &Path) -> Result<FormatValidation> {
        let mut validation = check_source_file(path);
        if !validation.is_valid() {
            return Ok(validation);
        }

        let base = match shapefile_base(path) {
            Ok(base) => base,
            Err(e) => {
                validation.errors.push(e.to_string());
                return Ok(validation);
            }
        };

        validation.absorb(check_sidecars(&base, &REQUIRED_COMPONENTS, &["prj"]));
        Ok(validation)
    }
}

fn read_shapefile(path: &Path) -> Result<GeometryLayer> {
    verify_components(path)?;

    let mut reader = ::shapefile::Reader::from_path(path)
        .map_err(|e| GeoselectError::load(path, format!("failed to open Shapefile: {}", e)))?;

    let crs = read_crs(path)?;

    let mut features = Vec::new();
    for (idx, result) in reader.iter_shapes_and_records().enumerate() {
        let (shape, record) = result
            .map_err(|e| GeoselectError::load(path, format!("failed to read record {}: {}", idx, e)))?;

        let geometry = shape_to_geometry(shape)
            .map_err(|reason| GeoselectError::load(path, format!("record {}: {}", idx, reason)))?;

        features.push(Feature { id: FeatureId::from(idx), geometry, properties: record_to_attributes(record) });
    }

    let name = path.file_stem().and_then(|s| s.to_str()).unwrap_or("unnamed").to_string();
    Ok(GeometryLayer::new(name, crs, features))
}

/// Base path (no extension) shared by the component files
fn shapefile_base(path: &Path) -> Result<PathBuf> {
    let is_shp = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("shp"))
        .unwrap_or(false);

    if !is_shp {
        return Err(GeoselectError::load(path, "not a Shapefile (.shp)"));
    }

    Ok(path.with_extension(""))
}

fn verify_components(path: &Path) -> Result<()> {
    let base = shapefile_base(path)?;
    let missing: Vec<String> = REQUIRED_COMPONENTS
        .iter()
        .filter(|ext| !base.with_extension(ext).exists())
        .map(|ext| format!(".{}", ext))
        .collect();

    if !missing.is_empty() {
        return Err(GeoselectError::load(
            path,
            format!("missing required component files: {}", missing.join(", ")),
        ));
    }

    Ok(())
}

/// CRS from the .prj sidecar; undefined when there is none
fn read_crs(path: &Path) -> Result<Crs> {
    let prj_path = shapefile_base(path)?.with_extension("prj");

    if !prj_path.exists() {
        tracing::warn!(path = %path.display(), "No .prj file, CRS is undefined");
        return Ok(Crs::Undefined);
    }

    let content = std::fs::read_to_string(&prj_path)
        .map_err(|e| GeoselectError::load(&prj_path, format!("failed to read .prj: {}", e)))?;

    Ok(crs_from_prj(&content))
}

/// EPSG code of the outermost CRS in a WKT1 definition, else the WKT itself.
///
/// Only an AUTHORITY that is a direct child of the outer PROJCS/GEOGCS node
/// names the layer CRS. Nested GEOGCS, DATUM and UNIT nodes carry their own
/// codes, so a custom projection keeps its WKT for PROJ to interpret.
pub fn crs_from_prj(wkt: &str) -> Crs {
    let text = wkt.trim();
    if text.is_empty() {
        return Crs::Undefined;
    }
    match outer_epsg_code(text) {
        Some(code) => Crs::Epsg(code),
        None => Crs::Wkt(text.to_string()),
    }
}

fn outer_epsg_code(wkt: &str) -> Option<u32> {
    let open = wkt.find(['[', '('])?;
    let keyword = wkt[..open].trim();
    if !keyword.eq_ignore_ascii_case("PROJCS") && !keyword.eq_ignore_ascii_case("GEOGCS") {
        return None;
    }

    let mut depth = 0usize;
    let mut quoted = false;
    for (pos, ch) in wkt.char_indices() {
        match ch {
            '"' => quoted = !quoted,
            _ if quoted => {}
            '[' | '(' => depth += 1,
            ']' | ')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return None;
                }
            }
            'A' | 'a' if depth == 1 => {
                if let Some(code) = authority_code(&wkt[pos..]) {
                    return Some(code);
                }
            }
            _ => {}
        }
    }
    None
}

/// Code of an `AUTHORITY["EPSG","<code>"]` node at the start of `node`
fn authority_code(node: &str) -> Option<u32> {
    const KEYWORD: &str = "AUTHORITY";

    let head = node.get(..KEYWORD.len())?;
    if !head.eq_ignore_ascii_case(KEYWORD) {
        return None;
    }
    let body = node[KEYWORD.len()..].trim_start().strip_prefix(['[', '('])?;

    let mut parts = body.split([',', ']', ')']);
    let authority = parts.next()?.trim().trim_matches('"');
    let code = parts.next()?.trim().trim_matches('"');
    if !authority.eq_ignore_ascii_case("EPSG") {
        return None;
    }
    code.parse().ok()
}

fn coords<'a, P: 'a>(points: impl IntoIterator<Item = &'a P>, xy: impl Fn(&P) -> (f64, f64)) -> Vec<Coord<f64>> {
    points.into_iter().map(|p| xy(p)).map(|(x, y)| Coord { x, y }).collect()
}

fn lines<P>(parts: &[Vec<P>], xy: impl Fn(&P) -> (f64, f64) + Copy) -> Geometry<f64> {
    let mut lines: Vec<LineString<f64>> =
        parts.iter().map(|part| LineString::new(coords(part, xy))).collect();

    if lines.len() == 1 {
        Geometry::LineString(lines.remove(0))
    } else {
        Geometry::MultiLineString(MultiLineString::new(lines))
    }
}

/// Outer rings start a new polygon; inner rings are holes of the latest one
fn polygons<P>(rings: &[PolygonRing<P>], xy: impl Fn(&P) -> (f64, f64) + Copy) -> Geometry<f64> {
    let mut shells: Vec<(LineString<f64>, Vec<LineString<f64>>)> = Vec::new();

    for ring in rings {
        let line = LineString::new(coords(ring.points(), xy));
        match (ring, shells.last_mut()) {
            (PolygonRing::Inner(_), Some((_, holes))) => holes.push(line),
            _ => shells.push((line, Vec::new())),
        }
    }

    let mut polygons: Vec<Polygon<f64>> =
        shells.into_iter().map(|(exterior, holes)| Polygon::new(exterior, holes)).collect();

    if polygons.len() == 1 {
        Geometry::Polygon(polygons.remove(0))
    } else {
        Geometry::MultiPolygon(MultiPolygon::new(polygons))
    }
}

fn points<P>(points: &[P], xy: impl Fn(&P) -> (f64, f64)) -> Geometry<f64> {
    Geometry::MultiPoint(MultiPoint::new(
        points.iter().map(|p| xy(p)).map(|(x, y)| Point::new(x, y)).collect(),
    ))
}

/// Convert a shape to a 2D geometry; M and Z values are dropped
fn shape_to_geometry(shape: Shape) -> std::result::Result<Option<Geometry<f64>>, String> {
    let geometry = match shape {
        Shape::NullShape => return Ok(None),
        Shape::Point(p) => Geometry::Point(Point::new(p.x, p.y)),
        Shape::PointM(p) => Geometry::Point(Point::new(p.x, p.y)),
        Shape::PointZ(p) => Geometry::Point(Point::new(p.x, p.y)),
        Shape::Polyline(line) => lines(line.parts(), |p| (p.x, p.y)),
        Shape::PolylineM(line) => lines(line.parts(), |p| (p.x, p.y)),
        Shape::PolylineZ(line) => lines(line.parts(), |p| (p.x, p.y)),
        Shape::Polygon(polygon) => polygons(polygon.rings(), |p| (p.x, p.y)),
        Shape::PolygonM(polygon) => polygons(polygon.rings(), |p| (p.x, p.y)),
        Shape::PolygonZ(polygon) => polygons(polygon.rings(), |p| (p.x, p.y)),
        Shape::Multipoint(multi) => points(multi.points(), |p| (p.x, p.y)),
        Shape::MultipointM(multi) => points(multi.points(), |p| (p.x, p.y)),
        Shape::MultipointZ(multi) => points(multi.points(), |p| (p.x, p.y)),
        Shape::Multipatch(_) => return Err("Multipatch geometry is not supported".to_string()),
    };
    Ok(Some(geometry))
}

/// DBF record to attributes, sorted by field name
fn record_to_attributes(record: Record) -> Attributes {
    let mut fields: Vec<(String, FieldValue)> = record.into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));

    fields.into_iter().map(|(name, value)| (name.trim().to_string(), field_to_json(value))).collect()
}

fn number(value: f64) -> serde_json::Value {
    serde_json::Number::from_f64(value)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

#[allow(unreachable_patterns)]
fn field_to_json(value: FieldValue) -> serde_json::Value {
    use serde_json::Value;

    match value {
        FieldValue::Character(Some(s)) => Value::String(s.trim_end().to_string()),
        FieldValue::Numeric(Some(n)) => number(n),
        FieldValue::Logical(Some(b)) => Value::Bool(b),
        FieldValue::Date(Some(date)) => {
            Value::String(format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day()))
        }
        FieldValue::Float(Some(f)) => number(f as f64),
        FieldValue::Integer(i) => Value::Number(i.into()),
        FieldValue::Currency(c) => number(c),
        FieldValue::Double(d) => number(d),
        FieldValue::Memo(s) => Value::String(s),
        FieldValue::DateTime(dt) => Value::String(format!(
            "{:04}-{:02}-{:02}",
            dt.date().year(),
            dt.date().month(),
            dt.date().day()
        )),
        _ => Value::Null,
    }
}
