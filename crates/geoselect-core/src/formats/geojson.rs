//! GeoJSON reader and writer

use ::geojson::{feature::Id, FeatureCollection, GeoJson, JsonObject};
use async_trait::async_trait;
use std::path::Path;
use tokio::io::AsyncWriteExt;

use crate::error::{GeoselectError, Result};
use crate::formats::validation::{check_geojson_document, check_source_file};
use crate::formats::{FormatReader, FormatValidation};
use crate::models::{Attributes, Crs, Feature, FeatureId, GeometryLayer};

/// GeoJSON format reader
pub struct GeoJsonReader;

#[async_trait]
impl FormatReader for GeoJsonReader {
    async fn read(&self, path: &Path) -> Result<GeometryLayer> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| GeoselectError::load(path, format!("cannot read file: {}", e)))?;

        let geojson: GeoJson = content
            .parse()
            .map_err(|e| GeoselectError::load(path, format!("invalid GeoJSON: {}", e)))?;

        let name = layer_name(path);
        parse_layer(geojson, &name).map_err(|e| match e {
            GeoselectError::Serialization(reason) => GeoselectError::load(path, reason),
            other => other,
        })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["geojson", "json"]
    }

    fn format_name(&self) -> &str {
        "GeoJSON"
    }

    async fn validate(&self, path: &Path) -> Result<FormatValidation> {
        let mut validation = check_source_file(path);
        if validation.is_valid() {
            validation.absorb(check_geojson_document(path));
        }
        Ok(validation)
    }
}

/// Build a layer from parsed GeoJSON
pub fn parse_layer(geojson: GeoJson, name: &str) -> Result<GeometryLayer> {
    match geojson {
        GeoJson::FeatureCollection(fc) => {
            let crs = fc
                .foreign_members
                .as_ref()
                .and_then(|members| members.get("crs"))
                .map(crs_from_member)
                .unwrap_or_else(|| default_crs(name));

            let features = fc
                .features
                .into_iter()
                .enumerate()
                .map(|(idx, feature)| convert_feature(feature, idx))
                .collect::<Result<Vec<_>>>()?;

            Ok(GeometryLayer::new(name, crs, features))
        }
        GeoJson::Feature(feature) => {
            Ok(GeometryLayer::new(name, default_crs(name), vec![convert_feature(feature, 0)?]))
        }
        GeoJson::Geometry(geometry) => {
            let geometry = geo::Geometry::<f64>::try_from(geometry)
                .map_err(|e| GeoselectError::Serialization(format!("invalid geometry: {}", e)))?;
            Ok(GeometryLayer::new(
                name,
                default_crs(name),
                vec![Feature::new(0usize, geometry, Attributes::new())],
            ))
        }
    }
}

fn convert_feature(feature: ::geojson::Feature, idx: usize) -> Result<Feature> {
    let id = feature
        .id
        .map(|id| match id {
            Id::String(s) => FeatureId(s),
            Id::Number(n) => FeatureId(n.to_string()),
        })
        .unwrap_or_else(|| FeatureId::from(idx));

    let geometry = feature
        .geometry
        .map(|geometry| {
            geo::Geometry::<f64>::try_from(geometry).map_err(|e| {
                GeoselectError::Serialization(format!("invalid geometry in feature {}: {}", id, e))
            })
        })
        .transpose()?;

    Ok(Feature { id, geometry, properties: feature.properties.unwrap_or_default() })
}

/// RFC 7946 coordinates are WGS 84 when no legacy `crs` member says otherwise
fn default_crs(layer: &str) -> Crs {
    tracing::warn!(layer, "GeoJSON has no crs member, defaulting to EPSG:4326");
    Crs::wgs84()
}

/// Read the legacy `crs` member (`{"type": "name", "properties": {"name": ...}}`)
fn crs_from_member(member: &serde_json::Value) -> Crs {
    let name = member.get("properties").and_then(|p| p.get("name")).and_then(|n| n.as_str());

    match name.map(str::parse::<Crs>) {
        Some(Ok(crs)) => crs,
        Some(Err(e)) => {
            tracing::warn!("Unrecognised GeoJSON crs member, CRS left undefined: {}", e);
            Crs::Undefined
        }
        None => {
            tracing::warn!("GeoJSON crs member without a name, CRS left undefined");
            Crs::Undefined
        }
    }
}

fn layer_name(path: &Path) -> String {
    path.file_stem().and_then(|s| s.to_str()).unwrap_or("unnamed").to_string()
}

/// Convert a layer into a GeoJSON feature collection.
///
/// Layers not in WGS 84 carry a `crs` member so they read back with the
/// same CRS.
pub fn to_feature_collection(layer: &GeometryLayer) -> FeatureCollection {
    let features = layer
        .features
        .iter()
        .map(|feature| ::geojson::Feature {
            bbox: None,
            geometry: feature
                .geometry
                .as_ref()
                .map(|g| ::geojson::Geometry::new(::geojson::Value::from(g))),
            id: Some(Id::String(feature.id.0.clone())),
            properties: Some(feature.properties.clone()),
            foreign_members: None,
        })
        .collect();

    let foreign_members = if layer.crs == Crs::wgs84() {
        None
    } else {
        let name = match &layer.crs {
            Crs::Epsg(code) => format!("urn:ogc:def:crs:EPSG::{}", code),
            other => String::from(other.clone()),
        };
        let mut members = JsonObject::new();
        members.insert(
            "crs".to_string(),
            serde_json::json!({ "type": "name", "properties": { "name": name } }),
        );
        Some(members)
    };

    FeatureCollection { bbox: None, features, foreign_members }
}

/// GeoJSON writer; refuses to replace an existing file unless `overwrite` is set
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoJsonWriter {
    pub overwrite: bool,
}

impl GeoJsonWriter {
    pub fn new(overwrite: bool) -> Self {
        Self { overwrite }
    }

    pub async fn write(&self, layer: &GeometryLayer, path: &Path) -> Result<()> {
        let body = serde_json::to_string_pretty(&to_feature_collection(layer))
            .map_err(|e| GeoselectError::Serialization(e.to_string()))?;

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true);
        if self.overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }

        let mut file = options.open(path).await.map_err(|e| match e.kind() {
            std::io::ErrorKind::AlreadyExists => GeoselectError::FileExists { path: path.to_path_buf() },
            _ => GeoselectError::Io(e),
        })?;
        file.write_all(body.as_bytes()).await?;
        file.flush().await?;

        tracing::info!(path = %path.display(), features = layer.len(), "Wrote GeoJSON layer");
        Ok(())
    }
}
