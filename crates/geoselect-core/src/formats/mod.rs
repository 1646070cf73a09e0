//! Vector format layer
//!
//! Each readable format implements `FormatReader`; the `FormatRegistry` picks a
//! reader by file extension. Paths may also name a directory holding a single
//! layer, the way Shapefile datasets are usually shipped.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::error::{GeoselectError, Result};
use crate::models::GeometryLayer;

pub mod geojson;
pub mod shapefile;
pub mod table;
pub mod validation;

/// Format reader trait that all format implementations must implement
#[async_trait]
pub trait FormatReader: Send + Sync {
    /// Read a layer from the given file
    async fn read(&self, path: &Path) -> Result<GeometryLayer>;

    /// Supported file extensions (e.g., ["shp"])
    fn supported_extensions(&self) -> &[&str];

    /// Human-readable format name (e.g., "Shapefile")
    fn format_name(&self) -> &str;

    /// Validate file structure without a full read
    async fn validate(&self, _path: &Path) -> Result<FormatValidation> {
        Ok(FormatValidation::default())
    }
}

/// Result of format validation
#[derive(Debug, Clone, Default)]
pub struct FormatValidation {
    /// Problems that prevent reading
    pub errors: Vec<String>,

    /// Issues that don't prevent reading
    pub warnings: Vec<String>,
}

impl FormatValidation {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Central registry for format readers
pub struct FormatRegistry {
    readers: Vec<Box<dyn FormatReader>>,
}

impl FormatRegistry {
    /// Create a new empty format registry
    pub fn new() -> Self {
        Self { readers: Vec::new() }
    }

    /// Registry with the GeoJSON and Shapefile readers
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(geojson::GeoJsonReader));
        registry.register(Box::new(shapefile::ShapefileFormatReader));
        registry
    }

    pub fn register(&mut self, reader: Box<dyn FormatReader>) {
        self.readers.push(reader);
    }

    /// Detect format and return the reader for this file extension
    pub fn detect_format(&self, path: &Path) -> Result<&dyn FormatReader> {
        let extension = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            GeoselectError::UnsupportedFormat {
                extension: "none".to_string(),
                supported: self.supported_formats(),
            }
        })?;

        self.readers
            .iter()
            .find(|r| r.supported_extensions().iter().any(|e| e.eq_ignore_ascii_case(extension)))
            .map(|r| r.as_ref())
            .ok_or_else(|| GeoselectError::UnsupportedFormat {
                extension: extension.to_string(),
                supported: self.supported_formats(),
            })
    }

    /// List of all supported format extensions
    pub fn supported_formats(&self) -> Vec<String> {
        self.readers
            .iter()
            .flat_map(|r| r.supported_extensions())
            .map(|s| s.to_string())
            .collect()
    }

    pub fn readers(&self) -> &[Box<dyn FormatReader>] {
        &self.readers
    }

    /// Resolve a file or directory (plus optional layer name) to a readable file.
    ///
    /// A directory resolves to `<dir>/<layer>.<ext>` when `layer` is given,
    /// otherwise to the only supported file it contains.
    pub fn resolve_source(&self, path: &Path, layer: Option<&str>) -> Result<PathBuf> {
        if !path.exists() {
            return Err(GeoselectError::load(path, "no such file or directory"));
        }

        if !path.is_dir() {
            return Ok(path.to_path_buf());
        }

        let extensions = self.supported_formats();

        if let Some(layer) = layer {
            return extensions
                .iter()
                .map(|ext| path.join(format!("{}.{}", layer, ext)))
                .find(|candidate| candidate.is_file())
                .ok_or_else(|| {
                    GeoselectError::load(path, format!("layer '{}' not found in directory", layer))
                });
        }

        let mut candidates: Vec<PathBuf> = std::fs::read_dir(path)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.is_file()
                    && p.extension()
                        .and_then(|e| e.to_str())
                        .map(|e| extensions.iter().any(|s| s.eq_ignore_ascii_case(e)))
                        .unwrap_or(false)
            })
            .collect();
        candidates.sort();

        match candidates.len() {
            1 => Ok(candidates.remove(0)),
            0 => Err(GeoselectError::load(path, "directory holds no supported vector file")),
            n => Err(GeoselectError::load(
                path,
                format!("directory holds {} vector files; name the layer to read", n),
            )),
        }
    }

    /// Resolve, validate and read a layer
    pub async fn read_layer(&self, path: &Path, layer: Option<&str>) -> Result<GeometryLayer> {
        let source = self.resolve_source(path, layer)?;
        let reader = self.detect_format(&source)?;

        let validation = reader.validate(&source).await?;
        for warning in &validation.warnings {
            tracing::warn!(path = %source.display(), "{}", warning);
        }
        if !validation.is_valid() {
            return Err(GeoselectError::load(&source, validation.errors.join("; ")));
        }

        let layer = reader.read(&source).await?;
        tracing::info!(
            path = %source.display(),
            format = reader.format_name(),
            features = layer.len(),
            crs = %layer.crs,
            "Loaded layer"
        );
        Ok(layer)
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
