use geoselect_core::config::ConfigSource;
use geoselect_core::models::{Distance, GeometryType};
use serde::Serialize;
use tabled::Tabled;

/// Output for select command
#[derive(Debug, Serialize)]
pub struct SelectOutput {
    pub layer: String,
    pub crs: String,
    /// CRS the buffer test ran in
    pub frame_crs: String,
    /// Center expressed in the frame CRS
    pub center: [f64; 2],
    /// Radius as given
    pub radius: Distance,
    /// Radius in the frame CRS linear unit
    pub frame_radius: f64,
    pub selected: usize,
    pub total: usize,
    pub feature_ids: Vec<String>,
    pub output: Option<String>,
    pub buffer_output: Option<String>,
}

/// Output for reproject command
#[derive(Debug, Serialize)]
pub struct ReprojectOutput {
    pub layer: String,
    pub from: String,
    pub to: String,
    pub feature_count: usize,
    pub output: String,
}

/// Output for join command
#[derive(Debug, Serialize)]
pub struct JoinOutput {
    pub layer: String,
    pub left_key: String,
    pub right_key: String,
    pub mode: String,
    pub matched: usize,
    pub unmatched: usize,
    pub feature_count: usize,
    pub output: String,
}

/// Output for aggregate command
#[derive(Debug, Serialize)]
pub struct AggregateOutput {
    pub polygons: String,
    pub points: String,
    pub count_column: String,
    pub polygon_count: usize,
    pub point_count: usize,
    pub output: String,
}

/// Output for inspect command
#[derive(Debug, Serialize)]
pub struct InspectOutput {
    pub name: String,
    pub crs: String,
    pub crs_defined: bool,
    /// `None` when PROJ cannot classify the CRS
    pub geographic: Option<bool>,
    /// Metres per axis unit of a projected CRS
    pub meters_per_unit: Option<f64>,
    pub feature_count: usize,
    pub null_geometries: usize,
    pub geometry_types: Vec<GeometryType>,
    pub attributes: Vec<String>,
}

/// One row of the config command
#[derive(Debug, Serialize, Tabled)]
pub struct ConfigEntry {
    #[tabled(rename = "Setting")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source")]
    pub source: String,
}

impl ConfigEntry {
    pub fn new(key: String, value: String, source: ConfigSource) -> Self {
        Self { key, value, source: format!("{:?}", source).to_lowercase() }
    }
}
