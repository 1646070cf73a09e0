use crate::error::{GeoselectError, Result};
use crate::models::{Crs, DistanceUnit};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

/// Smallest polygon that still reads as a buffer ring
pub const MIN_BUFFER_SEGMENTS: usize = 4;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    Default,
    File,
    Environment,
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration: defaults < file < environment < CLI
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    /// CRS assumed for center coordinates given without one
    pub center_crs: ConfigValue<Crs>,
    /// Optional projected CRS layers are moved into before selection
    pub working_crs: ConfigValue<Option<Crs>>,
    pub distance_unit: ConfigValue<DistanceUnit>,
    /// Vertex count of the buffer polygon written alongside selections
    pub buffer_segments: ConfigValue<usize>,
    pub overwrite: ConfigValue<bool>,
}

impl Default for LayeredConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl LayeredConfig {
    pub fn with_defaults() -> Self {
        Self {
            center_crs: ConfigValue::new(Crs::wgs84(), ConfigSource::Default),
            working_crs: ConfigValue::new(None, ConfigSource::Default),
            distance_unit: ConfigValue::new(DistanceUnit::Meters, ConfigSource::Default),
            buffer_segments: ConfigValue::new(64, ConfigSource::Default),
            overwrite: ConfigValue::new(false, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| GeoselectError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file {}: {}", path.as_ref().display(), e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| GeoselectError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(crs) = file_config.center_crs {
            self.center_crs.update(crs, ConfigSource::File);
        }

        if let Some(crs) = file_config.working_crs {
            self.working_crs.update(Some(crs), ConfigSource::File);
        }

        if let Some(unit) = file_config.distance_unit {
            self.distance_unit.update(parse_distance_unit(&unit)?, ConfigSource::File);
        }

        if let Some(segments) = file_config.buffer_segments {
            self.buffer_segments.update(parse_buffer_segments(segments)?, ConfigSource::File);
        }

        if let Some(overwrite) = file_config.overwrite {
            self.overwrite.update(overwrite, ConfigSource::File);
        }

        tracing::debug!(path = %path.as_ref().display(), "Loaded configuration file");
        Ok(self)
    }

    /// Load configuration from environment variables.
    ///
    /// Invalid values are logged and ignored.
    pub fn load_from_env(mut self) -> Self {
        if let Ok(value) = env::var("GEOSELECT_CENTER_CRS") {
            match value.parse::<Crs>() {
                Ok(crs) => self.center_crs.update(crs, ConfigSource::Environment),
                Err(e) => tracing::warn!("Ignoring GEOSELECT_CENTER_CRS: {}", e),
            }
        }

        if let Ok(value) = env::var("GEOSELECT_WORKING_CRS") {
            match value.parse::<Crs>() {
                Ok(crs) => self.working_crs.update(Some(crs), ConfigSource::Environment),
                Err(e) => tracing::warn!("Ignoring GEOSELECT_WORKING_CRS: {}", e),
            }
        }

        if let Ok(value) = env::var("GEOSELECT_DISTANCE_UNIT") {
            match parse_distance_unit(&value) {
                Ok(unit) => self.distance_unit.update(unit, ConfigSource::Environment),
                Err(e) => tracing::warn!("Ignoring GEOSELECT_DISTANCE_UNIT: {}", e),
            }
        }

        if let Ok(value) = env::var("GEOSELECT_BUFFER_SEGMENTS") {
            match value.trim().parse::<usize>().map_err(|e| e.to_string()).and_then(|n| {
                parse_buffer_segments(n).map_err(|e| e.to_string())
            }) {
                Ok(segments) => self.buffer_segments.update(segments, ConfigSource::Environment),
                Err(e) => tracing::warn!("Ignoring GEOSELECT_BUFFER_SEGMENTS '{}': {}", value, e),
            }
        }

        if let Ok(value) = env::var("GEOSELECT_OVERWRITE") {
            match parse_bool(&value) {
                Some(overwrite) => self.overwrite.update(overwrite, ConfigSource::Environment),
                None => tracing::warn!(
                    "Ignoring GEOSELECT_OVERWRITE '{}': expected true or false",
                    value
                ),
            }
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(crs) = overrides.center_crs {
            self.center_crs.update(crs, ConfigSource::Cli);
        }

        if let Some(crs) = overrides.working_crs {
            self.working_crs.update(Some(crs), ConfigSource::Cli);
        }

        if let Some(unit) = overrides.distance_unit {
            self.distance_unit.update(unit, ConfigSource::Cli);
        }

        if let Some(segments) = overrides.buffer_segments {
            self.buffer_segments.update(segments, ConfigSource::Cli);
        }

        if let Some(overwrite) = overrides.overwrite {
            self.overwrite.update(overwrite, ConfigSource::Cli);
        }
    }

    /// All configuration values with their sources, for display
    pub fn to_inspection_map(&self) -> BTreeMap<String, (String, ConfigSource)> {
        let mut map = BTreeMap::new();

        map.insert(
            "center_crs".to_string(),
            (self.center_crs.value.to_string(), self.center_crs.source),
        );
        map.insert(
            "working_crs".to_string(),
            (
                self.working_crs
                    .value
                    .as_ref()
                    .map(|crs| crs.to_string())
                    .unwrap_or_else(|| "(reference layer CRS)".to_string()),
                self.working_crs.source,
            ),
        );
        map.insert(
            "distance_unit".to_string(),
            (format!("{:?}", self.distance_unit.value), self.distance_unit.source),
        );
        map.insert(
            "buffer_segments".to_string(),
            (self.buffer_segments.value.to_string(), self.buffer_segments.source),
        );
        map.insert(
            "overwrite".to_string(),
            (self.overwrite.value.to_string(), self.overwrite.source),
        );

        map
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    center_crs: Option<Crs>,
    working_crs: Option<Crs>,
    distance_unit: Option<String>,
    buffer_segments: Option<usize>,
    overwrite: Option<bool>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub center_crs: Option<Crs>,
    pub working_crs: Option<Crs>,
    pub distance_unit: Option<DistanceUnit>,
    pub buffer_segments: Option<usize>,
    pub overwrite: Option<bool>,
}

/// Parse distance unit from string
pub fn parse_distance_unit(s: &str) -> Result<DistanceUnit> {
    match s.trim().to_lowercase().as_str() {
        "meters" | "meter" | "m" => Ok(DistanceUnit::Meters),
        "kilometers" | "kilometer" | "km" => Ok(DistanceUnit::Kilometers),
        "miles" | "mile" | "mi" => Ok(DistanceUnit::Miles),
        "feet" | "foot" | "ft" => Ok(DistanceUnit::Feet),
        _ => Err(GeoselectError::ConfigInvalid {
            key: "distance_unit".to_string(),
            reason: format!("Invalid distance unit: {}. Use meters, kilometers, miles, or feet", s),
        }),
    }
}

fn parse_buffer_segments(segments: usize) -> Result<usize> {
    if segments < MIN_BUFFER_SEGMENTS {
        return Err(GeoselectError::ConfigInvalid {
            key: "buffer_segments".to_string(),
            reason: format!("{} is below the minimum of {}", segments, MIN_BUFFER_SEGMENTS),
        });
    }
    Ok(segments)
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = LayeredConfig::with_defaults();
        assert_eq!(config.center_crs.value, Crs::wgs84());
        assert_eq!(config.center_crs.source, ConfigSource::Default);
        assert_eq!(config.working_crs.value, None);
        assert_eq!(config.distance_unit.value, DistanceUnit::Meters);
        assert_eq!(config.buffer_segments.value, 64);
        assert!(!config.overwrite.value);
    }

    #[test]
    fn test_config_precedence() {
        let mut value = ConfigValue::new(100, ConfigSource::Default);

        value.update(200, ConfigSource::File);
        assert_eq!(value.value, 200);
        assert_eq!(value.source, ConfigSource::File);

        value.update(300, ConfigSource::Environment);
        assert_eq!(value.value, 300);

        value.update(400, ConfigSource::Cli);
        assert_eq!(value.value, 400);
        assert_eq!(value.source, ConfigSource::Cli);

        // Lower precedence should not override
        value.update(500, ConfigSource::File);
        assert_eq!(value.value, 400);
        assert_eq!(value.source, ConfigSource::Cli);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
center_crs = "EPSG:4269"
working_crs = "EPSG:32618"
distance_unit = "km"
buffer_segments = 128
overwrite = true
"#
        )
        .unwrap();

        let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

        assert_eq!(config.center_crs.value, Crs::Epsg(4269));
        assert_eq!(config.center_crs.source, ConfigSource::File);
        assert_eq!(config.working_crs.value, Some(Crs::utm_north(18)));
        assert_eq!(config.distance_unit.value, DistanceUnit::Kilometers);
        assert_eq!(config.buffer_segments.value, 128);
        assert!(config.overwrite.value);
    }

    #[test]
    fn test_file_rejects_tiny_buffer() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "buffer_segments = 2").unwrap();

        let result = LayeredConfig::with_defaults().load_from_file(file.path());
        assert!(matches!(result, Err(GeoselectError::ConfigInvalid { ref key, .. }) if key == "buffer_segments"));
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = LayeredConfig::with_defaults();

        config.update_from_cli(CliConfigOverrides {
            working_crs: Some(Crs::Epsg(2272)),
            distance_unit: Some(DistanceUnit::Feet),
            ..Default::default()
        });

        assert_eq!(config.working_crs.value, Some(Crs::Epsg(2272)));
        assert_eq!(config.working_crs.source, ConfigSource::Cli);
        assert_eq!(config.distance_unit.value, DistanceUnit::Feet);
        assert_eq!(config.center_crs.source, ConfigSource::Default);
        assert_eq!(config.overwrite.source, ConfigSource::Default);
    }

    #[test]
    fn test_parse_distance_unit() {
        assert_eq!(parse_distance_unit("meters").unwrap(), DistanceUnit::Meters);
        assert_eq!(parse_distance_unit("m").unwrap(), DistanceUnit::Meters);
        assert_eq!(parse_distance_unit("KM").unwrap(), DistanceUnit::Kilometers);
        assert_eq!(parse_distance_unit("mi").unwrap(), DistanceUnit::Miles);
        assert!(parse_distance_unit("furlongs").is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("yes"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_inspection_map() {
        let config = LayeredConfig::with_defaults();
        let map = config.to_inspection_map();

        let (crs_value, crs_source) = &map["center_crs"];
        assert_eq!(crs_value, "EPSG:4326");
        assert_eq!(*crs_source, ConfigSource::Default);
        assert_eq!(map["working_crs"].0, "(reference layer CRS)");
        assert_eq!(map.len(), 5);
    }
}
