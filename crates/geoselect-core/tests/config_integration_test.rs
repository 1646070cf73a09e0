//! Integration tests for layered configuration
//!
//! Precedence: CLI arguments > environment variables > config file > defaults

use geoselect_core::config::{CliConfigOverrides, ConfigSource, LayeredConfig};
use geoselect_core::models::{Crs, DistanceUnit};
use serial_test::serial;
use std::env;
use std::io::Write;
use tempfile::NamedTempFile;

const ENV_VARS: [&str; 5] = [
    "GEOSELECT_CENTER_CRS",
    "GEOSELECT_WORKING_CRS",
    "GEOSELECT_DISTANCE_UNIT",
    "GEOSELECT_BUFFER_SEGMENTS",
    "GEOSELECT_OVERWRITE",
];

fn clear_env() {
    for var in ENV_VARS {
        env::remove_var(var);
    }
}

fn config_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", content).unwrap();
    file
}

#[test]
fn test_partial_file_configuration() {
    let file = config_file(r#"working_crs = "EPSG:32618""#);

    let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap();

    assert_eq!(config.working_crs.value, Some(Crs::utm_north(18)));
    assert_eq!(config.working_crs.source, ConfigSource::File);
    assert_eq!(config.distance_unit.value, DistanceUnit::Meters);
    assert_eq!(config.distance_unit.source, ConfigSource::Default);
}

#[test]
fn test_invalid_file_is_rejected() {
    let file = config_file("center_crs = \"somewhere\"");
    assert!(LayeredConfig::with_defaults().load_from_file(file.path()).is_err());

    let file = config_file("this is not toml");
    assert!(LayeredConfig::with_defaults().load_from_file(file.path()).is_err());

    assert!(LayeredConfig::with_defaults().load_from_file("/nonexistent/geoselect.toml").is_err());
}

#[test]
#[serial]
fn test_environment_overrides_file() {
    clear_env();
    env::set_var("GEOSELECT_WORKING_CRS", "EPSG:32129");
    env::set_var("GEOSELECT_DISTANCE_UNIT", "miles");
    env::set_var("GEOSELECT_OVERWRITE", "true");

    let file = config_file(
        r#"
working_crs = "EPSG:32618"
distance_unit = "kilometers"
overwrite = false
"#,
    );

    let config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap().load_from_env();

    assert_eq!(config.working_crs.value, Some(Crs::Epsg(32129)));
    assert_eq!(config.working_crs.source, ConfigSource::Environment);
    assert_eq!(config.distance_unit.value, DistanceUnit::Miles);
    assert!(config.overwrite.value);
    assert_eq!(config.overwrite.source, ConfigSource::Environment);

    clear_env();
}

#[test]
#[serial]
fn test_invalid_environment_values_are_ignored() {
    clear_env();
    env::set_var("GEOSELECT_BUFFER_SEGMENTS", "3");
    env::set_var("GEOSELECT_DISTANCE_UNIT", "cubits");
    env::set_var("GEOSELECT_OVERWRITE", "perhaps");

    let config = LayeredConfig::with_defaults().load_from_env();

    assert_eq!(config.buffer_segments.value, 64);
    assert_eq!(config.buffer_segments.source, ConfigSource::Default);
    assert_eq!(config.distance_unit.source, ConfigSource::Default);
    assert_eq!(config.overwrite.source, ConfigSource::Default);

    clear_env();
}

#[test]
#[serial]
fn test_configuration_precedence_order() {
    clear_env();
    env::set_var("GEOSELECT_CENTER_CRS", "EPSG:4269");

    let file = config_file(r#"center_crs = "EPSG:4258""#);

    let mut config = LayeredConfig::with_defaults().load_from_file(file.path()).unwrap().load_from_env();

    assert_eq!(config.center_crs.value, Crs::Epsg(4269));
    assert_eq!(config.center_crs.source, ConfigSource::Environment);

    config.update_from_cli(CliConfigOverrides { center_crs: Some(Crs::wgs84()), ..Default::default() });

    assert_eq!(config.center_crs.value, Crs::wgs84());
    assert_eq!(config.center_crs.source, ConfigSource::Cli);

    assert!(ConfigSource::Cli.precedence() > ConfigSource::Environment.precedence());
    assert!(ConfigSource::Environment.precedence() > ConfigSource::File.precedence());
    assert!(ConfigSource::File.precedence() > ConfigSource::Default.precedence());

    clear_env();
}
