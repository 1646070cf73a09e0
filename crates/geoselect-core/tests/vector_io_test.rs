//! Integration tests for loading and persisting layers through the registry

use geoselect_core::formats::geojson::GeoJsonWriter;
use geoselect_core::formats::FormatRegistry;
use geoselect_core::join::{join_attributes, JoinMode};
use geoselect_core::formats::table::read_record_table;
use geoselect_core::models::{Crs, GeometryType};
use geoselect_core::GeoselectError;
use geo::{Area, BoundingRect, Geometry};
use shapefile::dbase::{FieldValue, Record, TableWriterBuilder};
use shapefile::{Point, Polygon, PolygonRing, ShapeWriter};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const TRACTS: &str = r#"{
    "type": "FeatureCollection",
    "crs": { "type": "name", "properties": { "name": "EPSG:32618" } },
    "features": [
        {
            "type": "Feature",
            "geometry": { "type": "Polygon", "coordinates": [[[0, 0], [100, 0], [100, 100], [0, 100], [0, 0]]] },
            "properties": { "GEOID": "42101000100" }
        },
        {
            "type": "Feature",
            "geometry": { "type": "Polygon", "coordinates": [[[100, 0], [200, 0], [200, 100], [100, 100], [100, 0]]] },
            "properties": { "GEOID": "42101000200" }
        }
    ]
}"#;

#[tokio::test]
async fn test_read_layer_from_directory() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("tracts.geojson"), TRACTS).unwrap();

    let layer = FormatRegistry::with_defaults().read_layer(dir.path(), None).await.unwrap();

    assert_eq!(layer.name, "tracts");
    assert_eq!(layer.crs, Crs::utm_north(18));
    assert_eq!(layer.len(), 2);
    assert_eq!(layer.geometry_types(), vec![GeometryType::Polygon]);
    assert_eq!(layer.attribute_names(), vec!["GEOID".to_string()]);
}

#[tokio::test]
async fn test_read_layer_missing_source() {
    let dir = TempDir::new().unwrap();
    let result = FormatRegistry::with_defaults().read_layer(&dir.path().join("nope.geojson"), None).await;
    assert!(matches!(result, Err(GeoselectError::Load { .. })));
}

#[tokio::test]
async fn test_read_layer_invalid_json_reports_load_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.geojson");
    fs::write(&path, "{ broken").unwrap();

    let result = FormatRegistry::with_defaults().read_layer(&path, None).await;
    assert!(matches!(result, Err(GeoselectError::Load { .. })));
}

#[tokio::test]
async fn test_join_then_write_and_reload() {
    let dir = TempDir::new().unwrap();
    let tracts_path = dir.path().join("tracts.geojson");
    let table_path = dir.path().join("income.json");
    let out_path = dir.path().join("joined.geojson");
    fs::write(&tracts_path, TRACTS).unwrap();
    fs::write(&table_path, r#"[{"GEOID": "42101000200", "income": 48000}]"#).unwrap();

    let registry = FormatRegistry::with_defaults();
    let tracts = registry.read_layer(&tracts_path, None).await.unwrap();
    let table = read_record_table(&table_path).await.unwrap();

    let (joined, summary) = join_attributes(&tracts, &table, "GEOID", "GEOID", JoinMode::Inner).unwrap();
    assert_eq!(summary.matched, 1);

    GeoJsonWriter::new(false).write(&joined, &out_path).await.unwrap();
    let second = GeoJsonWriter::new(false).write(&joined, &out_path).await;
    assert!(matches!(second, Err(GeoselectError::FileExists { .. })));

    let reloaded = registry.read_layer(&out_path, None).await.unwrap();
    assert_eq!(reloaded.crs, Crs::utm_north(18));
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded.features[0].property("income"), Some(&serde_json::json!(48000)));
}

const UTM_18N_PRJ: &str = r#"PROJCS["WGS_1984_UTM_Zone_18N",GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]],PROJECTION["Transverse_Mercator"],PARAMETER["Central_Meridian",-75.0],PARAMETER["Scale_Factor",0.9996],UNIT["Meter",1.0,AUTHORITY["EPSG","9001"]],AUTHORITY["EPSG","32618"]]"#;

/// Clockwise outer ring of a square parcel
fn square(x: f64, y: f64, size: f64) -> Polygon {
    Polygon::new(PolygonRing::Outer(vec![
        Point::new(x, y),
        Point::new(x, y + size),
        Point::new(x + size, y + size),
        Point::new(x + size, y),
        Point::new(x, y),
    ]))
}

fn parcel_record(name: &str, units: Option<f64>) -> Record {
    let mut record = Record::default();
    record.insert("NAME".to_string(), FieldValue::Character(Some(name.to_string())));
    record.insert("UNITS".to_string(), FieldValue::Numeric(units));
    record
}

/// Appends a null-shape record to the .shp and its .shx index entry,
/// patching both headers' file lengths (counted in 16-bit words)
fn append_null_shape(base: &Path) {
    let shp_path = base.with_extension("shp");
    let shx_path = base.with_extension("shx");
    let mut shp = fs::read(&shp_path).unwrap();
    let mut shx = fs::read(&shx_path).unwrap();

    let offset_words = (shp.len() / 2) as i32;
    let record_number = ((shx.len() - 100) / 8 + 1) as i32;

    shp.extend_from_slice(&record_number.to_be_bytes());
    shp.extend_from_slice(&2i32.to_be_bytes());
    shp.extend_from_slice(&0i32.to_le_bytes());
    shx.extend_from_slice(&offset_words.to_be_bytes());
    shx.extend_from_slice(&2i32.to_be_bytes());

    let shp_words = (shp.len() / 2) as i32;
    let shx_words = (shx.len() / 2) as i32;
    shp[24..28].copy_from_slice(&shp_words.to_be_bytes());
    shx[24..28].copy_from_slice(&shx_words.to_be_bytes());

    fs::write(&shp_path, shp).unwrap();
    fs::write(&shx_path, shx).unwrap();
}

/// parcels.shp/.shx/.dbf/.prj with two squares and a trailing null shape
fn write_parcels(dir: &Path) {
    let base = dir.join("parcels");

    let mut shapes = ShapeWriter::from_path(base.with_extension("shp")).unwrap();
    shapes.write_shape(&square(0.0, 0.0, 100.0)).unwrap();
    shapes.write_shape(&square(500.0, 200.0, 50.0)).unwrap();
    shapes.finalize().unwrap();
    drop(shapes);

    let mut table = TableWriterBuilder::new()
        .add_character_field("NAME".try_into().unwrap(), 32)
        .add_numeric_field("UNITS".try_into().unwrap(), 10, 0)
        .build_with_file_dest(base.with_extension("dbf"))
        .unwrap();
    table.write_record(&parcel_record("Rittenhouse", Some(12.0))).unwrap();
    table.write_record(&parcel_record("Fishtown", None)).unwrap();
    table.write_record(&parcel_record("Vacant lot", Some(0.0))).unwrap();
    table.finalize().unwrap();
    drop(table);

    append_null_shape(&base);
    fs::write(base.with_extension("prj"), UTM_18N_PRJ).unwrap();
}

#[tokio::test]
async fn test_read_shapefile_from_directory() {
    let dir = TempDir::new().unwrap();
    write_parcels(dir.path());

    let layer = FormatRegistry::with_defaults().read_layer(dir.path(), None).await.unwrap();

    assert_eq!(layer.name, "parcels");
    assert_eq!(layer.crs, Crs::utm_north(18));
    assert_eq!(layer.len(), 3);
    assert_eq!(layer.geometry_types(), vec![GeometryType::Polygon]);
    assert_eq!(layer.attribute_names(), vec!["NAME".to_string(), "UNITS".to_string()]);

    let first = layer.features[0].geometry.as_ref().unwrap();
    assert!(matches!(first, Geometry::Polygon(_)));
    assert!((first.unsigned_area() - 10_000.0).abs() < 1e-9);

    let bounds = layer.features[1].geometry.as_ref().unwrap().bounding_rect().unwrap();
    assert_eq!((bounds.min().x, bounds.min().y), (500.0, 200.0));
    assert_eq!((bounds.max().x, bounds.max().y), (550.0, 250.0));

    assert_eq!(layer.features[0].property("NAME"), Some(&serde_json::json!("Rittenhouse")));
    assert_eq!(layer.features[0].property("UNITS"), Some(&serde_json::json!(12.0)));
    assert_eq!(layer.features[1].property("UNITS"), Some(&serde_json::Value::Null));

    let vacant = &layer.features[2];
    assert!(vacant.geometry.is_none());
    assert_eq!(vacant.property("NAME"), Some(&serde_json::json!("Vacant lot")));
}

#[tokio::test]
async fn test_read_shapefile_without_prj_is_undefined() {
    let dir = TempDir::new().unwrap();
    write_parcels(dir.path());
    fs::remove_file(dir.path().join("parcels.prj")).unwrap();

    let layer = FormatRegistry::with_defaults()
        .read_layer(&dir.path().join("parcels.shp"), None)
        .await
        .unwrap();

    assert_eq!(layer.crs, Crs::Undefined);
    assert_eq!(layer.len(), 3);
}
