//! End-to-end selection around Philadelphia City Hall with PROJ reprojection

use geo::{Geometry, LineString, Polygon};
use geoselect_core::models::{Center, Crs, Distance, Feature, GeometryLayer};
use geoselect_core::GeoselectError;
use geoselect_geo::transform::{reproject_center, reproject_layer, ProjReprojector};
use geoselect_geo::{select_within_radius, SpatialSelector};
use serde_json::json;

fn city_hall() -> Center {
    Center::lon_lat(-75.16522, 39.95258)
}

fn projected_city_hall() -> Center {
    reproject_center(&city_hall(), &Crs::utm_north(18), &ProjReprojector).unwrap()
}

fn square(cx: f64, cy: f64, min_dx: f64, min_dy: f64, size: f64) -> Geometry<f64> {
    let (x, y) = (cx + min_dx, cy + min_dy);
    Geometry::Polygon(Polygon::new(
        LineString::from(vec![(x, y), (x + size, y), (x + size, y + size), (x, y + size), (x, y)]),
        vec![],
    ))
}

/// Five tracts laid out around City Hall in UTM 18N meters
fn tracts() -> GeometryLayer {
    let c = projected_city_hall();
    let tract = |idx: usize, geoid: &str, geometry: Geometry<f64>| {
        Feature::new(idx, geometry, json!({ "GEOID": geoid }).as_object().cloned().unwrap())
    };

    GeometryLayer::new(
        "tracts",
        Crs::utm_north(18),
        vec![
            // Contains the center
            tract(0, "42101000100", square(c.x, c.y, -300.0, -300.0, 600.0)),
            // Nearest edge 3 km east
            tract(1, "42101000200", square(c.x, c.y, 3000.0, -200.0, 400.0)),
            // Nearest edge 1.5 km north
            tract(2, "42101000300", square(c.x, c.y, -100.0, 1500.0, 300.0)),
            // Nearest edge 2.5 km south
            tract(3, "42101000400", square(c.x, c.y, -100.0, -2900.0, 400.0)),
            // Far to the west
            tract(4, "42101000500", square(c.x, c.y, -12000.0, 0.0, 1000.0)),
        ],
    )
}

#[test]
fn test_projected_center_is_in_zone_18() {
    let c = projected_city_hall();
    assert!(c.x > 480_000.0 && c.x < 492_000.0, "easting {}", c.x);
    assert!(c.y > 4_400_000.0 && c.y < 4_450_000.0, "northing {}", c.y);
}

#[test]
fn test_two_tracts_within_two_kilometers() {
    let selected = select_within_radius(&city_hall(), &tracts(), 2000.0).unwrap();

    let geoids: Vec<_> = selected.iter().map(|f| f.property("GEOID").cloned().unwrap()).collect();
    assert_eq!(geoids, vec![json!("42101000100"), json!("42101000300")]);
    assert_eq!(selected.crs, Crs::utm_north(18));
}

#[test]
fn test_indexed_selection_agrees() {
    let selection = SpatialSelector::new()
        .strategy(geoselect_geo::selector::ScanStrategy::Indexed)
        .select_indices(&city_hall(), &tracts(), 2000.0)
        .unwrap();
    assert_eq!(selection.indices, vec![0, 2]);
}

#[test]
fn test_geographic_reference_needs_working_crs() {
    let lonlat = reproject_layer(&tracts(), &Crs::wgs84(), &ProjReprojector).unwrap();

    let result = select_within_radius(&city_hall(), &lonlat, 2000.0);
    assert!(matches!(result, Err(GeoselectError::CrsMismatch { .. })));

    let selected = SpatialSelector::new()
        .working_crs(Some(Crs::utm_north(18)))
        .select(&city_hall(), &lonlat, 2000.0)
        .unwrap();
    assert_eq!(selected.len(), 2);
    assert_eq!(selected.crs, Crs::wgs84());
}

#[test]
fn test_ground_distance_in_state_plane_feet() {
    // Pennsylvania South state plane, US survey feet
    let state_plane = reproject_layer(&tracts(), &Crs::Epsg(2272), &ProjReprojector).unwrap();

    let selection = SpatialSelector::new()
        .select_within_distance(&city_hall(), &state_plane, Distance::meters(2000.0))
        .unwrap();
    assert_eq!(selection.indices, vec![0, 2]);
    assert!((selection.buffer.radius() - 6561.67).abs() < 0.01);

    // A bare radius is read in frame units: 2000 ft only reaches the containing tract
    let feet = SpatialSelector::new().select_indices(&city_hall(), &state_plane, 2000.0).unwrap();
    assert_eq!(feet.indices, vec![0]);
}
