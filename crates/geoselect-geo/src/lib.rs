//! geoselect-geo - Reprojection, buffers, spatial predicates and selection
//!
//! Everything here works on `geoselect_core` layers and returns new layers;
//! no input is modified in place.

pub mod aggregate;
pub mod buffer;
pub mod index;
pub mod selector;
pub mod spatial;
pub mod transform;

pub use aggregate::{aggregate_points_in_polygons, AggregateSpec};
pub use buffer::Buffer;
pub use selector::{select_within_radius, select_within_radius_with, Selection, SpatialSelector};
pub use transform::{ProjReprojector, Reprojector};
