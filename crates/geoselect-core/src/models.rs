pub mod crs;
pub mod geometry;
pub mod layer;

pub use crs::{Crs, CrsKind};
pub use geometry::{Center, Distance, DistanceUnit, GeometryType, SpatialPredicate};
pub use layer::{Attributes, Feature, FeatureId, GeometryLayer};
