use geo::Geometry;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::crs::Crs;
use super::geometry::GeometryType;

/// Named scalar attributes of a feature, kept in insertion order
pub type Attributes = serde_json::Map<String, serde_json::Value>;

/// Identifier of a feature within its layer
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeatureId(pub String);

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for FeatureId {
    fn from(index: usize) -> Self {
        FeatureId(index.to_string())
    }
}

impl From<&str> for FeatureId {
    fn from(id: &str) -> Self {
        FeatureId(id.to_string())
    }
}

/// Vector feature: optional geometry plus attributes.
///
/// Its coordinates are expressed in the CRS of the layer that owns it.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub id: FeatureId,

    /// None for records without geometry (e.g. Shapefile null shapes)
    pub geometry: Option<Geometry<f64>>,

    pub properties: Attributes,
}

impl Feature {
    pub fn new(id: impl Into<FeatureId>, geometry: Geometry<f64>, properties: Attributes) -> Self {
        Self { id: id.into(), geometry: Some(geometry), properties }
    }

    pub fn without_geometry(id: impl Into<FeatureId>, properties: Attributes) -> Self {
        Self { id: id.into(), geometry: None, properties }
    }

    pub fn has_geometry(&self) -> bool {
        self.geometry.is_some()
    }

    pub fn property(&self, name: &str) -> Option<&serde_json::Value> {
        self.properties.get(name)
    }

    /// Copy of this feature with a different geometry, attributes untouched
    pub fn with_geometry(&self, geometry: Option<Geometry<f64>>) -> Self {
        Self { id: self.id.clone(), geometry, properties: self.properties.clone() }
    }

    /// Copy of this feature with different attributes, geometry untouched
    pub fn with_properties(&self, properties: Attributes) -> Self {
        Self { id: self.id.clone(), geometry: self.geometry.clone(), properties }
    }
}

/// Ordered collection of features sharing one CRS.
///
/// Layers are never mutated by the spatial operations: reprojection,
/// selection, joins and aggregation all return new layers.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryLayer {
    pub name: String,
    pub crs: Crs,
    pub features: Vec<Feature>,
}

impl GeometryLayer {
    pub fn new(name: impl Into<String>, crs: Crs, features: Vec<Feature>) -> Self {
        Self { name: name.into(), crs, features }
    }

    pub fn empty(name: impl Into<String>, crs: Crs) -> Self {
        Self::new(name, crs, Vec::new())
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    /// New layer with the same name and CRS holding `features`
    pub fn derive(&self, features: Vec<Feature>) -> Self {
        Self { name: self.name.clone(), crs: self.crs.clone(), features }
    }

    /// New layer with the features at `indices`, in the order given
    pub fn subset(&self, indices: &[usize]) -> Self {
        self.derive(indices.iter().filter_map(|&i| self.features.get(i).cloned()).collect())
    }

    /// Attribute names in order of first appearance across the layer
    pub fn attribute_names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        for feature in &self.features {
            for key in feature.properties.keys() {
                if !names.iter().any(|n| n == key) {
                    names.push(key.clone());
                }
            }
        }
        names
    }

    /// Distinct geometry types present in the layer
    pub fn geometry_types(&self) -> Vec<GeometryType> {
        let mut types = Vec::new();
        for geometry in self.features.iter().filter_map(|f| f.geometry.as_ref()) {
            let kind = GeometryType::of(geometry);
            if !types.contains(&kind) {
                types.push(kind);
            }
        }
        types
    }

    /// Number of features without geometry
    pub fn null_geometry_count(&self) -> usize {
        self.features.iter().filter(|f| !f.has_geometry()).count()
    }
}

impl IntoIterator for GeometryLayer {
    type Item = Feature;
    type IntoIter = std::vec::IntoIter<Feature>;

    fn into_iter(self) -> Self::IntoIter {
        self.features.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(name: &str) -> Attributes {
        let mut properties = Attributes::new();
        properties.insert("name".to_string(), json!(name));
        properties
    }

    fn sample_layer() -> GeometryLayer {
        GeometryLayer::new(
            "tracts",
            Crs::utm_north(18),
            vec![
                Feature::new(0usize, Geometry::Point(geo::Point::new(0.0, 0.0)), attrs("a")),
                Feature::without_geometry(1usize, attrs("b")),
                Feature::new(2usize, Geometry::Point(geo::Point::new(1.0, 1.0)), attrs("c")),
            ],
        )
    }

    #[test]
    fn test_subset_preserves_requested_order() {
        let layer = sample_layer();
        let subset = layer.subset(&[2, 0, 99]);

        assert_eq!(subset.len(), 2);
        assert_eq!(subset.features[0].id, FeatureId::from(2usize));
        assert_eq!(subset.features[1].id, FeatureId::from(0usize));
        assert_eq!(subset.crs, layer.crs);
        assert_eq!(subset.name, "tracts");
    }

    #[test]
    fn test_attribute_names_and_types() {
        let mut layer = sample_layer();
        layer.features[2].properties.insert("pop".to_string(), json!(12));

        assert_eq!(layer.attribute_names(), vec!["name".to_string(), "pop".to_string()]);
        assert_eq!(layer.geometry_types(), vec![GeometryType::Point]);
        assert_eq!(layer.null_geometry_count(), 1);
    }

    #[test]
    fn test_with_geometry_keeps_attributes() {
        let layer = sample_layer();
        let moved = layer.features[0].with_geometry(Some(Geometry::Point(geo::Point::new(5.0, 5.0))));

        assert_eq!(moved.properties, layer.features[0].properties);
        assert_eq!(moved.id, layer.features[0].id);
        assert_ne!(moved.geometry, layer.features[0].geometry);
    }
}
