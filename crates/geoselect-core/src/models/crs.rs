//! Coordinate reference system identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{GeoselectError, Result};

/// Coordinate Reference System attached to a layer or a center point.
///
/// Two values are only directly comparable when they are equal; anything else
/// has to go through a reprojection first. `Undefined` never compares and
/// never reprojects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Crs {
    /// EPSG registry code, e.g. 4326
    Epsg(u32),
    /// PROJ parameter string, e.g. `+proj=utm +zone=18 +datum=WGS84`
    Proj(String),
    /// OGC WKT definition, typically read from a `.prj` file
    Wkt(String),
    /// No CRS information available
    Undefined,
}

impl Default for Crs {
    fn default() -> Self {
        Self::wgs84()
    }
}

impl Crs {
    /// WGS 84 (EPSG:4326)
    pub fn wgs84() -> Self {
        Crs::Epsg(4326)
    }

    /// Web Mercator (EPSG:3857)
    pub fn web_mercator() -> Self {
        Crs::Epsg(3857)
    }

    /// WGS 84 / UTM zone `zone` north
    pub fn utm_north(zone: u8) -> Self {
        Crs::Epsg(32600 + zone as u32)
    }

    pub fn epsg(&self) -> Option<u32> {
        match self {
            Crs::Epsg(code) => Some(*code),
            _ => None,
        }
    }

    pub fn is_defined(&self) -> bool {
        !matches!(self, Crs::Undefined)
    }

    /// Definition string understood by PROJ, `None` for an undefined CRS
    pub fn proj_definition(&self) -> Option<String> {
        match self {
            Crs::Epsg(code) => Some(format!("EPSG:{}", code)),
            Crs::Proj(definition) | Crs::Wkt(definition) => Some(definition.clone()),
            Crs::Undefined => None,
        }
    }
}

/// Kind of coordinate system behind a CRS, as resolved by the projection backend
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CrsKind {
    /// Angular coordinates (degrees, radians)
    Geographic,
    /// Linear coordinates; one axis unit is `meters_per_unit` metres
    Projected { meters_per_unit: f64 },
}

impl CrsKind {
    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsKind::Geographic)
    }

    /// Metres per axis unit, `None` for angular coordinates
    pub fn meters_per_unit(&self) -> Option<f64> {
        match self {
            CrsKind::Geographic => None,
            CrsKind::Projected { meters_per_unit } => Some(*meters_per_unit),
        }
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Crs::Epsg(code) => write!(f, "EPSG:{}", code),
            Crs::Proj(definition) => write!(f, "{}", definition),
            Crs::Wkt(definition) => {
                let head: String = definition.chars().take(50).collect();
                write!(f, "WKT:{}", head)
            }
            Crs::Undefined => write!(f, "undefined"),
        }
    }
}

impl FromStr for Crs {
    type Err = GeoselectError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let upper = trimmed.to_ascii_uppercase();

        if trimmed.is_empty() || upper == "UNDEFINED" {
            return Ok(Crs::Undefined);
        }

        // OGC CRS84 is WGS 84 with lon/lat axis order, which is what we use anyway
        if upper == "CRS84" || upper.ends_with(":CRS84") {
            return Ok(Crs::wgs84());
        }

        if trimmed.starts_with('+') {
            return Ok(Crs::Proj(trimmed.to_string()));
        }

        if ["GEOGCS", "PROJCS", "GEOGCRS", "PROJCRS", "GEODCRS", "COMPD_CS"]
            .iter()
            .any(|keyword| upper.starts_with(keyword))
        {
            return Ok(Crs::Wkt(trimmed.to_string()));
        }

        // "4326", "EPSG:4326", "urn:ogc:def:crs:EPSG::4326"
        if upper.chars().all(|c| c.is_ascii_digit()) || upper.contains("EPSG") {
            let code = upper.rsplit(':').next().unwrap_or_default();
            return code.parse::<u32>().map(Crs::Epsg).map_err(|_| {
                GeoselectError::invalid_parameter("crs", trimmed, "malformed EPSG code")
            });
        }

        Err(GeoselectError::invalid_parameter(
            "crs",
            trimmed,
            "expected EPSG:<code>, a PROJ string, or WKT",
        ))
    }
}

impl TryFrom<String> for Crs {
    type Error = GeoselectError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Crs> for String {
    fn from(crs: Crs) -> Self {
        match crs {
            Crs::Epsg(code) => format!("EPSG:{}", code),
            Crs::Proj(definition) | Crs::Wkt(definition) => definition,
            Crs::Undefined => "undefined".to_string(),
        }
    }
}
