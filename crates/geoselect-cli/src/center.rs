//! Parsing of `--center` values

use geoselect_core::error::{GeoselectError, Result};
use geoselect_core::models::{Center, Crs};
use std::str::FromStr;

/// Parse "X,Y", WKT "POINT(X Y)" or EWKT "SRID=n;POINT(X Y)".
///
/// `default_crs` applies unless the value carries an SRID.
pub fn parse_center(input: &str, default_crs: &Crs) -> Result<Center> {
    let input = input.trim();
    let (crs, body) = split_srid(input)?;
    let crs = crs.unwrap_or_else(|| default_crs.clone());

    let (x, y) = if body.to_ascii_uppercase().starts_with("POINT") {
        parse_wkt_point(body)?
    } else {
        parse_pair(body)?
    };

    let center = Center::new(x, y, crs);
    if !center.is_finite() {
        return Err(invalid(input, "coordinates must be finite"));
    }
    Ok(center)
}

fn invalid(input: &str, reason: impl Into<String>) -> GeoselectError {
    GeoselectError::invalid_parameter("center", input, reason)
}

fn split_srid(input: &str) -> Result<(Option<Crs>, &str)> {
    let Some((head, body)) = input.split_once(';') else {
        return Ok((None, input));
    };
    let code = head
        .trim()
        .strip_prefix("SRID=")
        .or_else(|| head.trim().strip_prefix("srid="))
        .ok_or_else(|| invalid(input, "expected SRID=<code>;POINT(X Y)"))?;
    let code: u32 = code.trim().parse().map_err(|_| invalid(input, "SRID must be an EPSG code"))?;
    Ok((Some(Crs::Epsg(code)), body.trim()))
}

fn parse_pair(body: &str) -> Result<(f64, f64)> {
    let parts: Vec<&str> = body.split(',').map(str::trim).collect();
    match parts.as_slice() {
        [x, y] => {
            let x: f64 = x.parse().map_err(|_| invalid(body, "X is not a number"))?;
            let y: f64 = y.parse().map_err(|_| invalid(body, "Y is not a number"))?;
            Ok((x, y))
        }
        _ => Err(invalid(body, "expected \"X,Y\" or \"POINT(X Y)\"")),
    }
}

fn parse_wkt_point(body: &str) -> Result<(f64, f64)> {
    let parsed = wkt::Wkt::<f64>::from_str(body).map_err(|e| invalid(body, e.to_string()))?;
    match geo::Geometry::<f64>::try_from(parsed) {
        Ok(geo::Geometry::Point(point)) => Ok((point.x(), point.y())),
        Ok(_) => Err(invalid(body, "WKT center must be a POINT")),
        Err(e) => Err(invalid(body, e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pair() {
        let center = parse_center("-75.16522, 39.95258", &Crs::wgs84()).unwrap();
        assert_eq!(center, Center::lon_lat(-75.16522, 39.95258));
    }

    #[test]
    fn test_parse_wkt_point() {
        let center = parse_center("POINT(-75.16522 39.95258)", &Crs::wgs84()).unwrap();
        assert_eq!(center.x, -75.16522);
        assert_eq!(center.y, 39.95258);
        assert_eq!(center.crs, Crs::wgs84());
    }

    #[test]
    fn test_parse_ewkt_sets_crs() {
        let center = parse_center("SRID=32618;POINT(485900 4422000)", &Crs::wgs84()).unwrap();
        assert_eq!(center.crs, Crs::utm_north(18));
        assert_eq!(center.x, 485900.0);
    }

    #[test]
    fn test_rejects_malformed() {
        for input in ["", "1", "1,2,3", "a,b", "POINT(1)", "LINESTRING(0 0, 1 1)", "SRID=x;POINT(1 2)", "inf,0"] {
            assert!(
                matches!(
                    parse_center(input, &Crs::wgs84()),
                    Err(GeoselectError::InvalidParameter { name: "center", .. })
                ),
                "{:?} should be rejected",
                input
            );
        }
    }
}
