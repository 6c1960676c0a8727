use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::models::GeoPoint;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Equirectangular approximation, valid for the short ranges the analyzer
/// compares. Longitude difference is normalised across the antimeridian.
pub fn distance_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let mut dlon = b.lon - a.lon;
    if dlon > 180.0 {
        dlon -= 360.0;
    } else if dlon < -180.0 {
        dlon += 360.0;
    }
    let mean_lat = ((a.lat + b.lat) / 2.0).to_radians();
    let x = dlon.to_radians() * mean_lat.cos();
    let y = (b.lat - a.lat).to_radians();
    (x * x + y * y).sqrt() * EARTH_RADIUS_KM
}

pub fn centroid(points: &[GeoPoint]) -> GeoPoint {
    if points.is_empty() {
        return GeoPoint { lat: 0.0, lon: 0.0 };
    }
    let n = points.len() as f64;
    GeoPoint {
        lat: points.iter().map(|p| p.lat).sum::<f64>() / n,
        lon: points.iter().map(|p| p.lon).sum::<f64>() / n,
    }
}

/// RMS distance of the points from the given center, in km.
pub fn radius_of_gyration(points: &[GeoPoint], center: &GeoPoint) -> f64 {
    if points.is_empty() {
        return 0.0;
    }
    let sum_sq: f64 = points
        .iter()
        .map(|p| {
            let d = distance_km(p, center);
            d * d
        })
        .sum();
    (sum_sq / points.len() as f64).sqrt()
}

/// Region-membership capability injected into the analyzer. The engine
/// depends only on this predicate, not on any gazetteer internals.
pub trait RegionPredicate {
    fn contains(&self, point: &GeoPoint) -> bool;
}

impl<F> RegionPredicate for F
where
    F: Fn(&GeoPoint) -> bool,
{
    fn contains(&self, point: &GeoPoint) -> bool {
        self(point)
    }
}

/// Axis-aligned region for callers that declare distribution as a simple
/// lat/lon box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl RegionPredicate for BoundingBox {
    fn contains(&self, point: &GeoPoint) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.lat)
            && (self.min_lon..=self.max_lon).contains(&point.lon)
    }
}

impl FromStr for BoundingBox {
    type Err = EngineError;

    /// Parses "min_lat,min_lon,max_lat,max_lon".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<f64> = s
            .split(',')
            .map(|part| {
                part.trim()
                    .parse::<f64>()
                    .map_err(|_| EngineError::InvalidInput(format!("bad coordinate '{part}'")))
            })
            .collect::<Result<_, _>>()?;
        if parts.len() != 4 {
            return Err(EngineError::InvalidInput(
                "region bounds must be min_lat,min_lon,max_lat,max_lon".to_string(),
            ));
        }
        let bounds = BoundingBox {
            min_lat: parts[0],
            min_lon: parts[1],
            max_lat: parts[2],
            max_lon: parts[3],
        };
        if bounds.min_lat >= bounds.max_lat || bounds.min_lon >= bounds.max_lon {
            return Err(EngineError::InvalidInput(
                "region bounds must have min < max on both axes".to_string(),
            ));
        }
        Ok(bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_between_identical_points_is_zero() {
        let lagos = GeoPoint { lat: 6.5244, lon: 3.3792 };
        assert_eq!(distance_km(&lagos, &lagos), 0.0);
    }

    #[test]
    fn lagos_to_abuja_is_roughly_five_hundred_km() {
        let lagos = GeoPoint { lat: 6.5244, lon: 3.3792 };
        let abuja = GeoPoint { lat: 9.0765, lon: 7.3986 };
        let d = distance_km(&lagos, &abuja);
        assert!((450.0..600.0).contains(&d), "got {d}");
    }

    #[test]
    fn antimeridian_neighbours_are_close() {
        let east = GeoPoint { lat: 0.0, lon: 179.5 };
        let west = GeoPoint { lat: 0.0, lon: -179.5 };
        assert!(distance_km(&east, &west) < 150.0);
    }

    #[test]
    fn centroid_averages_coordinates() {
        let points = vec![
            GeoPoint { lat: 0.0, lon: 0.0 },
            GeoPoint { lat: 2.0, lon: 4.0 },
        ];
        let center = centroid(&points);
        assert_eq!(center.lat, 1.0);
        assert_eq!(center.lon, 2.0);
    }

    #[test]
    fn bounding_box_parses_and_contains() {
        let bounds: BoundingBox = "6.0,2.5,7.5,4.5".parse().unwrap();
        assert!(bounds.contains(&GeoPoint { lat: 6.5244, lon: 3.3792 }));
        assert!(!bounds.contains(&GeoPoint { lat: 9.0765, lon: 7.3986 }));
    }

    #[test]
    fn bounding_box_rejects_inverted_bounds() {
        assert!("7.5,2.5,6.0,4.5".parse::<BoundingBox>().is_err());
        assert!("1,2,3".parse::<BoundingBox>().is_err());
    }
}
