//! Geohash encoding of latitude/longitude pairs, longitude bit first.

use crate::error::{Result, TrackerError};

/// Detection bucket size: 11 characters is a cell of roughly 15cm x 15cm at
/// the equator.
pub const PRECISION: usize = 11;

const BASE32: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Bounding box of a geohash cell. Ingestion only encodes; this side is for
/// callers mapping stored keys back onto coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_latitude: f64,
    pub max_latitude: f64,
    pub min_longitude: f64,
    pub max_longitude: f64,
}

impl Bounds {
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_latitude + self.max_latitude) / 2.0,
            (self.min_longitude + self.max_longitude) / 2.0,
        )
    }

    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        (self.min_latitude..=self.max_latitude).contains(&latitude)
            && (self.min_longitude..=self.max_longitude).contains(&longitude)
    }
}

pub fn encode(latitude: f64, longitude: f64, precision: usize) -> Result<String> {
    if precision == 0
        || !(-90.0..=90.0).contains(&latitude)
        || !(-180.0..=180.0).contains(&longitude)
    {
        // NaN fails the range checks as well
        return Err(TrackerError::InvalidCoordinate {
            latitude,
            longitude,
            precision,
        });
    }

    let mut lat = (-90.0, 90.0);
    let mut lon = (-180.0, 180.0);
    let mut hash = String::with_capacity(precision);
    let mut even = true;
    let mut bit = 0;
    let mut idx = 0usize;

    while hash.len() < precision {
        let (range, value) = if even {
            (&mut lon, longitude)
        } else {
            (&mut lat, latitude)
        };
        let mid = (range.0 + range.1) / 2.0;
        if value >= mid {
            idx = (idx << 1) | 1;
            range.0 = mid;
        } else {
            idx <<= 1;
            range.1 = mid;
        }
        even = !even;

        bit += 1;
        if bit == 5 {
            hash.push(BASE32[idx] as char);
            bit = 0;
            idx = 0;
        }
    }

    Ok(hash)
}

/// Cell that `hash` names. Case-insensitive.
pub fn decode_bounds(hash: &str) -> Result<Bounds> {
    if hash.is_empty() {
        return Err(TrackerError::InvalidGeohash(hash.to_string()));
    }

    let mut lat = (-90.0, 90.0);
    let mut lon = (-180.0, 180.0);
    let mut even = true;

    for c in hash.bytes() {
        let idx = BASE32
            .iter()
            .position(|&b| b == c.to_ascii_lowercase())
            .ok_or_else(|| TrackerError::InvalidGeohash(hash.to_string()))?;

        for shift in (0..5).rev() {
            let range = if even { &mut lon } else { &mut lat };
            let mid = (range.0 + range.1) / 2.0;
            if (idx >> shift) & 1 == 1 {
                range.0 = mid;
            } else {
                range.1 = mid;
            }
            even = !even;
        }
    }

    Ok(Bounds {
        min_latitude: lat.0,
        max_latitude: lat.1,
        min_longitude: lon.0,
        max_longitude: lon.1,
    })
}
