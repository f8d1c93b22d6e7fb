/*
 * minimal geographic bounding box type.
 *
 * The teacher's `odin_common::geo` builds `GeoRect`/`GeoPoint` on top of the `geo`, `nav_types`
 * and `uom` crates with full units-of-measure tracking. None of that precision is needed here -
 * every extent in this system is a plain WGS84 lon/lat box, so we use plain `f64` degrees.
 */
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox<T = f64> {
    pub west: T,
    pub south: T,
    pub east: T,
    pub north: T,
}

impl BoundingBox<f64> {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        BoundingBox { west, south, east, north }
    }

    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    pub fn aspect_ratio(&self) -> f64 {
        let h = self.height();
        if h != 0.0 {
            self.width() / h
        } else {
            1.0
        }
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.west + self.east) / 2.0, (self.south + self.north) / 2.0)
    }

    /// [lat_min, lon_min, lat_max, lon_max] ordering, as used by `.wepx` stream metadata
    pub fn to_lat_lon_array(&self) -> [f64; 4] {
        [self.south, self.west, self.north, self.east]
    }
}

#[inline]
pub fn abs(x: f64) -> f64 {
    x.abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_ratio_flat_height_defaults_to_one() {
        let bbox = BoundingBox::new(-10.0, 5.0, 10.0, 5.0);
        assert_eq!(bbox.aspect_ratio(), 1.0);
    }
}
