/*
 * stream-global metadata (§3 StreamMeta) and the scale-selection rule (§4.1) that is evaluated
 * once, on the first frame of a stream, and frozen for the stream's lifetime (invariant I1).
 */
use serde::{Deserialize, Serialize};

/// frozen at I-frame 0; every later frame of the stream (I or P) is interpreted against this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamMeta {
    pub min: f64,
    pub max: f64,
    pub width: u32,
    pub height: u32,
    pub scale: f64,
    pub alpha: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extent: Option<[f64; 4]>, // [lat_min, lon_min, lat_max, lon_max]
}

/// choose the fixed-decimal scale for a stream from the value range of its first frame (§4.1).
/// Buckets are chosen so integer deltas stay small for each weather-variable family; once picked
/// the scale never changes for the life of the stream (I1).
pub fn scale_for_range(range: f64) -> f64 {
    if range == 0.0 {
        10000.0
    } else if range > 200.0 {
        1.0
    } else if range > 15.0 {
        10.0
    } else if range > 5.0 {
        100.0
    } else {
        10000.0
    }
}

/// scan a raster for its non-NaN value range, returning `(min, max, scale)`. Falls back to
/// `(0.0, 0.0, 100.0)` when every pixel is NaN.
pub fn value_range_and_scale(grid: &[f32]) -> (f64, f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    let mut any = false;

    for &v in grid {
        if !v.is_nan() {
            let v = v as f64;
            if v < min {
                min = v;
            }
            if v > max {
                max = v;
            }
            any = true;
        }
    }

    if !any {
        (0.0, 0.0, 100.0)
    } else {
        (min, max, scale_for_range(max - min))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scale_buckets_are_deterministic() {
        // S8: value-ranges 0, 3, 10, 50, 300 -> scales 10000, 10000, 100, 10, 1
        assert_eq!(scale_for_range(0.0), 10000.0);
        assert_eq!(scale_for_range(3.0), 10000.0);
        assert_eq!(scale_for_range(10.0), 100.0);
        assert_eq!(scale_for_range(50.0), 10.0);
        assert_eq!(scale_for_range(300.0), 1.0);
    }

    #[test]
    fn all_nan_falls_back_to_100() {
        let grid = vec![f32::NAN; 16];
        let (min, max, scale) = value_range_and_scale(&grid);
        assert_eq!((min, max), (0.0, 0.0));
        assert_eq!(scale, 100.0);
    }
}
