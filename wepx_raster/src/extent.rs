/*
 * best_width_for_wgs84 / extent_in_wgs84 (§4.3). `wepx_gdal::transform_bounds_2d` already
 * densifies the edges of the source bbox before reprojecting it (odin_gdal/src/lib.rs), which is
 * exactly the "sample the edges, compute the tight WGS84 bbox" step both functions need - so both
 * reduce to one densified bounds transform plus the model-specific shortcuts spec section 4.3
 * calls for.
 */
use std::collections::HashMap;

use lazy_static::lazy_static;
use tracing::warn;

use wepx_common::BoundingBox;
use wepx_gdal::srs_epsg_4326;

use crate::errors::Result;
use crate::raster::RasterDataset;

/// number of points densified per edge when sampling a raster's footprint (§4.3: "10 samples per
/// edge"); `transform_bounds_2d` densifies all four edges together, so this is one total count.
const EDGE_DENSIFY_POINTS: i32 = 40;

const DEFAULT_WIDTH_FALLBACK: u32 = 3000;
const METERS_PER_DEGREE_EQUATOR: f64 = 111_320.0;

lazy_static! {
    /// hardcoded footprints for named models whose native grid is awkward to derive cheaply
    /// (§4.3: "hardcoded bbox for certain named models").
    static ref MODEL_EXTENTS: HashMap<&'static str, (f64, f64, f64, f64)> = HashMap::from([
        ("hrdps", (-152.78, 27.22, -40.7, 70.6)),
    ]);
}

/// tight WGS84 bbox enclosing the raster's footprint, by densifying and reprojecting its own
/// (geotransform-derived) bounding box.
fn footprint_in_wgs84(raster: &RasterDataset) -> Result<BoundingBox<f64>> {
    let (cols, rows) = raster.size();
    let gt = raster.geo_transform()?;

    let x_min = gt[0];
    let x_max = gt[0] + gt[1] * cols as f64;
    let y_max = gt[3];
    let y_min = gt[3] + gt[5] * rows as f64;
    let (y_min, y_max) = if y_min <= y_max { (y_min, y_max) } else { (y_max, y_min) };

    let src_srs = raster.spatial_ref()?;
    let wgs84 = srs_epsg_4326();

    let (west, south, east, north) = wepx_gdal::transform_bounds_2d(
        &src_srs,
        &wgs84,
        x_min,
        y_min,
        x_max,
        y_max,
        Some(EDGE_DENSIFY_POINTS),
    )?;
    Ok(BoundingBox::new(west, south, east, north))
}

/// §4.3: `meters_per_degree = 111320 * cos(safe_lat)`, `safe_lat = 0` if the bbox crosses the
/// equator else `min(|lat_min|, |lat_max|)`.
fn meters_per_degree(bbox: &BoundingBox<f64>) -> f64 {
    let crosses_equator = bbox.south < 0.0 && bbox.north > 0.0;
    let safe_lat = if crosses_equator { 0.0 } else { bbox.south.abs().min(bbox.north.abs()) };
    METERS_PER_DEGREE_EQUATOR * safe_lat.to_radians().cos()
}

/// best output width for reprojecting `path` onto a regular WGS84 grid, matching the raster's own
/// native resolution as closely as possible. Returns `DEFAULT_WIDTH_FALLBACK` if the raster cannot
/// be opened or inspected.
pub fn best_width_for_wgs84(path: &std::path::Path) -> u32 {
    match try_best_width_for_wgs84(path) {
        Ok(width) => width,
        Err(e) => {
            warn!(error = %e, path = %path.display(), "best_width_for_wgs84: falling back to default width");
            DEFAULT_WIDTH_FALLBACK
        }
    }
}

fn try_best_width_for_wgs84(path: &std::path::Path) -> Result<u32> {
    let raster = RasterDataset::open(path)?;
    let gt = raster.geo_transform()?;
    let native_res = gt[1].abs();

    let bbox = footprint_in_wgs84(&raster)?;
    let src_srs = raster.spatial_ref()?;

    let target_res_deg = if src_srs.is_geographic() {
        native_res
    } else {
        let mpd = meters_per_degree(&bbox);
        if mpd <= 0.0 {
            return Ok(DEFAULT_WIDTH_FALLBACK);
        }
        native_res / mpd
    };

    if target_res_deg <= 0.0 || bbox.width() <= 0.0 {
        return Ok(DEFAULT_WIDTH_FALLBACK);
    }
    Ok((bbox.width() / target_res_deg).ceil() as u32)
}

/// WGS84 footprint to reproject `path` into: a hardcoded table entry for `model_id` if one exists,
/// otherwise derived from the raster itself (geotransform directly if already geographic, a
/// densified bounds transform otherwise).
pub fn extent_in_wgs84(path: &std::path::Path, model_id: &str) -> Result<BoundingBox<f64>> {
    if let Some(&(west, south, east, north)) = MODEL_EXTENTS.get(model_id.to_lowercase().as_str()) {
        return Ok(BoundingBox::new(west, south, east, north));
    }
    let raster = RasterDataset::open(path)?;
    footprint_in_wgs84(&raster)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equator_crossing_bbox_uses_zero_safe_lat() {
        let bbox = BoundingBox::new(-10.0, -5.0, 10.0, 5.0);
        assert_eq!(meters_per_degree(&bbox), METERS_PER_DEGREE_EQUATOR);
    }

    #[test]
    fn non_crossing_bbox_uses_closer_to_equator_latitude() {
        let bbox = BoundingBox::new(-10.0, 30.0, 10.0, 60.0);
        let expected = METERS_PER_DEGREE_EQUATOR * 30f64.to_radians().cos();
        assert!((meters_per_degree(&bbox) - expected).abs() < 1e-9);
    }

    #[test]
    fn hrdps_extent_is_hardcoded() {
        let bbox = MODEL_EXTENTS.get("hrdps").unwrap();
        assert_eq!(*bbox, (-152.78, 27.22, -40.7, 70.6));
    }
}
