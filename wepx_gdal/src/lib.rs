/*
 * wepx_gdal - thin, safe-ish wrapper around the `gdal`/`gdal-sys` crates.
 *
 * This is the "external raster library" the raster ingest adapter (wepx_raster) delegates to for
 * everything that touches an actual GRIB/NetCDF/GeoTIFF dataset: opening files, reading
 * geotransform/projection/size, and warping to a target CRS. Trimmed from the teacher's
 * `odin_gdal` down to what a WGS84 reprojection pipeline needs - the UTM zone bookkeeping and
 * generic per-pixel grid-point search the teacher carries for its fire/smoke plume tooling have
 * no counterpart here and were dropped (see DESIGN.md).
 */
#![allow(unused)]

pub mod errors;
pub mod warp;

use lazy_static::lazy_static;
use std::collections::HashMap;
use std::ffi::{CStr, CString};
use std::path::Path;
use std::ptr::{null, null_mut};
use std::sync::Mutex;

use libc::{c_char, c_int};

pub use gdal::{self, errors::GdalError, Dataset, Driver, DriverManager, GeoTransform, Metadata};
pub use gdal::raster::{Buffer, GdalType, RasterBand};
pub use gdal::spatial_ref::{CoordTransform, CoordTransformOptions, SpatialRef};

use gdal_sys::CPLErr;

use wepx_common::fs::get_filename_extension;
use wepx_common::BoundingBox;

use crate::errors::{gdal_error, last_gdal_error, misc_error, Result, WepxGdalError};

lazy_static! {
    /// file extension -> GDAL driver short name. Not exhaustive - just the formats the ingest
    /// pipeline is expected to see (GRIB2 from NOMADS-style mirrors, NetCDF, GeoTIFF).
    static ref EXT_MAP: HashMap<&'static str, &'static str> = HashMap::from([
        ("tif", "GTiff"),
        ("nc", "netCDF"),
        ("grib2", "GRIB"),
        ("grb2", "GRIB"),
    ]);
}

/// protects non-threadsafe GDAL calls (dataset open, error handler push/pop).
static GLOB_GDAL_MUTEX: Mutex<usize> = Mutex::new(0);

pub fn get_driver_from_filename(filename: &str) -> Option<gdal::Driver> {
    get_filename_extension(filename)
        .and_then(|ext| EXT_MAP.get(ext.to_lowercase().as_str()))
        .and_then(|n| DriverManager::get_driver_by_name(n).ok())
}

pub fn pc_char_to_string(pc_char: *const c_char) -> String {
    let cstr = unsafe { CStr::from_ptr(pc_char) };
    String::from_utf8_lossy(cstr.to_bytes()).to_string()
}

pub fn ok_not_zero<F>(res: c_int, err: F) -> Result<()>
where
    F: FnOnce() -> String,
{
    if res != 0 {
        Ok(())
    } else {
        Err(misc_error(err()))
    }
}

pub fn ok_non_null<R, F>(ptr: *const R, err: F) -> Result<*const R>
where
    F: FnOnce() -> String,
{
    if ptr != null() {
        Ok(ptr)
    } else {
        Err(misc_error(err()))
    }
}

pub fn ok_mut_non_null<R, F>(ptr: *mut R, err: F) -> Result<*mut R>
where
    F: FnOnce() -> String,
{
    if ptr != null_mut() {
        Ok(ptr)
    } else {
        Err(misc_error(err()))
    }
}

pub fn ok_ce_none(res: CPLErr::Type) -> Result<()> {
    if res == CPLErr::CE_None {
        Ok(())
    } else {
        Err(last_gdal_error())
    }
}

/// run the provided closure with the global GDAL error handler disabled, so warnings about
/// non-CF-1 SRS metadata (common in model GRIB output) don't spam the console.
pub fn run_quiet<T, F>(f: F) -> Result<T>
where
    F: Fn() -> Result<T>,
{
    let _lock = GLOB_GDAL_MUTEX.lock().unwrap();
    unsafe {
        gdal_sys::CPLPushErrorHandler(Some(gdal_sys::CPLQuietErrorHandler));
    }
    let result = f();
    unsafe {
        gdal_sys::CPLPopErrorHandler();
    }
    result
}

pub fn new_geotransform(
    x_upper_left: f64,
    x_resolution: f64,
    row_rotation: f64,
    y_upper_left: f64,
    col_rotation: f64,
    y_resolution: f64,
) -> GeoTransform {
    [x_upper_left, x_resolution, row_rotation, y_upper_left, col_rotation, y_resolution]
}

pub fn geotransform_from_bbox(bbox: &BoundingBox<f64>, x_resolution: f64, y_resolution: f64) -> GeoTransform {
    new_geotransform(bbox.west, x_resolution, 0.0, bbox.north, 0.0, y_resolution)
}

pub fn bounds_center(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> (f64, f64) {
    ((x_min + x_max) / 2.0, (y_min + y_max) / 2.0)
}

pub fn transform_point_2d(transform: &CoordTransform, x: f64, y: f64) -> Result<(f64, f64)> {
    let mut ax: [f64; 1] = [x];
    let mut ay: [f64; 1] = [y];
    let mut az: [f64; 0] = [];

    transform.transform_coords(&mut ax, &mut ay, &mut az)?;
    Ok((ax[0], ay[0]))
}

/// axis-order-aware bounding box transform between two spatial reference systems, densifying the
/// edges so a reprojected box still encloses curved meridians/parallels.
pub fn transform_bounds_2d(
    s_srs: &SpatialRef,
    t_srs: &SpatialRef,
    x_min: f64,
    y_min: f64,
    x_max: f64,
    y_max: f64,
    opt_densify_pts: Option<i32>,
) -> Result<(f64, f64, f64, f64)> {
    let s_is_geo = s_srs.is_geographic();
    let t_is_geo = t_srs.is_geographic();

    let mut bounds: [f64; 4] = if s_is_geo && !t_is_geo { [y_min, x_min, y_max, x_max] } else { [x_min, y_min, x_max, y_max] };
    let densify_pts: i32 = opt_densify_pts.unwrap_or(21);

    let mut ct_options = CoordTransformOptions::new()?;
    ct_options.desired_accuracy(0.0);
    ct_options.set_ballpark_allowed(false);

    CoordTransform::new_with_options(s_srs, t_srs, &ct_options)
        .and_then(|transform| transform.transform_bounds(&mut bounds, densify_pts))
        .map_err(gdal_error)
        .map(|a| {
            if t_is_geo && !s_is_geo {
                (a[1], a[0], a[3], a[2])
            } else {
                (a[0], a[1], a[2], a[3])
            }
        })
}

pub fn srs_lon_lat() -> SpatialRef {
    SpatialRef::from_epsg(4326).unwrap()
}

pub fn srs_epsg_4326() -> SpatialRef {
    SpatialRef::from_epsg(4326).unwrap()
}

pub fn srs_epsg(code: u32) -> Result<SpatialRef> {
    Ok(SpatialRef::from_epsg(code)?)
}
