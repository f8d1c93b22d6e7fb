/*
 * single-band reprojection to a fixed-size WGS84 grid, trimmed from the teacher's general
 * `SimpleWarpBuilder` (which builds arbitrary multi-band GTiff outputs) down to the one thing the
 * raster ingest adapter (wepx_raster) needs: warp exactly one band into an in-memory ("MEM")
 * dataset of caller-chosen width/height/bbox, with NaN nodata. Dropped relative to the teacher:
 * multi-band target datasets, GTiff/format selection, creation options, resample algorithm choice
 * (always nearest-neighbour here) - see DESIGN.md.
 */
use std::ffi::CString;
use std::ptr::{null, null_mut};

use gdal::spatial_ref::SpatialRef;
use gdal::Dataset;
use gdal_sys::{CPLErr::CE_None, GDALResampleAlg};
use libc::{c_double, c_int, c_uint, c_void};

use wepx_common::BoundingBox;

use crate::errors::{last_gdal_error, misc_error, reset_last_gdal_error, Result, WepxGdalError};

/// a band reprojected onto a regular WGS84 lon/lat grid, nodata already mapped to NaN.
pub struct WarpedBand {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
}

/// warp `band_index` (1-based, as in GDAL) of `src_ds` onto a `out_width x out_height` WGS84 grid
/// covering `bbox` (west/south/east/north degrees), using nearest-neighbour resampling.
pub fn reproject_band_to_wgs84(
    src_ds: &Dataset,
    band_index: isize,
    out_width: u32,
    out_height: u32,
    bbox: &BoundingBox<f64>,
) -> Result<WarpedBand> {
    unsafe { reproject_band_to_wgs84_unsafe(src_ds, band_index, out_width, out_height, bbox) }
}

unsafe fn reproject_band_to_wgs84_unsafe(
    src_ds: &Dataset,
    band_index: isize,
    out_width: u32,
    out_height: u32,
    bbox: &BoundingBox<f64>,
) -> Result<WarpedBand> {
    reset_last_gdal_error();

    let c_src_ds = src_ds.c_dataset();
    let src_srs = src_ds
        .spatial_ref()
        .ok()
        .or_else(|| src_ds.gcp_spatial_ref())
        .ok_or(WepxGdalError::NoSpatialReferenceSystem)?;
    let tgt_srs = SpatialRef::from_epsg(4326)?;

    let src_wkt = CString::new(src_srs.to_wkt()?)?;
    let tgt_wkt = CString::new(tgt_srs.to_wkt()?)?;

    // (1) create an in-memory single-band target dataset sized exactly to what the caller wants.
    let mem_format = CString::new("MEM").unwrap();
    let c_driver = gdal_sys::GDALGetDriverByName(mem_format.as_ptr());
    if c_driver == null_mut() {
        return Err(misc_error("MEM driver not available"));
    }

    let n_pixels = out_width as c_int;
    let n_lines = out_height as c_int;

    let empty_name = CString::new("").unwrap();
    let c_tgt_ds = gdal_sys::GDALCreate(
        c_driver,
        empty_name.as_ptr(),
        n_pixels,
        n_lines,
        1,
        gdal_sys::GDALDataType::GDT_Float32,
        null_mut(),
    );
    if c_tgt_ds == null_mut() {
        return Err(last_gdal_error());
    }

    let res_x = (bbox.east - bbox.west) / out_width as f64;
    let res_y = -((bbox.north - bbox.south) / out_height as f64);
    let mut geo_transform: [c_double; 6] = [bbox.west, res_x, 0.0, bbox.north, 0.0, res_y];

    gdal_sys::GDALSetProjection(c_tgt_ds, tgt_wkt.as_ptr());
    gdal_sys::GDALSetGeoTransform(c_tgt_ds, geo_transform.as_mut_ptr());

    let tgt_band = gdal_sys::GDALGetRasterBand(c_tgt_ds, 1);
    gdal_sys::GDALSetRasterNoDataValue(tgt_band, f64::NAN);

    // (2) set up the src->tgt transformer and run the warp.
    let c_transformer_arg = gdal_sys::GDALCreateGenImgProjTransformer(
        c_src_ds,
        src_wkt.as_ptr(),
        c_tgt_ds,
        tgt_wkt.as_ptr(),
        0,
        0.0,
        0,
    );
    if c_transformer_arg == null_mut() {
        gdal_sys::GDALClose(c_tgt_ds);
        return Err(last_gdal_error());
    }

    let c_warp_options = gdal_sys::GDALCreateWarpOptions();
    let warp_options = c_warp_options.as_mut().ok_or_else(last_gdal_error)?;
    warp_options.hSrcDS = c_src_ds;
    warp_options.hDstDS = c_tgt_ds;
    warp_options.dfWarpMemoryLimit = 268_435_456 as c_double; // 256M, plenty for one band
    warp_options.eResampleAlg = GDALResampleAlg::GRA_NearestNeighbour as c_uint;
    warp_options.pfnProgress = Some(gdal_sys::GDALDummyProgress);
    warp_options.nBandCount = 1;

    let c_src_bands = gdal_sys::CPLMalloc(std::mem::size_of::<c_int>()) as *mut c_int;
    *c_src_bands = band_index as c_int;
    warp_options.panSrcBands = c_src_bands;

    let c_tgt_bands = gdal_sys::CPLMalloc(std::mem::size_of::<c_int>()) as *mut c_int;
    *c_tgt_bands = 1;
    warp_options.panDstBands = c_tgt_bands;

    let src_nodata = gdal_sys::CPLMalloc(std::mem::size_of::<c_double>()) as *mut c_double;
    *src_nodata = f64::NAN;
    warp_options.padfSrcNoDataReal = src_nodata;

    let dst_nodata = gdal_sys::CPLMalloc(std::mem::size_of::<c_double>()) as *mut c_double;
    *dst_nodata = f64::NAN;
    warp_options.padfDstNoDataReal = dst_nodata;

    warp_options.pTransformerArg = c_transformer_arg;
    warp_options.pfnTransformer = Some(gdal_sys::GDALGenImgProjTransform);

    let c_warp_op = gdal_sys::GDALCreateWarpOperation(c_warp_options);
    if c_warp_op == null_mut() {
        gdal_sys::GDALDestroyGenImgProjTransformer(c_transformer_arg);
        gdal_sys::GDALDestroyWarpOptions(c_warp_options);
        gdal_sys::GDALClose(c_tgt_ds);
        return Err(last_gdal_error());
    }

    let warp_result = gdal_sys::GDALChunkAndWarpImage(c_warp_op, 0, 0, n_pixels, n_lines);

    gdal_sys::GDALDestroyWarpOperation(c_warp_op);
    gdal_sys::GDALDestroyGenImgProjTransformer(c_transformer_arg);

    if warp_result != CE_None {
        gdal_sys::GDALClose(c_tgt_ds);
        return Err(last_gdal_error());
    }
    gdal_sys::GDALFlushCache(c_tgt_ds);

    // (3) read the warped band back out as a flat row-major f32 Vec, NaN already in place.
    let mut data = vec![0f32; out_width as usize * out_height as usize];
    let read_result = gdal_sys::GDALRasterIO(
        tgt_band,
        gdal_sys::GDALRWFlag::GF_Read,
        0,
        0,
        n_pixels,
        n_lines,
        data.as_mut_ptr() as *mut c_void,
        n_pixels,
        n_lines,
        gdal_sys::GDALDataType::GDT_Float32,
        0,
        0,
    );

    gdal_sys::GDALClose(c_tgt_ds);

    if read_result != CE_None {
        return Err(last_gdal_error());
    }

    Ok(WarpedBand { width: out_width, height: out_height, data })
}
