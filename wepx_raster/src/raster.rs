/*
 * the raster ingest adapter's `open`/`bands`/`reproject_to_wgs84` contract (§4.3), backed by
 * `wepx_gdal`. Band metadata (GRIB_ELEMENT/GRIB_SHORT_NAME/GRIB_REF_TIME/GRIB_VALID_TIME) is read
 * the same way the teacher reads GOES-R projection metadata - iterate `Metadata::metadata()` into
 * a plain map - just at band level instead of dataset level (see DESIGN.md).
 */
use std::collections::HashMap;
use std::path::Path;

use wepx_common::BoundingBox;
use wepx_gdal::{Buffer, Dataset, GeoTransform, Metadata, MetadataEntry};

use crate::errors::{Result, WepxRasterError};

pub struct RasterDataset {
    ds: Dataset,
}

/// one GRIB/GeoTIFF/NetCDF band and the metadata keys the run orchestrator matches variables on.
pub struct BandInfo {
    pub index: isize,
    pub metadata: HashMap<String, String>,
}

impl RasterDataset {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let ds = Dataset::open(path.as_ref()).map_err(wepx_gdal::errors::gdal_error)?;
        Ok(RasterDataset { ds })
    }

    pub fn size(&self) -> (usize, usize) {
        self.ds.raster_size()
    }

    pub fn geo_transform(&self) -> Result<GeoTransform> {
        Ok(self.ds.geo_transform().map_err(wepx_gdal::errors::gdal_error)?)
    }

    pub fn spatial_ref(&self) -> Result<wepx_gdal::SpatialRef> {
        self.ds
            .spatial_ref()
            .ok()
            .or_else(|| self.ds.gcp_spatial_ref())
            .ok_or(WepxRasterError::NoSpatialReferenceSystem)
    }

    pub fn band_count(&self) -> isize {
        self.ds.raster_count() as isize
    }

    /// 1-based GDAL band metadata, as a plain key/value map.
    pub fn band_metadata(&self, index: isize) -> Result<HashMap<String, String>> {
        let band = self.ds.rasterband(index).map_err(wepx_gdal::errors::gdal_error)?;
        let mut map = HashMap::new();
        for MetadataEntry { domain: _, key, value } in band.metadata() {
            map.insert(key, value);
        }
        Ok(map)
    }

    pub fn bands(&self) -> Result<Vec<BandInfo>> {
        let mut out = Vec::with_capacity(self.band_count() as usize);
        for index in 1..=self.band_count() {
            out.push(BandInfo { index, metadata: self.band_metadata(index)? });
        }
        Ok(out)
    }

    /// first band whose GRIB_ELEMENT matches exactly and whose GRIB_SHORT_NAME matches
    /// `expected_level` when one is given (§4.5 - "level either unspecified ... or exact match").
    pub fn find_band(&self, grib_element: &str, expected_level: Option<&str>) -> Result<Option<isize>> {
        for band in self.bands()? {
            let element_matches = band.metadata.get("GRIB_ELEMENT").map(String::as_str) == Some(grib_element);
            if !element_matches {
                continue;
            }
            let level_matches = match expected_level {
                None => true,
                Some(level) => band.metadata.get("GRIB_SHORT_NAME").map(String::as_str) == Some(level),
            };
            if level_matches {
                return Ok(Some(band.index));
            }
        }
        Ok(None)
    }

    /// read a band into a flat row-major f32 array, mapping GDAL nodata to NaN.
    pub fn read_band_f32(&self, index: isize) -> Result<Vec<f32>> {
        let band = self.ds.rasterband(index).map_err(wepx_gdal::errors::gdal_error)?;
        let (w, h) = band.size();
        let buf: Buffer<f32> =
            band.read_as((0, 0), (w, h), (w, h), None).map_err(wepx_gdal::errors::gdal_error)?;
        let mut data = buf.data;
        if let Some(nodata) = band.no_data_value() {
            let nodata = nodata as f32;
            for v in data.iter_mut() {
                if *v == nodata {
                    *v = f32::NAN;
                }
            }
        }
        Ok(data)
    }

    /// reproject one band onto a `width x height` WGS84 grid covering `bbox`, nodata already NaN.
    pub fn reproject_band(&self, index: isize, width: u32, height: u32, bbox: &BoundingBox<f64>) -> Result<Vec<f32>> {
        let warped = wepx_gdal::warp::reproject_band_to_wgs84(&self.ds, index, width, height, bbox)?;
        Ok(warped.data)
    }
}
