/*
 * wepx_raster - the raster ingest adapter (§4.3): opens GRIB/NetCDF/GeoTIFF datasets, matches
 * bands by GRIB metadata, and reprojects them onto the regular WGS84 grid the codec expects.
 */
#![allow(unused)]

pub mod errors;
pub mod extent;
pub mod raster;

pub use errors::{Result, WepxRasterError};
pub use extent::{best_width_for_wgs84, extent_in_wgs84};
pub use raster::{BandInfo, RasterDataset};
