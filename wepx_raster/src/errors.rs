use thiserror::Error;

pub type Result<T> = std::result::Result<T, WepxRasterError>;

#[derive(Error, Debug)]
pub enum WepxRasterError {
    #[error("gdal error {0}")]
    Gdal(#[from] wepx_gdal::errors::WepxGdalError),

    #[error("no spatial reference system for raster")]
    NoSpatialReferenceSystem,

    #[error("band {0} not found")]
    BandNotFound(isize),
}
