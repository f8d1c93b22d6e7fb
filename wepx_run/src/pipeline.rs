/*
 * the run orchestrator (C5, §4.5): per-cycle pipeline that downloads every URL a model's
 * scheduler generated, opens each raster, matches bands against the model's configured
 * variables, and drives each matching band through a per-stream [`wepx_stream::Stream`]. This is
 * the "glue" component - it owns no algorithm of its own, only the sequencing the teacher's
 * `odin_hrrr::run_downloads` spells out for its own (single-variable, HRRR-specific) pipeline,
 * generalized to many variables and bands per cycle (see DESIGN.md).
 */
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use reqwest::Client;
use tracing::{info, warn};

use wepx_action::DataAction;
use wepx_codec::FrameType;
use wepx_common::BoundingBox;
use wepx_model::ModelConfig;
use wepx_raster::{best_width_for_wgs84, extent_in_wgs84, RasterDataset};
use wepx_stream::{stream_id, stream_path, Stream};

use crate::downloader::{download, DownloadOptions};
use crate::errors::Result;
use crate::formula::Formula;
use crate::lock::CycleLock;

/// parameters for one orchestrator run, shared across every cycle it drives.
pub struct OrchestratorConfig {
    pub out_root: PathBuf,
    pub lockdir: PathBuf,
    pub download_opts: DownloadOptions,
}

/// one frame's worth of notification data, delivered to the caller-supplied
/// [`DataAction<FrameAppended>`] after every successful [`wepx_stream::Stream::append`] (SPEC_FULL
/// §4.5 "new" notification hook) - grounded on `odin_hrrr::run_downloads`'s generic
/// `A: DataAction<HrrrFileAvailable>` parameter.
#[derive(Debug, Clone)]
pub struct FrameAppended {
    pub model_id: String,
    pub stream_id: String,
    pub path: PathBuf,
    pub frame_type: FrameType,
    pub valid_time: u32,
}

/// §4.5: for a model whose status is READY at tick time, acquire its cycle lock, build the task
/// from `model` + `cycle_time`, and drive every URL through download -> match -> append. Returns
/// `Ok(false)` (not an error) when another worker already holds the lock (§8 property 7).
pub async fn run_cycle<A>(client: &Client, cfg: &OrchestratorConfig, model: &ModelConfig, cycle_time: DateTime<Utc>, frame_action: &A) -> Result<bool>
where
    A: DataAction<FrameAppended>,
{
    let Some(_lock) = CycleLock::try_acquire(&cfg.lockdir, &model.metadata.id, cycle_time)? else {
        info!(model = %model.metadata.id, %cycle_time, "cycle already locked by another worker, skipping");
        return Ok(false);
    };

    let urls = model.generate_urls(cycle_time);
    info!(model = %model.metadata.id, %cycle_time, n_urls = urls.len(), "starting cycle");

    let mut streams: HashMap<String, Stream> = HashMap::new();

    for url in &urls {
        let Some(local_path) = download(client, url, &cfg.download_opts).await else {
            warn!(url, "download failed after max retries, skipping URL");
            continue;
        };

        if let Err(e) = process_file(&local_path, model, cycle_time, &cfg.out_root, &mut streams, frame_action).await {
            warn!(url, error = %e, "failed to process downloaded file, skipping URL");
        }
    }

    info!(model = %model.metadata.id, %cycle_time, n_streams = streams.len(), "cycle complete");
    Ok(true)
}

/// one URL's worth of work (§4.5 step 3): open the raster, compute its WGS84 width/extent once,
/// then match every configured variable against a band and append its reprojected grid.
async fn process_file<A>(
    path: &Path,
    model: &ModelConfig,
    cycle_time: DateTime<Utc>,
    out_root: &Path,
    streams: &mut HashMap<String, Stream>,
    frame_action: &A,
) -> Result<()>
where
    A: DataAction<FrameAppended>,
{
    let raster = RasterDataset::open(path)?;
    let width = best_width_for_wgs84(path);
    let extent = extent_in_wgs84(path, &model.metadata.id)?;
    let height = ((width as f64) / extent.aspect_ratio().max(f64::EPSILON)).round().max(1.0) as u32;
    let extent_arr = extent.to_lat_lon_array();

    for variable in &model.variables {
        let expected_level = if variable.grib_level.is_empty() { None } else { Some(variable.grib_level.as_str()) };
        let band_index = match raster.find_band(&variable.grib_id, expected_level) {
            Ok(Some(idx)) => idx,
            Ok(None) => continue, // no band in this file matches this variable
            Err(e) => {
                warn!(variable = %variable.internal_id, error = %e, "band lookup failed, skipping variable");
                continue;
            }
        };

        if let Err(e) = process_band(&raster, band_index, variable, model, cycle_time, width, height, &extent_arr, out_root, streams, frame_action).await {
            warn!(variable = %variable.internal_id, error = %e, "band processing failed, skipping band");
        }
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn process_band<A>(
    raster: &RasterDataset,
    band_index: isize,
    variable: &wepx_model::VariableConfig,
    model: &ModelConfig,
    cycle_time: DateTime<Utc>,
    width: u32,
    height: u32,
    extent_arr: &[f64; 4],
    out_root: &Path,
    streams: &mut HashMap<String, Stream>,
    frame_action: &A,
) -> Result<()>
where
    A: DataAction<FrameAppended>,
{
    let metadata = raster.band_metadata(band_index)?;

    let bbox = BoundingBox::new(extent_arr[1], extent_arr[0], extent_arr[3], extent_arr[2]);
    let warped = raster.reproject_band(band_index, width, height, &bbox)?;
    debug_assert_eq!(warped.len(), (width as usize) * (height as usize));

    // the formula is a pointwise transform and reprojection here is nearest-neighbour (no
    // blending of source pixels), so applying it to the warped grid is equivalent to applying it
    // before reprojection (§4.5) while letting `wepx_gdal::warp` stay in charge of resampling the
    // raw GDAL band directly.
    let warped = match &variable.formula {
        Some(src) => Formula::parse(src)?.apply(&warped),
        None => warped,
    };

    let ref_time = metadata.get("GRIB_REF_TIME").and_then(|s| parse_grib_time(s)).unwrap_or_else(|| cycle_time.timestamp());
    let valid_time = metadata.get("GRIB_VALID_TIME").and_then(|s| parse_grib_time(s)).unwrap_or(ref_time);

    let sid = stream_id(&variable.internal_id, &variable.grib_level);
    let path = stream_path(out_root, &model.metadata.id, ref_time, &sid);

    let stream = streams.entry(sid.clone()).or_insert_with(|| Stream::new(&path));
    let was_new = stream.state().is_none();
    stream.append(&warped, width, height, Some(*extent_arr), valid_time as u32)?;

    let frame_type = if was_new {
        FrameType::I
    } else {
        let n = stream.state().expect("state set by append").frame_count() - 1;
        if wepx_codec::is_periodic_i_frame(n) { FrameType::I } else { FrameType::P }
    };

    let appended = FrameAppended { model_id: model.metadata.id.clone(), stream_id: sid, path, frame_type, valid_time: valid_time as u32 };
    if let Err(e) = frame_action.execute(appended).await {
        warn!(variable = %variable.internal_id, error = %e, "frame notification action failed");
    }

    Ok(())
}

/// GDAL GRIB metadata timestamps look like `"1690000000 sec UTC"` - take the leading integer.
fn parse_grib_time(s: &str) -> Option<i64> {
    s.split_whitespace().next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grib_time_parses_leading_integer() {
        assert_eq!(parse_grib_time("1690000000 sec UTC"), Some(1690000000));
        assert_eq!(parse_grib_time("not a time"), None);
    }
}
