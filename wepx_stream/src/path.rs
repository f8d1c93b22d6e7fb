/*
 * filesystem layout (§6): `<root>/<model_id>/<ref_time_unix>/<stream_id>.wepx` for stream files
 * and `<lockdir>/<model_id>_<YYYYMMDD>_<HH>.lock` for cycle locks.
 */
use std::path::PathBuf;

pub fn stream_id(internal_id: &str, grib_level: &str) -> String {
    format!("{internal_id}_{grib_level}")
}

pub fn stream_path(root: impl AsRef<std::path::Path>, model_id: &str, ref_time_unix: i64, stream_id: &str) -> PathBuf {
    root.as_ref().join(model_id).join(ref_time_unix.to_string()).join(format!("{stream_id}.wepx"))
}

pub fn lock_path(lockdir: impl AsRef<std::path::Path>, model_id: &str, yyyymmdd: &str, hh: u32) -> PathBuf {
    lockdir.as_ref().join(format!("{model_id}_{yyyymmdd}_{hh:02}.lock"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_id_joins_internal_id_and_level() {
        assert_eq!(stream_id("temp_2m", "surface"), "temp_2m_surface");
    }

    #[test]
    fn stream_path_layout_matches_spec() {
        let p = stream_path("/data", "hrrr", 1_700_000_000, "temp_2m_surface");
        assert_eq!(p, std::path::PathBuf::from("/data/hrrr/1700000000/temp_2m_surface.wepx"));
    }
}
