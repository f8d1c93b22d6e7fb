/*
 * URL path -> `.wepx` file path mapping (§4.6: "URL path → data/<path>.wepx"). Rejects any path
 * that would escape `data_root` (`..` segments, absolute components) - a client is only ever
 * allowed to read a stream file, never anything else under the process's working directory.
 */
use std::path::{Path, PathBuf};

use crate::errors::{Result, WepxServerError};

pub fn resolve_stream_path(data_root: &Path, request_path: &str) -> Result<PathBuf> {
    let trimmed = request_path.trim_start_matches('/');
    if trimmed.is_empty() {
        return Err(WepxServerError::InvalidPath(request_path.to_string()));
    }

    let mut resolved = data_root.to_path_buf();
    for segment in trimmed.split('/') {
        match segment {
            "" | "." => continue,
            ".." => return Err(WepxServerError::InvalidPath(request_path.to_string())),
            seg => resolved.push(seg),
        }
    }
    resolved.set_extension("wepx");
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_path_segments_onto_wepx_file() {
        let root = Path::new("data");
        let resolved = resolve_stream_path(root, "/hrdps/1700000000/temp_2m_surface").unwrap();
        assert_eq!(resolved, PathBuf::from("data/hrdps/1700000000/temp_2m_surface.wepx"));
    }

    #[test]
    fn rejects_parent_dir_escape() {
        let root = Path::new("data");
        assert!(resolve_stream_path(root, "/../../etc/passwd").is_err());
    }
}
