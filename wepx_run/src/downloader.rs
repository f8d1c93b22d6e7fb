/*
 * downloader contract (§4.8), grounded on the teacher's `odin_hrrr::download_file` /
 * `download_file_with_retry` (stream to a tempfile, verify nonzero size, rename into place) but
 * reworked as a single retrying async function over a generic URL rather than an HRRR-specific
 * NOMADS query builder.
 */
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Client;
use tracing::{info, warn};

use wepx_common::fs::ensure_dir;

pub struct DownloadOptions {
    pub email: Option<String>,
    pub retry_delay: Duration,
    pub max_retries: u32,
    pub auth: Option<(String, String)>,
    pub output_path: Option<PathBuf>,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        DownloadOptions { email: None, retry_delay: Duration::from_secs(30), max_retries: 30, auth: None, output_path: None }
    }
}

/// §4.8: `download(url, opts) -> path | false`. Returns `None` on exhausted retries rather than
/// erroring, matching §4.7's "download failure after max retries: skip URL, continue."
pub async fn download(client: &Client, url: &str, opts: &DownloadOptions) -> Option<PathBuf> {
    let mut attempt = 0u32;
    loop {
        match try_download_once(client, url, opts).await {
            Ok(path) => return Some(path),
            Err(e) => {
                if attempt >= opts.max_retries {
                    warn!(url, error = %e, attempt, "download failed, giving up");
                    return None;
                }
                warn!(url, error = %e, attempt, "download attempt failed, retrying");
                attempt += 1;
                tokio::time::sleep(opts.retry_delay).await;
            }
        }
    }
}

async fn try_download_once(client: &Client, url: &str, opts: &DownloadOptions) -> Result<PathBuf, String> {
    let output_path = match &opts.output_path {
        Some(p) => p.clone(),
        None => derive_output_path(url),
    };
    if let Some(parent) = output_path.parent() {
        ensure_dir(parent).map_err(|e| e.to_string())?;
    }

    let mut request = client.get(url);
    if let Some((user, pass)) = &opts.auth {
        request = request.basic_auth(user, Some(pass));
    }
    if let Some(email) = &opts.email {
        request = request.header("User-Agent", format!("wepx/1.0 (contact: {email})"));
    }

    let mut response = request.send().await.map_err(|e| e.to_string())?;
    if !response.status().is_success() {
        return Err(format!("request failed with status {}", response.status()));
    }

    let mut tmp = tempfile::NamedTempFile::new().map_err(|e| e.to_string())?;
    while let Some(chunk) = response.chunk().await.map_err(|e| e.to_string())? {
        tmp.write_all(&chunk).map_err(|e| e.to_string())?;
    }

    let len = tmp.as_file().metadata().map_err(|e| e.to_string())?.len();
    if len == 0 {
        return Err("downloaded file is empty".to_string());
    }

    std::fs::rename(tmp.path(), &output_path).map_err(|e| e.to_string())?;
    info!(url, bytes = len, path = %output_path.display(), "download complete");
    Ok(output_path)
}

/// a sensible output filename derived from the URL's query parameters when the caller doesn't
/// supply one (§4.8). Falls back to the last path segment, then a fixed name.
fn derive_output_path(url: &str) -> PathBuf {
    let parsed = reqwest::Url::parse(url).ok();

    if let Some(parsed) = &parsed {
        if let Some(file_param) = parsed.query_pairs().find(|(k, _)| k == "file").map(|(_, v)| v.into_owned()) {
            return std::env::temp_dir().join(file_param);
        }
        let query_name: String = parsed
            .query_pairs()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("_")
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-' { c } else { '_' })
            .collect();
        if !query_name.is_empty() {
            return std::env::temp_dir().join(query_name);
        }
        if let Some(last_segment) = parsed.path_segments().and_then(|mut s| s.next_back()) {
            if !last_segment.is_empty() {
                return std::env::temp_dir().join(last_segment);
            }
        }
    }
    std::env::temp_dir().join("wepx_download.bin")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_derived_from_file_query_param() {
        let path = derive_output_path("https://example.test/cgi-bin/fetch?dir=x&file=hrrr.t00z.f003.grib2");
        assert_eq!(path.file_name().unwrap(), "hrrr.t00z.f003.grib2");
    }

    #[test]
    fn filename_falls_back_to_last_path_segment() {
        let path = derive_output_path("https://example.test/data/hrdps_00z.grib2");
        assert_eq!(path.file_name().unwrap(), "hrdps_00z.grib2");
    }
}
