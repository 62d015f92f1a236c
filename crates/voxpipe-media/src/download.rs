//! HTTP download of remote media to staged local files.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use url::Url;

use crate::error::{MediaError, MediaResult};

/// Download `url` into `out_dir`, keeping the remote filename when the URL
/// path has one.
pub async fn download_to_dir(url: &str, out_dir: &Path, fallback_name: &str) -> MediaResult<PathBuf> {
    let parsed = Url::parse(url).map_err(|e| {
        MediaError::download_failed(format!("invalid url {:?}: {}", url, e))
    })?;

    let filename = parsed
        .path_segments()
        .and_then(|segments| segments.last())
        .filter(|s| !s.is_empty())
        .unwrap_or(fallback_name)
        .to_string();

    let dest = out_dir.join(filename);
    debug!("Downloading {} to {}", url, dest.display());

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(600))
        .connect_timeout(Duration::from_secs(10))
        .build()?;

    let response = client.get(parsed).send().await?;
    if !response.status().is_success() {
        return Err(MediaError::download_failed(format!(
            "{} returned {}",
            url,
            response.status()
        )));
    }

    // Media files can be large; stream to disk instead of buffering the
    // whole body in memory.
    let mut stream = response.bytes_stream();
    let mut file = tokio::fs::File::create(&dest).await?;
    let mut written: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        written += chunk.len() as u64;
        file.write_all(&chunk).await?;
    }
    file.flush().await?;

    if written == 0 {
        return Err(MediaError::download_failed(format!("{} returned an empty body", url)));
    }

    info!("Downloaded {} ({} bytes) to {}", url, written, dest.display());
    Ok(dest)
}
