//! Object-size lookup: resolves the total size the engine needs before it
//! can plan a single segment. A `TransferJob` requires this up front, so an
//! object whose size can't be determined is rejected here rather than inside
//! the engine.

use anyhow::{bail, Context, Result};

/// Probes `url` for its total size via HEAD, falling back to a 1-byte Range
/// GET for servers that reject HEAD or omit Content-Length on it.
pub async fn resolve_size(client: &reqwest::Client, url: &str) -> Result<u64> {
    if let Some(size) = head_content_length(client, url).await? {
        return Ok(size);
    }

    let probe = client
        .get(url)
        .header("Range", "bytes=0-0")
        .send()
        .await
        .context("probe GET failed")?;

    if let Some(size) = content_range_total(&probe) {
        return Ok(size);
    }
    if let Some(size) = probe.content_length() {
        return Ok(size);
    }

    bail!("could not determine object size for {url}");
}

async fn head_content_length(client: &reqwest::Client, url: &str) -> Result<Option<u64>> {
    let response = match client.head(url).send().await {
        Ok(r) => r,
        Err(_) => return Ok(None), // server may reject HEAD; fall back to Range probe
    };
    if !response.status().is_success() {
        return Ok(None);
    }
    Ok(response.content_length())
}

fn content_range_total(response: &reqwest::Response) -> Option<u64> {
    let header = response
        .headers()
        .get(reqwest::header::CONTENT_RANGE)
        .and_then(|v| v.to_str().ok());
    parse_content_range_total(header)
}

/// Parses the object's total size out of a `Content-Range` header value
/// (e.g. `"bytes 0-0/12345"` -> `Some(12345)`). Split out from
/// [`content_range_total`] so the parsing logic is testable without a live
/// HTTP response.
fn parse_content_range_total(header: Option<&str>) -> Option<u64> {
    header
        .and_then(|v| v.rsplit('/').next())
        .and_then(|v| v.parse::<u64>().ok())
}
