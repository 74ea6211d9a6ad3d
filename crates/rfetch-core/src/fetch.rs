//! The fetch worker: executes one ranged GET into an in-memory buffer,
//! enforcing a per-fetch inactivity watchdog.

use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use std::time::Duration;

use crate::credentials::CredentialSnapshot;
use crate::error::Fault;
use crate::planner::Segment;

/// Executes a single ranged GET for `segment` against `url`, using
/// `snapshot`'s credentials, and returns exactly `segment.len()` bytes on
/// success.
///
/// Applies an inactivity watchdog of `timeout`: if no chunk of the response
/// body arrives within `timeout` of the previous one (or of the request
/// starting), the fetch is abandoned and reported as a [`Fault::Stall`].
pub async fn fetch_segment(
    client: &reqwest::Client,
    url: &str,
    segment: Segment,
    snapshot: &CredentialSnapshot,
    timeout: Duration,
) -> Result<Bytes, Fault> {
    let expected_len = segment.len() as usize;

    let mut request = client.get(url).header("Range", segment.range_header_value());
    request = apply_credentials(request, snapshot);

    let send_result = tokio::time::timeout(timeout, request.send()).await;
    let response = match send_result {
        Err(_) => {
            return Err(Fault::Stall {
                segment: segment.index,
            })
        }
        Ok(Err(e)) => {
            return Err(Fault::Transport {
                segment: segment.index,
                detail: e.to_string(),
            })
        }
        Ok(Ok(resp)) => resp,
    };

    if !response.status().is_success() {
        return Err(Fault::Transport {
            segment: segment.index,
            detail: format!("unexpected status {}", response.status()),
        });
    }

    let mut body = response.bytes_stream();
    let mut buf = BytesMut::with_capacity(expected_len);

    loop {
        match tokio::time::timeout(timeout, body.next()).await {
            Err(_) => {
                return Err(Fault::Stall {
                    segment: segment.index,
                })
            }
            Ok(None) => break,
            Ok(Some(Err(e))) => {
                return Err(Fault::Transport {
                    segment: segment.index,
                    detail: e.to_string(),
                })
            }
            Ok(Some(Ok(chunk))) => buf.extend_from_slice(&chunk),
        }
    }

    if buf.len() != expected_len {
        return Err(Fault::Transport {
            segment: segment.index,
            detail: format!("short response: got {} of {} bytes", buf.len(), expected_len),
        });
    }

    Ok(buf.freeze())
}

/// Applies the snapshot's credentials to an outgoing request. Object-store
/// request signing (e.g. SigV4) is a transport-specific concern handled by
/// whatever `reqwest::Client` middleware the caller installs; this only
/// carries the snapshot's fields through as headers for stores that accept
/// bearer-style credentials directly.
fn apply_credentials(
    request: reqwest::RequestBuilder,
    snapshot: &CredentialSnapshot,
) -> reqwest::RequestBuilder {
    if snapshot.access_key.is_empty() {
        return request;
    }
    let mut request = request.header("X-Rfetch-Access-Key", &snapshot.access_key);
    if let Some(token) = &snapshot.session_token {
        request = request.header("X-Rfetch-Session-Token", token);
    }
    request
}
