//! Minimal HTTP/1.1 server that supports ranged GET, for integration tests.
//!
//! Serves a single static body. Responds to GET with Range with 206 Partial
//! Content; a request with no Range header gets the full body with 200.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone, Copy)]
pub struct RangeServerOptions {
    /// Never responds, so a client's inactivity watchdog is exercised.
    pub stall: bool,
}

impl Default for RangeServerOptions {
    fn default() -> Self {
        Self { stall: false }
    }
}

/// Starts a server in a background thread serving `body`. Returns the full
/// object URL (e.g. "http://127.0.0.1:12345/object"). Runs until the process
/// exits; tests don't need to tear it down explicitly.
pub fn start(body: Vec<u8>) -> String {
    start_with_options(body, RangeServerOptions::default())
}

pub fn start_with_options(body: Vec<u8>, opts: RangeServerOptions) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            thread::spawn(move || handle(stream, &body, opts));
        }
    });
    format!("http://127.0.0.1:{}/object", port)
}

fn handle(mut stream: std::net::TcpStream, body: &[u8], opts: RangeServerOptions) {
    if opts.stall {
        loop {
            thread::sleep(std::time::Duration::from_secs(3600));
        }
    }

    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(5)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(5)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let range = parse_range(request);
    let total = body.len() as u64;

    let (status, content_range, slice) = match range {
        Some((start, end_incl)) => {
            let start = start.min(total);
            let end_incl = end_incl.min(total.saturating_sub(1));
            if total == 0 || start > end_incl {
                ("416 Range Not Satisfiable", format!("bytes */{}", total), &body[0..0])
            } else {
                let end_excl = (end_incl + 1).min(total) as usize;
                let slice = &body[start as usize..end_excl];
                (
                    "206 Partial Content",
                    format!("bytes {}-{}/{}", start, end_excl.saturating_sub(1), total),
                    slice,
                )
            }
        }
        None => (
            "200 OK",
            format!("bytes 0-{}/{}", total.saturating_sub(1), total),
            body,
        ),
    };

    let response = format!(
        "HTTP/1.1 {}\r\nContent-Length: {}\r\nContent-Range: {}\r\nConnection: close\r\n\r\n",
        status,
        slice.len(),
        content_range
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.write_all(slice);
}

/// Extracts a `Range: bytes=X-Y` header as `(start, end_inclusive)`.
/// `end_inclusive` is `u64::MAX` when the range is open-ended (`bytes=X-`).
fn parse_range(request: &str) -> Option<(u64, u64)> {
    for line in request.lines() {
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("range") {
                let value = value.trim();
                let spec = value.strip_prefix("bytes=")?;
                let (start_s, end_s) = spec.split_once('-')?;
                let start = start_s.trim().parse::<u64>().unwrap_or(0);
                let end = end_s.trim();
                let end_incl = if end.is_empty() {
                    u64::MAX
                } else {
                    end.parse::<u64>().unwrap_or(0)
                };
                return Some((start, end_incl));
            }
        }
        if line.trim().is_empty() {
            break;
        }
    }
    None
}
