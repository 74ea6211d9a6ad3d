//! Tunable transfer parameters, loadable from `~/.config/rfetch/config.toml`.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Default segment size: 384 MiB, sized to keep many requests in flight
/// without any single one dominating the watchdog window.
pub const DEFAULT_SEGMENT_SIZE: u64 = 384 * 1024 * 1024;

/// Default per-fetch inactivity timeout.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(120);

/// Default credential refresh margin: refresh when less than this remains.
pub const DEFAULT_REFRESH_MARGIN: Duration = Duration::from_secs(300);

/// Recognized, persisted configuration options.
///
/// `concurrency_cap` and `memory_cap` are `None` by default, meaning "auto,
/// derived from host memory at startup" (see [`autoscale`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Bytes per range request.
    pub segment_size: u64,
    /// Maximum number of in-flight fetches. `None` means auto-detect from host RAM.
    pub concurrency_cap: Option<usize>,
    /// Maximum number of buffered segments. `None` means auto-detect from host RAM.
    pub memory_cap: Option<usize>,
    /// Per-fetch inactivity timeout, in seconds.
    pub fetch_timeout_secs: u64,
    /// Credential refresh margin, in seconds.
    pub refresh_margin_secs: u64,
    /// Suppress informational progress output.
    pub quiet: bool,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            segment_size: DEFAULT_SEGMENT_SIZE,
            concurrency_cap: None,
            memory_cap: None,
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT.as_secs(),
            refresh_margin_secs: DEFAULT_REFRESH_MARGIN.as_secs(),
            quiet: false,
        }
    }
}

impl TransferConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn refresh_margin(&self) -> Duration {
        Duration::from_secs(self.refresh_margin_secs)
    }

    /// Resolve `concurrency_cap`/`memory_cap`, auto-detecting from host RAM
    /// when either was left unset.
    pub fn resolved_caps(&self) -> (usize, usize) {
        match (self.concurrency_cap, self.memory_cap) {
            (Some(c), Some(m)) => (c, m),
            (c, m) => {
                let (auto_c, auto_m) = autoscale(detect_host_memory_bytes());
                (c.unwrap_or(auto_c), m.unwrap_or(auto_m))
            }
        }
    }
}

/// Buckets host memory into a concurrency/memory-cap pair, conservatively
/// sized so that `memory_cap * DEFAULT_SEGMENT_SIZE` stays a small fraction
/// of total RAM.
pub fn autoscale(host_ram_bytes: Option<u64>) -> (usize, usize) {
    const GIB: u64 = 1024 * 1024 * 1024;
    match host_ram_bytes {
        None => (3, 6),
        Some(ram) if ram <= 128 * GIB => (7, 16),
        Some(ram) if ram <= 384 * GIB => (15, 32),
        Some(_) => (36, 72),
    }
}

/// Best-effort host memory probe. Returns `None` if it cannot be determined,
/// in which case callers fall back to the conservative default bucket.
#[cfg(target_os = "linux")]
fn detect_host_memory_bytes() -> Option<u64> {
    let meminfo = fs::read_to_string("/proc/meminfo").ok()?;
    let line = meminfo.lines().find(|l| l.starts_with("MemTotal:"))?;
    let kib: u64 = line.split_whitespace().nth(1)?.parse().ok()?;
    Some(kib * 1024)
}

#[cfg(not(target_os = "linux"))]
fn detect_host_memory_bytes() -> Option<u64> {
    None
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("rfetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<TransferConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = TransferConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: TransferConfig = toml::from_str(&data)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = TransferConfig::default();
        assert_eq!(cfg.segment_size, DEFAULT_SEGMENT_SIZE);
        assert_eq!(cfg.concurrency_cap, None);
        assert_eq!(cfg.memory_cap, None);
        assert_eq!(cfg.fetch_timeout_secs, 120);
        assert_eq!(cfg.refresh_margin_secs, 300);
        assert!(!cfg.quiet);
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = TransferConfig::default();
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: TransferConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.segment_size, cfg.segment_size);
        assert_eq!(parsed.fetch_timeout_secs, cfg.fetch_timeout_secs);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            segment_size = 1048576
            concurrency_cap = 4
            memory_cap = 8
            fetch_timeout_secs = 30
            refresh_margin_secs = 60
            quiet = true
        "#;
        let cfg: TransferConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.segment_size, 1_048_576);
        assert_eq!(cfg.concurrency_cap, Some(4));
        assert_eq!(cfg.memory_cap, Some(8));
        assert!(cfg.quiet);
    }

    #[test]
    fn autoscale_buckets_by_ram() {
        assert_eq!(autoscale(None), (3, 6));
        assert_eq!(autoscale(Some(64 * 1024 * 1024 * 1024)), (7, 16));
        assert_eq!(autoscale(Some(256 * 1024 * 1024 * 1024)), (15, 32));
        assert_eq!(autoscale(Some(512 * 1024 * 1024 * 1024)), (36, 72));
    }
}
