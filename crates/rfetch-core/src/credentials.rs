//! Credential snapshot caching with a refresh margin.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::sync::Mutex;

/// A point-in-time set of credentials plus the instant they stop being valid.
#[derive(Debug, Clone)]
pub struct CredentialSnapshot {
    pub access_key: String,
    pub secret_key: String,
    pub session_token: Option<String>,
    pub region: Option<String>,
    pub expires_at: SystemTime,
}

impl CredentialSnapshot {
    /// A sentinel snapshot used when no provider is configured: carries no
    /// credentials and never expires, so the transport falls back to
    /// whatever ambient mechanism (if any) it already has.
    pub fn pass_through() -> Self {
        Self {
            access_key: String::new(),
            secret_key: String::new(),
            session_token: None,
            region: None,
            expires_at: SystemTime::now() + Duration::from_secs(u64::MAX / 2),
        }
    }

    fn remaining(&self, now: SystemTime) -> Duration {
        self.expires_at
            .duration_since(now)
            .unwrap_or(Duration::ZERO)
    }
}

/// Produces credential snapshots on demand. Implementations talk to whatever
/// ambient discovery mechanism is in scope (environment variables, an
/// instance-metadata endpoint, an STS assume-role call); the engine itself
/// is agnostic to which.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn snapshot(&self) -> anyhow::Result<CredentialSnapshot>;
}

/// A provider that always returns the same, already-resolved snapshot.
/// Useful for callers that resolve credentials once up front and for tests.
pub struct StaticCredentialProvider(CredentialSnapshot);

impl StaticCredentialProvider {
    pub fn new(snapshot: CredentialSnapshot) -> Self {
        Self(snapshot)
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentialProvider {
    async fn snapshot(&self) -> anyhow::Result<CredentialSnapshot> {
        Ok(self.0.clone())
    }
}

/// Caches the current credential snapshot, refreshing it from the provider
/// when less than `margin` remains before expiry.
pub struct CredentialCache {
    provider: Arc<dyn CredentialProvider>,
    margin: Duration,
    current: Mutex<Option<CredentialSnapshot>>,
}

impl CredentialCache {
    pub fn new(provider: Arc<dyn CredentialProvider>, margin: Duration) -> Self {
        Self {
            provider,
            margin,
            current: Mutex::new(None),
        }
    }

    /// Returns a snapshot valid for at least `margin` from now, refreshing
    /// from the provider first if the cached one is missing or too close to
    /// expiry.
    pub async fn current(&self) -> anyhow::Result<CredentialSnapshot> {
        let mut slot = self.current.lock().await;
        let now = SystemTime::now();
        let needs_refresh = match slot.as_ref() {
            None => true,
            Some(snap) => snap.remaining(now) < self.margin,
        };
        if needs_refresh {
            let fresh = self.provider.snapshot().await?;
            *slot = Some(fresh.clone());
            return Ok(fresh);
        }
        Ok(slot.as_ref().unwrap().clone())
    }
}
