//! Ambient credential discovery: reads whatever access keys the shell
//! environment already has. Resolving these from a specific object store's
//! own discovery chain (instance metadata, profile files, SSO) is out of
//! scope for the core engine; this is the thin collaborator that plugs into
//! it.

use async_trait::async_trait;
use rfetch_core::credentials::{CredentialProvider, CredentialSnapshot};
use std::time::{Duration, SystemTime};

pub struct EnvCredentialProvider;

#[async_trait]
impl CredentialProvider for EnvCredentialProvider {
    async fn snapshot(&self) -> anyhow::Result<CredentialSnapshot> {
        let access_key = std::env::var("RFETCH_ACCESS_KEY_ID").unwrap_or_default();
        if access_key.is_empty() {
            // No ambient credentials configured; pass through and let the
            // transport rely on whatever it already has (e.g. a public
            // object, or a Range-capable URL that needs no auth at all).
            return Ok(CredentialSnapshot::pass_through());
        }
        let secret_key = std::env::var("RFETCH_SECRET_ACCESS_KEY").unwrap_or_default();
        let session_token = std::env::var("RFETCH_SESSION_TOKEN").ok();
        let region = std::env::var("RFETCH_REGION").ok();

        Ok(CredentialSnapshot {
            access_key,
            secret_key,
            session_token,
            region,
            // The environment doesn't expose an expiry; treat it as valid
            // for a conservative hour so the cache still exercises its
            // refresh path on very long transfers.
            expires_at: SystemTime::now() + Duration::from_secs(3600),
        })
    }
}
