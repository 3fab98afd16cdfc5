//! Token lifetime policy keyed by client id.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;

use crate::config::{MAX_TTL_SECS, TokenConfig};

/// Lifetimes applied at issuance time.
///
/// Access tokens default to a short lifetime; clients listed as trusted
/// (the bundled frontend) get their own, longer one.
#[derive(Debug, Clone)]
pub struct TtlPolicy {
    access_token: Duration,
    refresh_token: Duration,
    auth_code: Duration,
    trusted_clients: HashMap<String, Duration>,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self::from_config(&TokenConfig::default())
    }
}

impl TtlPolicy {
    #[must_use]
    pub fn from_config(config: &TokenConfig) -> Self {
        Self {
            access_token: seconds(config.access_token_ttl_secs),
            refresh_token: seconds(config.refresh_token_ttl_secs),
            auth_code: seconds(config.auth_code_ttl_secs),
            trusted_clients: config
                .trusted_clients
                .iter()
                .map(|client| {
                    (
                        client.client_id.clone(),
                        seconds(client.access_token_ttl_secs),
                    )
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn is_trusted(&self, client_id: &str) -> bool {
        self.trusted_clients.contains_key(client_id)
    }

    #[must_use]
    pub fn access_token_ttl(&self, client_id: &str) -> Duration {
        self.trusted_clients
            .get(client_id)
            .copied()
            .unwrap_or(self.access_token)
    }

    #[must_use]
    pub const fn refresh_token_ttl(&self) -> Duration {
        self.refresh_token
    }

    #[must_use]
    pub const fn auth_code_ttl(&self) -> Duration {
        self.auth_code
    }

    #[must_use]
    pub fn access_token_expiration(&self, client_id: &str, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.access_token_ttl(client_id)
    }

    #[must_use]
    pub fn refresh_token_expiration(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.refresh_token
    }

    #[must_use]
    pub fn auth_code_expiration(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.auth_code
    }
}

fn seconds(secs: u64) -> Duration {
    let capped = secs.min(MAX_TTL_SECS);
    Duration::seconds(i64::try_from(capped).unwrap_or(i64::from(u32::MAX)))
}
