use chrono::{DateTime, Duration, Utc};

/// Refresh this long before the token actually expires, so a token handed to
/// an outbound request does not die mid-flight.
const SAFETY_MARGIN_SECS: i64 = 60;

/// A cached client-credentials access token with its wall-clock expiry.
#[derive(Debug, Clone)]
pub struct TokenCache {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl TokenCache {
    pub fn new(access_token: String, now: DateTime<Utc>, expires_in_secs: i64) -> Self {
        Self {
            access_token,
            expires_at: now + Duration::seconds(expires_in_secs),
        }
    }

    /// Usable iff `now` is still inside the expiry minus the safety margin.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at - Duration::seconds(SAFETY_MARGIN_SECS)
    }
}
