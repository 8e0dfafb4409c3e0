use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The currently-held credential set. Overwritten wholesale on each refresh,
/// never patched in place.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub token_type: String,
}

impl TokenSet {
    /// An absent `expires_at` means the provider reported no expiry; the
    /// token is treated as valid until the provider rejects it.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => Utc::now() >= expires,
            None => false,
        }
    }

    /// Value for an `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

/// Raw token-endpoint success body. Decoded through serde before any field
/// access; a body without `access_token` fails the decode rather than
/// producing an empty credential.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
    pub token_type: Option<String>,
}

impl TokenResponse {
    /// Convert to a `TokenSet`, computing the absolute expiry instant.
    ///
    /// Providers commonly omit `refresh_token` from refresh responses and
    /// expect the client to keep using the old one, so the previous refresh
    /// token is carried over when the response has none.
    pub fn into_token_set(self, previous_refresh_token: Option<String>) -> TokenSet {
        let expires_at = self
            .expires_in
            .map(|secs| Utc::now() + chrono::Duration::seconds(secs));
        TokenSet {
            access_token: self.access_token,
            refresh_token: self.refresh_token.or(previous_refresh_token),
            expires_at,
            token_type: self.token_type.unwrap_or_else(|| "Bearer".to_string()),
        }
    }
}

/// Raw token-endpoint error body per RFC 6749 section 5.2.
#[derive(Debug, Deserialize)]
pub struct TokenErrorBody {
    pub error: String,
    pub error_description: Option<String>,
}

impl TokenErrorBody {
    /// `invalid_grant` marks a revoked or expired refresh token. Anything
    /// else on the refresh path is treated as retryable by the caller.
    pub fn is_invalid_grant(&self) -> bool {
        self.error == "invalid_grant"
    }
}
