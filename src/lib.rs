pub mod callback;
pub mod endpoint;
pub mod error;
pub mod flow;
pub mod global;
pub mod manager;
pub mod pkce;
pub mod provider;
pub mod retry;
pub mod store;
pub mod token;

pub use error::TokenkeepError;
pub use flow::{AuthFlowDriver, BrowserDriver};
pub use manager::{AuthState, TokenLifecycleManager};
pub use pkce::{generate_pkce, AuthorizationRequest, PkceChallenge};
pub use provider::ProviderConfig;
pub use retry::RetryPolicy;
pub use store::{FileTokenStore, MemoryTokenStore, TokenStore};
pub use token::{TokenResponse, TokenSet};

/// One-shot convenience: ensure freshness, then return the bearer credential.
pub async fn access_token(manager: &TokenLifecycleManager) -> Result<String, TokenkeepError> {
    manager.authorize().await?;
    match manager.get_tokens().await? {
        Some(set) => Ok(set.access_token),
        None => Err(TokenkeepError::AuthRequired(
            "authorization completed but no token was persisted".into(),
        )),
    }
}
