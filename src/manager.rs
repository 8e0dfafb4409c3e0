use std::sync::Arc;

use tokio::sync::Mutex;

use crate::endpoint::{exchange_code, refresh_grant};
use crate::error::TokenkeepError;
use crate::flow::AuthFlowDriver;
use crate::pkce::AuthorizationRequest;
use crate::provider::ProviderConfig;
use crate::store::TokenStore;
use crate::token::TokenSet;

/// Observable lifecycle state.
///
/// A transient refresh failure leaves the manager in `Expired` with the old
/// set untouched, so the caller can retry the refresh without re-authorizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticating,
    Authenticated,
    Expired,
}

struct Inner {
    state: AuthState,
    current: Option<TokenSet>,
}

/// Owns the token set for one provider and keeps it fresh.
///
/// Every mutating operation runs under one async lock held across its network
/// awaits: concurrent `authorize()` callers collapse onto a single flow, and
/// the store's read-modify-write never interleaves with another refresh or a
/// `logout()`. Dropping an in-flight `authorize()` future releases the lock,
/// so an abandoned interactive attempt never wedges the manager.
pub struct TokenLifecycleManager {
    config: ProviderConfig,
    store: Arc<dyn TokenStore>,
    driver: Arc<dyn AuthFlowDriver>,
    store_key: String,
    http: reqwest::Client,
    inner: Mutex<Inner>,
}

impl std::fmt::Debug for TokenLifecycleManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenLifecycleManager")
            .field("store_key", &self.store_key)
            .finish_non_exhaustive()
    }
}

impl TokenLifecycleManager {
    pub fn new(
        config: ProviderConfig,
        store: Arc<dyn TokenStore>,
        driver: Arc<dyn AuthFlowDriver>,
        store_key: impl Into<String>,
    ) -> Self {
        Self {
            config,
            store,
            driver,
            store_key: store_key.into(),
            http: reqwest::Client::new(),
            inner: Mutex::new(Inner {
                state: AuthState::Unauthenticated,
                current: None,
            }),
        }
    }

    /// Guarantee a currently-valid access token is persisted, authorizing or
    /// refreshing as needed.
    ///
    /// Never retries internally: a terminal refresh failure surfaces as
    /// `AuthExpired` with the store cleared, an interactive failure as
    /// `AuthFlowFailed`, and the caller decides whether to re-invoke.
    pub async fn authorize(&self) -> Result<(), TokenkeepError> {
        let mut inner = self.inner.lock().await;

        if let Some(token) = self.load(&mut inner).await? {
            if !token.is_expired() {
                inner.state = AuthState::Authenticated;
                inner.current = Some(token);
                return Ok(());
            }

            inner.state = AuthState::Expired;
            inner.current = Some(token.clone());
            if let Some(refresh_tok) = token.refresh_token {
                self.refresh_locked(&mut inner, &refresh_tok).await?;
                return Ok(());
            }
            // Expired with nothing to refresh with: fall through to a fresh
            // interactive flow.
        }

        self.interactive_locked(&mut inner).await
    }

    /// Exchange a refresh token for a new set and persist it.
    ///
    /// Terminal failure (`invalid_grant`) clears the store and surfaces as
    /// `AuthExpired`; transient failure leaves the previous set in place.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenSet, TokenkeepError> {
        let mut inner = self.inner.lock().await;
        self.refresh_locked(&mut inner, refresh_token).await
    }

    /// Pure read of whatever is currently persisted. Never triggers a flow.
    pub async fn get_tokens(&self) -> Result<Option<TokenSet>, TokenkeepError> {
        let raw = self.store.get(&self.store_key).await?;
        Ok(raw.and_then(|data| serde_json::from_str(&data).ok()))
    }

    /// Clear the persisted set unconditionally. Idempotent.
    pub async fn logout(&self) -> Result<(), TokenkeepError> {
        let mut inner = self.inner.lock().await;
        inner.current = None;
        inner.state = AuthState::Unauthenticated;
        self.store.remove(&self.store_key).await
    }

    pub async fn state(&self) -> AuthState {
        self.inner.lock().await.state
    }

    /// `Authorization` header value for the currently-held set, if valid.
    pub async fn bearer(&self) -> Result<String, TokenkeepError> {
        match self.get_tokens().await? {
            Some(ref token) if !token.is_expired() => Ok(token.bearer()),
            _ => Err(TokenkeepError::AuthRequired(format!(
                "no valid token for '{}'",
                self.store_key
            ))),
        }
    }

    async fn load(&self, inner: &mut Inner) -> Result<Option<TokenSet>, TokenkeepError> {
        match self.store.get(&self.store_key).await {
            // A corrupt persisted set is treated as absent rather than fatal;
            // the flow below will replace it.
            Ok(raw) => Ok(raw.and_then(|data| serde_json::from_str(&data).ok())),
            Err(e) => {
                inner.current = None;
                inner.state = AuthState::Unauthenticated;
                Err(e)
            }
        }
    }

    async fn persist(&self, inner: &mut Inner, set: &TokenSet) -> Result<(), TokenkeepError> {
        let data = serde_json::to_string(set)
            .map_err(|e| TokenkeepError::StoreUnavailable(format!("Failed to serialize token: {e}")))?;
        if let Err(e) = self.store.set(&self.store_key, &data).await {
            inner.current = None;
            inner.state = AuthState::Unauthenticated;
            return Err(e);
        }
        inner.current = Some(set.clone());
        inner.state = AuthState::Authenticated;
        Ok(())
    }

    async fn refresh_locked(
        &self,
        inner: &mut Inner,
        refresh_token: &str,
    ) -> Result<TokenSet, TokenkeepError> {
        match refresh_grant(
            &self.http,
            &self.config.token_endpoint,
            refresh_token,
            &self.config.client_id,
        )
        .await
        {
            Ok(resp) => {
                let set = resp.into_token_set(Some(refresh_token.to_string()));
                self.persist(inner, &set).await?;
                Ok(set)
            }
            Err(TokenkeepError::AuthExpired) => {
                inner.current = None;
                inner.state = AuthState::Unauthenticated;
                self.store.remove(&self.store_key).await?;
                Err(TokenkeepError::AuthExpired)
            }
            Err(e) => {
                tracing::debug!("Token refresh failed: {e}");
                inner.state = AuthState::Expired;
                Err(e)
            }
        }
    }

    async fn interactive_locked(&self, inner: &mut Inner) -> Result<(), TokenkeepError> {
        inner.state = AuthState::Authenticating;
        match self.run_interactive().await {
            Ok(set) => self.persist(inner, &set).await,
            Err(e) => {
                inner.state = AuthState::Unauthenticated;
                Err(e)
            }
        }
    }

    async fn run_interactive(&self) -> Result<TokenSet, TokenkeepError> {
        let redirect_uri = self.driver.redirect_uri().await?;
        let request = AuthorizationRequest::new(redirect_uri);
        let auth_url = self.config.authorization_url(&request);

        tracing::debug!("Starting authorization flow for '{}'", self.store_key);
        let code = self.driver.receive_code(&auth_url, &request.state).await?;

        let resp = exchange_code(
            &self.http,
            &self.config.token_endpoint,
            &code,
            &request.code_verifier,
            &request.redirect_uri,
            &self.config.client_id,
        )
        .await?;
        Ok(resp.into_token_set(None))
    }
}
