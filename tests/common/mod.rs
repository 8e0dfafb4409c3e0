use std::sync::Arc;

use async_trait::async_trait;
use tokenkeep::{
    AuthFlowDriver, MemoryTokenStore, ProviderConfig, TokenLifecycleManager, TokenSet,
    TokenStore, TokenkeepError,
};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const STORE_KEY: &str = "test-provider";

/// Driver that skips the browser and delivers a canned authorization code,
/// as if the provider redirect had already happened.
pub struct StaticDriver {
    pub code: String,
}

#[async_trait]
impl AuthFlowDriver for StaticDriver {
    async fn redirect_uri(&self) -> Result<String, TokenkeepError> {
        Ok("http://localhost:9000/callback".to_string())
    }

    async fn receive_code(&self, _: &str, _: &str) -> Result<String, TokenkeepError> {
        Ok(self.code.clone())
    }
}

pub fn provider_config(server_uri: &str) -> ProviderConfig {
    ProviderConfig::new(
        "test-client",
        format!("{server_uri}/authorize"),
        format!("{server_uri}/token"),
        vec!["profile".to_string()],
    )
}

#[allow(dead_code)]
pub fn manager_with_store(
    server_uri: &str,
    store: Arc<dyn TokenStore>,
    code: &str,
) -> TokenLifecycleManager {
    TokenLifecycleManager::new(
        provider_config(server_uri),
        store,
        Arc::new(StaticDriver { code: code.into() }),
        STORE_KEY,
    )
}

#[allow(dead_code)]
pub fn manager(server_uri: &str, code: &str) -> (TokenLifecycleManager, Arc<MemoryTokenStore>) {
    let store = Arc::new(MemoryTokenStore::new());
    let m = manager_with_store(server_uri, store.clone(), code);
    (m, store)
}

#[allow(dead_code)]
pub async fn seed_token(store: &dyn TokenStore, set: &TokenSet) {
    store
        .set(STORE_KEY, &serde_json::to_string(set).unwrap())
        .await
        .unwrap();
}

#[allow(dead_code)]
pub fn expired_set(access: &str, refresh: Option<&str>) -> TokenSet {
    TokenSet {
        access_token: access.into(),
        refresh_token: refresh.map(Into::into),
        expires_at: Some(chrono::Utc::now() - chrono::Duration::seconds(10)),
        token_type: "Bearer".into(),
    }
}

/// Mount a code-exchange mock answering with the given tokens.
#[allow(dead_code)]
pub async fn mock_code_exchange(
    server: &MockServer,
    code: &str,
    body: serde_json::Value,
    expected_calls: u64,
) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains(format!("code={code}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(expected_calls)
        .mount(server)
        .await;
}

/// Mount a refresh-grant mock answering with the given status and body.
#[allow(dead_code)]
pub async fn mock_refresh(
    server: &MockServer,
    refresh_token: &str,
    response: ResponseTemplate,
    expected_calls: u64,
) {
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains(format!("refresh_token={refresh_token}")))
        .respond_with(response)
        .expect(expected_calls)
        .mount(server)
        .await;
}
