use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::callback::listen_for_callback;
use crate::error::TokenkeepError;

/// The interactive half of the authorization-code flow.
///
/// The manager builds the authorization URL; the driver is responsible for
/// presenting it to the user and delivering the code the provider redirects
/// back with. Embedding hosts with their own web views supply their own
/// implementation; tests use a canned one.
#[async_trait]
pub trait AuthFlowDriver: Send + Sync {
    /// Redirect URI to register with the provider for this attempt.
    async fn redirect_uri(&self) -> Result<String, TokenkeepError>;

    /// Present `auth_url` to the user and wait for the code delivery.
    ///
    /// There is no programmatic timeout mandated here; the driver decides
    /// how long to wait and how cancellation surfaces.
    async fn receive_code(
        &self,
        auth_url: &str,
        expected_state: &str,
    ) -> Result<String, TokenkeepError>;
}

impl std::fmt::Debug for dyn AuthFlowDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthFlowDriver").finish()
    }
}

/// Default driver: open the system browser and run a loopback callback
/// listener on a free port.
pub struct BrowserDriver {
    timeout: Duration,
    port: Mutex<Option<u16>>,
}

impl BrowserDriver {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            port: Mutex::new(None),
        }
    }
}

impl Default for BrowserDriver {
    fn default() -> Self {
        Self::new(Duration::from_secs(300))
    }
}

#[async_trait]
impl AuthFlowDriver for BrowserDriver {
    async fn redirect_uri(&self) -> Result<String, TokenkeepError> {
        // Find a free port, then release it so the callback listener can
        // bind it once the browser is open.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();
        drop(listener);

        *self
            .port
            .lock()
            .map_err(|e| TokenkeepError::AuthFlowFailed(e.to_string()))? = Some(port);
        Ok(format!("http://localhost:{port}/callback"))
    }

    async fn receive_code(
        &self,
        auth_url: &str,
        expected_state: &str,
    ) -> Result<String, TokenkeepError> {
        let port = self
            .port
            .lock()
            .map_err(|e| TokenkeepError::AuthFlowFailed(e.to_string()))?
            .ok_or_else(|| {
                TokenkeepError::AuthFlowFailed(
                    "receive_code called before redirect_uri".to_string(),
                )
            })?;

        if webbrowser::open(auth_url).is_err() {
            tracing::warn!("Could not open browser automatically. Please visit:\n{auth_url}");
        }

        listen_for_callback(port, expected_state, self.timeout).await
    }
}
