use crate::error::TokenkeepError;
use crate::token::{TokenErrorBody, TokenResponse};

/// Exchange an authorization code for a token set (PKCE code exchange).
pub async fn exchange_code(
    http: &reqwest::Client,
    token_endpoint: &str,
    code: &str,
    code_verifier: &str,
    redirect_uri: &str,
    client_id: &str,
) -> Result<TokenResponse, TokenkeepError> {
    let resp = http
        .post(token_endpoint)
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("code_verifier", code_verifier),
            ("redirect_uri", redirect_uri),
            ("client_id", client_id),
        ])
        .send()
        .await
        .map_err(|e| TokenkeepError::AuthFlowFailed(format!("Token exchange request failed: {e}")))?;

    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        return Err(TokenkeepError::AuthFlowFailed(format!(
            "Token exchange failed with status {status}: {body}"
        )));
    }

    resp.json::<TokenResponse>()
        .await
        .map_err(|e| TokenkeepError::AuthFlowFailed(format!("Failed to parse token response: {e}")))
}

/// POST a `refresh_token` grant.
///
/// A non-2xx carrying `invalid_grant` is terminal (`AuthExpired`); everything
/// else surfaces as `TokenRefreshFailed` and may be retried by the caller.
pub async fn refresh_grant(
    http: &reqwest::Client,
    token_endpoint: &str,
    refresh_token: &str,
    client_id: &str,
) -> Result<TokenResponse, TokenkeepError> {
    let resp = http
        .post(token_endpoint)
        .form(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", client_id),
        ])
        .send()
        .await
        .map_err(|e| TokenkeepError::TokenRefreshFailed {
            status: None,
            detail: format!("Token refresh request failed: {e}"),
        })?;

    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        if let Ok(err_body) = serde_json::from_str::<TokenErrorBody>(&body) {
            if err_body.is_invalid_grant() {
                return Err(TokenkeepError::AuthExpired);
            }
        }
        return Err(TokenkeepError::TokenRefreshFailed {
            status: Some(status),
            detail: body,
        });
    }

    resp.json::<TokenResponse>()
        .await
        .map_err(|e| TokenkeepError::TokenRefreshFailed {
            status: None,
            detail: format!("Failed to parse refresh token response: {e}"),
        })
}
