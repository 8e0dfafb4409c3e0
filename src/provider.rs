use crate::pkce::AuthorizationRequest;

/// Immutable provider endpoints and client identity, supplied by the
/// embedding application at construction.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub client_id: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub scopes: Vec<String>,
}

impl ProviderConfig {
    pub fn new(
        client_id: impl Into<String>,
        authorization_endpoint: impl Into<String>,
        token_endpoint: impl Into<String>,
        scopes: Vec<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            authorization_endpoint: authorization_endpoint.into(),
            token_endpoint: token_endpoint.into(),
            scopes,
        }
    }

    /// Build the browser redirect URL for an authorization attempt.
    pub fn authorization_url(&self, request: &AuthorizationRequest) -> String {
        format!(
            "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}&code_challenge={}&code_challenge_method=S256",
            self.authorization_endpoint,
            urlencoded(&self.client_id),
            urlencoded(&request.redirect_uri),
            urlencoded(&self.scopes.join(" ")),
            urlencoded(&request.state),
            request.code_challenge,
        )
    }
}

fn urlencoded(s: &str) -> String {
    let mut result = String::with_capacity(s.len() * 2);
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                result.push(b as char);
            }
            _ => {
                result.push('%');
                result.push_str(&format!("{b:02X}"));
            }
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ProviderConfig {
        ProviderConfig::new(
            "my-client",
            "https://auth.example.com/authorize",
            "https://auth.example.com/token",
            vec!["calendar.readonly".into(), "profile".into()],
        )
    }

    #[test]
    fn authorization_url_contains_required_params() {
        let request = AuthorizationRequest::new("http://localhost:9000/callback".into());
        let url = config().authorization_url(&request);

        assert!(url.starts_with("https://auth.example.com/authorize?response_type=code"));
        assert!(url.contains("client_id=my-client"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A9000%2Fcallback"));
        assert!(url.contains("scope=calendar.readonly%20profile"));
        assert!(url.contains(&format!("state={}", request.state)));
        assert!(url.contains(&format!("code_challenge={}", request.code_challenge)));
        assert!(url.contains("code_challenge_method=S256"));
    }

    #[test]
    fn authorization_url_never_leaks_verifier() {
        let request = AuthorizationRequest::new("http://localhost:9000/callback".into());
        let url = config().authorization_url(&request);
        assert!(!url.contains(&request.code_verifier));
    }

    #[test]
    fn urlencoded_passes_unreserved_chars() {
        assert_eq!(urlencoded("abc-DEF_123.~"), "abc-DEF_123.~");
    }

    #[test]
    fn urlencoded_escapes_reserved_chars() {
        assert_eq!(urlencoded("a b/c?d"), "a%20b%2Fc%3Fd");
    }
}
