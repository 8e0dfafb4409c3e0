#[derive(Debug, thiserror::Error)]
pub enum TokenkeepError {
    #[error("Authorization flow failed: {0}")]
    AuthFlowFailed(String),

    #[error("{}", format_refresh_failure(.status, .detail))]
    TokenRefreshFailed {
        status: Option<u16>,
        detail: String,
    },

    #[error("Session expired. Re-authorization is required.")]
    AuthExpired,

    #[error("Token store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Authentication required: {0}")]
    AuthRequired(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

fn format_refresh_failure(status: &Option<u16>, detail: &str) -> String {
    match status {
        Some(code) => format!("Token refresh failed with status {code}: {detail}"),
        None => format!("Token refresh failed: {detail}"),
    }
}

impl TokenkeepError {
    /// Error code string for structured output.
    pub fn code(&self) -> &'static str {
        match self {
            TokenkeepError::AuthFlowFailed(_) => "auth_flow_failed",
            TokenkeepError::TokenRefreshFailed { .. } => "token_refresh_failed",
            TokenkeepError::AuthExpired => "auth_expired",
            TokenkeepError::StoreUnavailable(_) => "store_unavailable",
            TokenkeepError::AuthRequired(_) => "auth_required",
            TokenkeepError::IoError(_) => "io_error",
        }
    }

    /// Whether retrying the same operation may succeed without re-authorizing.
    ///
    /// `AuthExpired` is terminal: the provider rejected the refresh token and
    /// only a fresh interactive authorization can recover. Refresh failures
    /// caused by the network or a 5xx from the provider are transient.
    pub fn is_transient(&self) -> bool {
        match self {
            TokenkeepError::TokenRefreshFailed { .. } => true,
            TokenkeepError::IoError(_) => true,
            TokenkeepError::AuthFlowFailed(_)
            | TokenkeepError::AuthExpired
            | TokenkeepError::StoreUnavailable(_)
            | TokenkeepError::AuthRequired(_) => false,
        }
    }
}
