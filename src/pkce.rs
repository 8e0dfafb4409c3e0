use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

pub struct PkceChallenge {
    pub code_verifier: String,
    pub code_challenge: String,
}

pub fn generate_pkce() -> PkceChallenge {
    let mut buf = [0u8; 32];
    rand::Rng::fill_bytes(&mut rand::rng(), &mut buf);
    let code_verifier = URL_SAFE_NO_PAD.encode(buf);

    let mut hasher = Sha256::new();
    hasher.update(code_verifier.as_bytes());
    let hash = hasher.finalize();
    let code_challenge = URL_SAFE_NO_PAD.encode(hash);

    PkceChallenge {
        code_verifier,
        code_challenge,
    }
}

/// Single-use authorization attempt. Created fresh for every interactive
/// flow and discarded once the code exchange completes, success or failure.
pub struct AuthorizationRequest {
    pub code_verifier: String,
    pub code_challenge: String,
    pub state: String,
    pub redirect_uri: String,
}

impl AuthorizationRequest {
    pub fn new(redirect_uri: String) -> Self {
        let pkce = generate_pkce();
        Self {
            code_verifier: pkce.code_verifier,
            code_challenge: pkce.code_challenge,
            state: uuid::Uuid::new_v4().to_string(),
            redirect_uri,
        }
    }
}
