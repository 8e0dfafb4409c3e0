use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use crate::error::TokenkeepError;

/// Query parameters delivered on the redirect back from the provider.
#[derive(Debug, Default, PartialEq)]
struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// Wait for the provider to redirect the browser to the loopback address and
/// extract the authorization code.
///
/// The `state` echoed by the provider must match the one sent in the
/// authorization URL; a mismatch means the redirect does not belong to this
/// attempt and the code is rejected.
pub async fn listen_for_callback(
    port: u16,
    expected_state: &str,
    timeout: Duration,
) -> Result<String, TokenkeepError> {
    let listener = TcpListener::bind(format!("127.0.0.1:{port}")).await?;

    let accept_future = async {
        let (mut stream, _) = listener.accept().await?;

        let mut buf = vec![0u8; 4096];
        let n = stream.read(&mut buf).await?;
        let request = String::from_utf8_lossy(&buf[..n]);

        let params = parse_callback_request(&request);

        // Respond before validating so the user always sees a page instead
        // of a hung browser tab.
        let body = "<!DOCTYPE html><html><body><h1>Authentication successful!</h1>\
                     <p>You can close this window and return to the application.</p></body></html>";
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).await?;
        stream.shutdown().await?;

        if let Some(error) = params.error {
            return Err(TokenkeepError::AuthFlowFailed(format!(
                "Provider returned error on callback: {error}"
            )));
        }

        let code = params.code.ok_or_else(|| {
            TokenkeepError::AuthFlowFailed(
                "No authorization code found in callback request".to_string(),
            )
        })?;

        match params.state {
            Some(ref s) if s == expected_state => Ok(code),
            _ => Err(TokenkeepError::AuthFlowFailed(
                "State mismatch in callback request".to_string(),
            )),
        }
    };

    tokio::time::timeout(timeout, accept_future)
        .await
        .map_err(|_| {
            TokenkeepError::AuthFlowFailed(format!(
                "Timed out waiting for OAuth callback after {}s",
                timeout.as_secs()
            ))
        })?
}

fn parse_callback_request(request: &str) -> CallbackParams {
    // Extract the request path from "GET /callback?code=...&state=... HTTP/1.1"
    let mut params = CallbackParams::default();
    let Some(first_line) = request.lines().next() else {
        return params;
    };
    let Some(path) = first_line.split_whitespace().nth(1) else {
        return params;
    };
    let Some(query) = path.split('?').nth(1) else {
        return params;
    };

    for param in query.split('&') {
        if let Some(value) = param.strip_prefix("code=") {
            let decoded = urldecode(value);
            if !decoded.is_empty() {
                params.code = Some(decoded);
            }
        } else if let Some(value) = param.strip_prefix("state=") {
            params.state = Some(urldecode(value));
        } else if let Some(value) = param.strip_prefix("error=") {
            let decoded = urldecode(value);
            if !decoded.is_empty() {
                params.error = Some(decoded);
            }
        }
    }
    params
}

fn urldecode(s: &str) -> String {
    // Decode into raw bytes first so multi-byte UTF-8 percent sequences
    // reassemble correctly.
    let mut bytes = Vec::with_capacity(s.len());
    let mut iter = s.bytes();
    while let Some(b) = iter.next() {
        if b == b'%' {
            let hi = iter.next();
            let lo = iter.next();
            if let (Some(h), Some(l)) = (hi, lo) {
                let hex = [h, l];
                if let Ok(s) = std::str::from_utf8(&hex) {
                    if let Ok(val) = u8::from_str_radix(s, 16) {
                        bytes.push(val);
                        continue;
                    }
                }
            }
            bytes.push(b'%');
        } else if b == b'+' {
            bytes.push(b' ');
        } else {
            bytes.push(b);
        }
    }
    String::from_utf8_lossy(&bytes).into_owned()
}
