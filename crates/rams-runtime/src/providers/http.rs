//! HTTP plumbing shared by the vendor providers.

use std::sync::OnceLock;
use std::time::Duration;

use serde_json::Value as JsonValue;

use super::ProviderError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Process-wide HTTP client; connection pools are shared across providers.
pub(crate) fn client() -> &'static reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new())
    })
}

/// Map a transport failure. The overall call deadline is enforced by the
/// client, so a reqwest timeout here can only be the connect timeout.
pub(crate) fn send_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout(CONNECT_TIMEOUT)
    } else {
        ProviderError::HttpError(err.to_string())
    }
}

/// Seconds from a `retry-after` header, if present.
pub(crate) fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Turn a non-success response into a [`ProviderError`].
///
/// 429 becomes `RateLimited`, 401/403 without a quota message becomes
/// `AuthError`, anything else an `ApiError` carrying the vendor code.
pub(crate) async fn error_from_response(response: reqwest::Response) -> ProviderError {
    let status = response.status().as_u16();
    if status == 429 {
        return ProviderError::RateLimited {
            retry_after: retry_after(&response),
        };
    }

    let body = response.text().await.unwrap_or_default();
    let (code, message) = error_details(&body);

    let error = ProviderError::ApiError {
        status,
        code,
        message,
    };
    if (status == 401 || status == 403) && !error.is_quota() {
        return ProviderError::AuthError;
    }
    error
}

/// Extract `(code, message)` from a vendor error body.
///
/// Both vendors wrap errors in `{"error": {...}}`. Gemini puts the symbolic
/// code in `status`, OpenAI in `code` (or `type`).
pub(crate) fn error_details(body: &str) -> (Option<String>, String) {
    let Ok(value) = serde_json::from_str::<JsonValue>(body) else {
        return (None, body.trim().to_string());
    };
    let error = &value["error"];

    let code = ["status", "code", "type"]
        .iter()
        .find_map(|key| error[*key].as_str())
        .map(str::to_string);
    let message = error["message"]
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string());

    (code, message)
}
