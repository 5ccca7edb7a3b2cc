use reqwest::blocking::{Client, Response};
use serde_json::Value;

use crate::error::{Service, ServiceError};

const MAX_ERROR_BODY: usize = 300;

/// Blocking client with no request timeout. Image predictions can take
/// longer than reqwest's 30s default.
pub fn build_client(service: Service) -> Result<Client, ServiceError> {
    Client::builder()
        .timeout(None)
        .build()
        .map_err(|source| ServiceError::Transport { service, source })
}

pub fn transport(service: Service) -> impl FnOnce(reqwest::Error) -> ServiceError {
    move |source| ServiceError::Transport { service, source }
}

/// Passes 2xx responses through and turns everything else into
/// `ServiceError::Status` with the best message the body offers.
pub fn check_status(service: Service, resp: Response) -> Result<Response, ServiceError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().unwrap_or_default();
    Err(ServiceError::Status {
        service,
        status: status.as_u16(),
        message: error_message(&body),
    })
}

/// Gemini wraps errors as `{"error": {"message": ..}}`, Replicate uses
/// `{"detail": ..}`. Anything else is returned as (truncated) raw text.
pub fn error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if let Some(msg) = value["error"]["message"].as_str() {
            return msg.to_string();
        }
        if let Some(msg) = value["detail"].as_str() {
            return msg.to_string();
        }
        if let Some(msg) = value["error"].as_str() {
            return msg.to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "empty response body".to_string();
    }

    match trimmed.char_indices().nth(MAX_ERROR_BODY) {
        Some((cut, _)) => format!("{}…", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}
