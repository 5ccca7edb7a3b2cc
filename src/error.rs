use std::fmt;

use thiserror::Error;

/// The hosted service a request was addressed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Gemini,
    Replicate,
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Service::Gemini => write!(f, "Gemini"),
            Service::Replicate => write!(f, "Replicate"),
        }
    }
}

/// Any downstream network, auth, or service fault.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{service} request failed: {source}")]
    Transport {
        service: Service,
        #[source]
        source: reqwest::Error,
    },

    #[error("{service} returned HTTP {status}: {message}")]
    Status {
        service: Service,
        status: u16,
        message: String,
    },

    #[error("{service} sent a malformed response: {source}")]
    Decode {
        service: Service,
        #[source]
        source: serde_json::Error,
    },

    #[error("{service} stream interrupted: {message}")]
    Stream { service: Service, message: String },

    #[error("prediction {id} {status}: {message}")]
    Prediction {
        id: String,
        status: String,
        message: String,
    },
}

impl ServiceError {
    pub fn service(&self) -> Service {
        match self {
            ServiceError::Transport { service, .. }
            | ServiceError::Status { service, .. }
            | ServiceError::Decode { service, .. }
            | ServiceError::Stream { service, .. } => *service,
            ServiceError::Prediction { .. } => Service::Replicate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_names_service_and_code() {
        let err = ServiceError::Status {
            service: Service::Gemini,
            status: 400,
            message: "API key not valid".into(),
        };

        assert_eq!(err.to_string(), "Gemini returned HTTP 400: API key not valid");
        assert_eq!(err.service(), Service::Gemini);
    }

    #[test]
    fn prediction_error_belongs_to_replicate() {
        let err = ServiceError::Prediction {
            id: "abc".into(),
            status: "failed".into(),
            message: "NSFW content detected".into(),
        };

        assert_eq!(err.service(), Service::Replicate);
        assert!(err.to_string().contains("NSFW"));
    }
}
