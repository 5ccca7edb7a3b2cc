use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::engine::http::{build_client, check_status, transport};
use crate::error::{Service, ServiceError};
use crate::model::image::{ImageOutcome, ImageParams};

/* =========================
   Wire format
   ========================= */

#[derive(Serialize)]
pub struct ImageInput<'a> {
    #[serde(flatten)]
    pub params: &'a ImageParams,
    pub prompt: &'a str,
}

#[derive(Serialize)]
struct PredictionRequest<'a> {
    version: &'a str,
    input: ImageInput<'a>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    Aborted,
}

impl PredictionStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, PredictionStatus::Starting | PredictionStatus::Processing)
    }

    fn as_str(self) -> &'static str {
        match self {
            PredictionStatus::Starting => "starting",
            PredictionStatus::Processing => "processing",
            PredictionStatus::Succeeded => "succeeded",
            PredictionStatus::Failed => "failed",
            PredictionStatus::Canceled => "canceled",
            PredictionStatus::Aborted => "aborted",
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PredictionUrls {
    pub get: String,
}

#[derive(Debug, Deserialize)]
pub struct Prediction {
    pub id: String,
    pub status: PredictionStatus,
    #[serde(default)]
    pub output: Value,
    #[serde(default)]
    pub error: Value,
    pub urls: PredictionUrls,
}

impl Prediction {
    /// Converts a finished prediction into an outcome. Must only be called
    /// once `status` is terminal.
    pub fn into_outcome(self) -> Result<ImageOutcome, ServiceError> {
        match self.status {
            PredictionStatus::Succeeded => Ok(first_output(&self.output)),
            status => Err(ServiceError::Prediction {
                message: match &self.error {
                    Value::Null => "no error reported".to_string(),
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                },
                id: self.id,
                status: status.as_str().to_string(),
            }),
        }
    }
}

/// First element of the output. SDXL returns a list; some models return a
/// single string. An empty or non-string first element is no image.
pub fn first_output(output: &Value) -> ImageOutcome {
    let url = match output {
        Value::Array(items) => items.first().and_then(Value::as_str),
        Value::String(s) => Some(s.as_str()),
        _ => None,
    }
    .filter(|s| !s.is_empty());

    match url {
        Some(url) => ImageOutcome::HasImage(url.to_string()),
        None => ImageOutcome::NoImage,
    }
}

/* =========================
   Image generator
   ========================= */

pub trait ImageGenerator {
    fn generate_image(&self, prompt: &str, params: &ImageParams) -> Result<ImageOutcome, ServiceError>;
}

pub struct ReplicateClient {
    http: Client,
    api_token: String,
    base_url: String,
    version: String,
    poll_interval: Duration,
}

impl ReplicateClient {
    pub fn new(
        api_token: impl Into<String>,
        base_url: impl Into<String>,
        version: impl Into<String>,
        poll_interval: Duration,
    ) -> Result<Self, ServiceError> {
        Ok(Self::with_http(
            build_client(Service::Replicate)?,
            api_token,
            base_url,
            version,
            poll_interval,
        ))
    }

    pub fn with_http(
        http: Client,
        api_token: impl Into<String>,
        base_url: impl Into<String>,
        version: impl Into<String>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            http,
            api_token: api_token.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            version: version.into(),
            poll_interval,
        }
    }

    fn create(&self, prompt: &str, params: &ImageParams) -> Result<Prediction, ServiceError> {
        let req = PredictionRequest {
            version: &self.version,
            input: ImageInput { params, prompt },
        };

        let resp = self
            .http
            .post(format!("{}/v1/predictions", self.base_url))
            .bearer_auth(&self.api_token)
            .header("Prefer", "wait")
            .json(&req)
            .send()
            .map_err(transport(Service::Replicate))?;

        decode(check_status(Service::Replicate, resp)?)
    }

    fn fetch(&self, url: &str) -> Result<Prediction, ServiceError> {
        let resp = self
            .http
            .get(url)
            .bearer_auth(&self.api_token)
            .send()
            .map_err(transport(Service::Replicate))?;

        decode(check_status(Service::Replicate, resp)?)
    }
}

fn decode(resp: reqwest::blocking::Response) -> Result<Prediction, ServiceError> {
    let body = resp.text().map_err(transport(Service::Replicate))?;
    serde_json::from_str(&body).map_err(|source| ServiceError::Decode {
        service: Service::Replicate,
        source,
    })
}

impl ImageGenerator for ReplicateClient {
    /// Blocks until the prediction finishes.
    fn generate_image(&self, prompt: &str, params: &ImageParams) -> Result<ImageOutcome, ServiceError> {
        let mut prediction = self.create(prompt, params)?;
        info!(id = %prediction.id, status = prediction.status.as_str(), "prediction created");

        while !prediction.status.is_terminal() {
            thread::sleep(self.poll_interval);
            prediction = self.fetch(&prediction.urls.get)?;
            debug!(id = %prediction.id, status = prediction.status.as_str(), "prediction polled");
        }

        let outcome = prediction.into_outcome();
        if let Ok(ImageOutcome::NoImage) = &outcome {
            warn!("prediction succeeded without output");
        }
        outcome
    }
}
