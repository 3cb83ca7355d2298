//! Image classification, frame archiving, and label announcements.
//!
//! The classifier is an AutoML Vision model behind its REST predict
//! endpoint; frames are archived to a Cloud Storage object that is
//! overwritten every time. Both authenticate with a bearer token from
//! [`TokenSource`].

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    auth::{AuthError, TokenSource},
    model::{Key, LastAnnouncedLabel, Prediction},
    store::StateStore,
};

/// Errors from the classification service.
#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("prediction request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("prediction service returned HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("malformed prediction response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Errors archiving a frame.
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("upload failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("storage returned HTTP {0}")]
    Status(StatusCode),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// A service that labels images.
pub trait Classifier {
    /// Predictions at or above `score_threshold`, in the service's order.
    fn predict(&self, image: &[u8], score_threshold: f64) -> Result<Vec<Prediction>, ClassifyError>;
}

/// Durable storage for captured frames.
pub trait BlobStore {
    /// Store `bytes` under `object`, replacing any previous object.
    fn upload(&self, object: &str, bytes: &[u8]) -> Result<(), BlobError>;
}

// ── AutoML ──

#[derive(Serialize)]
struct PredictRequest {
    payload: ExamplePayload,
    params: PredictParams,
}

#[derive(Serialize)]
struct ExamplePayload {
    image: Image,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Image {
    image_bytes: String,
}

/// The service takes parameters as a string map.
#[derive(Serialize)]
struct PredictParams {
    score_threshold: String,
}

/// JSON shape returned by `models/*:predict`.
#[derive(Deserialize)]
struct PredictResponse {
    #[serde(default)]
    payload: Vec<AnnotationPayload>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotationPayload {
    display_name: String,
    #[serde(default)]
    classification: Option<ClassificationAnnotation>,
}

#[derive(Deserialize)]
struct ClassificationAnnotation {
    #[serde(default)]
    score: f64,
}

/// An AutoML Vision classification model.
pub struct AutoMl {
    client: Client,
    predict_url: String,
    token: TokenSource,
}

impl AutoMl {
    pub fn new(endpoint: &str, project: &str, region: &str, model: &str, token: TokenSource) -> Self {
        let predict_url = format!(
            "{}/projects/{project}/locations/{region}/models/{model}:predict",
            endpoint.trim_end_matches('/')
        );
        Self {
            client: Client::new(),
            predict_url,
            token,
        }
    }
}

impl Classifier for AutoMl {
    fn predict(&self, image: &[u8], score_threshold: f64) -> Result<Vec<Prediction>, ClassifyError> {
        let request = PredictRequest {
            payload: ExamplePayload {
                image: Image {
                    image_bytes: BASE64.encode(image),
                },
            },
            params: PredictParams {
                score_threshold: score_threshold.to_string(),
            },
        };

        debug!(bytes = image.len(), "sending prediction request");

        let response = self
            .client
            .post(&self.predict_url)
            .bearer_auth(self.token.token()?)
            .json(&request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ClassifyError::Status { status, body });
        }

        let body = response.text()?;
        let result: PredictResponse = serde_json::from_str(&body)?;

        Ok(result
            .payload
            .into_iter()
            .map(|p| Prediction::new(p.display_name, p.classification.map_or(0.0, |c| c.score)))
            .collect())
    }
}

// ── Cloud Storage ──

/// A Cloud Storage bucket.
pub struct CloudStorage {
    client: Client,
    upload_url: String,
    token: TokenSource,
}

impl CloudStorage {
    pub fn new(endpoint: &str, bucket: &str, token: TokenSource) -> Self {
        let upload_url = format!(
            "{}/upload/storage/v1/b/{bucket}/o",
            endpoint.trim_end_matches('/')
        );
        Self {
            client: Client::new(),
            upload_url,
            token,
        }
    }
}

impl BlobStore for CloudStorage {
    fn upload(&self, object: &str, bytes: &[u8]) -> Result<(), BlobError> {
        let response = self
            .client
            .post(&self.upload_url)
            .query(&[("uploadType", "media"), ("name", object)])
            .bearer_auth(self.token.token()?)
            .header(CONTENT_TYPE, "image/jpeg")
            .body(bytes.to_vec())
            .send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(BlobError::Status(status));
        }
        debug!(object, bytes = bytes.len(), "frame archived");
        Ok(())
    }
}

// ── Announcements ──

/// Publish every prediction whose label differs from the last announced one.
///
/// Predictions are compared in service order against a label that updates
/// as it goes, so a response like `[cone, person]` announces both while
/// `[cone, cone]` announces once. A failed publish is logged and leaves the
/// last label alone, so the same label is tried again next time.
///
/// Returns the labels that were published.
pub fn announce(
    store: &dyn StateStore,
    last: &mut LastAnnouncedLabel,
    predictions: &[Prediction],
) -> Vec<String> {
    let mut announced = Vec::new();

    for prediction in predictions {
        if !last.differs(&prediction.label) {
            continue;
        }

        match store.put(Key::SPEECH, &Value::String(prediction.label.clone())) {
            Ok(()) => {
                info!(label = %prediction.label, score = prediction.score, "announced");
                last.set(&prediction.label);
                announced.push(prediction.label.clone());
            }
            Err(e) => warn!("failed to announce {}: {e}", prediction.label),
        }
    }

    announced
}
