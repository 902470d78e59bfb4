use super::classifier::PoseClassifier;
use super::response::{HealthResponse, PosesResponse, PredictRequest, PredictResponse};
use crate::common::EncodedFrame;
use crate::error::BoundaryError;
use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};

const PREDICT_PATH: &str = "/api/predict";
const HEALTH_PATH: &str = "/api/health";
const POSES_PATH: &str = "/api/poses";

/// JSON client for the pose classification API.
#[derive(Debug, Clone)]
pub struct HttpPoseClassifier {
    client: Client,
    base_url: String,
}

impl HttpPoseClassifier {
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Result<Self, BoundaryError> {
        let client = Client::builder().timeout(request_timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn health(&self) -> Result<HealthResponse, BoundaryError> {
        self.get_json(HEALTH_PATH).await
    }

    /// The sequence the service itself was trained on.
    pub async fn poses(&self) -> Result<PosesResponse, BoundaryError> {
        self.get_json(POSES_PATH).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BoundaryError> {
        let response = self.client.get(self.endpoint(path)).send().await?;
        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, BoundaryError> {
    let status = response.status();
    if !status.is_success() {
        return Err(BoundaryError::Status(status.as_u16()));
    }
    response
        .json::<T>()
        .await
        .map_err(|e| BoundaryError::Malformed(e.to_string()))
}

#[async_trait]
impl PoseClassifier for HttpPoseClassifier {
    #[instrument(skip(self, frame), fields(frame_id = %frame.frame_id()))]
    async fn classify(&self, frame: &EncodedFrame) -> Result<PredictResponse, BoundaryError> {
        let response = self
            .client
            .post(self.endpoint(PREDICT_PATH))
            .json(&PredictRequest {
                image: frame.base64(),
            })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BoundaryError::Timeout
                } else {
                    BoundaryError::Transport(e)
                }
            })?;
        let prediction: PredictResponse = decode(response).await?;
        debug!(
            success = prediction.success,
            pose = prediction.pose.as_deref().unwrap_or("-"),
            "Classifier responded"
        );
        Ok(prediction)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
