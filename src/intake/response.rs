use crate::common::PoseSequence;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct PredictRequest<'a> {
    pub image: &'a str,
}

/// Body of `POST /api/predict`. Only `success`, `pose`, `pose_display` and
/// `confidence` drive progression; the rest is advisory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub pose: Option<String>,
    #[serde(default)]
    pub pose_display: Option<String>,
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub corrections: Vec<String>,
    #[serde(default)]
    pub alignment_status: Option<String>,
}

impl PredictResponse {
    pub fn detected(pose: impl Into<String>, confidence: f32) -> Self {
        Self {
            success: true,
            pose: Some(pose.into()),
            confidence: Some(confidence),
            ..Self::default()
        }
    }

    pub fn not_detected() -> Self {
        Self {
            success: false,
            pose: Some("Unknown".to_string()),
            message: Some("No pose detected".to_string()),
            ..Self::default()
        }
    }
}

/// Body of `GET /api/health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    #[serde(default)]
    pub model_loaded: bool,
    #[serde(default)]
    pub mediapipe_ready: bool,
}

impl HealthResponse {
    pub fn is_ready(&self) -> bool {
        self.status == "ok" && self.model_loaded && self.mediapipe_ready
    }
}

/// Body of `GET /api/poses`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosesResponse {
    pub poses: Vec<String>,
    #[serde(default)]
    pub total: usize,
}

impl PosesResponse {
    pub fn into_sequence(self) -> PoseSequence {
        PoseSequence::new(self.poses)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_successful_prediction() {
        let body = r#"{
            "success": true,
            "pose": "kumbhakasana",
            "pose_display": "Kumbhakasana",
            "confidence": 0.87,
            "description": "Plank - Straight body like a plank",
            "corrections": ["Keep body straight like plank (angle: 150°)"],
            "alignment_status": "Adjust your pose",
            "has_angle_corrections": true,
            "landmarks": [[0.1, 0.2, 0.3, 0.9]]
        }"#;
        let response: PredictResponse = serde_json::from_str(body).unwrap();
        assert!(response.success);
        assert_eq!(response.pose.as_deref(), Some("kumbhakasana"));
        assert_eq!(response.confidence, Some(0.87));
        assert_eq!(response.corrections.len(), 1);
    }

    #[test]
    fn parses_failed_prediction_with_null_pose() {
        let body = r#"{"success": false, "message": "Failed to decode image", "pose": null}"#;
        let response: PredictResponse = serde_json::from_str(body).unwrap();
        assert!(!response.success);
        assert_eq!(response.pose, None);
        assert_eq!(response.confidence, None);
    }

    #[test]
    fn poses_become_a_sequence() {
        let body = r#"{"poses": ["Pranamasana", "Hasta Utthanasana"], "total": 2}"#;
        let response: PosesResponse = serde_json::from_str(body).unwrap();
        let sequence = response.into_sequence();
        assert_eq!(sequence.len(), 2);
        assert_eq!(sequence[1].as_str(), "hasta utthanasana");
    }

    #[test]
    fn health_requires_all_components() {
        let ready: HealthResponse =
            serde_json::from_str(r#"{"status": "ok", "model_loaded": true, "mediapipe_ready": true}"#)
                .unwrap();
        assert!(ready.is_ready());

        let partial: HealthResponse =
            serde_json::from_str(r#"{"status": "ok", "model_loaded": false}"#).unwrap();
        assert!(!partial.is_ready());
    }

    #[test]
    fn request_serializes_image_field() {
        let body = serde_json::to_value(PredictRequest { image: "abc" }).unwrap();
        assert_eq!(body, serde_json::json!({ "image": "abc" }));
    }
}
