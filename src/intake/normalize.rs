use super::response::PredictResponse;
use crate::engine::{EngineEvent, Observation};
use crate::error::BoundaryError;
use tracing::warn;

const UNKNOWN_POSE: &str = "unknown";

/// Turn whatever the classifier produced into an engine event.
/// Every failure becomes an absence; nothing here is fatal.
pub fn normalize_response(result: Result<PredictResponse, BoundaryError>) -> EngineEvent {
    match result {
        Ok(response) => normalize_prediction(response),
        Err(error) => {
            warn!(error = %error, "Classifier unavailable");
            EngineEvent::unavailable(error.to_string())
        }
    }
}

fn normalize_prediction(response: PredictResponse) -> EngineEvent {
    if !response.success {
        return EngineEvent::no_body();
    }
    let pose = match response.pose.as_deref().map(str::trim) {
        Some(pose) if !pose.is_empty() && !pose.eq_ignore_ascii_case(UNKNOWN_POSE) => pose,
        _ => return EngineEvent::no_body(),
    };
    let confidence = response.confidence.unwrap_or(0.0);
    if !confidence.is_finite() {
        return EngineEvent::no_body();
    }

    let mut observation = Observation::new(pose, confidence).with_corrections(response.corrections);
    if let Some(display) = response.pose_display.filter(|d| !d.trim().is_empty()) {
        observation = observation.with_display(display);
    }
    EngineEvent::Observed(observation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Absence;

    #[test]
    fn successful_prediction_becomes_observation() {
        let mut response = PredictResponse::detected("bhujangasana", 0.91);
        response.pose_display = Some("Bhujangasana".to_string());
        match normalize_response(Ok(response)) {
            EngineEvent::Observed(observation) => {
                assert_eq!(observation.label.as_str(), "bhujangasana");
                assert_eq!(observation.confidence, 0.91);
                assert_eq!(observation.display.as_deref(), Some("Bhujangasana"));
            }
            other => panic!("expected observation, got {:?}", other),
        }
    }

    #[test]
    fn unsuccessful_or_unknown_means_no_body() {
        assert_eq!(
            normalize_response(Ok(PredictResponse::not_detected())),
            EngineEvent::no_body()
        );
        assert_eq!(
            normalize_response(Ok(PredictResponse::detected("Unknown", 0.9))),
            EngineEvent::no_body()
        );
        assert_eq!(
            normalize_response(Ok(PredictResponse::detected("  ", 0.9))),
            EngineEvent::no_body()
        );
        let mut missing = PredictResponse::detected("x", 0.9);
        missing.pose = None;
        assert_eq!(normalize_response(Ok(missing)), EngineEvent::no_body());
        assert_eq!(
            normalize_response(Ok(PredictResponse::detected("kumbhakasana", f32::NAN))),
            EngineEvent::no_body()
        );
    }

    #[test]
    fn missing_confidence_defaults_to_zero() {
        let mut response = PredictResponse::detected("kumbhakasana", 0.0);
        response.confidence = None;
        match normalize_response(Ok(response)) {
            EngineEvent::Observed(observation) => assert_eq!(observation.confidence, 0.0),
            other => panic!("expected observation, got {:?}", other),
        }
    }

    #[test]
    fn boundary_errors_become_source_unavailable() {
        let event = normalize_response(Err(BoundaryError::Status(500)));
        assert!(matches!(
            event,
            EngineEvent::Absent(Absence::SourceUnavailable { ref reason }) if reason.contains("500")
        ));
        assert!(matches!(
            normalize_response(Err(BoundaryError::Timeout)),
            EngineEvent::Absent(Absence::SourceUnavailable { .. })
        ));
    }
}
