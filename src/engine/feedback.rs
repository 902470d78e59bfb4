use super::event::{Absence, Observation};
use crate::common::{PoseCatalog, PoseId};

pub const HOLD_STEADY: &str = "Perfect! Hold steady...";
pub const SEQUENCE_COMPLETE: &str = "Suryanamaskara complete!";

pub fn for_match(observation: &Observation) -> Vec<String> {
    let mut feedback = vec![HOLD_STEADY.to_string()];
    feedback.extend(observation.corrections.iter().cloned());
    feedback
}

pub fn for_mismatch(
    observation: &Observation,
    target: &PoseId,
    catalog: &PoseCatalog,
) -> Vec<String> {
    vec![
        format!("You're doing {}", detected_display(observation, catalog)),
        format!("Please do {} instead", catalog.display_name(target)),
        catalog.hint(target).to_string(),
    ]
}

/// Right pose, but below the confidence floor.
pub fn for_low_confidence(
    observation: &Observation,
    target: &PoseId,
    catalog: &PoseCatalog,
) -> Vec<String> {
    vec![
        format!(
            "You're doing {} ({:.0}% confidence)",
            detected_display(observation, catalog),
            observation.confidence * 100.0
        ),
        format!("Hold {} more precisely", catalog.display_name(target)),
        catalog.hint(target).to_string(),
    ]
}

pub fn for_absence(absence: &Absence) -> Vec<String> {
    match absence {
        Absence::NoBody => vec![
            "Stand in clear view of the camera".to_string(),
            "Ensure good lighting".to_string(),
            "Position your full body in the frame".to_string(),
        ],
        Absence::SourceUnavailable { .. } => vec![
            "Cannot reach the pose classifier".to_string(),
            "Make sure the classifier API is running".to_string(),
        ],
    }
}

pub fn for_completion() -> Vec<String> {
    vec![SEQUENCE_COMPLETE.to_string()]
}

pub fn detected_display(observation: &Observation, catalog: &PoseCatalog) -> String {
    match &observation.display {
        Some(display) if !display.trim().is_empty() => display.clone(),
        _ => catalog.display_name(&observation.label),
    }
}
