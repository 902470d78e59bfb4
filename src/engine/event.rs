use crate::common::PoseId;
use serde::{Deserialize, Serialize};

/// One classification result for a single frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub label: PoseId,
    pub confidence: f32,
    /// Display spelling reported by the classifier, if any.
    pub display: Option<String>,
    /// Advisory corrections supplied by the classifier for the detected pose.
    #[serde(default)]
    pub corrections: Vec<String>,
}

impl Observation {
    pub fn new(label: impl Into<PoseId>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence: clamp_confidence(confidence),
            display: None,
            corrections: Vec::new(),
        }
    }

    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }

    pub fn with_corrections(mut self, corrections: Vec<String>) -> Self {
        self.corrections = corrections;
        self
    }
}

fn clamp_confidence(confidence: f32) -> f32 {
    if confidence.is_finite() {
        confidence.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Why no observation is available for a frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Absence {
    /// Nothing recognizable in frame.
    NoBody,
    /// The classifier could not be reached or answered garbage.
    SourceUnavailable { reason: String },
}

/// Input to [`step`](super::step).
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Observed(Observation),
    Absent(Absence),
    /// Synthetic event fired by the scheduler once the advance delay elapsed.
    CommitAdvance { from_index: usize },
}

impl EngineEvent {
    pub fn observed(label: impl Into<PoseId>, confidence: f32) -> Self {
        EngineEvent::Observed(Observation::new(label, confidence))
    }

    pub fn no_body() -> Self {
        EngineEvent::Absent(Absence::NoBody)
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        EngineEvent::Absent(Absence::SourceUnavailable {
            reason: reason.into(),
        })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            EngineEvent::Observed(_) => "observed",
            EngineEvent::Absent(Absence::NoBody) => "no_body",
            EngineEvent::Absent(Absence::SourceUnavailable { .. }) => "source_unavailable",
            EngineEvent::CommitAdvance { .. } => "commit_advance",
        }
    }
}
