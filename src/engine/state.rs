use super::config::{EngineConfig, SessionMode, MAX_PROGRESS};
use crate::common::PoseId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Latest detection, kept for display only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub label: PoseId,
    pub display: String,
    pub confidence: f32,
}

/// Mutable progression state for one practice run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceState {
    pub current_index: usize,
    pub progress: f32,
    pub is_correct: bool,
    pub feedback: Vec<String>,
    pub detected: Option<Detection>,
    /// Set once the hold is reached and a `CommitAdvance` is outstanding.
    pub advance_pending: bool,
    pub mode: SessionMode,
    pub last_index: usize,
}

impl SequenceState {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            current_index: 0,
            progress: 0.0,
            is_correct: false,
            feedback: Vec::new(),
            detected: None,
            advance_pending: false,
            mode: config.mode,
            last_index: config.sequence.last_index(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.mode == SessionMode::Sequence
            && self.current_index == self.last_index
            && self.progress >= MAX_PROGRESS
    }

    pub fn snapshot(&self, config: &EngineConfig) -> Snapshot {
        let target = config.target(self.current_index).cloned();
        Snapshot {
            current_index: self.current_index,
            total_poses: config.sequence.len(),
            target_display: target.as_ref().map(|id| config.catalog.display_name(id)),
            target,
            progress: self.progress,
            is_correct: self.is_correct,
            feedback: self.feedback.clone(),
            is_complete: self.is_complete(),
            detected_label: self.detected.as_ref().map(|d| d.display.clone()),
            confidence: self.detected.as_ref().map(|d| d.confidence).unwrap_or(0.0),
            taken_at: Utc::now(),
        }
    }
}

/// Read-only view handed to the rendering layer after every step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub current_index: usize,
    pub total_poses: usize,
    pub target: Option<PoseId>,
    pub target_display: Option<String>,
    pub progress: f32,
    pub is_correct: bool,
    pub feedback: Vec<String>,
    pub is_complete: bool,
    pub detected_label: Option<String>,
    pub confidence: f32,
    pub taken_at: DateTime<Utc>,
}
