use crate::common::{PoseCatalog, PoseId, PoseSequence};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub const MAX_PROGRESS: f32 = 100.0;

/// Decides whether a detected label counts as the target pose.
pub trait PoseMatcher: Send + Sync {
    fn matches(&self, label: &str, target: &PoseId) -> bool;
}

/// Compares canonical identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct CanonicalMatcher;

impl PoseMatcher for CanonicalMatcher {
    fn matches(&self, label: &str, target: &PoseId) -> bool {
        PoseId::new(label) == *target
    }
}

impl<F> PoseMatcher for F
where
    F: Fn(&str, &PoseId) -> bool + Send + Sync,
{
    fn matches(&self, label: &str, target: &PoseId) -> bool {
        self(label, target)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionMode {
    /// Walk the whole sequence and finish on the last pose.
    #[serde(alias = "practice")]
    Sequence,
    /// Hold a single pose indefinitely; never completes.
    Learn,
}

#[derive(Clone)]
pub struct EngineConfig {
    pub sequence: PoseSequence,
    pub progress_step: f32,
    pub hold_threshold: f32,
    pub advance_delay: Duration,
    pub match_confidence_floor: f32,
    pub mode: SessionMode,
    pub matcher: Arc<dyn PoseMatcher>,
    pub catalog: Arc<PoseCatalog>,
}

impl fmt::Debug for EngineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineConfig")
            .field("sequence", &self.sequence)
            .field("progress_step", &self.progress_step)
            .field("hold_threshold", &self.hold_threshold)
            .field("advance_delay", &self.advance_delay)
            .field("match_confidence_floor", &self.match_confidence_floor)
            .field("mode", &self.mode)
            .finish_non_exhaustive()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sequence: PoseSequence::suryanamaskara(),
            progress_step: 5.0,
            hold_threshold: MAX_PROGRESS,
            advance_delay: Duration::from_millis(1000),
            match_confidence_floor: 0.0,
            mode: SessionMode::Sequence,
            matcher: Arc::new(CanonicalMatcher),
            catalog: Arc::new(PoseCatalog::suryanamaskara()),
        }
    }
}

impl EngineConfig {
    pub fn practice(sequence: PoseSequence) -> Self {
        Self {
            sequence,
            ..Self::default()
        }
    }

    /// Single-pose practice. The sequence degenerates to the pose under study.
    pub fn learn(pose: impl Into<PoseId>) -> Self {
        Self {
            sequence: PoseSequence::single(pose),
            mode: SessionMode::Learn,
            ..Self::default()
        }
    }

    pub fn with_progress_step(mut self, progress_step: f32) -> Self {
        self.progress_step = progress_step;
        self
    }

    pub fn with_hold_threshold(mut self, hold_threshold: f32) -> Self {
        self.hold_threshold = hold_threshold;
        self
    }

    pub fn with_advance_delay(mut self, advance_delay: Duration) -> Self {
        self.advance_delay = advance_delay;
        self
    }

    pub fn with_confidence_floor(mut self, floor: f32) -> Self {
        self.match_confidence_floor = floor;
        self
    }

    pub fn with_matcher(mut self, matcher: impl PoseMatcher + 'static) -> Self {
        self.matcher = Arc::new(matcher);
        self
    }

    pub fn with_catalog(mut self, catalog: PoseCatalog) -> Self {
        self.catalog = Arc::new(catalog);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sequence.is_empty() {
            return Err(ConfigError::EmptySequence);
        }
        // Written as negated comparisons so NaN is rejected too.
        if !(self.progress_step > 0.0) {
            return Err(ConfigError::InvalidProgressStep(self.progress_step));
        }
        if !(self.hold_threshold > 0.0 && self.hold_threshold <= MAX_PROGRESS) {
            return Err(ConfigError::InvalidHoldThreshold(self.hold_threshold));
        }
        if !(0.0..=1.0).contains(&self.match_confidence_floor) {
            return Err(ConfigError::InvalidConfidenceFloor(
                self.match_confidence_floor,
            ));
        }
        Ok(())
    }

    pub fn is_learn(&self) -> bool {
        self.mode == SessionMode::Learn
    }

    pub fn target(&self, index: usize) -> Option<&PoseId> {
        self.sequence.get(index)
    }
}
