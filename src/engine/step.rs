use super::config::{EngineConfig, SessionMode, MAX_PROGRESS};
use super::event::{Absence, EngineEvent, Observation};
use super::feedback;
use super::state::{Detection, SequenceState, Snapshot};
use crate::error::ConfigError;
use std::time::Duration;
use tracing::{debug, info};

/// A follow-up the caller must deliver as `EngineEvent::CommitAdvance` after `delay`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledAdvance {
    pub from_index: usize,
    pub delay: Duration,
}

impl ScheduledAdvance {
    pub fn event(&self) -> EngineEvent {
        EngineEvent::CommitAdvance {
            from_index: self.from_index,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub state: SequenceState,
    pub scheduled: Option<ScheduledAdvance>,
}

impl StepOutcome {
    fn unscheduled(state: SequenceState) -> Self {
        Self {
            state,
            scheduled: None,
        }
    }
}

/// Advance the progression by one event. Never mutates `config`, never fails.
pub fn step(state: &SequenceState, event: &EngineEvent, config: &EngineConfig) -> StepOutcome {
    if state.is_complete() {
        let mut next = state.clone();
        next.feedback = feedback::for_completion();
        return StepOutcome::unscheduled(next);
    }

    match event {
        EngineEvent::Absent(absence) => StepOutcome::unscheduled(on_absence(state, absence)),
        EngineEvent::Observed(observation) => on_observation(state, observation, config),
        EngineEvent::CommitAdvance { from_index } => {
            StepOutcome::unscheduled(commit_advance(state, *from_index))
        }
    }
}

fn on_absence(state: &SequenceState, absence: &Absence) -> SequenceState {
    if let Absence::SourceUnavailable { reason } = absence {
        debug!(reason = %reason, "Observation source unavailable");
    }
    let mut next = state.clone();
    next.feedback = feedback::for_absence(absence);
    next.detected = None;
    next.is_correct = false;
    next
}

fn on_observation(
    state: &SequenceState,
    observation: &Observation,
    config: &EngineConfig,
) -> StepOutcome {
    let mut next = state.clone();
    let Some(target) = config.target(state.current_index) else {
        return StepOutcome::unscheduled(next);
    };

    let label_matches = config.matcher.matches(observation.label.as_str(), target);
    let matched = label_matches && observation.confidence >= config.match_confidence_floor;

    next.is_correct = matched;
    next.detected = Some(Detection {
        label: observation.label.clone(),
        display: feedback::detected_display(observation, &config.catalog),
        confidence: observation.confidence,
    });

    if !matched {
        debug!(
            detected = %observation.label,
            expected = %target,
            confidence = observation.confidence,
            "Pose mismatch, resetting hold"
        );
        next.progress = 0.0;
        next.feedback = if label_matches {
            feedback::for_low_confidence(observation, target, &config.catalog)
        } else {
            feedback::for_mismatch(observation, target, &config.catalog)
        };
        return StepOutcome::unscheduled(next);
    }

    let mut progress = (state.progress + config.progress_step).min(MAX_PROGRESS);
    if progress >= config.hold_threshold {
        progress = MAX_PROGRESS;
    }
    next.progress = progress;
    next.feedback = feedback::for_match(observation);
    debug!(expected = %target, progress, "Pose matched");

    if progress < MAX_PROGRESS || config.mode == SessionMode::Learn {
        return StepOutcome::unscheduled(next);
    }

    if state.current_index < next.last_index {
        if next.advance_pending {
            return StepOutcome::unscheduled(next);
        }
        next.advance_pending = true;
        info!(
            index = state.current_index,
            pose = %target,
            delay_ms = config.advance_delay.as_millis() as u64,
            "Hold reached, scheduling advance"
        );
        return StepOutcome {
            state: next,
            scheduled: Some(ScheduledAdvance {
                from_index: state.current_index,
                delay: config.advance_delay,
            }),
        };
    }

    info!(poses = config.sequence.len(), "Sequence complete");
    next.feedback = feedback::for_completion();
    StepOutcome::unscheduled(next)
}

fn commit_advance(state: &SequenceState, from_index: usize) -> SequenceState {
    let mut next = state.clone();
    if !state.advance_pending
        || state.current_index != from_index
        || from_index >= state.last_index
    {
        debug!(
            from_index,
            current_index = state.current_index,
            "Ignoring stale advance"
        );
        return next;
    }

    next.current_index = from_index + 1;
    next.progress = 0.0;
    next.feedback.clear();
    next.is_correct = false;
    next.advance_pending = false;
    info!(index = next.current_index, "Advanced to next pose");
    next
}

/// Owns a validated config together with the state it drives.
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    state: SequenceState,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let state = SequenceState::new(&config);
        Ok(Self { config, state })
    }

    pub fn apply(&mut self, event: &EngineEvent) -> Option<ScheduledAdvance> {
        let outcome = step(&self.state, event, &self.config);
        self.state = outcome.state;
        outcome.scheduled
    }

    pub fn state(&self) -> &SequenceState {
        &self.state
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn snapshot(&self) -> Snapshot {
        self.state.snapshot(&self.config)
    }

    pub fn is_complete(&self) -> bool {
        self.state.is_complete()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{PoseId, PoseSequence};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn two_pose_config() -> EngineConfig {
        EngineConfig::practice(PoseSequence::new(["p0", "p1"]))
            .with_progress_step(50.0)
            .with_hold_threshold(100.0)
            .with_advance_delay(Duration::from_millis(1000))
    }

    fn engine(config: EngineConfig) -> Engine {
        Engine::new(config).expect("valid config")
    }

    #[test]
    fn holding_the_pose_schedules_one_advance() {
        let mut engine = engine(two_pose_config());
        assert_eq!(engine.apply(&EngineEvent::observed("p0", 0.9)), None);
        assert_eq!(engine.state().progress, 50.0);

        let scheduled = engine.apply(&EngineEvent::observed("p0", 0.9));
        assert_eq!(
            scheduled,
            Some(ScheduledAdvance {
                from_index: 0,
                delay: Duration::from_millis(1000)
            })
        );
        assert_eq!(engine.state().progress, 100.0);
        assert_eq!(engine.state().current_index, 0);

        engine.apply(&EngineEvent::CommitAdvance { from_index: 0 });
        assert_eq!(engine.state().current_index, 1);
        assert_eq!(engine.state().progress, 0.0);
        assert!(engine.state().feedback.is_empty());
    }

    #[test]
    fn mismatch_resets_progress() {
        let mut engine = engine(two_pose_config());
        engine.apply(&EngineEvent::observed("p0", 0.9));
        engine.apply(&EngineEvent::observed("p1", 0.9));
        assert_eq!(engine.state().progress, 0.0);
        assert_eq!(engine.state().current_index, 0);
        assert!(!engine.state().is_correct);
        assert_eq!(engine.state().feedback.len(), 3);
        assert_eq!(engine.state().feedback[0], "You're doing P1");
        assert_eq!(engine.state().feedback[1], "Please do P0 instead");
    }

    #[test]
    fn absence_leaves_progress_alone() {
        let mut engine = engine(two_pose_config());
        let initial = engine.state().clone();
        for _ in 0..5 {
            assert_eq!(engine.apply(&EngineEvent::no_body()), None);
        }
        assert_eq!(engine.state().current_index, initial.current_index);
        assert_eq!(engine.state().progress, initial.progress);
        assert_eq!(
            engine.state().feedback,
            feedback::for_absence(&Absence::NoBody)
        );

        engine.apply(&EngineEvent::observed("p0", 0.9));
        engine.apply(&EngineEvent::unavailable("connection refused"));
        assert_eq!(engine.state().progress, 50.0);
        assert_eq!(engine.state().detected, None);
        assert_eq!(
            engine.state().feedback[0],
            "Cannot reach the pose classifier"
        );
    }

    #[test]
    fn learn_mode_never_completes() {
        let mut engine = engine(EngineConfig::learn("p0").with_progress_step(50.0));
        assert_eq!(engine.apply(&EngineEvent::observed("p0", 0.9)), None);
        assert_eq!(engine.apply(&EngineEvent::observed("p0", 0.9)), None);
        assert_eq!(engine.state().progress, 100.0);
        assert!(!engine.is_complete());

        assert_eq!(engine.apply(&EngineEvent::observed("p0", 0.9)), None);
        assert_eq!(engine.state().progress, 100.0);
        assert_eq!(engine.state().feedback[0], feedback::HOLD_STEADY);

        engine.apply(&EngineEvent::observed("p1", 0.9));
        assert_eq!(engine.state().progress, 0.0);
        assert_eq!(engine.state().current_index, 0);
    }

    #[test]
    fn matches_during_advance_window_do_not_double_advance() {
        let mut engine = engine(two_pose_config());
        engine.apply(&EngineEvent::observed("p0", 0.9));
        assert!(engine.apply(&EngineEvent::observed("p0", 0.9)).is_some());
        assert!(engine.apply(&EngineEvent::observed("p0", 0.9)).is_none());
        assert!(engine.apply(&EngineEvent::observed("p0", 0.9)).is_none());

        engine.apply(&EngineEvent::CommitAdvance { from_index: 0 });
        engine.apply(&EngineEvent::CommitAdvance { from_index: 0 });
        assert_eq!(engine.state().current_index, 1);
        assert_eq!(engine.state().progress, 0.0);
    }

    #[test]
    fn early_observation_of_next_pose_converges() {
        let mut engine = engine(two_pose_config());
        engine.apply(&EngineEvent::observed("p0", 0.9));
        engine.apply(&EngineEvent::observed("p0", 0.9));

        // The user moved on before the advance fired; judged against the old target.
        engine.apply(&EngineEvent::observed("p1", 0.9));
        assert_eq!(engine.state().current_index, 0);
        assert_eq!(engine.state().progress, 0.0);
        assert!(engine.state().advance_pending);

        engine.apply(&EngineEvent::CommitAdvance { from_index: 0 });
        assert_eq!(engine.state().current_index, 1);

        engine.apply(&EngineEvent::observed("p1", 0.9));
        engine.apply(&EngineEvent::observed("p1", 0.9));
        assert!(engine.is_complete());
    }

    #[test]
    fn stale_commit_is_ignored() {
        let mut engine = engine(two_pose_config());
        let before = engine.state().clone();
        engine.apply(&EngineEvent::CommitAdvance { from_index: 0 });
        assert_eq!(engine.state(), &before);

        engine.apply(&EngineEvent::observed("p0", 0.9));
        engine.apply(&EngineEvent::observed("p0", 0.9));
        engine.apply(&EngineEvent::CommitAdvance { from_index: 3 });
        assert_eq!(engine.state().current_index, 0);
    }

    #[test]
    fn completion_is_terminal() {
        let config = EngineConfig::practice(PoseSequence::new(["p0"])).with_progress_step(50.0);
        let mut engine = engine(config);
        engine.apply(&EngineEvent::observed("p0", 0.9));
        assert!(!engine.is_complete());
        assert_eq!(engine.apply(&EngineEvent::observed("p0", 0.9)), None);
        assert!(engine.is_complete());
        assert_eq!(engine.state().feedback, feedback::for_completion());

        engine.apply(&EngineEvent::observed("bhujangasana", 0.9));
        engine.apply(&EngineEvent::no_body());
        assert!(engine.is_complete());
        assert_eq!(engine.state().progress, 100.0);
    }

    #[test]
    fn full_suryanamaskara_run_completes() {
        let mut engine = engine(EngineConfig::default().with_progress_step(25.0));
        let sequence = PoseSequence::suryanamaskara();
        for (index, pose) in sequence.iter().enumerate() {
            assert_eq!(engine.state().current_index, index);
            let mut scheduled = None;
            for _ in 0..4 {
                scheduled = engine.apply(&EngineEvent::observed(pose.clone(), 0.95));
            }
            match scheduled {
                Some(advance) => {
                    engine.apply(&advance.event());
                }
                None => assert_eq!(index, sequence.last_index()),
            }
        }
        assert!(engine.is_complete());
        assert!(engine.snapshot().is_complete);
    }

    #[test]
    fn confidence_floor_gates_matching() {
        let config = two_pose_config().with_confidence_floor(0.8);
        let mut engine = engine(config);
        engine.apply(&EngineEvent::observed("p0", 0.79));
        assert_eq!(engine.state().progress, 0.0);
        assert!(!engine.state().is_correct);
        assert_eq!(engine.state().feedback[1], "Hold P0 more precisely");

        engine.apply(&EngineEvent::observed("p0", 0.8));
        assert_eq!(engine.state().progress, 50.0);
        assert!(engine.state().is_correct);
    }

    #[test]
    fn threshold_below_full_snaps_to_full() {
        let config = two_pose_config()
            .with_progress_step(30.0)
            .with_hold_threshold(60.0);
        let mut engine = engine(config);
        engine.apply(&EngineEvent::observed("p0", 0.9));
        assert_eq!(engine.state().progress, 30.0);
        assert!(engine.apply(&EngineEvent::observed("p0", 0.9)).is_some());
        assert_eq!(engine.state().progress, 100.0);
    }

    #[test]
    fn progress_is_capped() {
        let config = EngineConfig::learn("p0").with_progress_step(40.0);
        let mut engine = engine(config);
        for _ in 0..10 {
            engine.apply(&EngineEvent::observed("p0", 0.9));
            assert!(engine.state().progress <= 100.0);
        }
        assert_eq!(engine.state().progress, 100.0);
    }

    #[test]
    fn step_does_not_touch_the_sequence() {
        let config = two_pose_config();
        let before = config.sequence.clone();
        let state = SequenceState::new(&config);
        let _ = step(&state, &EngineEvent::observed("p0", 0.9), &config);
        assert_eq!(config.sequence, before);
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let empty = EngineConfig::practice(PoseSequence::new(Vec::<PoseId>::new()));
        assert!(matches!(Engine::new(empty), Err(ConfigError::EmptySequence)));
    }

    #[test]
    fn random_streams_preserve_invariants() {
        let labels = ["p0", "p1", "p2", "other"];
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..50 {
            let config = EngineConfig::practice(PoseSequence::new(["p0", "p1", "p2"]))
                .with_progress_step(rng.random_range(1.0..60.0));
            let mut engine = engine(config);
            let mut pending: Vec<ScheduledAdvance> = Vec::new();

            for _ in 0..500 {
                let before = engine.state().clone();
                let event = match rng.random_range(0..10) {
                    0 => EngineEvent::no_body(),
                    1 => EngineEvent::unavailable("timeout"),
                    2 if !pending.is_empty() => pending.remove(0).event(),
                    _ => EngineEvent::observed(
                        labels[rng.random_range(0..labels.len())],
                        rng.random::<f32>(),
                    ),
                };
                if let Some(advance) = engine.apply(&event) {
                    pending.push(advance);
                }
                let after = engine.state();

                assert!(after.current_index >= before.current_index);
                assert!(after.current_index <= before.current_index + 1);
                assert!((0.0..=100.0).contains(&after.progress));
                assert_eq!(
                    after.is_complete(),
                    after.current_index == 2 && after.progress >= 100.0
                );
                assert!(pending.len() <= 1);

                if let EngineEvent::Absent(_) = &event {
                    assert_eq!(after.current_index, before.current_index);
                    assert_eq!(after.progress, before.progress);
                    assert!(!after.feedback.is_empty());
                }
                if let EngineEvent::Observed(observation) = &event {
                    let target = engine.config().sequence[before.current_index].clone();
                    if observation.label != target && !before.is_complete() {
                        assert_eq!(after.progress, 0.0);
                        assert!(!after.feedback.is_empty());
                    }
                }
            }
        }
    }
}
