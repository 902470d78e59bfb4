pub mod config;
pub mod event;
pub mod feedback;
pub mod state;
pub mod step;

pub use config::{CanonicalMatcher, EngineConfig, PoseMatcher, SessionMode, MAX_PROGRESS};
pub use event::{Absence, EngineEvent, Observation};
pub use state::{Detection, SequenceState, Snapshot};
pub use step::{step, Engine, ScheduledAdvance, StepOutcome};
