pub mod common;
pub mod config;
pub mod coordinator;
pub mod engine;
pub mod error;
pub mod intake;
pub mod session;

pub use error::{AppError, BoundaryError, ConfigError, SessionError};

pub use config::Settings;
pub use coordinator::{Coordinator, CoordinatorBuilder};
pub use engine::{Engine, EngineConfig, EngineEvent, Snapshot, step};
pub use session::{PracticeSession, SessionHandle};
