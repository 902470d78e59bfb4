pub mod metrics;
pub mod scheduler;
pub mod session;

pub use metrics::SessionMetrics;
pub use scheduler::AdvanceScheduler;
pub use session::{PracticeSession, SessionCommand, SessionHandle};
