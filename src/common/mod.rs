pub mod catalog;
pub mod frame;
pub mod pose;

pub use catalog::{PoseCatalog, PoseInfo};
pub use frame::EncodedFrame;
pub use pose::{PoseId, PoseSequence};
