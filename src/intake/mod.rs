pub mod classifier;
pub mod frame_source;
pub mod http;
pub mod normalize;
pub mod response;

pub use classifier::{
    ClassifierService, ObservationService, PoseClassifier, create_observation_service, observe,
};
pub use frame_source::{ChannelFrameSource, FrameSource, spawn_line_reader};
pub use http::HttpPoseClassifier;
pub use normalize::normalize_response;
pub use response::{HealthResponse, PosesResponse, PredictResponse};
