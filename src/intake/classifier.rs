use super::normalize::normalize_response;
use super::response::PredictResponse;
use crate::common::EncodedFrame;
use crate::engine::EngineEvent;
use crate::error::BoundaryError;
use async_trait::async_trait;
use futures::Future;
use futures::task::{Context, Poll};
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tower::timeout::error::Elapsed;
use tower::util::BoxCloneService;
use tower::{BoxError, Service, ServiceBuilder, ServiceExt};

/// Remote (or fake) pose classifier.
#[async_trait]
pub trait PoseClassifier: Send + Sync {
    async fn classify(&self, frame: &EncodedFrame) -> Result<PredictResponse, BoundaryError>;
    fn name(&self) -> &'static str;
}

/// Adapts a [`PoseClassifier`] to a tower `Service` so it can be layered.
#[derive(Clone)]
pub struct ClassifierService {
    inner: Arc<dyn PoseClassifier>,
}

impl ClassifierService {
    pub fn new(inner: Arc<dyn PoseClassifier>) -> Self {
        Self { inner }
    }
}

impl Service<EncodedFrame> for ClassifierService {
    type Response = PredictResponse;
    type Error = BoundaryError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, frame: EncodedFrame) -> Self::Future {
        let inner = self.inner.clone();
        Box::pin(async move { inner.classify(&frame).await })
    }
}

/// Frame in, engine event out. Never fails once ready.
pub type ObservationService = BoxCloneService<EncodedFrame, EngineEvent, BoxError>;

pub fn create_observation_service(
    classifier: Arc<dyn PoseClassifier>,
    request_timeout: Duration,
) -> ObservationService {
    let service = ServiceBuilder::new()
        .map_result(normalize_layered)
        .concurrency_limit(1)
        .timeout(request_timeout)
        .service(ClassifierService::new(classifier));
    BoxCloneService::new(service)
}

fn normalize_layered(result: Result<PredictResponse, BoxError>) -> Result<EngineEvent, BoxError> {
    Ok(normalize_response(result.map_err(into_boundary_error)))
}

fn into_boundary_error(error: BoxError) -> BoundaryError {
    match error.downcast::<BoundaryError>() {
        Ok(error) => *error,
        Err(error) if error.is::<Elapsed>() => BoundaryError::Timeout,
        Err(error) => BoundaryError::Malformed(error.to_string()),
    }
}

/// Run one frame through the service.
pub async fn observe(service: &mut ObservationService, frame: EncodedFrame) -> EngineEvent {
    match service.ready().await {
        Ok(ready) => match ready.call(frame).await {
            Ok(event) => event,
            Err(error) => EngineEvent::unavailable(error.to_string()),
        },
        Err(error) => EngineEvent::unavailable(error.to_string()),
    }
}
