use crate::{
    config::Settings,
    engine::{EngineConfig, EngineEvent, SessionMode},
    error::{AppError, BoundaryError},
    intake::{FrameSource, ObservationService, PoseClassifier, create_observation_service, observe},
    session::{PracticeSession, SessionHandle, SessionMetrics},
};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Drives one practice session: samples a frame every poll tick, classifies it
/// and feeds the resulting event to the session.
pub struct Coordinator {
    handle: SessionHandle,
    polling_task: Option<JoinHandle<Result<SessionMetrics, AppError>>>,
    cancel_token: CancellationToken,
}

impl Coordinator {
    fn new(
        source: Box<dyn FrameSource>,
        service: ObservationService,
        session: PracticeSession,
        handle: SessionHandle,
        poll_interval: Duration,
        mode: SessionMode,
    ) -> Self {
        let cancel_token = CancellationToken::new();
        let polling_task = tokio::spawn(Self::poll(
            source,
            service,
            session,
            handle.clone(),
            poll_interval,
            mode == SessionMode::Sequence,
            cancel_token.clone(),
        ));

        Self {
            handle,
            polling_task: Some(polling_task),
            cancel_token,
        }
    }

    async fn poll(
        mut source: Box<dyn FrameSource>,
        mut service: ObservationService,
        session: PracticeSession,
        handle: SessionHandle,
        poll_interval: Duration,
        stop_on_complete: bool,
        cancel_token: CancellationToken,
    ) -> Result<SessionMetrics, AppError> {
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => {
                    info!(session = %handle.id(), "Polling cancelled");
                    break;
                }
                _ = ticker.tick() => {}
            }

            let event = tokio::select! {
                _ = cancel_token.cancelled() => {
                    info!(session = %handle.id(), "Polling cancelled mid-frame");
                    break;
                }
                tick = next_event(source.as_mut(), &mut service) => match tick {
                    Tick::Event(event) => event,
                    Tick::Idle => continue,
                    Tick::Closed => {
                        info!(session = %handle.id(), "Frame source closed");
                        break;
                    }
                },
            };
            tokio::select! {
                _ = cancel_token.cancelled() => break,
                submitted = handle.submit(event) => submitted?,
            }

            if stop_on_complete && handle.current().await?.is_complete {
                info!(session = %handle.id(), "Sequence complete, stopping");
                break;
            }
        }

        handle.stop().await?;
        Ok(session.join().await?)
    }

    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    pub fn stop(&self) {
        self.cancel_token.cancel();
    }

    /// Waits for polling to end and returns the session's final metrics.
    pub async fn join(mut self) -> Result<SessionMetrics, AppError> {
        let task = self
            .polling_task
            .take()
            .ok_or(AppError::Coordinator("Polling task already joined".to_string()))?;
        task.await
            .map_err(|e| AppError::Coordinator(format!("Polling task failed: {}", e)))?
    }
}

enum Tick {
    Event(EngineEvent),
    Idle,
    Closed,
}

async fn next_event(source: &mut dyn FrameSource, service: &mut ObservationService) -> Tick {
    match source.capture().await {
        Ok(Some(frame)) => {
            debug!(frame = %frame.frame_id(), "Captured frame");
            Tick::Event(observe(service, frame).await)
        }
        Ok(None) => Tick::Idle,
        Err(BoundaryError::SourceClosed) => Tick::Closed,
        Err(e) => {
            warn!(error = %e, "Frame capture failed");
            Tick::Event(EngineEvent::unavailable(e.to_string()))
        }
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        self.stop();
    }
}

pub struct CoordinatorBuilder {
    settings: Settings,
    engine_config: Option<EngineConfig>,
    frame_source: Option<Box<dyn FrameSource>>,
    classifier: Option<Arc<dyn PoseClassifier>>,
    poll_interval: Duration,
    request_timeout: Duration,
}

impl CoordinatorBuilder {
    pub fn new(settings: Settings) -> Self {
        Self {
            poll_interval: settings.poll_interval(),
            request_timeout: settings.request_timeout(),
            settings,
            engine_config: None,
            frame_source: None,
            classifier: None,
        }
    }

    // Replaces the engine configuration derived from the settings.
    pub fn engine_config(mut self, engine_config: EngineConfig) -> Self {
        self.engine_config = Some(engine_config);
        self
    }

    pub fn frame_source(mut self, frame_source: Box<dyn FrameSource>) -> Self {
        self.frame_source = Some(frame_source);
        self
    }

    pub fn classifier(mut self, classifier: Arc<dyn PoseClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    // Adjusts the polling interval, this will override the loaded settings.
    pub fn poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    // Adjusts the classifier timeout, this will override the loaded settings.
    pub fn request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    pub fn build(self) -> Result<Coordinator, AppError> {
        let frame_source = self
            .frame_source
            .ok_or(AppError::Coordinator("Frame source not set".to_string()))?;
        let classifier = self
            .classifier
            .ok_or(AppError::Coordinator("Classifier not set".to_string()))?;
        let engine_config = match self.engine_config {
            Some(engine_config) => engine_config,
            None => self.settings.engine_config()?,
        };
        if self.poll_interval.is_zero() {
            return Err(AppError::Coordinator("Poll interval must be greater than 0".to_string()));
        }
        if self.request_timeout.is_zero() {
            return Err(AppError::Coordinator("Request timeout must be greater than 0".to_string()));
        }

        info!(
            classifier = classifier.name(),
            poll_interval = ?self.poll_interval,
            request_timeout = ?self.request_timeout,
            "Building coordinator"
        );
        let mode = engine_config.mode;
        let service = create_observation_service(classifier, self.request_timeout);
        let (session, handle) = PracticeSession::start(engine_config, self.settings.command_buffer)?;
        Ok(Coordinator::new(
            frame_source,
            service,
            session,
            handle,
            self.poll_interval,
            mode,
        ))
    }
}
