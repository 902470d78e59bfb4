use super::metrics::SessionMetrics;
use super::scheduler::AdvanceScheduler;
use crate::engine::{Engine, EngineConfig, EngineEvent, Snapshot};
use crate::error::{ConfigError, SessionError};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};
use uuid::Uuid;

pub enum SessionCommand {
    Event(EngineEvent),
    Snapshot {
        responder: oneshot::Sender<Snapshot>,
    },
    Metrics {
        responder: oneshot::Sender<SessionMetrics>,
    },
    Stop,
}

#[derive(Clone)]
pub struct SessionHandle {
    id: Uuid,
    command_tx: mpsc::Sender<SessionCommand>,
    snapshot_rx: watch::Receiver<Snapshot>,
}

impl SessionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub async fn submit(&self, event: EngineEvent) -> Result<(), SessionError> {
        self.command_tx
            .send(SessionCommand::Event(event))
            .await
            .map_err(|_| SessionError::Closed(self.id))
    }

    /// Snapshot after every command queued before this call has been applied.
    pub async fn current(&self) -> Result<Snapshot, SessionError> {
        let (responder, response_rx) = oneshot::channel();
        self.command_tx
            .send(SessionCommand::Snapshot { responder })
            .await
            .map_err(|_| SessionError::Closed(self.id))?;
        response_rx.await.map_err(|_| SessionError::Closed(self.id))
    }

    pub async fn metrics(&self) -> Result<SessionMetrics, SessionError> {
        let (responder, response_rx) = oneshot::channel();
        self.command_tx
            .send(SessionCommand::Metrics { responder })
            .await
            .map_err(|_| SessionError::Closed(self.id))?;
        response_rx.await.map_err(|_| SessionError::Closed(self.id))
    }

    /// Latest published snapshot, without a round trip.
    pub fn latest(&self) -> Snapshot {
        self.snapshot_rx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_rx.clone()
    }

    /// Resolves once the sequence is complete; errors if the session ends first.
    pub async fn completed(&self) -> Result<Snapshot, SessionError> {
        let mut snapshot_rx = self.snapshot_rx.clone();
        let snapshot = snapshot_rx
            .wait_for(|snapshot| snapshot.is_complete)
            .await
            .map_err(|_| SessionError::Closed(self.id))?;
        Ok(snapshot.clone())
    }

    pub async fn stop(&self) -> Result<(), SessionError> {
        self.command_tx
            .send(SessionCommand::Stop)
            .await
            .map_err(|_| SessionError::Closed(self.id))
    }
}

/// A running practice session. The engine state lives on its own task and is
/// only reachable through [`SessionHandle`].
pub struct PracticeSession {
    id: Uuid,
    task: JoinHandle<SessionMetrics>,
}

impl PracticeSession {
    pub fn start(
        config: EngineConfig,
        command_buffer: usize,
    ) -> Result<(Self, SessionHandle), ConfigError> {
        let engine = Engine::new(config)?;
        let id = Uuid::new_v4();
        let (command_tx, command_rx) = mpsc::channel(command_buffer.max(1));
        let (snapshot_tx, snapshot_rx) = watch::channel(engine.snapshot());

        let actor = SessionActor {
            id,
            scheduler: AdvanceScheduler::new(command_tx.downgrade()),
            engine,
            command_rx,
            snapshot_tx,
            metrics: SessionMetrics::new(),
        };
        info!(session = %id, mode = ?actor.engine.config().mode, poses = actor.engine.config().sequence.len(), "Starting practice session");
        let task = tokio::spawn(actor.run());

        Ok((
            Self { id, task },
            SessionHandle {
                id,
                command_tx,
                snapshot_rx,
            },
        ))
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub async fn join(self) -> Result<SessionMetrics, SessionError> {
        self.task
            .await
            .map_err(|e| SessionError::TaskFailed(e.to_string()))
    }

    pub fn abort(&self) {
        self.task.abort();
    }
}

struct SessionActor {
    id: Uuid,
    engine: Engine,
    scheduler: AdvanceScheduler,
    command_rx: mpsc::Receiver<SessionCommand>,
    snapshot_tx: watch::Sender<Snapshot>,
    metrics: SessionMetrics,
}

impl SessionActor {
    async fn run(mut self) -> SessionMetrics {
        while let Some(command) = self.command_rx.recv().await {
            match command {
                SessionCommand::Event(event) => self.handle_event(event),
                SessionCommand::Snapshot { responder } => {
                    let _ = responder.send(self.engine.snapshot());
                }
                SessionCommand::Metrics { responder } => {
                    let _ = responder.send(self.metrics.clone());
                }
                SessionCommand::Stop => break,
            }
        }

        self.scheduler.cancel_all();
        info!(
            session = %self.id,
            observations = self.metrics.observations,
            matches = self.metrics.matches,
            mismatches = self.metrics.mismatches,
            no_body = self.metrics.no_body,
            source_unavailable = self.metrics.source_unavailable,
            advances = self.metrics.advances,
            completed = self.metrics.completed,
            elapsed_s = self.metrics.elapsed().num_seconds(),
            "Practice session ended"
        );
        self.metrics
    }

    #[instrument(skip(self, event), fields(session = %self.id, kind = event.kind()))]
    fn handle_event(&mut self, event: EngineEvent) {
        let before = self.engine.state().clone();
        let scheduled = self.engine.apply(&event);
        self.metrics.record(&event, &before, self.engine.state());

        if let Some(advance) = scheduled {
            self.scheduler.schedule(advance);
        }

        let snapshot = self.engine.snapshot();
        debug!(
            index = snapshot.current_index,
            progress = snapshot.progress,
            correct = snapshot.is_correct,
            "Published snapshot"
        );
        self.snapshot_tx.send_replace(snapshot);
    }
}
