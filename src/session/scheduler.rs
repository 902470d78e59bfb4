use super::session::SessionCommand;
use crate::engine::ScheduledAdvance;
use tokio::sync::mpsc::WeakSender;
use tokio::task::JoinHandle;
use tracing::debug;

/// Delivers `CommitAdvance` back into the session once the advance delay has elapsed.
///
/// Holds only a weak sender so a pending timer never keeps a session alive
/// after every handle is gone.
pub struct AdvanceScheduler {
    command_tx: WeakSender<SessionCommand>,
    pending: Vec<JoinHandle<()>>,
}

impl AdvanceScheduler {
    pub fn new(command_tx: WeakSender<SessionCommand>) -> Self {
        Self {
            command_tx,
            pending: Vec::new(),
        }
    }

    pub fn schedule(&mut self, advance: ScheduledAdvance) {
        self.pending.retain(|task| !task.is_finished());
        let command_tx = self.command_tx.clone();
        debug!(
            from_index = advance.from_index,
            delay_ms = advance.delay.as_millis() as u64,
            "Scheduling advance"
        );
        self.pending.push(tokio::spawn(async move {
            tokio::time::sleep(advance.delay).await;
            if let Some(command_tx) = command_tx.upgrade() {
                let _ = command_tx
                    .send(SessionCommand::Event(advance.event()))
                    .await;
            }
        }));
    }

    pub fn pending(&self) -> usize {
        self.pending.iter().filter(|task| !task.is_finished()).count()
    }

    pub fn cancel_all(&mut self) {
        for task in self.pending.drain(..) {
            task.abort();
        }
    }
}

impl Drop for AdvanceScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::EngineEvent;
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[tokio::test(start_paused = true)]
    async fn commit_arrives_after_delay() {
        let (command_tx, mut command_rx) = mpsc::channel(4);
        let mut scheduler = AdvanceScheduler::new(command_tx.downgrade());
        scheduler.schedule(ScheduledAdvance {
            from_index: 2,
            delay: Duration::from_millis(1000),
        });
        assert_eq!(scheduler.pending(), 1);

        tokio::time::sleep(Duration::from_millis(999)).await;
        assert!(command_rx.try_recv().is_err());

        match command_rx.recv().await {
            Some(SessionCommand::Event(EngineEvent::CommitAdvance { from_index })) => {
                assert_eq!(from_index, 2)
            }
            _ => panic!("expected commit"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_advance_never_fires() {
        let (command_tx, mut command_rx) = mpsc::channel(4);
        let mut scheduler = AdvanceScheduler::new(command_tx.downgrade());
        scheduler.schedule(ScheduledAdvance {
            from_index: 0,
            delay: Duration::from_millis(500),
        });
        scheduler.cancel_all();
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(command_rx.try_recv().is_err());
        assert_eq!(scheduler.pending(), 0);
    }
}
