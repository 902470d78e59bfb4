use crate::common::EncodedFrame;
use crate::error::BoundaryError;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc::{self, error::TryRecvError};
use tracing::{debug, warn};

/// Producer of encoded frames, sampled once per polling tick.
#[async_trait]
pub trait FrameSource: Send {
    /// `Ok(None)` when no frame is ready yet this tick.
    async fn capture(&mut self) -> Result<Option<EncodedFrame>, BoundaryError>;
}

/// Frames pushed by some capture task. Only the newest queued frame is used;
/// older ones are stale by the time the tick comes around.
pub struct ChannelFrameSource {
    frame_rx: mpsc::Receiver<EncodedFrame>,
}

impl ChannelFrameSource {
    pub fn new(frame_rx: mpsc::Receiver<EncodedFrame>) -> Self {
        Self { frame_rx }
    }

    pub fn channel(buffer: usize) -> (mpsc::Sender<EncodedFrame>, Self) {
        let (frame_tx, frame_rx) = mpsc::channel(buffer);
        (frame_tx, Self::new(frame_rx))
    }
}

#[async_trait]
impl FrameSource for ChannelFrameSource {
    async fn capture(&mut self) -> Result<Option<EncodedFrame>, BoundaryError> {
        let mut latest = None;
        loop {
            match self.frame_rx.try_recv() {
                Ok(frame) => latest = Some(frame),
                Err(TryRecvError::Empty) => return Ok(latest),
                Err(TryRecvError::Disconnected) => {
                    return match latest {
                        Some(frame) => Ok(Some(frame)),
                        None => Err(BoundaryError::SourceClosed),
                    };
                }
            }
        }
    }
}

/// Read one encoded frame per line from `reader` on a background task.
pub fn spawn_line_reader<R>(reader: R, buffer: usize) -> ChannelFrameSource
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (frame_tx, source) = ChannelFrameSource::channel(buffer);
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    if frame_tx.send(EncodedFrame::now(line)).await.is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    debug!("Frame input reached end of stream");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to read frame input");
                    break;
                }
            }
        }
    });
    source
}
