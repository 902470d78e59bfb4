use std::path::PathBuf;
use std::sync::Arc;
use surya_flow::config::Settings;
use surya_flow::coordinator::CoordinatorBuilder;
use surya_flow::error::AppError;
use surya_flow::intake::{HttpPoseClassifier, spawn_line_reader};
use tracing::{Level, error, info, warn};

fn init_logging(level: Level) {
    tracing_subscriber::fmt().with_max_level(level).init();
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let path = std::env::args().nth(1).map(PathBuf::from);
    let settings = Settings::load(path.as_deref())?;
    init_logging(settings.log_level());

    let classifier = HttpPoseClassifier::new(settings.api_url.clone(), settings.request_timeout())?;
    match classifier.health().await {
        Ok(health) if health.is_ready() => info!(url = %settings.api_url, "Classifier ready"),
        Ok(health) => warn!(status = %health.status, "Classifier reachable but not ready"),
        Err(e) => warn!(error = %e, url = %settings.api_url, "Classifier health check failed"),
    }

    // One base64 (or data URL) frame per stdin line.
    let frames = spawn_line_reader(tokio::io::stdin(), settings.frame_buffer);
    let coordinator = CoordinatorBuilder::new(settings)
        .frame_source(Box::new(frames))
        .classifier(Arc::new(classifier))
        .build()?;

    let mut snapshot_rx = coordinator.handle().subscribe();
    tokio::spawn(async move {
        while snapshot_rx.changed().await.is_ok() {
            let snapshot = snapshot_rx.borrow_and_update().clone();
            info!(
                pose = snapshot.target_display.as_deref().unwrap_or("-"),
                index = snapshot.current_index,
                total = snapshot.total_poses,
                progress = snapshot.progress,
                correct = snapshot.is_correct,
                feedback = %snapshot.feedback.join(" | "),
                "Progress"
            );
            if snapshot.is_complete {
                break;
            }
        }
    });

    let cancel_token = coordinator.cancel_token();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for ctrl-c");
            return;
        }
        info!("Interrupted, stopping");
        cancel_token.cancel();
    });

    let metrics = coordinator.join().await?;
    match serde_json::to_string(&metrics) {
        Ok(summary) => info!(%summary, "Session finished"),
        Err(e) => warn!(error = %e, "Failed to serialize session metrics"),
    }
    Ok(())
}
