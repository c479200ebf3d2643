//! Ingestion coordinator
//!
//! Consumes the watcher's event stream. Each event names a result file
//! that may still be mid-write: extraction failures a later write will
//! repair are logged and dropped, and the producer's follow-up
//! notification is the retry mechanism. Successful extractions are
//! validated, rescaled once, and handed to the broadcast hub.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};

use crate::extract;
use crate::hub::{Hub, ScoreUpdate};

/// Clamp a raw score to `[0, 1]` and rescale to a whole-number percentage.
///
/// Scaling happens exactly once, here, so every subscriber sees the same
/// transport format no matter which client consumes it.
pub fn scale_score(raw: f64) -> u8 {
    (raw.clamp(0.0, 1.0) * 100.0).round() as u8
}

/// Run the coordinator until the watcher's event stream ends.
///
/// One OS write typically fans out into several notifications (create,
/// then one or more modifies); the per-file memory of the last published
/// percentage collapses that burst into a single broadcast.
pub async fn run(mut events: UnboundedReceiver<PathBuf>, hub: Arc<Hub>, column: String) {
    let mut last_published: HashMap<PathBuf, u8> = HashMap::new();

    while let Some(path) = events.recv().await {
        handle_event(&path, &hub, &column, &mut last_published).await;
    }

    info!("Watcher event stream ended, ingestion coordinator stopping");
}

/// Process one watcher event: open, extract, validate, publish.
///
/// Never escalates. Every failure mode here is either repaired by a later
/// notification for the same file or permanent for that file alone.
async fn handle_event(
    path: &Path,
    hub: &Hub,
    column: &str,
    last_published: &mut HashMap<PathBuf, u8>,
) {
    let raw = match tokio::fs::read(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            // An environment fault, not a write race; waiting will not
            // fix it.
            warn!("Abandoning result file {}: {}", path.display(), e);
            return;
        }
        Err(e) => {
            // Renamed away, deleted, or still locked by the producer: the
            // file simply is not readable right now.
            debug!("Result file {} not readable: {}", path.display(), e);
            return;
        }
    };

    match extract::latest_value(&raw, column) {
        Ok(Some(score)) => {
            let percentage = scale_score(score);
            if last_published.get(path) == Some(&percentage) {
                debug!(
                    "Result file {} unchanged at {}%, not rebroadcasting",
                    path.display(),
                    percentage
                );
                return;
            }
            last_published.insert(path.to_path_buf(), percentage);

            let update = ScoreUpdate {
                ddos_percentage: percentage,
            };
            let delivered = hub.publish(&update);
            info!(
                "Ingested {}: score {:.3} -> {}% (delivered to {} subscribers)",
                path.display(),
                score,
                percentage,
                delivered
            );
        }
        Ok(None) => {
            debug!(
                "Result file {} has no complete data rows yet",
                path.display()
            );
        }
        Err(e) if e.is_retryable() => {
            debug!("Dropping event for {}: {}", path.display(), e);
        }
        Err(e) => {
            // The header is complete but wrong; only a rewrite of the
            // same file could fix it.
            warn!("Abandoning result file {}: {}", path.display(), e);
        }
    }
}
