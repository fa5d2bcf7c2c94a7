//! Session deletion with best-effort artifact cleanup

use super::{SessionRecord, SharedRegistry};
use booth_common::{Result, StorageLayout};
use serde::Serialize;
use std::io::ErrorKind;
use tracing::{info, warn};

/// Aggregate outcome of removing a session's files
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeletionReport {
    pub deleted: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

impl DeletionReport {
    /// Some artifact could not be removed (the record is gone regardless)
    pub fn is_partial_failure(&self) -> bool {
        self.failed > 0
    }

    pub fn message(&self) -> String {
        format!("{} files deleted, {} failed", self.deleted, self.failed)
    }

    async fn remove(&mut self, layout: &StorageLayout, kind: &str, relative: &str) {
        let path = layout.resolve(relative);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                self.deleted += 1;
                info!(path = %relative, "Deleted {}", kind);
            }
            // Already gone (e.g. final image was the first photo)
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => {
                self.failed += 1;
                self.errors
                    .push(format!("Failed to delete {} {}: {}", kind, relative, e));
            }
        }
    }
}

/// Delete a session and its files
///
/// **Algorithm:**
/// 1. Remove the record under the write lock (unknown hash: `NotFound`, no
///    files touched)
/// 2. Outside the lock, delete the QR image, the final image, then every photo
/// 3. Collect per-file failures without aborting
pub async fn delete_session(
    registry: &SharedRegistry,
    layout: &StorageLayout,
    hash: &str,
) -> Result<DeletionReport> {
    let record = registry.write().await.remove(hash)?;
    let report = remove_artifacts(layout, &record).await;

    if report.is_partial_failure() {
        warn!(
            hash = %hash,
            deleted = report.deleted,
            failed = report.failed,
            "Session deleted with leftover files"
        );
    } else {
        info!(hash = %hash, deleted = report.deleted, "Session deleted");
    }
    Ok(report)
}

async fn remove_artifacts(layout: &StorageLayout, record: &SessionRecord) -> DeletionReport {
    let mut report = DeletionReport::default();

    if let Some(qr_path) = &record.qr_path {
        report.remove(layout, "QR code", qr_path).await;
    }
    if let Some(final_img) = &record.final_img {
        report.remove(layout, "final image", final_img).await;
    }
    for photo in &record.photos {
        report.remove(layout, "photo", photo).await;
    }

    report
}
