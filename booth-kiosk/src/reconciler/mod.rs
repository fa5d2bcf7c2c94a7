//! Filesystem-to-registry reconciliation
//!
//! Turns folder/photo/output events into registry updates. Events are applied
//! one at a time in arrival order with no coalescing; the registry operations
//! are idempotent, so watcher re-announcements and startup-scan overlap are
//! harmless.
//!
//! Watchers are armed before the startup scan so entries created while it runs
//! are queued rather than missed. The scan feeds existing folders and outputs
//! through the same code path as live events, so a restart rebuilds
//! equivalent state from disk (access tokens excepted, they are re-randomised).

pub mod watcher;

pub use watcher::{spawn_watchers, WatchHandles};

use crate::qr::{spawn_qr_job, QrService};
use crate::registry::{FolderUpsert, QrJob, SharedRegistry};
use booth_common::classify::{classify, classify_output_name, is_image_name, EntryOrigin, PathKind};
use booth_common::{Error, Result, SessionFolder, StorageLayout};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, info, warn};

/// A filesystem change relevant to the session registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileEvent {
    /// Directory created directly under the photos root
    DirectoryCreated(PathBuf),
    /// Image created inside a session folder
    PhotoCreated(PathBuf),
    /// File created in the output directory
    OutputCreated(PathBuf),
}

/// Startup scan statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    /// Photo subfolders visited
    pub folders: usize,
    /// Output files visited
    pub outputs: usize,
    /// Entries skipped because of read errors
    pub skipped: usize,
    /// Sessions in the registry after the scan
    pub sessions: usize,
}

#[derive(Clone)]
pub struct Reconciler {
    registry: SharedRegistry,
    layout: Arc<StorageLayout>,
    qr: QrService,
}

impl Reconciler {
    pub fn new(registry: SharedRegistry, layout: Arc<StorageLayout>, qr: QrService) -> Self {
        Self {
            registry,
            layout,
            qr,
        }
    }

    /// Apply one event
    pub async fn apply(&self, event: ReconcileEvent) -> Result<()> {
        match event {
            ReconcileEvent::DirectoryCreated(path) => self.on_directory(&path).await,
            ReconcileEvent::PhotoCreated(path) => self.on_photo(&path).await,
            ReconcileEvent::OutputCreated(path) => self.on_output(&path).await,
        }
    }

    /// Session folder appeared: upsert, then pick up photos already inside
    async fn on_directory(&self, path: &Path) -> Result<()> {
        let Some(relative) = path.strip_prefix(&self.layout.photos_dir).ok() else {
            return Ok(());
        };
        let PathKind::SessionFolder(folder) = classify(relative, EntryOrigin::PhotosTree, true)
        else {
            debug!(path = %path.display(), "Ignoring non-session directory");
            return Ok(());
        };

        let upsert = self.registry.write().await.upsert_from_folder(&folder.name);
        let hash = match upsert {
            FolderUpsert::Created(job) => {
                let hash = job.hash.clone();
                self.start_qr(job);
                hash
            }
            FolderUpsert::Existing(hash) => hash,
            FolderUpsert::Ignored => return Ok(()),
        };

        // The recursive watch arms the new folder asynchronously, so files that
        // landed before it did are only visible through a listing
        self.record_photo_folder(path, &hash).await.map(|_| ())
    }

    /// Photo appeared: ensure its session exists, then record the folder
    async fn on_photo(&self, path: &Path) -> Result<()> {
        let Some(relative) = path.strip_prefix(&self.layout.photos_dir).ok() else {
            return Ok(());
        };
        let PathKind::PhotoFile { folder } = classify(relative, EntryOrigin::PhotosTree, false)
        else {
            return Ok(());
        };

        let ensured = self.registry.write().await.ensure_photo_session(&folder);
        let Some((hash, job)) = ensured else {
            debug!(folder = %folder.name, "Photo folder belongs to a deleted session");
            return Ok(());
        };
        if let Some(job) = job {
            self.start_qr(job);
        }

        match path.parent() {
            Some(folder_path) => self.record_photo_folder(folder_path, &hash).await.map(|_| ()),
            None => Ok(()),
        }
    }

    /// Output image appeared
    async fn on_output(&self, path: &Path) -> Result<()> {
        let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
            return Ok(());
        };
        let Some(relative) = self.layout.relative(path) else {
            return Ok(());
        };

        let outcome = self
            .registry
            .write()
            .await
            .record_output_file(file_name, relative);
        debug!(file = %file_name, ?outcome, "Output file applied");
        Ok(())
    }

    /// List accepted images in a session folder and append them to `hash`
    ///
    /// Files are taken in name order so the first capture becomes the
    /// placeholder. Returns how many new photos were recorded.
    pub async fn record_photo_folder(&self, folder_path: &Path, hash: &str) -> Result<usize> {
        let photos = list_images(folder_path)
            .await?
            .into_iter()
            .filter_map(|path| self.layout.relative(&path))
            .collect::<Vec<_>>();

        match self.registry.write().await.record_photos(hash, photos) {
            Ok(added) => Ok(added),
            // Folder outlived its session (deleted via the admin API)
            Err(Error::NotFound(_)) => Ok(0),
            Err(e) => Err(e),
        }
    }

    /// Populate the registry from what is already on disk
    ///
    /// Unreadable folders are logged and skipped; the scan never fails startup.
    pub async fn initial_scan(&self) -> ScanSummary {
        info!("Scanning existing session folders...");
        let mut summary = ScanSummary::default();

        match sorted_entries(&self.layout.photos_dir).await {
            Ok(entries) => {
                for (path, is_dir) in entries {
                    if !is_dir {
                        continue;
                    }
                    summary.folders += 1;
                    if let Err(e) = self.scan_folder(&path).await {
                        warn!(path = %path.display(), "Skipping folder: {}", e);
                        summary.skipped += 1;
                    }
                }
            }
            Err(e) => warn!(path = %self.layout.photos_dir.display(), "Cannot read photos directory: {}", e),
        }

        match sorted_entries(&self.layout.output_dir).await {
            Ok(entries) => {
                for (path, is_dir) in entries {
                    if is_dir {
                        continue;
                    }
                    summary.outputs += 1;
                    self.scan_output(&path).await;
                }
            }
            Err(e) => warn!(path = %self.layout.output_dir.display(), "Cannot read output directory: {}", e),
        }

        summary.sessions = self.registry.read().await.len();
        info!(
            folders = summary.folders,
            outputs = summary.outputs,
            skipped = summary.skipped,
            sessions = summary.sessions,
            "Existing session scan complete"
        );
        summary
    }

    async fn scan_folder(&self, path: &Path) -> Result<()> {
        self.on_directory(path).await?;

        // Token-named folders are only ever registered through their photos
        let token_folder = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(SessionFolder::parse)
            .map(|folder| !folder.qualifies_for_upsert())
            .unwrap_or(false);
        if token_folder {
            if let Some(first) = list_images(path).await?.into_iter().next() {
                self.on_photo(&first).await?;
            }
        }
        Ok(())
    }

    async fn scan_output(&self, path: &Path) {
        let (Some(file_name), Some(relative)) = (
            path.file_name().and_then(|name| name.to_str()),
            self.layout.relative(path),
        ) else {
            return;
        };

        let mut registry = self.registry.write().await;
        match classify_output_name(file_name) {
            PathKind::OutputFinalFile { .. } => {
                registry.record_output_file(file_name, relative);
            }
            PathKind::OutputCandidateFile { .. } => {
                registry.record_output_candidate(file_name, relative);
            }
            _ => {}
        }
    }

    fn start_qr(&self, job: QrJob) {
        spawn_qr_job(self.registry.clone(), self.qr.clone(), job);
    }

    /// Arm the photos and output watchers
    ///
    /// Events queue in the returned channel until it is drained, so nothing
    /// created between arming and draining is lost.
    pub fn watch(&self) -> Result<(WatchHandles, UnboundedReceiver<ReconcileEvent>)> {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let handles = spawn_watchers(&self.layout, events_tx)?;
        Ok((handles, events_rx))
    }

    /// Arm the watchers, run the startup scan, then drain events in the background
    ///
    /// The watchers must outlive the service; dropping the handles stops them.
    pub async fn start(self) -> Result<(WatchHandles, ScanSummary)> {
        let (handles, events) = self.watch()?;
        let summary = self.initial_scan().await;
        tokio::spawn(run_event_loop(self, events));
        Ok((handles, summary))
    }
}

/// Apply watcher events until every sender is dropped
pub async fn run_event_loop(reconciler: Reconciler, mut events: UnboundedReceiver<ReconcileEvent>) {
    while let Some(event) = events.recv().await {
        debug!(?event, "Reconciling");
        if let Err(e) = reconciler.apply(event).await {
            warn!("Failed to reconcile event: {}", e);
        }
    }
    info!("Watch event stream closed");
}

/// Directory entries sorted by name, with their directory flag
async fn sorted_entries(dir: &Path) -> Result<Vec<(PathBuf, bool)>> {
    let mut reader = tokio::fs::read_dir(dir).await?;
    let mut entries = Vec::new();
    while let Some(entry) = reader.next_entry().await? {
        let name = entry.file_name();
        if name.to_string_lossy().starts_with('.') {
            continue;
        }
        match entry.file_type().await {
            Ok(file_type) => entries.push((entry.path(), file_type.is_dir())),
            Err(e) => warn!(path = %entry.path().display(), "Cannot stat entry: {}", e),
        }
    }
    entries.sort();
    Ok(entries)
}

async fn list_images(folder: &Path) -> Result<Vec<PathBuf>> {
    Ok(sorted_entries(folder)
        .await?
        .into_iter()
        .filter(|(path, is_dir)| {
            !is_dir
                && path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .map(is_image_name)
                    .unwrap_or(false)
        })
        .map(|(path, _)| path)
        .collect())
}
