//! Native filesystem watchers feeding the reconciler
//!
//! The photos root is watched recursively and the output root flat. Raw
//! notify events are classified here, on notify's own thread, and only
//! session-relevant ones are forwarded to the async event loop.

use super::ReconcileEvent;
use booth_common::{classify, EntryOrigin, Error, PathKind, Result, StorageLayout};
use notify::event::{CreateKind, ModifyKind, RenameMode};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

/// Keeps both watchers alive; dropping it stops event delivery
pub struct WatchHandles {
    _photos: RecommendedWatcher,
    _output: RecommendedWatcher,
}

/// Start watching the photos and output directories
///
/// Both directories must exist (see [`StorageLayout::ensure_directories`]).
pub fn spawn_watchers(
    layout: &StorageLayout,
    events: UnboundedSender<ReconcileEvent>,
) -> Result<WatchHandles> {
    let photos = watch_tree(
        &layout.photos_dir,
        EntryOrigin::PhotosTree,
        RecursiveMode::Recursive,
        events.clone(),
    )?;
    let output = watch_tree(
        &layout.output_dir,
        EntryOrigin::OutputTree,
        RecursiveMode::NonRecursive,
        events,
    )?;

    info!(
        photos = %layout.photos_dir.display(),
        output = %layout.output_dir.display(),
        "Filesystem watchers started"
    );
    Ok(WatchHandles {
        _photos: photos,
        _output: output,
    })
}

fn watch_tree(
    root: &Path,
    origin: EntryOrigin,
    mode: RecursiveMode,
    events: UnboundedSender<ReconcileEvent>,
) -> Result<RecommendedWatcher> {
    let watch_root = root.to_path_buf();
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for (path, is_dir) in created_paths(&event) {
                    let is_dir = is_dir.unwrap_or_else(|| path.is_dir());
                    if let Some(translated) = translate(&watch_root, origin, &path, is_dir) {
                        if events.send(translated).is_err() {
                            debug!("Reconciler gone, dropping watch event");
                        }
                    }
                }
            }
            Err(e) => warn!("Watch error: {}", e),
        },
        Config::default(),
    )
    .map_err(|e| Error::Internal(format!("Failed to create watcher: {}", e)))?;

    watcher
        .watch(root, mode)
        .map_err(|e| Error::Internal(format!("Failed to watch {}: {}", root.display(), e)))?;
    Ok(watcher)
}

/// Paths that newly appeared in a raw event, with a directory flag if known
fn created_paths(event: &Event) -> Vec<(PathBuf, Option<bool>)> {
    let known = |is_dir: Option<bool>| {
        event
            .paths
            .iter()
            .map(move |path| (path.clone(), is_dir))
            .collect::<Vec<_>>()
    };

    match event.kind {
        EventKind::Create(CreateKind::Folder) => known(Some(true)),
        EventKind::Create(CreateKind::File) => known(Some(false)),
        EventKind::Create(_) => known(None),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => known(None),
        // [from, to]
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => event
            .paths
            .last()
            .map(|path| vec![(path.clone(), None)])
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Map an absolute path under `root` to a reconcile event
///
/// Depth and hidden-entry rules come from the classifier, so a recursive
/// watch on the photos root never reaches beyond one subfolder level.
pub(crate) fn translate(
    root: &Path,
    origin: EntryOrigin,
    path: &Path,
    is_dir: bool,
) -> Option<ReconcileEvent> {
    let relative = path.strip_prefix(root).ok()?;
    match classify(relative, origin, is_dir) {
        PathKind::SessionFolder(_) => Some(ReconcileEvent::DirectoryCreated(path.to_path_buf())),
        PathKind::PhotoFile { .. } => Some(ReconcileEvent::PhotoCreated(path.to_path_buf())),
        PathKind::OutputFinalFile { .. } => Some(ReconcileEvent::OutputCreated(path.to_path_buf())),
        // Candidates only matter to the startup scan
        PathKind::OutputCandidateFile { .. } | PathKind::Unrecognized => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_photos_tree() {
        let root = Path::new("/data/photos");

        assert_eq!(
            translate(root, EntryOrigin::PhotosTree, &root.join("20240101_120000"), true),
            Some(ReconcileEvent::DirectoryCreated(root.join("20240101_120000")))
        );
        assert_eq!(
            translate(root, EntryOrigin::PhotosTree, &root.join("session_7/a.jpg"), false),
            Some(ReconcileEvent::PhotoCreated(root.join("session_7/a.jpg")))
        );
        // too deep
        assert_eq!(
            translate(root, EntryOrigin::PhotosTree, &root.join("session_7/raw/a.jpg"), false),
            None
        );
        // hidden
        assert_eq!(
            translate(root, EntryOrigin::PhotosTree, &root.join("session_7/.a.jpg"), false),
            None
        );
        assert_eq!(
            translate(root, EntryOrigin::PhotosTree, &root.join("holiday"), true),
            None
        );
    }

    #[test]
    fn test_translate_output_tree() {
        let root = Path::new("/data/output");

        assert_eq!(
            translate(root, EntryOrigin::OutputTree, &root.join("session_42_final.png"), false),
            Some(ReconcileEvent::OutputCreated(root.join("session_42_final.png")))
        );
        assert_eq!(
            translate(root, EntryOrigin::OutputTree, &root.join("session_42_strip.png"), false),
            None
        );
        assert_eq!(
            translate(root, EntryOrigin::OutputTree, &Path::new("/elsewhere/session_42_final.png"), false),
            None
        );
    }

    #[test]
    fn test_created_paths_from_event_kinds() {
        let path = PathBuf::from("/data/photos/session_1");

        let create = Event::new(EventKind::Create(CreateKind::Folder)).add_path(path.clone());
        assert_eq!(created_paths(&create), vec![(path.clone(), Some(true))]);

        let rename = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(PathBuf::from("/data/photos/tmp"))
            .add_path(path.clone());
        assert_eq!(created_paths(&rename), vec![(path.clone(), None)]);

        let removal = Event::new(EventKind::Remove(notify::event::RemoveKind::Any)).add_path(path);
        assert!(created_paths(&removal).is_empty());
    }
}
