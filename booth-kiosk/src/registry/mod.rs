//! Session registry
//!
//! Single authoritative mapping `hash -> SessionRecord`. The registry is pure
//! in-memory bookkeeping: callers list folders, delete files and encode QR
//! images outside of it, then apply the results through these operations.
//!
//! Shared as [`SharedRegistry`]; every operation is synchronous, so a write
//! lock is never held across an `.await`.

pub mod deletion;
mod record;

pub use deletion::{delete_session, DeletionReport};
pub use record::{FinalSource, SessionRecord};

use booth_common::classify::{
    classify_output_name, digits_only, FolderPattern, PathKind, SessionFolder, TEMP_MARKER,
};
use booth_common::{derive_hash, generate_access_token, Error, Result};
use rand::seq::IteratorRandom;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Registry handle shared by the reconciler and HTTP handlers
pub type SharedRegistry = Arc<RwLock<SessionRegistry>>;

/// Work order for background QR generation
///
/// `generation` identifies the record the job was issued for; the write-back
/// is dropped if the record has since been deleted or recreated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrJob {
    pub hash: String,
    pub generation: u64,
    pub url: String,
}

/// Result of a folder upsert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderUpsert {
    /// New record; QR generation should be started
    Created(QrJob),
    /// Folder already seen (record may since have been deleted)
    Existing(String),
    /// Not a session folder
    Ignored,
}

/// Result of applying an output file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputOutcome {
    /// Attached to an existing session
    Attached { hash: String },
    /// No session matched; one was created from the output's session id
    Created { hash: String },
    Ignored,
}

/// State of a session's QR image
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QrRequest {
    Ready { qr_b64: String, qr_url: String },
    /// Not generated yet (or an earlier attempt failed)
    Pending(QrJob),
}

pub struct SessionRegistry {
    base_url: String,
    sessions: HashMap<String, SessionRecord>,
    /// Raw folder names already handled by `upsert_from_folder`
    processed_folders: HashSet<String>,
    last_generation: u64,
}

impl SessionRegistry {
    /// Create an empty registry; `base_url` prefixes every QR URL
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            sessions: HashMap::new(),
            processed_folders: HashSet::new(),
            last_generation: 0,
        }
    }

    pub fn shared(self) -> SharedRegistry {
        Arc::new(RwLock::new(self))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn insert(
        &mut self,
        hash: String,
        folder: String,
        access_token: Option<String>,
        qr_url: String,
    ) -> QrJob {
        self.last_generation += 1;
        let generation = self.last_generation;
        let job = QrJob {
            hash: hash.clone(),
            generation,
            url: qr_url.clone(),
        };
        self.sessions.insert(
            hash.clone(),
            SessionRecord::new(hash, folder, access_token, qr_url, generation),
        );
        job
    }

    /// Register a session for a newly observed folder
    ///
    /// **Algorithm:**
    /// 1. Ignore names that are not `YYYYMMDD_HHMMSS` or 12-digit folders
    /// 2. No-op if the hash exists or the raw name was processed before
    /// 3. Otherwise create the record with a fresh access token and a QR URL
    ///    pointing at the session's final image download
    pub fn upsert_from_folder(&mut self, folder_name: &str) -> FolderUpsert {
        let Some(folder) = SessionFolder::parse(folder_name).filter(|f| f.qualifies_for_upsert())
        else {
            return FolderUpsert::Ignored;
        };

        let hash = derive_hash(&folder.name);
        if self.sessions.contains_key(&hash) || self.processed_folders.contains(&folder.name) {
            debug!(folder = %folder.name, hash = %hash, "Folder already processed");
            return FolderUpsert::Existing(hash);
        }
        self.processed_folders.insert(folder.name.clone());

        let qr_url = format!(
            "{}/download?img=output/session_{}_final.png",
            self.base_url,
            folder.digits()
        );
        let job = self.insert(hash, folder.name.clone(), Some(generate_access_token()), qr_url);
        info!(folder = %folder.name, hash = %job.hash, "Session created from folder");
        FolderUpsert::Created(job)
    }

    /// Make sure the session owning a photo folder exists
    ///
    /// Returns the owning hash plus a QR job when the session was just created.
    /// `session_<n>` folders get a record without an access token.
    pub fn ensure_photo_session(&mut self, folder: &SessionFolder) -> Option<(String, Option<QrJob>)> {
        match folder.pattern {
            FolderPattern::DateTime | FolderPattern::Numeric => {
                match self.upsert_from_folder(&folder.name) {
                    FolderUpsert::Created(job) => Some((job.hash.clone(), Some(job))),
                    FolderUpsert::Existing(hash) if self.sessions.contains_key(&hash) => {
                        Some((hash, None))
                    }
                    _ => None,
                }
            }
            FolderPattern::SessionToken => {
                let hash = derive_hash(&folder.name);
                if self.sessions.contains_key(&hash) {
                    return Some((hash, None));
                }
                let qr_url = format!("{}/photo/{}", self.base_url, hash);
                let job = self.insert(hash.clone(), folder.name.clone(), None, qr_url);
                info!(folder = %folder.name, hash = %hash, "Session created from photo");
                Some((hash, Some(job)))
            }
        }
    }

    /// Append photo paths to a session, skipping ones already recorded
    ///
    /// If the session still has no final image afterwards, its first photo
    /// becomes the placeholder. Returns how many paths were appended.
    pub fn record_photos<I>(&mut self, hash: &str, paths: I) -> Result<usize>
    where
        I: IntoIterator<Item = String>,
    {
        let record = self
            .sessions
            .get_mut(hash)
            .ok_or_else(|| Error::NotFound(format!("session {}", hash)))?;

        let added = paths
            .into_iter()
            .filter(|path| record.push_photo(path.clone()))
            .count();

        if let Some(first) = record.photos.first().cloned() {
            if record.set_placeholder(first.clone()) {
                debug!(hash = %hash, photo = %first, "Using first photo as placeholder final image");
            }
        }

        if added > 0 {
            debug!(hash = %hash, added, total = record.photos.len(), "Photos recorded");
        }
        Ok(added)
    }

    /// Apply a new file in the output directory
    ///
    /// Only `_final` images are authoritative here; candidates are ignored.
    ///
    /// **Target resolution:**
    /// 1. Exact hash of the extracted session id
    /// 2. Oldest session whose folder digits contain, or are contained in, the id
    /// 3. A new session keyed on the id's hash
    pub fn record_output_file(&mut self, file_name: &str, relative_path: String) -> OutputOutcome {
        let PathKind::OutputFinalFile { session_id } = classify_output_name(file_name) else {
            return OutputOutcome::Ignored;
        };

        if let Some(hash) = self.resolve_output_target(&session_id) {
            if let Some(record) = self.sessions.get_mut(&hash) {
                record.set_final(relative_path);
                info!(hash = %hash, file = %file_name, "Final image attached");
                return OutputOutcome::Attached { hash };
            }
        }

        let hash = derive_hash(&session_id);
        let qr_url = format!("{}/photo/{}", self.base_url, hash);
        self.insert(hash.clone(), session_id.clone(), None, qr_url);
        if let Some(record) = self.sessions.get_mut(&hash) {
            record.set_final(relative_path);
        }
        info!(session_id = %session_id, hash = %hash, "Session created from output file");
        OutputOutcome::Created { hash }
    }

    /// Apply an output candidate found by the startup scan
    ///
    /// Candidates never create sessions and only fill an unset final image.
    pub fn record_output_candidate(&mut self, file_name: &str, relative_path: String) -> OutputOutcome {
        if file_name.contains(TEMP_MARKER) {
            return OutputOutcome::Ignored;
        }
        let PathKind::OutputCandidateFile { session_id } = classify_output_name(file_name) else {
            return OutputOutcome::Ignored;
        };

        let Some(hash) = self.resolve_output_target(&session_id) else {
            return OutputOutcome::Ignored;
        };
        let placed = self
            .sessions
            .get_mut(&hash)
            .map(|record| record.set_placeholder(relative_path))
            .unwrap_or(false);
        if !placed {
            return OutputOutcome::Ignored;
        }
        debug!(hash = %hash, file = %file_name, "Output candidate used as placeholder");
        OutputOutcome::Attached { hash }
    }

    fn resolve_output_target(&self, session_id: &str) -> Option<String> {
        let exact = derive_hash(session_id);
        if self.sessions.contains_key(&exact) {
            return Some(exact);
        }

        self.sessions
            .values()
            .filter(|record| {
                let digits = digits_only(&record.folder);
                !digits.is_empty()
                    && (session_id.contains(digits.as_str()) || digits.contains(session_id))
            })
            .min_by_key(|record| record.generation)
            .map(|record| record.hash.clone())
    }

    /// Sessions ready for the gallery, newest first
    ///
    /// Excludes sessions without a final image and scratch (`temp_`) renders.
    pub fn list_valid(&self) -> Vec<SessionRecord> {
        let mut valid: Vec<SessionRecord> = self
            .sessions
            .values()
            .filter(|record| {
                record
                    .final_img
                    .as_deref()
                    .map(|path| !path.contains(TEMP_MARKER))
                    .unwrap_or(false)
            })
            .cloned()
            .collect();

        valid.sort_by(|a, b| {
            b.created_at
                .total_cmp(&a.created_at)
                .then(b.generation.cmp(&a.generation))
        });
        valid
    }

    pub fn get(&self, hash: &str) -> Result<&SessionRecord> {
        self.sessions
            .get(hash)
            .ok_or_else(|| Error::NotFound(format!("session {}", hash)))
    }

    /// Take a record out of the registry
    pub fn remove(&mut self, hash: &str) -> Result<SessionRecord> {
        self.sessions
            .remove(hash)
            .ok_or_else(|| Error::NotFound(format!("session {}", hash)))
    }

    /// Caller-specified session creation
    ///
    /// The hash is derived from `folder_name`; `session_id` must be present but
    /// only identifies the request in logs.
    pub fn create_explicit(&mut self, folder_name: &str, session_id: &str) -> Result<QrJob> {
        if folder_name.trim().is_empty() || session_id.trim().is_empty() {
            return Err(Error::InvalidInput(
                "folder_name and session_id are required".to_string(),
            ));
        }

        let hash = derive_hash(folder_name);
        if self.sessions.contains_key(&hash) {
            return Err(Error::Conflict(format!("session {} already exists", hash)));
        }

        let access_token = generate_access_token();
        let qr_url = format!("{}/photo/{}?token={}", self.base_url, hash, access_token);
        let job = self.insert(hash, folder_name.to_string(), Some(access_token), qr_url);
        info!(folder = %folder_name, session_id = %session_id, hash = %job.hash, "Session created explicitly");
        Ok(job)
    }

    /// Whether `hash` still names the record a job was issued for
    pub fn is_current(&self, hash: &str, generation: u64) -> bool {
        self.sessions
            .get(hash)
            .is_some_and(|record| record.generation == generation)
    }

    /// QR write-back; false if the record is gone or was recreated
    pub fn attach_qr(
        &mut self,
        hash: &str,
        generation: u64,
        qr_b64: String,
        qr_path: Option<String>,
    ) -> bool {
        match self.sessions.get_mut(hash) {
            Some(record) if record.generation == generation => {
                record.qr_b64 = Some(qr_b64);
                if qr_path.is_some() {
                    record.qr_path = qr_path;
                }
                true
            }
            _ => {
                debug!(hash = %hash, generation, "Discarding QR for deleted or recreated session");
                false
            }
        }
    }

    /// Current QR image, or a job to generate it
    pub fn qr_request(&self, hash: &str) -> Result<QrRequest> {
        let record = self.get(hash)?;
        Ok(match &record.qr_b64 {
            Some(qr_b64) => QrRequest::Ready {
                qr_b64: qr_b64.clone(),
                qr_url: record.qr_url.clone(),
            },
            None => QrRequest::Pending(QrJob {
                hash: record.hash.clone(),
                generation: record.generation,
                url: record.qr_url.clone(),
            }),
        })
    }

    /// Random session that has a final image
    pub fn random_final(&self) -> Option<&SessionRecord> {
        self.sessions
            .values()
            .filter(|record| record.final_img.is_some())
            .choose(&mut rand::thread_rng())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://booth.example.com";

    fn registry() -> SessionRegistry {
        SessionRegistry::new(BASE)
    }

    fn created(upsert: FolderUpsert) -> QrJob {
        match upsert {
            FolderUpsert::Created(job) => job,
            other => panic!("expected Created, got {:?}", other),
        }
    }

    #[test]
    fn test_upsert_from_folder_creates_record() {
        let mut reg = registry();
        let job = created(reg.upsert_from_folder("20240101_120000"));

        assert_eq!(job.hash, derive_hash("20240101_120000"));
        assert_eq!(
            job.url,
            format!("{}/download?img=output/session_20240101120000_final.png", BASE)
        );

        let record = reg.get(&job.hash).unwrap();
        assert_eq!(record.folder, "20240101_120000");
        assert!(record.photos.is_empty());
        assert!(record.final_img.is_none());
        assert_eq!(record.access_token.as_ref().map(String::len), Some(64));
        assert!(record.qr_b64.is_none());
    }

    #[test]
    fn test_upsert_is_idempotent() {
        let mut reg = registry();
        let job = created(reg.upsert_from_folder("20240101_120000"));
        assert_eq!(
            reg.upsert_from_folder("20240101_120000"),
            FolderUpsert::Existing(job.hash)
        );
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_upsert_ignores_non_session_folders() {
        let mut reg = registry();
        assert_eq!(reg.upsert_from_folder("holiday"), FolderUpsert::Ignored);
        assert_eq!(reg.upsert_from_folder("session_12"), FolderUpsert::Ignored);
        assert!(reg.is_empty());
    }

    #[test]
    fn test_deleted_folder_is_not_recreated_by_upsert() {
        let mut reg = registry();
        let job = created(reg.upsert_from_folder("202401011200"));
        reg.remove(&job.hash).unwrap();

        assert_eq!(
            reg.upsert_from_folder("202401011200"),
            FolderUpsert::Existing(job.hash)
        );
        assert!(reg.is_empty());
    }

    #[test]
    fn test_record_photos_deduplicates_and_sets_placeholder() {
        let mut reg = registry();
        let hash = created(reg.upsert_from_folder("20240101_120000")).hash;
        let photo = "photos/20240101_120000/photo1.jpg".to_string();

        assert_eq!(reg.record_photos(&hash, vec![photo.clone()]).unwrap(), 1);
        assert_eq!(reg.record_photos(&hash, vec![photo.clone()]).unwrap(), 0);

        let record = reg.get(&hash).unwrap();
        assert_eq!(record.photos, vec![photo.clone()]);
        assert_eq!(record.final_img.as_deref(), Some(photo.as_str()));
        assert_eq!(record.final_source(), FinalSource::Placeholder);
    }

    #[test]
    fn test_record_photos_keeps_discovery_order() {
        let mut reg = registry();
        let hash = created(reg.upsert_from_folder("20240101_120000")).hash;
        let paths: Vec<String> = ["b.jpg", "a.jpg", "b.jpg", "c.png"]
            .iter()
            .map(|name| format!("photos/20240101_120000/{}", name))
            .collect();

        assert_eq!(reg.record_photos(&hash, paths).unwrap(), 3);
        let record = reg.get(&hash).unwrap();
        assert_eq!(
            record.photos,
            vec![
                "photos/20240101_120000/b.jpg",
                "photos/20240101_120000/a.jpg",
                "photos/20240101_120000/c.png",
            ]
        );
        assert_eq!(record.final_img.as_deref(), Some("photos/20240101_120000/b.jpg"));
    }

    #[test]
    fn test_record_photos_unknown_hash() {
        let mut reg = registry();
        assert!(matches!(
            reg.record_photos("deadbeef0000", vec!["x.jpg".to_string()]),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_folder_photo_then_final_output_scenario() {
        let mut reg = registry();
        let hash = created(reg.upsert_from_folder("20240101_120000")).hash;
        reg.record_photos(&hash, vec!["photos/20240101_120000/photo1.jpg".to_string()])
            .unwrap();

        assert_eq!(
            reg.get(&hash).unwrap().final_img.as_deref(),
            Some("photos/20240101_120000/photo1.jpg")
        );

        // Digits-only id hashes differently; containment fallback finds the folder
        let outcome = reg.record_output_file(
            "session_20240101120000_final.png",
            "output/session_20240101120000_final.png".to_string(),
        );
        assert_eq!(outcome, OutputOutcome::Attached { hash: hash.clone() });
        assert_eq!(reg.len(), 1);

        let record = reg.get(&hash).unwrap();
        assert_eq!(
            record.final_img.as_deref(),
            Some("output/session_20240101120000_final.png")
        );
        assert_eq!(record.final_source(), FinalSource::Authoritative);
    }

    #[test]
    fn test_final_image_survives_later_photos() {
        let mut reg = registry();
        let hash = created(reg.upsert_from_folder("20240101_120000")).hash;
        reg.record_output_file(
            "session_20240101120000_final.png",
            "output/session_20240101120000_final.png".to_string(),
        );
        reg.record_photos(&hash, vec!["photos/20240101_120000/photo9.jpg".to_string()])
            .unwrap();

        let record = reg.get(&hash).unwrap();
        assert_eq!(
            record.final_img.as_deref(),
            Some("output/session_20240101120000_final.png")
        );
        assert_eq!(record.photos.len(), 1);
    }

    #[test]
    fn test_final_output_is_last_writer_wins() {
        let mut reg = registry();
        reg.record_output_file("session_77_final.png", "output/session_77_final.png".to_string());
        reg.record_output_file("v2_session_77_final.jpg", "output/v2_session_77_final.jpg".to_string());

        let record = reg.get(&derive_hash("77")).unwrap();
        assert_eq!(record.final_img.as_deref(), Some("output/v2_session_77_final.jpg"));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_output_exact_hash_creates_then_attaches() {
        let mut reg = registry();
        let outcome = reg.record_output_file("session_5_final.png", "output/session_5_final.png".to_string());
        let hash = derive_hash("5");
        assert_eq!(outcome, OutputOutcome::Created { hash: hash.clone() });

        let record = reg.get(&hash).unwrap();
        assert_eq!(record.folder, "5");
        assert!(record.access_token.is_none());
        assert_eq!(record.qr_url, format!("{}/photo/{}", BASE, hash));

        let again = reg.record_output_file("session_5_final.png", "output/session_5_final.png".to_string());
        assert_eq!(again, OutputOutcome::Attached { hash });
    }

    #[test]
    fn test_candidate_output_is_ignored_live() {
        let mut reg = registry();
        let hash = created(reg.upsert_from_folder("20240101_120000")).hash;
        let outcome = reg.record_output_file(
            "session_20240101120000_frame.png",
            "output/session_20240101120000_frame.png".to_string(),
        );
        assert_eq!(outcome, OutputOutcome::Ignored);
        assert!(reg.get(&hash).unwrap().final_img.is_none());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_candidate_fills_only_unset_final() {
        let mut reg = registry();
        let hash = created(reg.upsert_from_folder("20240101_120000")).hash;

        let outcome = reg.record_output_candidate(
            "session_20240101120000_frame.png",
            "output/session_20240101120000_frame.png".to_string(),
        );
        assert_eq!(outcome, OutputOutcome::Attached { hash: hash.clone() });
        assert_eq!(reg.get(&hash).unwrap().final_source(), FinalSource::Placeholder);

        // A second candidate does not displace the first
        let outcome = reg.record_output_candidate(
            "session_20240101120000_other.png",
            "output/session_20240101120000_other.png".to_string(),
        );
        assert_eq!(outcome, OutputOutcome::Ignored);

        // Candidates never create sessions
        assert_eq!(
            reg.record_output_candidate("session_999_frame.png", "output/session_999_frame.png".to_string()),
            OutputOutcome::Ignored
        );
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_containment_fallback_prefers_oldest_match() {
        // Both folders' digits are substrings of the output id; the overlap is
        // ambiguous, so the first-created session wins deterministically
        let mut reg = registry();
        let first = created(reg.upsert_from_folder("202401011200")).hash;
        let _second = created(reg.upsert_from_folder("20240101_120000")).hash;

        let outcome = reg.record_output_file(
            "session_20240101120000_final.png",
            "output/session_20240101120000_final.png".to_string(),
        );
        assert_eq!(outcome, OutputOutcome::Attached { hash: first });
    }

    #[test]
    fn test_containment_ignores_digitless_folders() {
        let mut reg = registry();
        reg.create_explicit("sess", "1").unwrap();
        let outcome = reg.record_output_file("session_42_final.png", "output/session_42_final.png".to_string());
        assert_eq!(outcome, OutputOutcome::Created { hash: derive_hash("42") });
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn test_list_valid_filters_and_orders() {
        let mut reg = registry();
        // Digitless folder so output ids cannot fall back onto it
        let no_final = reg.create_explicit("sess", "1").unwrap().hash;
        reg.record_output_file("session_1_final.png", "output/session_1_final.png".to_string());
        reg.record_output_file("session_2_final.png", "output/session_2_final.png".to_string());
        reg.record_output_file("temp_session_3_final.png", "output/temp_session_3_final.png".to_string());

        let valid = reg.list_valid();
        let hashes: Vec<&str> = valid.iter().map(|r| r.hash.as_str()).collect();
        assert_eq!(hashes.len(), 2);
        assert!(!hashes.contains(&no_final.as_str()));
        assert!(!hashes.contains(&derive_hash("3").as_str()));
        assert!(valid[0].created_at >= valid[1].created_at);
        // Same-millisecond creations fall back to newest generation first
        if valid[0].created_at == valid[1].created_at {
            assert_eq!(valid[0].hash, derive_hash("2"));
        }
    }

    #[test]
    fn test_create_explicit_conflict() {
        let mut reg = registry();
        let job = reg.create_explicit("sess", "1").unwrap();
        assert!(job.url.starts_with(&format!("{}/photo/{}?token=", BASE, job.hash)));

        assert!(matches!(reg.create_explicit("sess", "1"), Err(Error::Conflict(_))));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.get(&job.hash).unwrap().generation(), job.generation);
    }

    #[test]
    fn test_create_explicit_requires_fields() {
        let mut reg = registry();
        assert!(matches!(reg.create_explicit("", "1"), Err(Error::InvalidInput(_))));
        assert!(matches!(reg.create_explicit("sess", "  "), Err(Error::InvalidInput(_))));
        assert!(reg.is_empty());
    }

    #[test]
    fn test_attach_qr_rejects_stale_generation() {
        let mut reg = registry();
        let job = reg.create_explicit("sess", "1").unwrap();
        reg.remove(&job.hash).unwrap();
        let recreated = reg.create_explicit("sess", "1").unwrap();
        assert_ne!(job.generation, recreated.generation);
        assert!(!reg.is_current(&job.hash, job.generation));
        assert!(reg.is_current(&recreated.hash, recreated.generation));

        assert!(!reg.attach_qr(&job.hash, job.generation, "data:old".to_string(), None));
        assert!(reg.get(&job.hash).unwrap().qr_b64.is_none());

        assert!(reg.attach_qr(
            &recreated.hash,
            recreated.generation,
            "data:new".to_string(),
            Some("qr_codes/qr_x.png".to_string())
        ));
        let record = reg.get(&recreated.hash).unwrap();
        assert_eq!(record.qr_b64.as_deref(), Some("data:new"));
        assert_eq!(record.qr_path.as_deref(), Some("qr_codes/qr_x.png"));
    }

    #[test]
    fn test_attach_qr_after_delete_is_noop() {
        let mut reg = registry();
        let job = created(reg.upsert_from_folder("20240101_120000"));
        reg.remove(&job.hash).unwrap();
        assert!(!reg.attach_qr(&job.hash, job.generation, "data:x".to_string(), None));
        assert!(reg.is_empty());
    }

    #[test]
    fn test_qr_request_ready_and_pending() {
        let mut reg = registry();
        let job = reg.create_explicit("sess", "1").unwrap();

        assert_eq!(reg.qr_request(&job.hash).unwrap(), QrRequest::Pending(job.clone()));
        reg.attach_qr(&job.hash, job.generation, "data:qr".to_string(), None);
        assert_eq!(
            reg.qr_request(&job.hash).unwrap(),
            QrRequest::Ready {
                qr_b64: "data:qr".to_string(),
                qr_url: job.url.clone()
            }
        );
        assert!(matches!(reg.qr_request("missing"), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_ensure_photo_session_for_session_token_folder() {
        let mut reg = registry();
        let folder = SessionFolder::parse("session_12").unwrap();

        let (hash, job) = reg.ensure_photo_session(&folder).unwrap();
        assert!(job.is_some());
        assert_eq!(hash, derive_hash("session_12"));
        assert!(reg.get(&hash).unwrap().access_token.is_none());

        let (again, job) = reg.ensure_photo_session(&folder).unwrap();
        assert_eq!(again, hash);
        assert!(job.is_none());
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn test_ensure_photo_session_reuses_folder_upsert() {
        let mut reg = registry();
        let job = created(reg.upsert_from_folder("20240101_120000"));
        let folder = SessionFolder::parse("20240101_120000").unwrap();
        assert_eq!(reg.ensure_photo_session(&folder), Some((job.hash, None)));
    }

    #[test]
    fn test_random_final() {
        let mut reg = registry();
        assert!(reg.random_final().is_none());
        reg.create_explicit("sess", "1").unwrap();
        assert!(reg.random_final().is_none());
        reg.record_output_file("session_1_final.png", "output/session_1_final.png".to_string());
        assert_eq!(reg.random_final().unwrap().hash, derive_hash("1"));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let reg = SessionRegistry::new("http://kiosk.local:3000/");
        assert_eq!(reg.base_url(), "http://kiosk.local:3000");
    }
}
