//! Path classification for booth filesystem entries
//!
//! Decides what an entry under the photos tree or the output tree means to the
//! session registry. Pure string parsing; nothing here touches the filesystem.
//!
//! **Folder patterns:**
//! - `YYYYMMDD_HHMMSS` (camera software default)
//! - 12 digits (compact timestamp)
//! - anything containing `session_<digits>` (owns photos, never upserted as a folder)
//!
//! **Output names:** `..session_<digits>_final.<ext>` is an authoritative final
//! image, any other `..session_<digits>...<ext>` is a candidate.

use std::path::{Component, Path};

/// Marker preceding the numeric session id in output filenames
pub const SESSION_MARKER: &str = "session_";

/// Marker directly following the session id in final output filenames
pub const FINAL_MARKER: &str = "_final";

/// Paths containing this token are scratch renders and never listed
pub const TEMP_MARKER: &str = "temp_";

/// Accepted image extensions (compared case-insensitively)
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Which watched tree an entry was observed in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOrigin {
    /// `photos/` - one level of session subfolders
    PhotosTree,
    /// `output/` - flat directory of composed images
    OutputTree,
}

/// Naming pattern a session folder matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderPattern {
    /// `^\d{8}_\d{6}$`
    DateTime,
    /// `^\d{12}$`
    Numeric,
    /// Contains `session_` followed by at least one digit
    SessionToken,
}

/// A folder name recognised as belonging to a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFolder {
    pub name: String,
    pub pattern: FolderPattern,
}

impl SessionFolder {
    /// Parse a bare folder name
    pub fn parse(name: &str) -> Option<Self> {
        let pattern = if is_date_time_name(name) {
            FolderPattern::DateTime
        } else if name.len() == 12 && name.bytes().all(|b| b.is_ascii_digit()) {
            FolderPattern::Numeric
        } else if session_id_in(name).is_some() {
            FolderPattern::SessionToken
        } else {
            return None;
        };

        Some(Self {
            name: name.to_string(),
            pattern,
        })
    }

    /// Folder name reduced to its digits
    pub fn digits(&self) -> String {
        digits_only(&self.name)
    }

    /// Whether a directory-created event for this folder creates a session
    pub fn qualifies_for_upsert(&self) -> bool {
        matches!(self.pattern, FolderPattern::DateTime | FolderPattern::Numeric)
    }
}

/// Classification result for one filesystem entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathKind {
    /// Session folder directly under the photos root
    SessionFolder(SessionFolder),
    /// Captured photo inside a session folder
    PhotoFile { folder: SessionFolder },
    /// Composed result image with the `_final` marker
    OutputFinalFile { session_id: String },
    /// Output image carrying a session id but no `_final` marker
    OutputCandidateFile { session_id: String },
    /// Anything the registry ignores
    Unrecognized,
}

/// Classify an entry by its path relative to the watched root
///
/// `is_dir` comes from the caller (watch event kind or directory listing), so
/// the classifier never has to stat the path.
pub fn classify(relative: &Path, origin: EntryOrigin, is_dir: bool) -> PathKind {
    let mut names = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(name) => match name.to_str() {
                Some(name) => names.push(name),
                None => return PathKind::Unrecognized,
            },
            Component::CurDir => {}
            _ => return PathKind::Unrecognized,
        }
    }

    if names.iter().any(|name| name.starts_with('.')) {
        return PathKind::Unrecognized;
    }

    match (origin, names.as_slice(), is_dir) {
        (EntryOrigin::PhotosTree, [folder], true) => match SessionFolder::parse(folder) {
            Some(folder) if folder.qualifies_for_upsert() => PathKind::SessionFolder(folder),
            _ => PathKind::Unrecognized,
        },
        (EntryOrigin::PhotosTree, [folder, file], false) if is_image_name(file) => {
            match SessionFolder::parse(folder) {
                Some(folder) => PathKind::PhotoFile { folder },
                None => PathKind::Unrecognized,
            }
        }
        (EntryOrigin::OutputTree, [file], false) => classify_output_name(file),
        _ => PathKind::Unrecognized,
    }
}

/// Classify a bare output filename
pub fn classify_output_name(name: &str) -> PathKind {
    if name.starts_with('.') || !is_image_name(name) {
        return PathKind::Unrecognized;
    }

    match split_session_id(name) {
        Some((session_id, tail)) if is_final_tail(tail) => PathKind::OutputFinalFile {
            session_id: session_id.to_string(),
        },
        Some((session_id, _)) => PathKind::OutputCandidateFile {
            session_id: session_id.to_string(),
        },
        None => PathKind::Unrecognized,
    }
}

/// Whether the name ends in an accepted image extension
pub fn is_image_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|accepted| ext.eq_ignore_ascii_case(accepted))
        })
        .unwrap_or(false)
}

/// Strip every non-digit character
pub fn digits_only(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

fn is_date_time_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    bytes.len() == 15
        && bytes[8] == b'_'
        && bytes[..8].iter().all(u8::is_ascii_digit)
        && bytes[9..].iter().all(u8::is_ascii_digit)
}

fn session_id_in(name: &str) -> Option<&str> {
    split_session_id(name).map(|(id, _)| id)
}

/// First `session_<digits>` occurrence: (digits, remainder after digits)
fn split_session_id(name: &str) -> Option<(&str, &str)> {
    for (idx, _) in name.match_indices(SESSION_MARKER) {
        let rest = &name[idx + SESSION_MARKER.len()..];
        let digit_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digit_len > 0 {
            return Some(rest.split_at(digit_len));
        }
    }
    None
}

fn is_final_tail(tail: &str) -> bool {
    tail.strip_prefix(FINAL_MARKER)
        .and_then(|rest| rest.strip_prefix('.'))
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|accepted| ext.eq_ignore_ascii_case(accepted))
        })
        .unwrap_or(false)
}
