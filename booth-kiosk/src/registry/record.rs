//! Session record type

use chrono::Utc;
use serde::Serialize;

/// Which rule last set `final_img`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FinalSource {
    #[default]
    Unset,
    /// First captured photo (or an init-time output candidate) standing in
    Placeholder,
    /// A `_final` output image
    Authoritative,
}

/// One photo-booth session
///
/// Serialized field names are the ones the gallery and admin frontends read.
#[derive(Debug, Clone, Serialize)]
pub struct SessionRecord {
    pub hash: String,
    /// Raw session-folder name, or the numeric id taken from an output filename
    pub folder: String,
    pub access_token: Option<String>,
    pub qr_url: String,
    /// `data:image/png;base64,...` once generated
    pub qr_b64: Option<String>,
    /// Root-relative path of the saved QR PNG
    pub qr_path: Option<String>,
    /// Seconds since the epoch
    pub created_at: f64,
    /// Root-relative photo paths in discovery order
    pub photos: Vec<String>,
    pub final_img: Option<String>,
    #[serde(skip)]
    pub(crate) final_source: FinalSource,
    #[serde(skip)]
    pub(crate) generation: u64,
}

impl SessionRecord {
    pub(crate) fn new(
        hash: String,
        folder: String,
        access_token: Option<String>,
        qr_url: String,
        generation: u64,
    ) -> Self {
        Self {
            hash,
            folder,
            access_token,
            qr_url,
            qr_b64: None,
            qr_path: None,
            created_at: Utc::now().timestamp_millis() as f64 / 1000.0,
            photos: Vec::new(),
            final_img: None,
            final_source: FinalSource::Unset,
            generation,
        }
    }

    pub fn final_source(&self) -> FinalSource {
        self.final_source
    }

    /// Creation stamp used to reject stale QR write-backs
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Append a photo path unless already present; true if appended
    pub(crate) fn push_photo(&mut self, path: String) -> bool {
        if self.photos.contains(&path) {
            return false;
        }
        self.photos.push(path);
        true
    }

    /// Set `final_img` from an authoritative output (last writer wins)
    pub(crate) fn set_final(&mut self, path: String) {
        self.final_img = Some(path);
        self.final_source = FinalSource::Authoritative;
    }

    /// Set `final_img` only when nothing has claimed it yet
    pub(crate) fn set_placeholder(&mut self, path: String) -> bool {
        if self.final_img.is_some() {
            return false;
        }
        self.final_img = Some(path);
        self.final_source = FinalSource::Placeholder;
        true
    }
}
