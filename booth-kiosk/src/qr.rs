//! QR code generation
//!
//! Encoding is CPU-bound, so it runs on the blocking pool. Results re-enter the
//! registry through [`SessionRegistry::attach_qr`], which drops write-backs
//! for sessions deleted or recreated while the job was in flight.
//!
//! [`SessionRegistry::attach_qr`]: crate::registry::SessionRegistry::attach_qr

use crate::registry::{QrJob, SharedRegistry};
use base64::Engine;
use booth_common::{Error, Result, StorageLayout};
use image::{ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Minimum rendered QR edge in pixels
const QR_MIN_SIZE: u32 = 300;

/// Opaque `url -> PNG bytes` encoder
pub trait QrEncoder: Send + Sync {
    fn encode(&self, url: &str) -> Result<Vec<u8>>;
}

/// Default encoder: error correction H, at least 300x300, PNG
#[derive(Debug, Default, Clone, Copy)]
pub struct PngQrEncoder;

impl QrEncoder for PngQrEncoder {
    fn encode(&self, url: &str) -> Result<Vec<u8>> {
        let code = QrCode::with_error_correction_level(url.as_bytes(), EcLevel::H)
            .map_err(|e| Error::Encoding(format!("QR encode failed: {}", e)))?;

        let image = code
            .render::<Luma<u8>>()
            .min_dimensions(QR_MIN_SIZE, QR_MIN_SIZE)
            .build();

        let mut png = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .map_err(|e| Error::Encoding(format!("PNG encode failed: {}", e)))?;
        Ok(png)
    }
}

/// A generated QR image
#[derive(Debug, Clone)]
pub struct GeneratedQr {
    /// `data:image/png;base64,...`
    pub data_url: String,
    pub png: Vec<u8>,
}

/// Runs an encoder off the async scheduler and persists its output
#[derive(Clone)]
pub struct QrService {
    encoder: Arc<dyn QrEncoder>,
    layout: Arc<StorageLayout>,
}

impl QrService {
    pub fn new(encoder: Arc<dyn QrEncoder>, layout: Arc<StorageLayout>) -> Self {
        Self { encoder, layout }
    }

    /// Encode `url` on the blocking pool
    pub async fn generate(&self, url: &str) -> Result<GeneratedQr> {
        let encoder = Arc::clone(&self.encoder);
        let owned_url = url.to_string();
        let png = tokio::task::spawn_blocking(move || encoder.encode(&owned_url))
            .await
            .map_err(|e| Error::Internal(format!("QR task failed: {}", e)))??;

        let data_url = format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&png)
        );
        Ok(GeneratedQr { data_url, png })
    }

    /// Generate for a job and write the result back into the registry
    ///
    /// The PNG is staged under a per-generation name and only moved onto
    /// `qr_codes/qr_<hash>.png` once the registry confirms the job is still
    /// current, so a stale job never touches a recreated session's image. A
    /// failed file write is logged and only leaves `qr_path` unset.
    ///
    /// Returns the data URL if the write-back was accepted.
    pub async fn fulfil(&self, registry: &SharedRegistry, job: &QrJob) -> Result<Option<String>> {
        let generated = self.generate(&job.url).await?;
        debug!(hash = %job.hash, bytes = generated.png.len(), "QR image generated");

        let staged = self.layout.qr_staging_file(&job.hash, job.generation);
        let staged_ok = match tokio::fs::write(&staged, &generated.png).await {
            Ok(()) => true,
            Err(e) => {
                warn!(hash = %job.hash, path = %staged.display(), "Failed to save QR image: {}", e);
                false
            }
        };

        let accepted = {
            let mut reg = registry.write().await;
            if reg.is_current(&job.hash, job.generation) {
                let qr_path = if staged_ok { self.publish(&job.hash, &staged) } else { None };
                reg.attach_qr(&job.hash, job.generation, generated.data_url.clone(), qr_path)
            } else {
                debug!(
                    hash = %job.hash,
                    generation = job.generation,
                    "Discarding QR for deleted or recreated session"
                );
                false
            }
        };

        if accepted {
            return Ok(Some(generated.data_url));
        }

        if staged_ok {
            if let Err(e) = tokio::fs::remove_file(&staged).await {
                debug!(hash = %job.hash, "Staged QR cleanup failed: {}", e);
            }
        }
        Ok(None)
    }

    /// Move a staged PNG onto its final name; root-relative path on success
    fn publish(&self, hash: &str, staged: &Path) -> Option<String> {
        let file = self.layout.qr_file(hash);
        match std::fs::rename(staged, &file) {
            Ok(()) => self.layout.relative(&file),
            Err(e) => {
                warn!(hash = %hash, path = %file.display(), "Failed to save QR image: {}", e);
                if let Err(e) = std::fs::remove_file(staged) {
                    debug!(hash = %hash, "Staged QR cleanup failed: {}", e);
                }
                None
            }
        }
    }
}

/// Fire-and-forget QR generation for a freshly created session
///
/// Failures are logged and leave `qr_b64` unset; the generate-qr endpoint
/// retries on demand.
pub fn spawn_qr_job(registry: SharedRegistry, qr: QrService, job: QrJob) {
    tokio::spawn(async move {
        match qr.fulfil(&registry, &job).await {
            Ok(Some(_)) => info!(hash = %job.hash, "QR code ready"),
            Ok(None) => debug!(hash = %job.hash, "QR code discarded"),
            Err(e) => error!(hash = %job.hash, "QR code generation failed: {}", e),
        }
    });
}
