//! Shared fixtures for booth-kiosk integration tests

#![allow(dead_code)]

use booth_common::{Result, StorageLayout};
use booth_kiosk::qr::{QrEncoder, QrService};
use booth_kiosk::reconciler::Reconciler;
use booth_kiosk::registry::{SessionRegistry, SharedRegistry};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

pub const BASE_URL: &str = "https://booth.example.com";

/// Encoder that skips real QR rendering
pub struct StubEncoder;

impl QrEncoder for StubEncoder {
    fn encode(&self, url: &str) -> Result<Vec<u8>> {
        Ok(format!("qr:{}", url).into_bytes())
    }
}

/// A kiosk storage tree in a temp directory plus the services over it
pub struct Fixture {
    pub temp: TempDir,
    pub layout: Arc<StorageLayout>,
    pub registry: SharedRegistry,
    pub qr: QrService,
    pub reconciler: Reconciler,
}

impl Fixture {
    pub fn new() -> Self {
        let temp = tempfile::tempdir().expect("Should create temp dir");
        let layout = Arc::new(StorageLayout::new(temp.path()));
        layout
            .ensure_directories()
            .expect("Should create storage dirs");

        let registry = SessionRegistry::new(BASE_URL).shared();
        let qr = QrService::new(Arc::new(StubEncoder), Arc::clone(&layout));
        let reconciler = Reconciler::new(registry.clone(), Arc::clone(&layout), qr.clone());

        Self {
            temp,
            layout,
            registry,
            qr,
            reconciler,
        }
    }

    /// Create a file (and its parents) under the root
    pub fn touch(&self, relative: &str) -> PathBuf {
        let path = self.temp.path().join(relative);
        std::fs::create_dir_all(path.parent().expect("Relative path has a parent"))
            .expect("Should create parent dirs");
        std::fs::write(&path, b"image").expect("Should write file");
        path
    }

    pub fn mkdir(&self, relative: &str) -> PathBuf {
        let path = self.temp.path().join(relative);
        std::fs::create_dir_all(&path).expect("Should create dir");
        path
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }
}

/// Poll `check` until it holds or `timeout` elapses
pub async fn wait_for<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check().await {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}
