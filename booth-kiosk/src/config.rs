//! Kiosk runtime configuration
//!
//! Every setting resolves CLI flag, then environment variable, then TOML file,
//! then the compiled default. clap folds the first two tiers together, so this
//! module only layers the TOML file and defaults underneath.

use booth_common::config::{resolve_root_folder, TomlConfig, ROOT_FOLDER_ENV_VAR};
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3000;

/// Environment variable carrying the admin password (never a CLI flag)
pub const ADMIN_PASSWORD_ENV_VAR: &str = "BOOTH_ADMIN_PASSWORD";

/// Values already resolved from the command line or environment
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub root_folder: Option<PathBuf>,
    pub port: Option<u16>,
    pub base_url: Option<String>,
}

/// Fully resolved kiosk settings
#[derive(Clone)]
pub struct KioskConfig {
    pub root_folder: PathBuf,
    pub port: u16,
    /// Public URL prefix encoded into QR codes, without trailing slash
    pub base_url: String,
    admin_password: Option<String>,
}

impl KioskConfig {
    pub fn resolve(cli: &CliOverrides, toml_config: &TomlConfig) -> Self {
        let root_folder =
            resolve_root_folder(cli.root_folder.as_deref(), ROOT_FOLDER_ENV_VAR, toml_config);
        let port = cli.port.or(toml_config.port).unwrap_or(DEFAULT_PORT);

        let base_url = cli
            .base_url
            .clone()
            .or_else(|| toml_config.base_url.clone())
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| format!("http://localhost:{}", port));

        let admin_password = std::env::var(ADMIN_PASSWORD_ENV_VAR)
            .ok()
            .or_else(|| toml_config.admin_password.clone())
            .filter(|password| !password.is_empty());

        Self {
            root_folder,
            port,
            base_url: base_url.trim_end_matches('/').to_string(),
            admin_password,
        }
    }

    /// `None` means admin endpoints are disabled
    pub fn admin_password(&self) -> Option<&str> {
        self.admin_password.as_deref()
    }
}

impl fmt::Debug for KioskConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KioskConfig")
            .field("root_folder", &self.root_folder)
            .field("port", &self.port)
            .field("base_url", &self.base_url)
            .field(
                "admin_password",
                &self.admin_password.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}
