//! # Photo Booth Common Library
//!
//! Shared code for the kiosk service and its companion tools:
//! - Path classification for session folders, photos and output images
//! - Session hash derivation and access tokens
//! - Storage layout and configuration loading
//! - Admin credential checks

pub mod auth;
pub mod classify;
pub mod config;
pub mod error;
pub mod hash;
pub mod layout;

pub use classify::{classify, EntryOrigin, FolderPattern, PathKind, SessionFolder};
pub use error::{Error, Result};
pub use hash::{derive_hash, generate_access_token, HASH_LEN};
pub use layout::StorageLayout;
