//! # Error Module
//!
//! User-friendly error types for the theme pair matcher.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Stale ids are not errors** - session updates become no-ops instead

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum PairMatcherError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Feature extraction error: {0}")]
    Feature(#[from] FeatureError),

    #[error("Image loading error: {0}")]
    Load(#[from] LoadError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors that occur during directory scanning
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors raised for malformed pixel input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeatureError {
    #[error("Image has zero dimensions ({width}x{height})")]
    ZeroDimensions { width: u32, height: u32 },

    #[error("Pixel buffer holds {actual} bytes, expected {expected} for {width}x{height} RGBA")]
    BufferLength {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("Thumbnail resize failed: {0}")]
    Resize(String),
}

/// Errors that occur while decoding image files
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to decode image {path}: {reason}")]
    Decode { path: PathBuf, reason: String },

    #[error("Failed to extract features from {path}: {source}")]
    Features {
        path: PathBuf,
        #[source]
        source: FeatureError,
    },
}

/// Session invariant violations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Image {image_id} is referenced but not part of the session")]
    UnknownImage { image_id: String },

    #[error("Image {image_id} is held by more than one bucket")]
    DuplicateMembership { image_id: String },

    #[error("Image {image_id} is neither paired, under review, nor unmatched")]
    OrphanImage { image_id: String },

    #[error("Pair id {pair_id} appears more than once")]
    DuplicatePairId { pair_id: String },

    #[error("Duplicate image id {image_id}")]
    DuplicateImageId { image_id: String },
}

/// Errors from the persistence collaborator
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to create store directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize {key}: {reason}")]
    Serialize { key: String, reason: String },

    #[error("In-memory store lock poisoned")]
    Poisoned,
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, PairMatcherError>;
