//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the loader pipeline and matcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Scanning phase events
    Scan(ScanEvent),
    /// Decode + feature extraction events
    Extract(ExtractEvent),
    /// Matcher events
    Match(MatchEvent),
    /// Pipeline-level events
    Pipeline(PipelineEvent),
}

/// Events during the scanning phase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Scanning has started
    Started { paths: Vec<PathBuf> },
    /// Progress update during scanning
    Progress(ScanProgress),
    /// An image file was found
    ImageFound { path: PathBuf },
    /// An error occurred but scanning continues
    Error { path: PathBuf, message: String },
    /// Scanning completed
    Completed { total_images: usize },
}

/// Progress information during scanning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanProgress {
    /// Number of directories scanned so far
    pub directories_scanned: usize,
    /// Number of image files found so far
    pub images_found: usize,
    /// Current directory being scanned
    pub current_path: PathBuf,
}

/// Events during decoding and feature extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExtractEvent {
    /// Extraction has started
    Started { total_images: usize },
    /// Progress update during extraction
    Progress(ExtractProgress),
    /// An image could not be decoded or analyzed; it is skipped
    Error { path: PathBuf, message: String },
    /// Extraction completed
    Completed { total_extracted: usize, failed: usize },
}

/// Progress information during extraction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractProgress {
    /// Number of images processed so far
    pub completed: usize,
    /// Total number of images to process
    pub total: usize,
    /// Image just processed
    pub current_path: PathBuf,
}

/// Events during a matcher run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MatchEvent {
    /// Matching has started
    Started { total_images: usize },
    /// Progress update during pairwise scoring
    Progress(MatchProgress),
    /// Matching completed
    Completed {
        auto_pairs: usize,
        review_pairs: usize,
        unmatched: usize,
    },
}

/// Progress information during pairwise scoring
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchProgress {
    /// Number of pairs scored
    pub comparisons_completed: usize,
    /// Total number of pairs to score
    pub total_comparisons: usize,
    /// Candidates at or above the review threshold so far
    pub candidates_found: usize,
}

/// Pipeline-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// Pipeline has started
    Started,
    /// Moving to a new phase
    PhaseChanged { phase: PipelinePhase },
    /// Pipeline completed successfully
    Completed { summary: PipelineSummary },
    /// Pipeline encountered a fatal error
    Error { message: String },
}

/// Phases of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    Scanning,
    Extracting,
    Matching,
}

/// Summary of pipeline results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Image files discovered
    pub total_images: usize,
    /// Images with extracted features
    pub loaded_images: usize,
    pub auto_pairs: usize,
    pub review_pairs: usize,
    pub unmatched: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::Scanning => write!(f, "Scanning"),
            PipelinePhase::Extracting => write!(f, "Extracting"),
            PipelinePhase::Matching => write!(f, "Matching"),
        }
    }
}
