//! Pipeline execution implementation.

use super::loader::load_upload;
use crate::core::features::FeatureExtractor;
use crate::core::matcher::PairMatcher;
use crate::core::scanner::{ImageScanner, ScanConfig, WalkDirScanner};
use crate::core::scorer::{ScoringConfig, ThresholdStrategy};
use crate::core::session::{
    append_and_recompute_with, create_session_with, AppendMode, ImageUpload, LibrarySession,
};
use crate::error::{LoadError, PairMatcherError};
use crate::events::{
    null_sender, Event, EventSender, ExtractEvent, ExtractProgress, PipelineEvent, PipelinePhase,
    PipelineSummary,
};
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::{info, warn};

/// Result of pipeline execution
#[derive(Debug)]
pub struct PipelineResult {
    /// The new or updated session
    pub session: LibrarySession,
    /// Image files discovered
    pub total_images: usize,
    /// Images decoded and analyzed
    pub loaded_images: usize,
    /// Non-fatal errors (unreadable directories, undecodable files)
    pub errors: Vec<String>,
    pub duration_ms: u64,
}

/// Configuration for the pipeline
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Directories to scan
    pub paths: Vec<PathBuf>,
    pub scan_config: ScanConfig,
    pub scoring: ScoringConfig,
}

/// Builder for pipeline configuration
#[derive(Default)]
pub struct PipelineBuilder {
    config: PipelineConfig,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directories to scan
    pub fn paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.config.paths = paths;
        self
    }

    pub fn scan_config(mut self, config: ScanConfig) -> Self {
        self.config.scan_config = config;
        self
    }

    /// Include hidden files
    pub fn include_hidden(mut self, include: bool) -> Self {
        self.config.scan_config.include_hidden = include;
        self
    }

    /// Scoring weights and thresholds for the matcher
    pub fn scoring(mut self, scoring: ScoringConfig) -> Self {
        self.config.scoring = scoring;
        self
    }

    /// Build the pipeline, rejecting an inconsistent scoring config
    pub fn build(self) -> Result<Pipeline, PairMatcherError> {
        self.config
            .scoring
            .validate()
            .map_err(PairMatcherError::Config)?;
        Ok(Pipeline {
            config: self.config,
        })
    }
}

/// Scan, decode, extract and match in one run
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Build a fresh session from the configured directories
    pub fn run(&self) -> Result<PipelineResult, PairMatcherError> {
        self.run_with_events(&null_sender())
    }

    /// Build a fresh session, reporting progress
    pub fn run_with_events(
        &self,
        events: &EventSender,
    ) -> Result<PipelineResult, PairMatcherError> {
        self.execute(events, |uploads, matcher| {
            create_session_with(uploads, matcher, events)
        })
    }

    /// Append the configured directories to an existing session
    pub fn append_with_events(
        &self,
        session: &LibrarySession,
        mode: AppendMode,
        events: &EventSender,
    ) -> Result<PipelineResult, PairMatcherError> {
        self.execute(events, |uploads, matcher| {
            append_and_recompute_with(session, uploads, mode, matcher, events)
        })
    }

    fn execute<F>(&self, events: &EventSender, build: F) -> Result<PipelineResult, PairMatcherError>
    where
        F: FnOnce(Vec<ImageUpload>, &PairMatcher) -> LibrarySession,
    {
        let start_time = Instant::now();
        let mut errors = Vec::new();

        events.send(Event::Pipeline(PipelineEvent::Started));

        // Phase 1: Scanning
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Scanning,
        }));

        let scanner = WalkDirScanner::new(self.config.scan_config.clone());
        let scan_result = scanner.scan_with_events(&self.config.paths, events)?;
        errors.extend(scan_result.errors.iter().map(ToString::to_string));

        let files = scan_result.images;
        let total_images = files.len();

        // Phase 2: Decode + extract
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Extracting,
        }));
        events.send(Event::Extract(ExtractEvent::Started { total_images }));

        let completed = AtomicUsize::new(0);

        // Indexed parallel iteration keeps discovery order
        let loaded: Vec<Result<ImageUpload, LoadError>> = files
            .par_iter()
            .map_init(FeatureExtractor::new, |extractor, file| {
                let result = load_upload(file, extractor);
                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;

                match &result {
                    Ok(_) => events.send(Event::Extract(ExtractEvent::Progress(ExtractProgress {
                        completed: done,
                        total: total_images,
                        current_path: file.path.clone(),
                    }))),
                    Err(e) => events.send(Event::Extract(ExtractEvent::Error {
                        path: file.path.clone(),
                        message: e.to_string(),
                    })),
                }
                result
            })
            .collect();

        let mut uploads = Vec::with_capacity(loaded.len());
        for result in loaded {
            match result {
                Ok(upload) => uploads.push(upload),
                Err(e) => {
                    warn!(error = %e, "Skipping image");
                    errors.push(e.to_string());
                }
            }
        }
        let loaded_images = uploads.len();

        events.send(Event::Extract(ExtractEvent::Completed {
            total_extracted: loaded_images,
            failed: total_images - loaded_images,
        }));

        // Phase 3: Matching
        events.send(Event::Pipeline(PipelineEvent::PhaseChanged {
            phase: PipelinePhase::Matching,
        }));

        let matcher = PairMatcher::new(Box::new(ThresholdStrategy::new(
            self.config.scoring.clone(),
        )));
        let session = build(uploads, &matcher);

        let duration_ms = start_time.elapsed().as_millis() as u64;

        info!(
            total_images,
            loaded_images,
            pairs = session.pairs.len(),
            review = session.review_pairs.len(),
            unmatched = session.unmatched_image_ids.len(),
            duration_ms,
            "Pipeline complete"
        );

        events.send(Event::Pipeline(PipelineEvent::Completed {
            summary: PipelineSummary {
                total_images,
                loaded_images,
                auto_pairs: session.pairs.len(),
                review_pairs: session.review_pairs.len(),
                unmatched: session.unmatched_image_ids.len(),
                duration_ms,
            },
        }));

        Ok(PipelineResult {
            session,
            total_images,
            loaded_images,
            errors,
            duration_ms,
        })
    }
}
