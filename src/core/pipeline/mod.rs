//! # Pipeline Module
//!
//! Loads screenshots from disk into a session.
//!
//! ## Pipeline Stages
//! 1. **Scan** - Discover image files in the given directories
//! 2. **Extract** - Decode to RGBA and compute features
//! 3. **Match** - Build a new session or append to an existing one
//!
//! ## Parallelism
//! Decoding and extraction run on rayon's pool with one extractor per worker.
//! Results come back in discovery order, so ids are stable between runs.

mod executor;
mod loader;

pub use executor::{Pipeline, PipelineBuilder, PipelineConfig, PipelineResult};
pub use loader::{decode_rgba, load_upload};
