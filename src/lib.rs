//! # Theme Pair Matcher
//!
//! Pairs dark-mode and light-mode screenshots of the same screen.
//!
//! ## Core Philosophy
//! - **Never guess silently** - uncertain pairs go to a review queue
//! - **Show WHY** - every score breaks down into its signals
//! - **Finished work stays put** - completed pairs survive every recompute
//!
//! ## Architecture
//! The library is split into a core engine (UI-agnostic) and outer layers:
//! - `core` - Feature extraction, scoring, matching and session updates
//! - `events` - Event-driven progress reporting
//! - `store` - JSON persistence for sessions and preferences
//! - `error` - User-friendly error types

pub mod core;
pub mod error;
pub mod events;
pub mod store;

// Re-export commonly used types at the crate root
pub use error::{PairMatcherError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point.
pub fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default tracing subscriber");
}
