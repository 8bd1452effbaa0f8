//! # Core Module
//!
//! The UI-agnostic pair matching engine.
//!
//! ## Modules
//! - `features` - Turns RGBA pixels into comparable features
//! - `scorer` - Scores how likely two images are a dark/light pair
//! - `matcher` - Picks a conflict-free set of pairs from a batch
//! - `session` - Library state and the transitions between states
//! - `scanner` - Discovers screenshot files in directories
//! - `pipeline` - Scans, decodes and matches in one run

pub mod features;
pub mod matcher;
pub mod pipeline;
pub mod scanner;
pub mod scorer;
pub mod session;

// Re-export commonly used types
pub use features::{extract_features, EdgeHash, ImageFeatures};
pub use matcher::{build_library_pairs, PairMatcher, PairingResult};
pub use scanner::ImageFile;
pub use scorer::{score_pair, MatchStrategy, ScoreBreakdown, ScoringConfig, ThresholdStrategy};
pub use session::{LibraryImage, LibraryPair, LibrarySession, PairStatus, ReviewItem};
