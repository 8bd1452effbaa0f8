//! # pair-match CLI
//!
//! Command-line interface for the theme pair matcher.
//!
//! ## Usage
//! ```bash
//! pair-match scan ~/Screenshots --preset strict
//! pair-match show --verbose --output json
//! ```

mod cli;

use theme_pair_matcher::Result;

fn main() -> Result<()> {
    theme_pair_matcher::init_tracing();
    cli::run()
}
