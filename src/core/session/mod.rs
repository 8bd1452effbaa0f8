//! # Session Module
//!
//! The library session: every uploaded image, the pairs built from them, the
//! review queue and the leftovers, plus the pure transitions between states.

mod types;
mod updater;

pub use types::{
    pair_id, ImageUpload, LibraryImage, LibraryPair, LibrarySession, PairStatus, ReviewItem,
};
pub use updater::{
    accept_review_pair, append_and_recompute_session, append_and_recompute_with,
    clear_pair_completed, create_session, create_session_with, mark_pair_completed,
    reject_review_pair, remove_images_from_session, unpair_library_pair, AppendMode,
};
