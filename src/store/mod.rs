//! # Store Module
//!
//! Persists the library session and user preferences as JSON documents.
//!
//! ## Design
//! - Reads never fail: a missing, unreadable or corrupt document yields defaults
//! - Every field is validated on the way in; bad fields are dropped
//! - Writes go through a staging file and a rename
//!
//! ## Example
//! ```rust,ignore
//! let store = JsonStore::open(JsonStore::default_dir())?;
//! let session = store.load_session();
//! store.save_session(&accept_review_pair(&session, review_id))?;
//! ```

mod backend;
mod preferences;
mod sanitize;

pub use backend::{JsonStore, MemoryStore, StoreBackend, PREFERENCES_KEY, SESSION_KEY};
pub use preferences::{Confirmations, ExportFormat, Preferences, Region, Template};
pub use sanitize::{sanitize_preferences, sanitize_session};
