//! # Events Module
//!
//! Event-driven progress reporting for the loader pipeline and matcher.
//!
//! ## Design
//! The engine emits events through channels, so any UI (CLI, desktop,
//! web view) can subscribe and display progress. Nothing in the core waits
//! on a receiver.
//!
//! ## Example
//! ```rust,ignore
//! let (sender, receiver) = EventChannel::new();
//!
//! std::thread::spawn(move || {
//!     for event in receiver.iter() {
//!         if let Event::Extract(ExtractEvent::Progress(p)) = event {
//!             println!("Analyzed {}/{}", p.completed, p.total);
//!         }
//!     }
//! });
//!
//! pipeline.run_with_events(&sender)?;
//! ```

mod channel;
mod types;

pub use channel::{null_sender, EventChannel, EventReceiver, EventSender};
pub use types::*;
