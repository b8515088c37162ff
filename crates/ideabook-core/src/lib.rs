//! ideabook-core - Core library for Ideabook
//!
//! This crate contains the entry model, the per-day Markdown codec, the
//! remote repository client and the sync orchestrator used by the Ideabook
//! command-line client.

pub mod cache;
pub mod codec;
pub mod config;
pub mod credentials;
pub mod error;
pub mod models;
pub mod remote;
pub mod state;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{Entry, EntryId};
pub use sync::IdeaJournal;
