//! Data models for Ideabook

mod entry;

pub use entry::{Entry, EntryId};
