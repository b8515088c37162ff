//! Entry model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Opaque identifier for an entry.
///
/// New ids are UUID v7 (time-sortable with a random tail). Ids read back from
/// the cache or from documents are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(String);

impl EntryId {
    /// Create a new unique entry ID using UUID v7
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First characters of the id, for compact listings.
    #[must_use]
    pub fn short(&self) -> String {
        self.0.chars().take(13).collect()
    }
}

impl Default for EntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EntryId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_whitespace) {
            return Err(Error::InvalidInput(format!("Invalid entry id: '{s}'")));
        }
        Ok(Self(trimmed.to_string()))
    }
}

/// One idea in the journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: EntryId,
    pub title: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl Entry {
    /// Create a new entry stamped with the current time.
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new_at(title, description, Utc::now())
    }

    #[must_use]
    pub fn new_at(
        title: impl Into<String>,
        description: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: EntryId::new(),
            title: title.into(),
            description: description.into(),
            created_at,
        }
    }

    /// Calendar day (UTC) the entry belongs to.
    #[must_use]
    pub fn day(&self) -> NaiveDate {
        self.created_at.date_naive()
    }

    /// Get first line of the description, truncated to `max_len` characters
    #[must_use]
    pub fn description_preview(&self, max_len: usize) -> String {
        self.description
            .lines()
            .next()
            .unwrap_or("")
            .chars()
            .take(max_len)
            .collect()
    }
}
