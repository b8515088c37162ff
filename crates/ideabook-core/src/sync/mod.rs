//! Sync orchestrator.
//!
//! [`IdeaJournal`] owns the in-memory entry list and keeps it in step with
//! the local cache and, while connected, with today's document in the remote
//! repository.
//!
//! Mutations update the in-memory list synchronously and then await
//! [`IdeaJournal::save`]. The cache write happens first and is the only step
//! whose failure is returned; remote failures only move the sync state to
//! [`SyncState::Error`]. Remote writes for one document go through a FIFO
//! [`WriteQueue`], so concurrent mutations land in the order their snapshots
//! were taken.

mod write_queue;

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, NaiveDate, Utc};

use crate::cache::{self, LocalStore};
use crate::codec;
use crate::models::{Entry, EntryId};
use crate::remote::RemoteStore;
use crate::state::{ConnectionState, SyncState};
use crate::util::{normalize_text_option, single_line};
use crate::{Error, Result};

pub use write_queue::{WriteQueue, WriteSlot};

/// Source of "now" for the journal.
pub type Clock = fn() -> DateTime<Utc>;

/// Commit message used for the document of `day`.
#[must_use]
pub fn commit_message(day: NaiveDate) -> String {
    format!("Update ideas for {}", day.format("%Y-%m-%d"))
}

struct JournalState<R> {
    entries: Vec<Entry>,
    remote: Option<Arc<R>>,
    connection: ConnectionState,
    sync: SyncState,
    last_sync: Option<DateTime<Utc>>,
    deleting: HashSet<EntryId>,
}

impl<R> Default for JournalState<R> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            remote: None,
            connection: ConnectionState::Disconnected,
            sync: SyncState::Idle,
            last_sync: None,
            deleting: HashSet::new(),
        }
    }
}

pub struct IdeaJournal<R, L> {
    local: L,
    state: Mutex<JournalState<R>>,
    write_queue: WriteQueue,
    clock: Clock,
}

impl<R: RemoteStore, L: LocalStore> IdeaJournal<R, L> {
    /// Disconnected journal over `local`. Call [`Self::load`] to fill it.
    pub fn new(local: L) -> Self {
        Self {
            local,
            state: Mutex::new(JournalState::default()),
            write_queue: WriteQueue::new(),
            clock: Utc::now,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub const fn local_store(&self) -> &L {
        &self.local
    }

    fn state(&self) -> MutexGuard<'_, JournalState<R>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    fn connected_remote(&self) -> Option<Arc<R>> {
        let state = self.state();
        if state.connection.is_connected() {
            state.remote.clone()
        } else {
            None
        }
    }

    /// Probe the repository behind `remote` and keep it when reachable.
    pub async fn connect(&self, remote: R) -> ConnectionState {
        {
            let mut state = self.state();
            state.remote = None;
            state.connection = ConnectionState::Connecting;
        }

        let reachable = remote.repository_exists().await;

        let mut state = self.state();
        if reachable {
            tracing::info!("Connected to remote repository");
            state.remote = Some(Arc::new(remote));
            state.connection = ConnectionState::Connected;
        } else {
            tracing::warn!("Remote repository is not reachable; staying local");
            state.connection = ConnectionState::Failed;
        }
        state.connection
    }

    pub fn disconnect(&self) {
        let mut state = self.state();
        state.remote = None;
        state.connection = ConnectionState::Disconnected;
        tracing::info!("Disconnected from remote repository");
    }

    /// Load the entry list and make it the in-memory list.
    ///
    /// While connected, today's remote document wins: its entries replace the
    /// list, and a missing document means an empty list. Remote failures and
    /// the disconnected case read the local cache.
    pub async fn load(&self) -> Vec<Entry> {
        let entries = match self.connected_remote() {
            Some(remote) => {
                let today = self.now().date_naive();
                match remote.fetch_document(today).await {
                    Ok(Some(document)) => {
                        let entries = codec::decode(&document);
                        tracing::debug!("Loaded {} entries from remote", entries.len());
                        self.state().last_sync = Some(self.now());
                        entries
                    }
                    Ok(None) => Vec::new(),
                    Err(error) => {
                        tracing::warn!("Remote load failed, using local cache: {}", error);
                        cache::load_entries(&self.local)
                    }
                }
            }
            None => cache::load_entries(&self.local),
        };

        self.state().entries.clone_from(&entries);
        entries
    }

    /// Persist `entries` to the local cache, then push today's subset.
    pub async fn save(&self, entries: &[Entry]) -> Result<()> {
        cache::save_entries(&self.local, entries)?;
        self.push(entries).await;
        Ok(())
    }

    /// Push today's entries from the in-memory list without touching the
    /// cache. Does nothing while disconnected.
    pub async fn sync_now(&self) -> SyncState {
        let entries = self.entries();
        self.push(&entries).await;
        self.sync_state()
    }

    async fn push(&self, entries: &[Entry]) {
        let Some(remote) = self.connected_remote() else {
            return;
        };

        let day = self.now().date_naive();
        let document = codec::render_day_document(entries, day);
        let message = commit_message(day);

        let _slot = self.write_queue.acquire(&codec::document_path(day)).await;
        self.state().sync = SyncState::Syncing;

        let result = remote.write_document(day, &document, &message).await;

        let mut state = self.state();
        match result {
            Ok(sha) => {
                tracing::debug!("Wrote document for {} ({})", day, sha);
                state.sync = SyncState::Idle;
                state.last_sync = Some(self.now());
            }
            Err(error) => {
                tracing::warn!("Remote write for {} failed: {}", day, error);
                state.sync = SyncState::Error;
            }
        }
    }

    /// Add a new entry at the front of the list.
    pub async fn create(&self, title: &str, description: &str) -> Result<Entry> {
        let (title, description) = validate_fields(title, description)?;
        let entry = Entry::new_at(title, description, self.now());

        let snapshot = {
            let mut state = self.state();
            state.entries.insert(0, entry.clone());
            state.entries.clone()
        };

        self.save(&snapshot).await?;
        Ok(entry)
    }

    /// Replace title and description; id and creation time are kept.
    pub async fn update(&self, id: &EntryId, title: &str, description: &str) -> Result<Entry> {
        let (title, description) = validate_fields(title, description)?;

        let (entry, snapshot) = {
            let mut state = self.state();
            let entry = state
                .entries
                .iter_mut()
                .find(|entry| &entry.id == id)
                .ok_or_else(|| Error::NotFound(id.to_string()))?;
            entry.title = title;
            entry.description = description;
            let entry = entry.clone();
            (entry, state.entries.clone())
        };

        self.save(&snapshot).await?;
        Ok(entry)
    }

    /// Remove an entry.
    ///
    /// Returns `false` without touching anything when a delete for the same
    /// id is still in flight.
    pub async fn delete(&self, id: &EntryId) -> Result<bool> {
        let snapshot = {
            let mut state = self.state();
            if state.deleting.contains(id) {
                tracing::debug!("Delete for {} already in flight", id);
                return Ok(false);
            }
            let index = state
                .entries
                .iter()
                .position(|entry| &entry.id == id)
                .ok_or_else(|| Error::NotFound(id.to_string()))?;
            state.deleting.insert(id.clone());
            state.entries.remove(index);
            state.entries.clone()
        };

        let result = self.save(&snapshot).await;
        self.state().deleting.remove(id);
        result.map(|()| true)
    }

    #[must_use]
    pub fn entries(&self) -> Vec<Entry> {
        self.state().entries.clone()
    }

    /// Entry by exact id, or by a prefix matching exactly one id.
    pub fn find(&self, id_or_prefix: &str) -> Result<Entry> {
        let needle = id_or_prefix.trim();
        if needle.is_empty() {
            return Err(Error::InvalidInput("Entry id must not be empty".to_string()));
        }

        let state = self.state();
        if let Some(entry) = state.entries.iter().find(|entry| entry.id.as_str() == needle) {
            return Ok(entry.clone());
        }

        let mut matches = state
            .entries
            .iter()
            .filter(|entry| entry.id.as_str().starts_with(needle));
        match (matches.next(), matches.next()) {
            (Some(entry), None) => Ok(entry.clone()),
            (Some(_), Some(_)) => Err(Error::InvalidInput(format!(
                "Entry id prefix '{needle}' is ambiguous"
            ))),
            (None, _) => Err(Error::NotFound(needle.to_string())),
        }
    }

    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.state().connection
    }

    #[must_use]
    pub fn sync_state(&self) -> SyncState {
        self.state().sync
    }

    #[must_use]
    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.state().last_sync
    }
}

/// Trimmed fields; line breaks in the title are folded into spaces so it
/// stays a single heading line.
fn validate_fields(title: &str, description: &str) -> Result<(String, String)> {
    let title = normalize_text_option(Some(single_line(title)))
        .ok_or_else(|| Error::InvalidInput("Title must not be empty".to_string()))?;
    let description = normalize_text_option(Some(description.to_string()))
        .ok_or_else(|| Error::InvalidInput("Description must not be empty".to_string()))?;
    Ok((title, description))
}
