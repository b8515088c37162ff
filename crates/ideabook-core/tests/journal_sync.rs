mod support;

use axum::http::StatusCode;
use chrono::{DateTime, TimeZone, Utc};
use ideabook_core::cache::{self, FileStore};
use ideabook_core::codec;
use ideabook_core::remote::GitHubClient;
use ideabook_core::state::{ConnectionState, SyncState};
use ideabook_core::IdeaJournal;
use pretty_assertions::assert_eq;
use support::FakeGitHub;

const TODAY_PATH: &str = "ideas/2026-10-19.md";

fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 19, 21, 45, 0).unwrap()
}

fn journal(dir: &tempfile::TempDir) -> IdeaJournal<GitHubClient, FileStore> {
    IdeaJournal::new(FileStore::new(dir.path())).with_clock(fixed_now)
}

fn remote_titles(fake: &FakeGitHub) -> Vec<String> {
    let document = fake.file(TODAY_PATH).map(|file| file.content).unwrap_or_default();
    codec::decode(&document)
        .into_iter()
        .map(|entry| entry.title)
        .collect()
}

#[tokio::test]
async fn mutations_reach_the_day_document() {
    let fake = FakeGitHub::default();
    let base_url = fake.spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let journal = journal(&dir);

    assert_eq!(
        journal.connect(fake.client(&base_url)).await,
        ConnectionState::Connected
    );

    let first = journal.create("Sync daemon", "Push diffs").await.unwrap();
    journal.create("Pocket CLI", "Capture from terminal").await.unwrap();
    assert_eq!(remote_titles(&fake), vec!["Pocket CLI", "Sync daemon"]);

    journal
        .update(&first.id, "Sync daemon v2", "Push diffs, then pull")
        .await
        .unwrap();
    assert_eq!(remote_titles(&fake), vec!["Pocket CLI", "Sync daemon v2"]);

    assert!(journal.delete(&first.id).await.unwrap());
    assert_eq!(remote_titles(&fake), vec!["Pocket CLI"]);

    assert_eq!(journal.sync_state(), SyncState::Idle);
    assert_eq!(journal.last_sync(), Some(fixed_now()));
    assert!(fake
        .puts()
        .iter()
        .all(|put| put.message == "Update ideas for 2026-10-19"));
}

#[tokio::test]
async fn fresh_journal_loads_remote_entries_with_ids() {
    let fake = FakeGitHub::default();
    let base_url = fake.spawn().await;

    let writer_dir = tempfile::tempdir().unwrap();
    let writer = journal(&writer_dir);
    writer.connect(fake.client(&base_url)).await;
    let created = writer.create("Shared", "From another device").await.unwrap();

    let reader_dir = tempfile::tempdir().unwrap();
    let reader = journal(&reader_dir);
    reader.connect(fake.client(&base_url)).await;
    let loaded = reader.load().await;

    assert_eq!(loaded, vec![created]);
}

#[tokio::test]
async fn concurrent_creates_are_serialized() {
    let fake = FakeGitHub::default();
    let base_url = fake.spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let journal = journal(&dir);
    journal.connect(fake.client(&base_url)).await;

    let (first, second, third) = tokio::join!(
        journal.create("One", "1"),
        journal.create("Two", "2"),
        journal.create("Three", "3")
    );
    first.unwrap();
    second.unwrap();
    third.unwrap();

    let mut titles = remote_titles(&fake);
    titles.sort();
    assert_eq!(titles, vec!["One", "Three", "Two"]);
    assert_eq!(journal.sync_state(), SyncState::Idle);
}

#[tokio::test]
async fn outside_commit_between_saves_is_absorbed() {
    let fake = FakeGitHub::default();
    let base_url = fake.spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let journal = journal(&dir);
    journal.connect(fake.client(&base_url)).await;

    journal.create("Before", "b").await.unwrap();
    fake.seed(TODAY_PATH, "edited on the website");
    journal.create("After", "a").await.unwrap();

    assert_eq!(remote_titles(&fake), vec!["After", "Before"]);
    assert_eq!(journal.sync_state(), SyncState::Idle);
}

#[tokio::test]
async fn unreachable_repository_keeps_working_locally() {
    let fake = FakeGitHub::default();
    let base_url = fake.spawn().await;
    fake.set_repository_status(StatusCode::FORBIDDEN);
    let dir = tempfile::tempdir().unwrap();
    let journal = journal(&dir);

    assert_eq!(
        journal.connect(fake.client(&base_url)).await,
        ConnectionState::Failed
    );
    journal.create("Offline", "still saved").await.unwrap();

    assert!(fake.file(TODAY_PATH).is_none());
    let cached = cache::load_entries(&FileStore::new(dir.path()));
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].title, "Offline");

    let reopened = self::journal(&dir);
    assert_eq!(reopened.load().await, cached);
}
