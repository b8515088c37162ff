//! Per-path write serialization.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type Slots = Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>;

/// One FIFO lock per document path. Holding a [`WriteSlot`] means holding the
/// only in-flight write for that path.
///
/// A path's lock lives only while some writer holds or waits for it.
#[derive(Debug, Default)]
pub struct WriteQueue {
    paths: Slots,
}

impl WriteQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, path: &str) -> WriteSlot {
        let lock = {
            let mut paths = self.paths.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(
                paths
                    .entry(path.to_string())
                    .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
            )
        };

        WriteSlot {
            guard: Some(lock.lock_owned().await),
            path: path.to_string(),
            paths: Arc::clone(&self.paths),
        }
    }

    /// Number of paths currently tracked.
    #[must_use]
    pub fn tracked_paths(&self) -> usize {
        self.paths
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Exclusive write access to one path, released on drop.
#[derive(Debug)]
pub struct WriteSlot {
    guard: Option<OwnedMutexGuard<()>>,
    path: String,
    paths: Slots,
}

impl Drop for WriteSlot {
    fn drop(&mut self) {
        self.guard.take();

        // Waiters hold their own clone of the lock, so a count of one means
        // only the map still refers to it.
        let mut paths = self.paths.lock().unwrap_or_else(PoisonError::into_inner);
        if paths
            .get(&self.path)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            paths.remove(&self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;

    use super::*;

    #[tokio::test]
    async fn same_path_waits_for_previous_writer() {
        let queue = WriteQueue::new();
        let first = queue.acquire("ideas/2026-10-19.md").await;

        let second = tokio::time::timeout(
            Duration::from_millis(50),
            queue.acquire("ideas/2026-10-19.md"),
        )
        .await;
        assert!(second.is_err());

        drop(first);
        let _second = queue.acquire("ideas/2026-10-19.md").await;
    }

    #[tokio::test]
    async fn different_paths_do_not_block() {
        let queue = WriteQueue::new();
        let _today = queue.acquire("ideas/2026-10-19.md").await;
        let other = tokio::time::timeout(
            Duration::from_millis(50),
            queue.acquire("ideas/2026-10-20.md"),
        )
        .await;
        assert!(other.is_ok());
    }

    #[tokio::test]
    async fn released_paths_are_forgotten() {
        let queue = WriteQueue::new();
        for day in 1..=5 {
            let _slot = queue.acquire(&format!("ideas/2026-10-0{day}.md")).await;
            assert_eq!(queue.tracked_paths(), 1);
        }
        assert_eq!(queue.tracked_paths(), 0);
    }

    #[tokio::test]
    async fn path_is_kept_while_a_writer_waits() {
        let queue = Arc::new(WriteQueue::new());
        let first = queue.acquire("ideas/2026-10-19.md").await;

        let waiting = {
            let queue = Arc::clone(&queue);
            tokio::spawn(async move {
                let _slot = queue.acquire("ideas/2026-10-19.md").await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(first);
        assert_eq!(queue.tracked_paths(), 1);

        waiting.await.unwrap();
        assert_eq!(queue.tracked_paths(), 0);
    }
}
