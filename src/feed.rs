//! Live view of the multi-location summary, recomputed after each write.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex, PoisonError, Weak,
        atomic::{AtomicU64, Ordering},
    },
};

use thiserror::Error;
use tokio::{
    sync::{Notify, watch},
    task::JoinHandle,
};
use tracing::{debug, warn};

use crate::{models::Summaries, repositories::detection::DetectionRepo};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("summary query failed: {0}")]
pub struct FeedError(pub String);

/// A replacement snapshot, or the reason the latest recomputation failed.
pub type FeedUpdate = Result<Summaries, FeedError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

struct Inner {
    repo: DetectionRepo,
    changed: Arc<Notify>,
    tx: watch::Sender<FeedUpdate>,
    subscribers: Mutex<HashMap<u64, JoinHandle<()>>>,
    next_id: AtomicU64,
}

impl Inner {
    async fn compute(repo: &DetectionRepo) -> FeedUpdate {
        match repo.summarize_multi_location_devices().await {
            Ok(summaries) => {
                debug!(msg = "Recomputed summary", devices = summaries.len());
                Ok(Arc::new(summaries))
            }
            Err(e) => {
                warn!(msg = "Summary recomputation failed", error = %e);
                Err(FeedError(e.to_string()))
            }
        }
    }

    async fn refresh(&self) {
        let update = Self::compute(&self.repo).await;
        let _previous = self.tx.send_replace(update);
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        // Wake the refresher so it sees the feed is gone
        self.changed.notify_one();
        let subscribers = self
            .subscribers
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        for (_, task) in subscribers.drain() {
            task.abort();
        }
    }
}

#[derive(Clone)]
pub struct LiveFeed {
    inner: Arc<Inner>,
}

impl LiveFeed {
    /// Compute the first snapshot and start the background refresher.
    /// Must be called from within a Tokio runtime.
    pub async fn start(repo: DetectionRepo) -> Self {
        let initial = Inner::compute(&repo).await;
        let (tx, _) = watch::channel(initial);
        let changed = Arc::new(Notify::new());

        let inner = Arc::new(Inner {
            repo,
            changed: changed.clone(),
            tx,
            subscribers: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(0),
        });

        let weak: Weak<Inner> = Arc::downgrade(&inner);
        tokio::spawn(async move {
            loop {
                changed.notified().await;
                let Some(inner) = weak.upgrade() else {
                    break;
                };
                inner.refresh().await;
            }
        });

        Self { inner }
    }

    /// Schedule a recomputation. Cheap, never blocks.
    pub fn notify_changed(&self) {
        self.inner.changed.notify_one();
    }

    /// Recompute and publish immediately.
    pub async fn refresh(&self) {
        self.inner.refresh().await;
    }

    pub fn current(&self) -> FeedUpdate {
        self.inner.tx.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<FeedUpdate> {
        self.inner.tx.subscribe()
    }

    /// Deliver the current snapshot to `callback` right away, then every
    /// replacement after it. Snapshots published in quick succession may be
    /// skipped in favour of the newest one.
    pub fn subscribe<F>(&self, mut callback: F) -> SubscriptionHandle
    where
        F: FnMut(FeedUpdate) + Send + 'static,
    {
        let mut rx = self.inner.tx.subscribe();
        let task = tokio::spawn(async move {
            loop {
                let update = rx.borrow_and_update().clone();
                callback(update);
                if rx.changed().await.is_err() {
                    break;
                }
            }
        });

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, task);

        SubscriptionHandle(id)
    }

    /// Stop deliveries to a subscriber. Returns `false` for unknown handles.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        let task = self
            .inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle.0);

        match task {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }

    /// Live callback subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
