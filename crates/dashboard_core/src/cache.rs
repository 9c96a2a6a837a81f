use std::{
    collections::HashMap,
    future::Future,
    sync::{Mutex, MutexGuard, PoisonError},
};

use shared::{
    domain::EntityKind,
    pagination::Page,
    protocol::CatalogEvent,
    query::ListQuery,
};
use tokio::sync::broadcast;
use tracing::debug;

/// Something holding list results that can be told they are stale.
pub trait Invalidate: Send + Sync {
    fn invalidate(&self, kind: EntityKind);

    /// Drops every list a change to `kind` can affect.
    fn invalidate_after_change(&self, kind: EntityKind) {
        for &list in kind.affected_lists() {
            self.invalidate(list);
        }
    }
}

impl<I: Invalidate + ?Sized> Invalidate for &I {
    fn invalidate(&self, kind: EntityKind) {
        (**self).invalidate(kind);
    }
}

/// Forwards invalidations to whoever is subscribed, typically websocket
/// sessions that hold their own caches.
impl Invalidate for broadcast::Sender<CatalogEvent> {
    fn invalidate(&self, kind: EntityKind) {
        if self
            .send(CatalogEvent::ListInvalidated { entity: kind })
            .is_err()
        {
            debug!(entity = %kind, "no invalidation subscribers");
        }
    }
}

/// Fetched pages keyed by the decoded list query that produced them.
///
/// Entries never expire on their own; they go away only through
/// [`Invalidate`].
#[derive(Debug)]
pub struct ListCache<T> {
    kind: EntityKind,
    entries: Mutex<Entries<T>>,
}

#[derive(Debug)]
struct Entries<T> {
    /// Bumped by every invalidation of this cache's kind.
    generation: u64,
    pages: HashMap<ListQuery, Page<T>>,
}

impl<T: Clone + Send> ListCache<T> {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            entries: Mutex::new(Entries {
                generation: 0,
                pages: HashMap::new(),
            }),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn get(&self, query: &ListQuery) -> Option<Page<T>> {
        self.lock().pages.get(query).cloned()
    }

    pub fn insert(&self, query: ListQuery, page: Page<T>) {
        self.lock().pages.insert(query, page);
    }

    pub fn len(&self) -> usize {
        self.lock().pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().pages.is_empty()
    }

    /// Returns the cached page for `query`, calling `fetch` only on a miss.
    /// Failed fetches are not cached, and neither is a page whose fetch was
    /// overtaken by an invalidation.
    pub async fn get_or_fetch<F, Fut, E>(&self, query: &ListQuery, fetch: F) -> Result<Page<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Page<T>, E>>,
    {
        let generation = {
            let entries = self.lock();
            if let Some(page) = entries.pages.get(query) {
                return Ok(page.clone());
            }
            entries.generation
        };
        let page = fetch().await?;
        let mut entries = self.lock();
        if entries.generation == generation {
            entries.pages.insert(query.clone(), page.clone());
        } else {
            debug!(entity = %self.kind, "discarding page fetched before invalidation");
        }
        Ok(page)
    }

    fn lock(&self) -> MutexGuard<'_, Entries<T>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone + Send> Invalidate for ListCache<T> {
    fn invalidate(&self, kind: EntityKind) {
        if kind == self.kind {
            let mut entries = self.lock();
            debug!(entity = %kind, dropped = entries.pages.len(), "list cache invalidated");
            entries.generation = entries.generation.wrapping_add(1);
            entries.pages.clear();
        }
    }
}
