//! Per-user cache of the latest search, backing the paging callbacks.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::results::{SearchResults, ViewFilter};

pub struct SearchState {
    pub results: SearchResults,
    pub page: usize,
    pub filter: ViewFilter,
}

#[derive(Default)]
pub struct SearchCache {
    states: Mutex<HashMap<i64, SearchState>>,
}

impl SearchCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache a fresh result set, starting at page zero with no filter.
    pub async fn put(&self, user_id: i64, results: SearchResults) {
        self.states.lock().await.insert(
            user_id,
            SearchState {
                results,
                page: 0,
                filter: ViewFilter::All,
            },
        );
    }

    /// Mutate the cached state (page turn, filter switch) and read the
    /// render inputs back out. `None` when the search expired.
    pub async fn update<R>(
        &self,
        user_id: i64,
        apply: impl FnOnce(&mut SearchState) -> R,
    ) -> Option<R> {
        let mut states = self.states.lock().await;
        states.get_mut(&user_id).map(apply)
    }

    pub async fn remove(&self, user_id: i64) -> bool {
        self.states.lock().await.remove(&user_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::results::search;

    #[tokio::test]
    async fn update_reaches_only_the_owning_user() {
        let cache = SearchCache::new();
        cache.put(1, search("avengers", &[], &[])).await;

        assert!(cache.update(1, |state| state.page = 2).await.is_some());
        assert!(cache.update(2, |state| state.page = 2).await.is_none());
    }

    #[tokio::test]
    async fn remove_expires_the_search() {
        let cache = SearchCache::new();
        cache.put(1, search("avengers", &[], &[])).await;

        assert!(cache.remove(1).await);
        assert!(!cache.remove(1).await);
        assert!(cache.update(1, |_| ()).await.is_none());
    }
}
