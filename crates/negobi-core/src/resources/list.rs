//! Paginated listing with search.
//!
//! Every parameter change marks the list for refetching. Requests are not
//! de-duplicated: each `refresh` is tagged with a generation number and
//! its response is only applied if no newer request was issued meanwhile,
//! so a slow stale response can never overwrite a fresher one.

use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use crate::api::{ApiClient, ApiError, ListQuery, Page};
use crate::hooks::BusyFlag;

use super::Resource;

/// What happened to the response of a `refresh`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    Applied,
    /// A newer request was issued while this one was in flight.
    Discarded,
}

#[derive(Debug)]
struct ListState<T> {
    query: ListQuery,
    /// Set after a create/update/delete so the list is fetched again.
    modified: bool,
    needs_fetch: bool,
    generation: u64,
    page: Page<T>,
}

pub struct ListController<R: Resource> {
    state: Arc<Mutex<ListState<R::Item>>>,
    loading: BusyFlag,
    _resource: PhantomData<R>,
}

impl<R: Resource> Clone for ListController<R> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            loading: self.loading.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R: Resource> Default for ListController<R> {
    fn default() -> Self {
        Self::new(ListQuery::default())
    }
}

impl<R: Resource> ListController<R> {
    pub fn new(query: ListQuery) -> Self {
        Self {
            state: Arc::new(Mutex::new(ListState {
                query,
                modified: false,
                needs_fetch: true,
                generation: 0,
                page: Page::default(),
            })),
            loading: BusyFlag::new(),
            _resource: PhantomData,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ListState<R::Item>> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn change(&self, f: impl FnOnce(&mut ListState<R::Item>)) {
        let mut state = self.lock();
        f(&mut state);
        state.needs_fetch = true;
    }

    pub fn query(&self) -> ListQuery {
        self.lock().query.clone()
    }

    pub fn page(&self) -> Page<R::Item> {
        self.lock().page.clone()
    }

    pub fn items(&self) -> Vec<R::Item> {
        self.lock().page.data.clone()
    }

    pub fn loading(&self) -> &BusyFlag {
        &self.loading
    }

    pub fn needs_fetch(&self) -> bool {
        self.lock().needs_fetch
    }

    pub fn is_modified(&self) -> bool {
        self.lock().modified
    }

    pub fn set_page(&self, page: u32) {
        self.change(|s| s.query.page = page.max(1));
    }

    /// Changing the search term starts again from the first page.
    pub fn set_search(&self, search: impl Into<String>) {
        let search = search.into();
        self.change(|s| {
            s.query = std::mem::take(&mut s.query).with_search(search);
            s.query.page = 1;
        });
    }

    pub fn set_items_per_page(&self, items_per_page: u32) {
        self.change(|s| {
            s.query = std::mem::take(&mut s.query).with_items_per_page(items_per_page);
            s.query.page = 1;
        });
    }

    pub fn mark_modified(&self) {
        self.change(|s| s.modified = true);
    }

    /// Fetch the current page. Errors from superseded requests are dropped
    /// along with their responses.
    pub async fn refresh(&self, api: &ApiClient) -> Result<Refresh, ApiError> {
        let (generation, query) = {
            let mut state = self.lock();
            state.generation += 1;
            state.needs_fetch = false;
            (state.generation, state.query.clone())
        };

        let _loading = self.loading.enter();
        let result = api.list::<R>(&query).await;

        let mut state = self.lock();
        if state.generation != generation {
            debug!(
                resource = %R::KIND,
                generation = generation,
                latest = state.generation,
                "Discarding stale list response"
            );
            return Ok(Refresh::Discarded);
        }

        let page = result?;
        debug!(resource = %R::KIND, page = query.page, items = page.data.len(), "List refreshed");
        state.page = page;
        state.modified = false;
        Ok(Refresh::Applied)
    }

    /// Refresh only when a parameter changed since the last fetch.
    pub async fn refresh_if_needed(&self, api: &ApiClient) -> Result<Option<Refresh>, ApiError> {
        if !self.needs_fetch() {
            return Ok(None);
        }
        self.refresh(api).await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::Clients;

    #[test]
    fn test_changes_request_refetch() {
        let list = ListController::<Clients>::default();
        assert!(list.needs_fetch());

        list.lock().needs_fetch = false;
        list.set_page(3);
        assert!(list.needs_fetch());
        assert_eq!(list.query().page, 3);
    }

    #[test]
    fn test_search_resets_page() {
        let list = ListController::<Clients>::new(ListQuery::page(4));
        list.set_search("acme");
        let query = list.query();
        assert_eq!(query.page, 1);
        assert_eq!(query.search.as_deref(), Some("acme"));

        list.set_page(2);
        list.set_items_per_page(50);
        assert_eq!(list.query().page, 1);
        assert_eq!(list.query().items_per_page, 50);
    }

    #[test]
    fn test_mark_modified() {
        let list = ListController::<Clients>::default();
        list.lock().needs_fetch = false;
        list.mark_modified();
        assert!(list.is_modified());
        assert!(list.needs_fetch());
    }

    #[test]
    fn test_page_zero_clamped() {
        let list = ListController::<Clients>::default();
        list.set_page(0);
        assert_eq!(list.query().page, 1);
    }
}
