//! Mock record store for testing purposes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::models::{ArtifactLocation, PropertyEntry, Record, ResultPage, SearchQuery};
use crate::store::{RecordStore, StoreError};

/// A mock store serving predefined pages, with fetch counting.
#[derive(Debug, Default)]
pub struct MockStore {
    pages: Mutex<HashMap<u32, ResultPage>>,
    locations: Mutex<HashMap<String, ArtifactLocation>>,
    fail_message: Mutex<Option<String>>,
    search_calls: AtomicUsize,
}

impl MockStore {
    /// Create an empty mock store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `page` for requests of page number `requested`.
    ///
    /// The served page's own index may differ from `requested`, which lets
    /// tests provoke index-mismatch handling.
    pub fn set_page(&self, requested: u32, page: ResultPage) {
        self.pages.lock().unwrap().insert(requested, page);
    }

    /// Serve `location` for the given instance id.
    pub fn set_location(&self, instance: &str, location: ArtifactLocation) {
        self.locations
            .lock()
            .unwrap()
            .insert(instance.to_string(), location);
    }

    /// Make every subsequent search fail with an API error.
    pub fn fail_searches(&self, message: &str) {
        *self.fail_message.lock().unwrap() = Some(message.to_string());
    }

    /// Number of search calls that reached the store.
    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecordStore for MockStore {
    async fn search(&self, _query: &SearchQuery, page: u32) -> Result<ResultPage, StoreError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = self.fail_message.lock().unwrap().clone() {
            return Err(StoreError::Api(message));
        }

        self.pages
            .lock()
            .unwrap()
            .get(&page)
            .cloned()
            .ok_or_else(|| StoreError::Api(format!("no such page: {}", page)))
    }

    async fn resolve_artifact(&self, instance: &str) -> Result<ArtifactLocation, StoreError> {
        self.locations
            .lock()
            .unwrap()
            .get(instance)
            .cloned()
            .ok_or_else(|| StoreError::Api(format!("no such instance: {}", instance)))
    }
}

/// Helper to build a result page for tests.
pub fn make_page(page_index: u32, total_pages: u32, titles: &[&str]) -> ResultPage {
    let records = titles
        .iter()
        .enumerate()
        .map(|(i, title)| {
            let props = vec![PropertyEntry {
                name: "dc:title".to_string(),
                lang: "zh".to_string(),
                col_name: "题名".to_string(),
                value: title.to_string(),
            }];
            Record::from_properties(format!("cjfd:P{}R{}", page_index, i), "literature", &props)
        })
        .collect::<Vec<_>>();

    ResultPage {
        page_index,
        page_size: records.len() as u32,
        total_pages,
        total_records: (total_pages as u64) * (records.len().max(1) as u64),
        records,
    }
}
