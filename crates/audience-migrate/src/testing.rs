//! In-memory [`RestApi`] used by unit tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::client::RestApi;
use crate::endpoint::{Record, ResourceKind};
use crate::error::{Error, Result};
use crate::paginator::{Page, PageRequest};

/// Builds a page from JSON objects.
pub fn page(records: Vec<serde_json::Value>, last: bool) -> Page {
    Page {
        content: records
            .into_iter()
            .filter_map(|r| r.as_object().cloned())
            .collect(),
        last,
    }
}

/// Scripted API with request counters.
#[derive(Default)]
pub struct MockApi {
    // `None` entries fail with a server error.
    pages: HashMap<ResourceKind, Vec<Option<Page>>>,
    details: HashMap<(ResourceKind, String), Record>,
    failing_creates: HashSet<String>,
    list_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
    create_calls: AtomicUsize,
    created: Mutex<Vec<(ResourceKind, Record)>>,
    queries: Mutex<Vec<Vec<(String, String)>>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, kind: ResourceKind, page: Page) -> Self {
        self.pages.entry(kind).or_default().push(Some(page));
        self
    }

    pub fn with_failing_page(mut self, kind: ResourceKind) -> Self {
        self.pages.entry(kind).or_default().push(None);
        self
    }

    pub fn with_detail(mut self, kind: ResourceKind, id: &str, record: Record) -> Self {
        self.details.insert((kind, id.to_string()), record);
        self
    }

    pub fn failing_create(mut self, id: &str) -> Self {
        self.failing_creates.insert(id.to_string());
        self
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.list_calls() + self.fetch_calls() + self.create_calls()
    }

    pub fn created(&self, kind: ResourceKind) -> Vec<Record> {
        self.created
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, r)| r.clone())
            .collect()
    }

    pub fn queries(&self) -> Vec<Vec<(String, String)>> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl RestApi for MockApi {
    async fn list_page(
        &self,
        kind: ResourceKind,
        page: u32,
        request: &PageRequest,
    ) -> Result<Page> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(request.query(page));

        match self.pages.get(&kind).and_then(|p| p.get(page as usize)) {
            Some(Some(page)) => Ok(page.clone()),
            Some(None) => Err(Error::Api {
                status: 503,
                body: "unavailable".to_string(),
            }),
            None => Err(Error::Decode("empty page".to_string())),
        }
    }

    async fn fetch(&self, kind: ResourceKind, id: &str) -> Result<Record> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.details
            .get(&(kind, id.to_string()))
            .cloned()
            .ok_or_else(|| Error::Api {
                status: 404,
                body: format!("{kind} {id} not found"),
            })
    }

    async fn create(&self, kind: ResourceKind, record: &Record) -> Result<Record> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing_creates.contains(&kind.display_id(record)) {
            return Err(Error::Api {
                status: 500,
                body: "internal error".to_string(),
            });
        }
        self.created.lock().unwrap().push((kind, record.clone()));
        Ok(record.clone())
    }
}
