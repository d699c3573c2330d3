//! In-memory document store used by handler tests.

use crate::store::{DocumentStore, Page, Properties, Query, QueryPage, StoreError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

/// Test double for the external document store. Supports the rich-text
/// equality filter and cursor pagination, which is all the handlers use.
#[derive(Default)]
pub struct MemoryStore {
    databases: Mutex<HashMap<String, Vec<Page>>>,
    next_id: Mutex<u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    fn matches(page: &Page, filter: &Value) -> bool {
        let Some(property) = filter.get("property").and_then(Value::as_str) else {
            return true;
        };
        let Some(expected) = filter
            .get("rich_text")
            .and_then(|f| f.get("equals"))
            .and_then(Value::as_str)
        else {
            return true;
        };
        crate::store::props::read_text(&page.properties, property).as_deref() == Some(expected)
    }

    /// Number of pages currently stored in a database.
    pub fn len(&self, database_id: &str) -> usize {
        self.databases
            .lock()
            .expect("store lock")
            .get(database_id)
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn pages(&self, database_id: &str) -> Vec<Page> {
        self.databases
            .lock()
            .expect("store lock")
            .get(database_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn query(&self, database_id: &str, query: Query) -> Result<QueryPage, StoreError> {
        let databases = self.databases.lock().expect("store lock");
        let pages = databases.get(database_id).cloned().unwrap_or_default();

        let filtered: Vec<Page> = pages
            .into_iter()
            .filter(|page| {
                query
                    .filter
                    .as_ref()
                    .is_none_or(|filter| Self::matches(page, filter))
            })
            .collect();

        let start = query
            .start_cursor
            .as_deref()
            .and_then(|c| c.parse::<usize>().ok())
            .unwrap_or(0);
        let page_size = query.page_size.unwrap_or(100) as usize;
        let end = (start + page_size).min(filtered.len());
        let has_more = end < filtered.len();

        Ok(QueryPage {
            results: filtered[start.min(filtered.len())..end].to_vec(),
            has_more,
            next_cursor: has_more.then(|| end.to_string()),
        })
    }

    async fn get_page(&self, page_id: &str) -> Result<Page, StoreError> {
        let databases = self.databases.lock().expect("store lock");
        databases
            .values()
            .flatten()
            .find(|page| page.id == page_id)
            .cloned()
            .ok_or_else(|| StoreError::PageNotFound(page_id.to_string()))
    }

    async fn create_page(
        &self,
        database_id: &str,
        properties: Properties,
    ) -> Result<Page, StoreError> {
        let id = {
            let mut next_id = self.next_id.lock().expect("id lock");
            *next_id += 1;
            format!("page-{}", *next_id)
        };
        let page = Page { id, properties };
        self.databases
            .lock()
            .expect("store lock")
            .entry(database_id.to_string())
            .or_default()
            .push(page.clone());
        Ok(page)
    }

    async fn patch_properties(
        &self,
        page_id: &str,
        properties: Properties,
    ) -> Result<(), StoreError> {
        let mut databases = self.databases.lock().expect("store lock");
        let page = databases
            .values_mut()
            .flatten()
            .find(|page| page.id == page_id)
            .ok_or_else(|| StoreError::PageNotFound(page_id.to_string()))?;
        for (name, value) in properties {
            page.properties.insert(name, value);
        }
        Ok(())
    }
}
