//! Document-store seam.
//!
//! All durable state lives in an external paged database. Handlers receive
//! the store through this trait so the HTTP client can be swapped for an
//! in-memory double in tests.

pub mod notion;
pub mod props;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store returned {status}: {message}")]
    UnexpectedStatus { status: u16, message: String },

    #[error("Page not found: {0}")]
    PageNotFound(String),

    #[error("Invalid store URL: {0}")]
    InvalidUrl(String),
}

/// Property objects keyed by property name, in the store's wire shape.
pub type Properties = Map<String, Value>;

/// A single record in the store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub properties: Properties,
}

/// One page of query results.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct QueryPage {
    #[serde(default)]
    pub results: Vec<Page>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_cursor: Option<String>,
}

/// Query parameters for a paged database query.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Query {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

impl Query {
    /// Equality filter on a rich-text property.
    pub fn text_equals(property: &str, value: &str) -> Self {
        Query {
            filter: Some(serde_json::json!({
                "property": property,
                "rich_text": { "equals": value },
            })),
            ..Query::default()
        }
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Runs one paged query against a database.
    async fn query(&self, database_id: &str, query: Query) -> Result<QueryPage, StoreError>;

    /// Fetches a single page by id.
    async fn get_page(&self, page_id: &str) -> Result<Page, StoreError>;

    /// Creates a page in a database and returns it.
    async fn create_page(
        &self,
        database_id: &str,
        properties: Properties,
    ) -> Result<Page, StoreError>;

    /// Patches a subset of a page's properties.
    async fn patch_properties(
        &self,
        page_id: &str,
        properties: Properties,
    ) -> Result<(), StoreError>;
}
