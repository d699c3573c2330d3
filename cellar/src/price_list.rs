//! Price-list assembly.
//!
//! An export record associates a list id with a fixed set of product ids,
//! optionally carrying a denormalized JSON blob of their fields. Lists with
//! a blob resolve locally; lists without one fall back to paginating the
//! product table and resolving producers through the relation, memoized per
//! call and fetched in bounded concurrent batches.

use crate::config::Databases;
use crate::errors::{CellarError, Result};
use crate::store::{DocumentStore, Page, Query, props};
use crate::wine::Wine;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::task::JoinSet;

/// Suffix marking the "92+ rated" filtered variant of a list.
pub const FILTERED_SUFFIX: &str = "-92";
/// Display-name decoration for the filtered variant.
pub const FILTERED_LABEL: &str = " (92+ Rated)";

/// Ceiling on product-table pages fetched in the fallback path.
const MAX_PRODUCT_PAGES: usize = 5;
const PRODUCT_PAGE_SIZE: u32 = 100;
/// Producer-relation lookups in flight at once.
const LOOKUP_BATCH_SIZE: usize = 8;

// Export-record property names.
pub const PROP_NAME: &str = "Name";
pub const PROP_LIST_ID: &str = "List ID";
pub const PROP_COMPANY: &str = "Company";
pub const PROP_TARGET_MARKET: &str = "Target Market";
pub const PROP_PRODUCT_IDS: &str = "Product IDs";
pub const PROP_PRODUCT_DATA: &str = "Product Data";

/// A list id split into its base id and the filtered-variant flag.
#[derive(Clone, Debug, PartialEq)]
pub struct ListId {
    pub base: String,
    pub filtered: bool,
}

impl ListId {
    pub fn parse(raw: &str) -> Self {
        match raw.strip_suffix(FILTERED_SUFFIX) {
            Some(base) if !base.is_empty() => ListId {
                base: base.to_string(),
                filtered: true,
            },
            _ => ListId {
                base: raw.to_string(),
                filtered: false,
            },
        }
    }
}

/// Two-level grouping: region -> producer -> wines sorted by name.
pub type GroupedWines = IndexMap<String, IndexMap<String, Vec<Wine>>>;

/// Groups wines region -> producer with each producer's wines sorted
/// alphabetically. Group order is alphabetical too, so the output is
/// deterministic regardless of input order.
pub fn group_wines(mut wines: Vec<Wine>) -> GroupedWines {
    wines.sort_by(|a, b| {
        (a.region.as_str(), a.producer.as_str(), a.name.as_str()).cmp(&(
            b.region.as_str(),
            b.producer.as_str(),
            b.name.as_str(),
        ))
    });

    let mut grouped: GroupedWines = IndexMap::new();
    for wine in wines {
        grouped
            .entry(wine.region.clone())
            .or_default()
            .entry(wine.producer.clone())
            .or_default()
            .push(wine);
    }
    grouped
}

/// Resolved export record with its wines, pre-grouping.
pub struct ResolvedList {
    pub display_name: String,
    pub company: String,
    pub target_market: String,
    pub wines: Vec<Wine>,
}

/// Looks up the export record for a base list id.
pub async fn find_export(
    store: &dyn DocumentStore,
    databases: &Databases,
    base_id: &str,
) -> Result<Page> {
    let query = Query::text_equals(PROP_LIST_ID, base_id);
    let page = store.query(&databases.exports, query).await?;
    page.results
        .into_iter()
        .next()
        .ok_or_else(|| CellarError::ListNotFound(base_id.to_string()))
}

/// Resolves an export record to its wines.
pub async fn resolve_list(
    store: &Arc<dyn DocumentStore>,
    databases: &Databases,
    id: &ListId,
) -> Result<ResolvedList> {
    let export = find_export(store.as_ref(), databases, &id.base).await?;

    let mut display_name =
        props::read_text(&export.properties, PROP_NAME).unwrap_or_else(|| "Price List".to_string());
    if id.filtered {
        display_name.push_str(FILTERED_LABEL);
    }
    let company =
        props::read_text(&export.properties, PROP_COMPANY).unwrap_or_else(|| "Unknown".to_string());
    let target_market =
        props::read_text(&export.properties, PROP_TARGET_MARKET).unwrap_or_default();

    let product_ids: Vec<String> = props::read_text(&export.properties, PROP_PRODUCT_IDS)
        .map(|ids| {
            ids.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    let blob = props::read_text(&export.properties, PROP_PRODUCT_DATA)
        .and_then(|raw| parse_product_blob(&raw));

    let wines = match blob {
        Some(blob) => resolve_from_blob(&product_ids, blob),
        None => resolve_from_product_table(store, databases, &product_ids).await?,
    };

    if wines.is_empty() {
        return Err(CellarError::ListEmpty(id.base.clone()));
    }

    Ok(ResolvedList {
        display_name,
        company,
        target_market,
        wines,
    })
}

fn parse_product_blob(raw: &str) -> Option<HashMap<String, Wine>> {
    match serde_json::from_str::<HashMap<String, Wine>>(raw) {
        Ok(blob) => Some(blob),
        Err(e) => {
            tracing::warn!(error = %e, "Unparseable product blob, falling back to product table");
            None
        }
    }
}

fn resolve_from_blob(product_ids: &[String], mut blob: HashMap<String, Wine>) -> Vec<Wine> {
    product_ids
        .iter()
        .filter_map(|id| blob.remove(id))
        .collect()
}

/// Fallback path: paginate the product table, keep rows in the requested id
/// set, and resolve producer names through the relation.
async fn resolve_from_product_table(
    store: &Arc<dyn DocumentStore>,
    databases: &Databases,
    product_ids: &[String],
) -> Result<Vec<Wine>> {
    let wanted: HashSet<&str> = product_ids.iter().map(String::as_str).collect();
    let mut matched: Vec<Page> = Vec::new();
    let mut cursor: Option<String> = None;

    for _ in 0..MAX_PRODUCT_PAGES {
        let query = Query {
            start_cursor: cursor.take(),
            page_size: Some(PRODUCT_PAGE_SIZE),
            ..Query::default()
        };
        let page = store.query(&databases.products, query).await?;
        matched.extend(
            page.results
                .into_iter()
                .filter(|p| wanted.contains(p.id.as_str())),
        );
        if !page.has_more {
            break;
        }
        cursor = page.next_cursor;
    }

    let producer_names = fetch_producer_names(store, &matched).await;

    let wines = matched
        .into_iter()
        .map(|page| {
            let producer = props::read_relation_ids(&page.properties, "Producer")
                .first()
                .and_then(|id| producer_names.get(id).cloned())
                .unwrap_or_default();
            Wine {
                id: page.id,
                name: props::read_text_any(&page.properties, &[PROP_NAME, "Product Name"])
                    .unwrap_or_default(),
                producer,
                region: props::read_text_any(&page.properties, &["Region"]).unwrap_or_default(),
                range: props::read_text_any(&page.properties, &["Range"]).unwrap_or_default(),
                color: props::read_text_any(&page.properties, &["Color"]).unwrap_or_default(),
                vintage: props::read_text_any(&page.properties, &["Vintage"]).unwrap_or_default(),
            }
        })
        .collect();

    Ok(wines)
}

/// Fetches each distinct producer page once, in bounded concurrent batches.
/// Lookup failures drop the producer name rather than the list.
async fn fetch_producer_names(
    store: &Arc<dyn DocumentStore>,
    products: &[Page],
) -> HashMap<String, String> {
    let mut distinct: Vec<String> = Vec::new();
    let mut seen = HashSet::new();
    for product in products {
        for id in props::read_relation_ids(&product.properties, "Producer") {
            if seen.insert(id.clone()) {
                distinct.push(id);
            }
        }
    }

    let mut names = HashMap::new();
    for batch in distinct.chunks(LOOKUP_BATCH_SIZE) {
        let mut join_set = JoinSet::new();
        for producer_id in batch {
            let store = Arc::clone(store);
            let producer_id = producer_id.clone();
            join_set.spawn(async move {
                let result = store.get_page(&producer_id).await;
                (producer_id, result)
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((producer_id, Ok(page))) => {
                    if let Some(name) = props::read_text(&page.properties, PROP_NAME) {
                        names.insert(producer_id, name);
                    }
                }
                Ok((producer_id, Err(e))) => {
                    tracing::warn!(producer_id, error = %e, "Producer lookup failed");
                }
                Err(e) => tracing::error!("Producer lookup task panicked: {e}"),
            }
        }
    }
    names
}
