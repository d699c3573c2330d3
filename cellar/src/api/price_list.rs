//! Price-list endpoints: creation from an export payload and grouped
//! retrieval.

use crate::AppState;
use crate::errors::{CellarError, Result};
use crate::price_list::{
    self, GroupedWines, ListId, PROP_COMPANY, PROP_LIST_ID, PROP_NAME, PROP_PRODUCT_DATA,
    PROP_PRODUCT_IDS, PROP_TARGET_MARKET, group_wines,
};
use crate::response::{HandlerBody, deserialize_body, json_response};
use crate::store::{Properties, props};
use crate::wine::{Wine, WineInput};
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

#[derive(Deserialize)]
struct CreateRequest {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    company: Option<String>,
    #[serde(default, rename = "targetMarket")]
    target_market: Option<String>,
    #[serde(default)]
    wines: Vec<WineInput>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateResponse {
    success: bool,
    id: String,
    sample_url: String,
    wine_count: usize,
}

/// `POST /price-list` — registers an exported list and returns the
/// shareable URL. Persistence is best-effort; a missing store is logged.
pub async fn create(state: &AppState, body: &Bytes) -> Result<Response<HandlerBody>> {
    let request: CreateRequest = deserialize_body(body)?;
    if request.wines.is_empty() {
        return Err(CellarError::NoWines);
    }

    let id = new_id();
    let wines: Vec<Wine> = request
        .wines
        .into_iter()
        .map(|input| input.reconcile(new_id))
        .collect();
    let wine_count = wines.len();

    let name = request.name.unwrap_or_else(|| "Price List".to_string());
    let company = request.company.unwrap_or_else(|| "Unknown".to_string());

    match &state.store {
        Some(handle) => {
            let product_ids: Vec<&str> = wines.iter().map(|w| w.id.as_str()).collect();
            let blob: HashMap<&str, &Wine> = wines.iter().map(|w| (w.id.as_str(), w)).collect();

            let mut properties = Properties::new();
            properties.insert(PROP_NAME.to_string(), props::title(&name));
            properties.insert(PROP_LIST_ID.to_string(), props::rich_text(&id));
            properties.insert(PROP_COMPANY.to_string(), props::rich_text(&company));
            if let Some(target_market) = &request.target_market {
                properties.insert(
                    PROP_TARGET_MARKET.to_string(),
                    props::rich_text(target_market),
                );
            }
            properties.insert(
                PROP_PRODUCT_IDS.to_string(),
                props::rich_text(&product_ids.join(",")),
            );
            properties.insert(
                PROP_PRODUCT_DATA.to_string(),
                props::rich_text(&serde_json::to_string(&blob)?),
            );
            properties.insert(
                crate::analytics::PROP_VIEWS.to_string(),
                props::number(0.0),
            );

            if let Err(e) = handle
                .store
                .create_page(&handle.databases.exports, properties)
                .await
            {
                tracing::error!(id, error = %e, "Failed to persist price list");
            }
        }
        None => {
            tracing::warn!(id, wine_count, "No document store configured, price list not persisted");
        }
    }

    let mut sample_url = state.config.base_url.clone();
    sample_url.set_query(Some(&format!("list={id}")));

    json_response(
        StatusCode::OK,
        &CreateResponse {
            success: true,
            id,
            sample_url: sample_url.to_string(),
            wine_count,
        },
    )
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GetResponse {
    id: String,
    display_name: String,
    company: String,
    target_market: String,
    product_count: usize,
    wines: GroupedWines,
}

/// `GET /price-list/{id}` — resolves and groups a list's wines.
pub async fn get(state: &AppState, raw_id: &str) -> Result<Response<HandlerBody>> {
    let handle = state.store.as_ref().ok_or(CellarError::StoreUnconfigured)?;

    let list_id = ListId::parse(raw_id);
    let resolved = price_list::resolve_list(&handle.store, &handle.databases, &list_id).await?;

    let product_count = resolved.wines.len();
    json_response(
        StatusCode::OK,
        &GetResponse {
            id: raw_id.to_string(),
            display_name: resolved.display_name,
            company: resolved.company,
            target_market: resolved.target_market,
            product_count,
            wines: group_wines(resolved.wines),
        },
    )
}
