//! Sample-request endpoints: submission with per-producer fan-out, the
//! admin listing, single-record fetch, and status updates.
//!
//! Submission is accept-first: once the body parses, the response reports
//! success regardless of store or email delivery outcome.

use crate::AppState;
use crate::errors::{CellarError, Result};
use crate::response::{HandlerBody, deserialize_body, json_response};
use crate::sample_request::{
    self, Contact, PROP_COMPANY, PROP_CONTACT, PROP_EMAIL, PROP_NAME, PROP_STATUS, PROP_SUBMITTED,
    PROP_WINES_COUNT, SampleRequest, Shipping, group_by_producer, record_properties,
};
use crate::store::{Page, Properties, Query, StoreError, props};
use crate::templates;
use crate::wine::WineInput;
use chrono::Utc;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Deserialize)]
struct SubmitRequest {
    #[serde(default)]
    contact: Contact,
    #[serde(default)]
    shipping: Shipping,
    #[serde(default)]
    wines: Vec<WineInput>,
    #[serde(default)]
    comments: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    success: bool,
    id: String,
    notion_page_id: Option<String>,
    message: String,
}

/// `POST /sample-request`
pub async fn create(state: &AppState, body: &Bytes) -> Result<Response<HandlerBody>> {
    let submitted: SubmitRequest = deserialize_body(body)?;
    if submitted.wines.is_empty() {
        return Err(CellarError::NoWines);
    }

    let request = SampleRequest {
        id: Uuid::new_v4().simple().to_string(),
        contact: submitted.contact,
        shipping: submitted.shipping,
        wines: submitted
            .wines
            .into_iter()
            .map(|input| input.reconcile(|| Uuid::new_v4().simple().to_string()))
            .collect(),
        comments: submitted.comments.unwrap_or_default(),
        submitted_at: Utc::now(),
    };

    let notion_page_id = persist(state, &request).await;
    notify(state, &request).await;

    json_response(
        StatusCode::OK,
        &SubmitResponse {
            success: true,
            id: request.id,
            notion_page_id,
            message: "Sample request submitted successfully".to_string(),
        },
    )
}

/// Writes one record per producer. Returns the first created page id; every
/// failure is logged and swallowed.
async fn persist(state: &AppState, request: &SampleRequest) -> Option<String> {
    let Some(handle) = &state.store else {
        tracing::warn!(
            request_id = %request.id,
            company = %request.contact.company,
            "No document store configured, sample request not persisted"
        );
        return None;
    };

    let mut first_page_id = None;
    for (producer, wines) in group_by_producer(&request.wines) {
        let properties = record_properties(request, &producer, &wines);
        match handle
            .store
            .create_page(&handle.databases.requests, properties)
            .await
        {
            Ok(page) => {
                tracing::info!(request_id = %request.id, producer, page_id = %page.id, "Created request record");
                first_page_id.get_or_insert(page.id);
            }
            Err(e) => {
                tracing::error!(request_id = %request.id, producer, error = %e, "Failed to create request record");
            }
        }
    }
    first_page_id
}

/// Sends the internal notice and, when a requester email is present, the
/// confirmation. Best-effort on both.
async fn notify(state: &AppState, request: &SampleRequest) {
    let Some(email) = &state.email else {
        return;
    };

    let notice = templates::render_internal_notice(request);
    let subject = templates::internal_subject(request);
    for recipient in &email.notify {
        if let Err(e) = email.send(recipient, &subject, &notice).await {
            tracing::error!(recipient, error = %e, "Failed to send notification email");
        }
    }

    if request.contact.email.is_empty() {
        tracing::warn!(request_id = %request.id, "No contact email, skipping confirmation");
        return;
    }
    let confirmation = templates::render_confirmation(request, &email.brand);
    let subject = templates::confirmation_subject(&email.brand);
    if let Err(e) = email.send(&request.contact.email, &subject, &confirmation).await {
        tracing::error!(to = %request.contact.email, error = %e, "Failed to send confirmation email");
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Summary {
    id: String,
    company: String,
    contact_name: String,
    email: String,
    wine_count: u64,
    status: String,
    submitted_at: String,
}

fn summarize(page: &Page) -> Summary {
    Summary {
        id: page.id.clone(),
        company: props::read_text(&page.properties, PROP_COMPANY).unwrap_or_default(),
        contact_name: props::read_text(&page.properties, PROP_CONTACT).unwrap_or_default(),
        email: props::read_email(&page.properties, PROP_EMAIL).unwrap_or_default(),
        wine_count: props::read_number(&page.properties, PROP_WINES_COUNT).unwrap_or(0.0) as u64,
        status: props::read_select(&page.properties, PROP_STATUS).unwrap_or_default(),
        submitted_at: props::read_date(&page.properties, PROP_SUBMITTED).unwrap_or_default(),
    }
}

/// `GET /sample-request` — admin listing, newest first.
pub async fn list(state: &AppState) -> Result<Response<HandlerBody>> {
    let handle = state.store.as_ref().ok_or(CellarError::StoreUnconfigured)?;

    let mut pages: Vec<Page> = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        let query = Query {
            start_cursor: cursor.take(),
            page_size: Some(100),
            ..Query::default()
        };
        let result = handle.store.query(&handle.databases.requests, query).await?;
        pages.extend(result.results);
        if !result.has_more {
            break;
        }
        cursor = result.next_cursor;
    }

    let mut summaries: Vec<Summary> = pages.iter().map(summarize).collect();
    summaries.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));

    json_response(StatusCode::OK, &summaries)
}

fn page_to_record(page: &Page) -> serde_json::Value {
    serde_json::json!({
        "id": page.id,
        "name": props::read_text(&page.properties, PROP_NAME).unwrap_or_default(),
        "requestId": props::read_text(&page.properties, sample_request::PROP_REQUEST_ID).unwrap_or_default(),
        "producer": props::read_text(&page.properties, sample_request::PROP_PRODUCER).unwrap_or_default(),
        "company": props::read_text(&page.properties, PROP_COMPANY).unwrap_or_default(),
        "contactName": props::read_text(&page.properties, PROP_CONTACT).unwrap_or_default(),
        "email": props::read_email(&page.properties, PROP_EMAIL).unwrap_or_default(),
        "phone": props::read_phone(&page.properties, sample_request::PROP_PHONE).unwrap_or_default(),
        "address": props::read_text(&page.properties, sample_request::PROP_ADDRESS).unwrap_or_default(),
        "wines": props::read_text(&page.properties, sample_request::PROP_WINES).unwrap_or_default(),
        "wineCount": props::read_number(&page.properties, PROP_WINES_COUNT).unwrap_or(0.0),
        "comments": props::read_text(&page.properties, sample_request::PROP_COMMENTS).unwrap_or_default(),
        "status": props::read_select(&page.properties, PROP_STATUS).unwrap_or_default(),
        "submittedAt": props::read_date(&page.properties, PROP_SUBMITTED).unwrap_or_default(),
    })
}

/// `GET /sample-request/{id}`
pub async fn get(state: &AppState, id: &str) -> Result<Response<HandlerBody>> {
    let handle = state.store.as_ref().ok_or(CellarError::StoreUnconfigured)?;

    let page = handle.store.get_page(id).await.map_err(|e| match e {
        StoreError::PageNotFound(_) => CellarError::RequestNotFound(id.to_string()),
        other => CellarError::Store(other),
    })?;

    json_response(StatusCode::OK, &page_to_record(&page))
}

#[derive(Deserialize)]
struct StatusUpdate {
    status: String,
}

/// `PATCH /sample-request/{id}` — updates the record's status.
pub async fn patch_status(state: &AppState, id: &str, body: &Bytes) -> Result<Response<HandlerBody>> {
    let handle = state.store.as_ref().ok_or(CellarError::StoreUnconfigured)?;
    let update: StatusUpdate = deserialize_body(body)?;

    let mut properties = Properties::new();
    properties.insert(PROP_STATUS.to_string(), props::select(&update.status));

    handle
        .store
        .patch_properties(id, properties)
        .await
        .map_err(|e| match e {
            StoreError::PageNotFound(_) => CellarError::RequestNotFound(id.to_string()),
            other => CellarError::Store(other),
        })?;

    json_response(
        StatusCode::OK,
        &serde_json::json!({ "success": true, "id": id, "status": update.status }),
    )
}
