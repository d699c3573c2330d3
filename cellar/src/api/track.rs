//! Analytics endpoints. Both are best-effort: every failure is logged and
//! the response still reports success, since analytics must never block the
//! customer-facing flow.

use crate::AppState;
use crate::analytics::{
    self, AccessLogEntry, PROP_ACCESS_LOG, PROP_AVG_DURATION, PROP_LAST_VISITOR,
    PROP_LAST_VISITOR_IP, PROP_MAX_DURATION, PROP_VIEWS,
};
use crate::errors::Result;
use crate::geo;
use crate::price_list::{self, ListId};
use crate::response::{HandlerBody, deserialize_body, json_response};
use crate::store::{Properties, props};
use chrono::{SecondsFormat, Utc};
use hyper::body::Bytes;
use hyper::header::HeaderMap;
use hyper::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TrackResponse {
    success: bool,
    session_id: String,
    views: u64,
    location: String,
}

/// `GET /track/{id}` — records a page view.
pub async fn view(state: &AppState, raw_id: &str, headers: &HeaderMap) -> Result<Response<HandlerBody>> {
    let session_id = Uuid::new_v4().simple().to_string();
    let mut views = 0;
    let mut location = String::new();

    match record_view(state, raw_id, headers).await {
        Ok((recorded_views, recorded_location)) => {
            views = recorded_views;
            location = recorded_location;
        }
        Err(e) => {
            tracing::warn!(list_id = raw_id, error = %e, "View tracking failed");
        }
    }

    json_response(
        StatusCode::OK,
        &TrackResponse {
            success: true,
            session_id,
            views,
            location,
        },
    )
}

async fn record_view(
    state: &AppState,
    raw_id: &str,
    headers: &HeaderMap,
) -> Result<(u64, String)> {
    let Some(handle) = &state.store else {
        return Ok((0, String::new()));
    };
    let list_id = ListId::parse(raw_id);
    let export = price_list::find_export(handle.store.as_ref(), &handle.databases, &list_id.base).await?;

    let views = props::read_number(&export.properties, PROP_VIEWS).unwrap_or(0.0) as u64 + 1;

    let ip = geo::client_ip(headers);
    let location = match &ip {
        Some(ip) if !geo::is_private(ip) => match state.geo.lookup(ip).await {
            Ok(resolved) => resolved.display(),
            Err(e) => {
                tracing::warn!(%ip, error = %e, "Geolocation lookup failed");
                String::new()
            }
        },
        _ => String::new(),
    };

    let entry = AccessLogEntry {
        t: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        ip: ip.map(|ip| ip.to_string()).unwrap_or_default(),
        loc: location.clone(),
        filtered: list_id.filtered,
    };
    let stored_log = props::read_text(&export.properties, PROP_ACCESS_LOG);
    let access_log = analytics::push_access_log(stored_log.as_deref(), entry);

    let mut properties = Properties::new();
    properties.insert(PROP_VIEWS.to_string(), props::number(views as f64));
    properties.insert(PROP_ACCESS_LOG.to_string(), props::rich_text(&access_log));
    if !location.is_empty() {
        properties.insert(PROP_LAST_VISITOR.to_string(), props::rich_text(&location));
    }
    if let Some(ip) = &ip {
        properties.insert(
            PROP_LAST_VISITOR_IP.to_string(),
            props::rich_text(&ip.to_string()),
        );
    }
    handle.store.patch_properties(&export.id, properties).await?;

    Ok((views, location))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DurationReport {
    price_list_id: String,
    duration: i64,
    #[serde(default)]
    #[allow(dead_code)]
    session_id: Option<String>,
}

/// `POST /track-duration` — folds a reported session duration into the
/// rolling average.
pub async fn duration(state: &AppState, body: &Bytes) -> Result<Response<HandlerBody>> {
    let success = serde_json::json!({ "success": true });

    let report: DurationReport = match deserialize_body(body) {
        Ok(report) => report,
        Err(e) => {
            tracing::warn!(error = %e, "Unparseable duration report");
            return json_response(StatusCode::OK, &success);
        }
    };

    if let Err(e) = record_duration(state, &report).await {
        tracing::warn!(list_id = %report.price_list_id, error = %e, "Duration tracking failed");
    }

    json_response(StatusCode::OK, &success)
}

async fn record_duration(state: &AppState, report: &DurationReport) -> Result<()> {
    let Some(duration) = analytics::clamp_duration(report.duration) else {
        return Ok(());
    };
    let Some(handle) = &state.store else {
        return Ok(());
    };

    let list_id = ListId::parse(&report.price_list_id);
    let export = price_list::find_export(handle.store.as_ref(), &handle.databases, &list_id.base).await?;

    let views = (props::read_number(&export.properties, PROP_VIEWS).unwrap_or(0.0) as u64).max(1);
    let old_avg = props::read_number(&export.properties, PROP_AVG_DURATION).unwrap_or(0.0) as u64;
    let old_max = props::read_number(&export.properties, PROP_MAX_DURATION).unwrap_or(0.0) as u64;

    let new_avg = analytics::rolling_average(old_avg, views, duration);

    let mut properties = Properties::new();
    properties.insert(PROP_AVG_DURATION.to_string(), props::number(new_avg as f64));
    if duration > old_max {
        properties.insert(PROP_MAX_DURATION.to_string(), props::number(duration as f64));
    }
    handle.store.patch_properties(&export.id, properties).await?;
    Ok(())
}
