//! `GET /states` — state/territory options for the shipping form.

use crate::AppState;
use crate::errors::Result;
use crate::response::{HandlerBody, json_response};
use crate::states::{StateEntry, fallback_states, load_states};
use hyper::{Response, StatusCode};
use serde::Serialize;

#[derive(Serialize)]
struct StatesResponse {
    states: Vec<StateEntry>,
}

/// Serves the external table when configured and reachable, otherwise the
/// hardcoded fallback. This endpoint never fails.
pub async fn get(state: &AppState) -> Result<Response<HandlerBody>> {
    let external = match &state.store {
        Some(handle) => match &handle.databases.states {
            Some(database_id) => match load_states(handle.store.as_ref(), database_id).await {
                Ok(states) => Some(states),
                Err(e) => {
                    tracing::warn!(error = %e, "States table unavailable, serving fallback");
                    None
                }
            },
            None => None,
        },
        None => None,
    };

    json_response(
        StatusCode::OK,
        &StatesResponse {
            states: external.unwrap_or_else(fallback_states),
        },
    )
}
