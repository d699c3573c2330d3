//! Sample-request fan-out.
//!
//! One submitted request becomes one store record per distinct producer
//! among the requested wines, each carrying the full contact/shipping block
//! plus that producer's wine subset. Deliberate denormalization: the sales
//! team works producer-by-producer.

use crate::store::{Properties, props};
use crate::wine::Wine;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub const STATUS_NEW: &str = "New";

// Request-record property names.
pub const PROP_NAME: &str = "Name";
pub const PROP_REQUEST_ID: &str = "Request ID";
pub const PROP_PRODUCER: &str = "Producer";
pub const PROP_COMPANY: &str = "Company";
pub const PROP_CONTACT: &str = "Contact";
pub const PROP_EMAIL: &str = "Email";
pub const PROP_PHONE: &str = "Phone";
pub const PROP_ADDRESS: &str = "Address";
pub const PROP_WINES: &str = "Wines";
pub const PROP_WINES_COUNT: &str = "Wines Count";
pub const PROP_COMMENTS: &str = "Comments";
pub const PROP_STATUS: &str = "Status";
pub const PROP_SUBMITTED: &str = "Submitted";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Contact {
    pub company: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

impl Contact {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Shipping {
    pub address1: String,
    pub address2: String,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
}

impl Shipping {
    /// Postal block, one line per non-empty component.
    pub fn formatted(&self) -> String {
        let mut lines = vec![self.address1.clone()];
        if !self.address2.is_empty() {
            lines.push(self.address2.clone());
        }
        lines.push(format!("{}, {} {}", self.city, self.state, self.zip));
        if !self.country.is_empty() {
            lines.push(self.country.clone());
        }
        lines.join("\n")
    }
}

/// A logical sample request, pre-fan-out.
#[derive(Clone, Debug)]
pub struct SampleRequest {
    pub id: String,
    pub contact: Contact,
    pub shipping: Shipping,
    pub wines: Vec<Wine>,
    pub comments: String,
    pub submitted_at: DateTime<Utc>,
}

/// Groups wines by producer, producers in alphabetical order, each
/// producer's wines in submission order.
pub fn group_by_producer(wines: &[Wine]) -> IndexMap<String, Vec<Wine>> {
    let mut grouped: IndexMap<String, Vec<Wine>> = IndexMap::new();
    for wine in wines {
        grouped
            .entry(wine.producer.clone())
            .or_default()
            .push(wine.clone());
    }
    grouped.sort_keys();
    grouped
}

/// Human-readable record title: `YYYYMMDD / STATE / COMPANY / PRODUCER`.
pub fn record_title(request: &SampleRequest, producer: &str) -> String {
    format!(
        "{} / {} / {} / {}",
        request.submitted_at.format("%Y%m%d"),
        request.shipping.state.to_uppercase(),
        request.contact.company,
        producer,
    )
}

/// Store properties for one producer's record of the fan-out.
pub fn record_properties(request: &SampleRequest, producer: &str, wines: &[Wine]) -> Properties {
    let wine_lines = wines
        .iter()
        .map(|w| {
            if w.vintage.is_empty() {
                w.name.clone()
            } else {
                format!("{} ({})", w.name, w.vintage)
            }
        })
        .collect::<Vec<_>>()
        .join("\n");

    let mut properties = Properties::new();
    properties.insert(
        PROP_NAME.to_string(),
        props::title(&record_title(request, producer)),
    );
    properties.insert(PROP_REQUEST_ID.to_string(), props::rich_text(&request.id));
    properties.insert(PROP_PRODUCER.to_string(), props::rich_text(producer));
    properties.insert(
        PROP_COMPANY.to_string(),
        props::rich_text(&request.contact.company),
    );
    properties.insert(
        PROP_CONTACT.to_string(),
        props::rich_text(&request.contact.full_name()),
    );
    if !request.contact.email.is_empty() {
        properties.insert(
            PROP_EMAIL.to_string(),
            props::email(&request.contact.email),
        );
    }
    if !request.contact.phone.is_empty() {
        properties.insert(
            PROP_PHONE.to_string(),
            props::phone(&request.contact.phone),
        );
    }
    properties.insert(
        PROP_ADDRESS.to_string(),
        props::rich_text(&request.shipping.formatted()),
    );
    properties.insert(PROP_WINES.to_string(), props::rich_text(&wine_lines));
    properties.insert(
        PROP_WINES_COUNT.to_string(),
        props::number(wines.len() as f64),
    );
    if !request.comments.is_empty() {
        properties.insert(
            PROP_COMMENTS.to_string(),
            props::rich_text(&request.comments),
        );
    }
    properties.insert(PROP_STATUS.to_string(), props::select(STATUS_NEW));
    properties.insert(
        PROP_SUBMITTED.to_string(),
        props::date(&request.submitted_at.to_rfc3339()),
    );
    properties
}
