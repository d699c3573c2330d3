//! Wine records and reconciliation of the two source-key spellings.
//!
//! The export tool has shipped payloads with title-case keys ("Product
//! Name", "Producer", ...) and with lower-case keys; both may appear in one
//! payload. Reconciliation is first-non-empty-wins over the prioritized
//! chain, title-case first.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Wine {
    pub id: String,
    pub name: String,
    pub producer: String,
    pub region: String,
    #[serde(default)]
    pub range: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub vintage: String,
}

/// Raw wine entry as submitted, carrying both key spellings.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct WineInput {
    #[serde(default)]
    pub id: Option<String>,

    #[serde(rename = "Product Name", default)]
    product_name: Option<String>,
    #[serde(default)]
    name: Option<String>,

    #[serde(rename = "Producer", default)]
    producer_titled: Option<String>,
    #[serde(default)]
    producer: Option<String>,

    #[serde(rename = "Region", default)]
    region_titled: Option<String>,
    #[serde(default)]
    region: Option<String>,

    #[serde(rename = "Range", default)]
    range_titled: Option<String>,
    #[serde(default)]
    range: Option<String>,

    #[serde(rename = "Color", default)]
    color_titled: Option<String>,
    #[serde(default)]
    color: Option<String>,

    #[serde(rename = "Vintage", default)]
    vintage_titled: Option<String>,
    #[serde(default)]
    vintage: Option<String>,
}

fn first_non_empty(candidates: [Option<String>; 2]) -> String {
    candidates
        .into_iter()
        .flatten()
        .find(|value| !value.is_empty())
        .unwrap_or_default()
}

impl WineInput {
    /// Collapses both spellings into a Wine, generating an id when absent.
    pub fn reconcile(self, fallback_id: impl FnOnce() -> String) -> Wine {
        let id = self
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(fallback_id);
        Wine {
            id,
            name: first_non_empty([self.product_name, self.name]),
            producer: first_non_empty([self.producer_titled, self.producer]),
            region: first_non_empty([self.region_titled, self.region]),
            range: first_non_empty([self.range_titled, self.range]),
            color: first_non_empty([self.color_titled, self.color]),
            vintage: first_non_empty([self.vintage_titled, self.vintage]),
        }
    }
}
