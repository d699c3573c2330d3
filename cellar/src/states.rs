//! State/territory lookup for the shipping form.
//!
//! The external table has two text columns whose roles drifted across
//! edits, so rows are disambiguated heuristically: a short, all-uppercase
//! value is the abbreviation. Rows the heuristic cannot resolve are logged
//! as schema drift and skipped. A hardcoded 50-state table backs the
//! endpoint when the external table is unconfigured or unreachable.

use crate::store::{DocumentStore, Query, StoreError, props};
use serde::Serialize;

const STATES_PAGE_SIZE: u32 = 100;
const MAX_STATE_PAGES: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Country {
    UnitedStates,
    Canada,
    Other,
}

#[derive(Clone, Debug, Serialize)]
pub struct StateEntry {
    pub name: String,
    pub abbrev: String,
    #[serde(skip)]
    pub country: Country,
}

impl StateEntry {
    fn new(name: &str, abbrev: &str) -> Self {
        StateEntry {
            name: name.to_string(),
            abbrev: abbrev.to_string(),
            country: infer_country(name, abbrev),
        }
    }
}

const CANADIAN_ABBREVS: &[&str] = &[
    "AB", "BC", "MB", "NB", "NL", "NS", "NT", "NU", "ON", "PE", "QC", "SK", "YT",
];

const CANADIAN_NAME_PREFIXES: &[&str] = &[
    "Alberta",
    "British Columbia",
    "Manitoba",
    "New Brunswick",
    "Newfoundland",
    "Northwest Territories",
    "Nova Scotia",
    "Nunavut",
    "Ontario",
    "Prince Edward",
    "Quebec",
    "Saskatchewan",
    "Yukon",
];

fn infer_country(name: &str, abbrev: &str) -> Country {
    if CANADIAN_ABBREVS.contains(&abbrev)
        || CANADIAN_NAME_PREFIXES
            .iter()
            .any(|prefix| name.starts_with(prefix))
    {
        Country::Canada
    } else {
        Country::UnitedStates
    }
}

/// Short, all-uppercase alphabetic values are abbreviations.
fn looks_like_abbrev(value: &str) -> bool {
    !value.is_empty()
        && value.chars().count() <= 3
        && value.chars().all(|c| c.is_ascii_uppercase())
}

fn is_sentinel(name: &str) -> bool {
    name.is_empty() || name.eq_ignore_ascii_case("n/a") || name.eq_ignore_ascii_case("other")
}

/// Assigns the two text columns of a row to (name, abbreviation). None when
/// the heuristic cannot tell them apart, which is upstream schema drift.
fn classify_row(values: &[String]) -> Option<(String, String)> {
    let non_empty: Vec<&String> = values.iter().filter(|v| !v.is_empty()).collect();
    if non_empty.len() != 2 {
        return None;
    }
    match (
        looks_like_abbrev(non_empty[0]),
        looks_like_abbrev(non_empty[1]),
    ) {
        (true, false) => Some((non_empty[1].clone(), non_empty[0].clone())),
        (false, true) => Some((non_empty[0].clone(), non_empty[1].clone())),
        // Both or neither look like abbreviations
        _ => None,
    }
}

fn synthetic_other() -> StateEntry {
    StateEntry {
        name: "Other".to_string(),
        abbrev: "Other".to_string(),
        country: Country::Other,
    }
}

/// Loads the state table from the store, sorted alphabetically with the
/// synthetic "Other" entry appended.
pub async fn load_states(
    store: &dyn DocumentStore,
    database_id: &str,
) -> Result<Vec<StateEntry>, StoreError> {
    let mut entries = Vec::new();
    let mut cursor: Option<String> = None;

    for _ in 0..MAX_STATE_PAGES {
        let query = Query {
            start_cursor: cursor.take(),
            page_size: Some(STATES_PAGE_SIZE),
            ..Query::default()
        };
        let page = store.query(database_id, query).await?;

        for row in page.results {
            let values: Vec<String> = row
                .properties
                .keys()
                .filter_map(|name| props::read_text(&row.properties, name))
                .collect();

            match classify_row(&values) {
                Some((name, abbrev)) if !is_sentinel(&name) => {
                    entries.push(StateEntry::new(&name, &abbrev));
                }
                Some(_) => {}
                None => {
                    tracing::warn!(page_id = %row.id, ?values, "Ambiguous state row, skipping");
                }
            }
        }

        if !page.has_more {
            break;
        }
        cursor = page.next_cursor;
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    entries.push(synthetic_other());
    Ok(entries)
}

/// The 50 US states, served when the external table is unavailable.
pub fn fallback_states() -> Vec<StateEntry> {
    const TABLE: &[(&str, &str)] = &[
        ("Alabama", "AL"),
        ("Alaska", "AK"),
        ("Arizona", "AZ"),
        ("Arkansas", "AR"),
        ("California", "CA"),
        ("Colorado", "CO"),
        ("Connecticut", "CT"),
        ("Delaware", "DE"),
        ("Florida", "FL"),
        ("Georgia", "GA"),
        ("Hawaii", "HI"),
        ("Idaho", "ID"),
        ("Illinois", "IL"),
        ("Indiana", "IN"),
        ("Iowa", "IA"),
        ("Kansas", "KS"),
        ("Kentucky", "KY"),
        ("Louisiana", "LA"),
        ("Maine", "ME"),
        ("Maryland", "MD"),
        ("Massachusetts", "MA"),
        ("Michigan", "MI"),
        ("Minnesota", "MN"),
        ("Mississippi", "MS"),
        ("Missouri", "MO"),
        ("Montana", "MT"),
        ("Nebraska", "NE"),
        ("Nevada", "NV"),
        ("New Hampshire", "NH"),
        ("New Jersey", "NJ"),
        ("New Mexico", "NM"),
        ("New York", "NY"),
        ("North Carolina", "NC"),
        ("North Dakota", "ND"),
        ("Ohio", "OH"),
        ("Oklahoma", "OK"),
        ("Oregon", "OR"),
        ("Pennsylvania", "PA"),
        ("Rhode Island", "RI"),
        ("South Carolina", "SC"),
        ("South Dakota", "SD"),
        ("Tennessee", "TN"),
        ("Texas", "TX"),
        ("Utah", "UT"),
        ("Vermont", "VT"),
        ("Virginia", "VA"),
        ("Washington", "WA"),
        ("West Virginia", "WV"),
        ("Wisconsin", "WI"),
        ("Wyoming", "WY"),
    ];

    let mut entries: Vec<StateEntry> = TABLE
        .iter()
        .map(|(name, abbrev)| StateEntry::new(name, abbrev))
        .collect();
    entries.push(synthetic_other());
    entries
}
