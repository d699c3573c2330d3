//! Read/write helpers for the store's property-object wire shape.
//!
//! Every property value is a one-key object tagged by type, e.g.
//! `{"rich_text": [{"text": {"content": "..."}, "plain_text": "..."}]}`.
//! Readers tolerate both the `plain_text` form the store returns and the
//! `text.content` form we write, since test doubles echo writes back.

use crate::store::Properties;
use serde_json::{Value, json};

pub fn title(content: &str) -> Value {
    json!({ "title": [{ "text": { "content": content } }] })
}

pub fn rich_text(content: &str) -> Value {
    json!({ "rich_text": [{ "text": { "content": content } }] })
}

pub fn number(value: f64) -> Value {
    json!({ "number": value })
}

pub fn select(name: &str) -> Value {
    json!({ "select": { "name": name } })
}

pub fn email(address: &str) -> Value {
    json!({ "email": address })
}

pub fn phone(number: &str) -> Value {
    json!({ "phone_number": number })
}

pub fn date(start: &str) -> Value {
    json!({ "date": { "start": start } })
}

fn fragments_text(fragments: &Value) -> Option<String> {
    let joined: String = fragments
        .as_array()?
        .iter()
        .filter_map(|fragment| {
            fragment
                .get("plain_text")
                .and_then(Value::as_str)
                .or_else(|| {
                    fragment
                        .get("text")
                        .and_then(|t| t.get("content"))
                        .and_then(Value::as_str)
                })
        })
        .collect();
    Some(joined)
}

/// Extracts the text of a title or rich-text property, None if absent/empty.
pub fn read_text(properties: &Properties, name: &str) -> Option<String> {
    let value = properties.get(name)?;
    let fragments = value.get("title").or_else(|| value.get("rich_text"))?;
    fragments_text(fragments).filter(|s| !s.is_empty())
}

pub fn read_number(properties: &Properties, name: &str) -> Option<f64> {
    properties.get(name)?.get("number")?.as_f64()
}

pub fn read_select(properties: &Properties, name: &str) -> Option<String> {
    let name = properties.get(name)?.get("select")?.get("name")?.as_str()?;
    Some(name.to_string())
}

pub fn read_email(properties: &Properties, name: &str) -> Option<String> {
    let address = properties.get(name)?.get("email")?.as_str()?;
    Some(address.to_string())
}

pub fn read_phone(properties: &Properties, name: &str) -> Option<String> {
    let number = properties.get(name)?.get("phone_number")?.as_str()?;
    Some(number.to_string())
}

pub fn read_date(properties: &Properties, name: &str) -> Option<String> {
    let start = properties.get(name)?.get("date")?.get("start")?.as_str()?;
    Some(start.to_string())
}

/// Ids of a relation property, empty when absent.
pub fn read_relation_ids(properties: &Properties, name: &str) -> Vec<String> {
    properties
        .get(name)
        .and_then(|value| value.get("relation"))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.get("id").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// First non-empty text among several candidate property spellings.
pub fn read_text_any(properties: &Properties, names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| read_text(properties, name))
}
