//! `{name}` placeholder templates shared by path- and URL-addressed tiers.

use regex_lite::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

use crate::error::{ChannelError, ChannelResult};
use wowdata_types::Value;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z0-9_]+)\}").expect("placeholder pattern is valid"));

/// Placeholder names in order of appearance.
pub fn placeholders(template: &str) -> Vec<&str> {
    PLACEHOLDER
        .captures_iter(template)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}

/// Replaces every placeholder with its value. A placeholder without a value
/// is a [`ChannelError::MissingParam`].
pub fn fill(template: &str, values: &BTreeMap<String, String>) -> ChannelResult<String> {
    if let Some(missing) = placeholders(template)
        .into_iter()
        .find(|name| !values.contains_key(*name))
    {
        return Err(ChannelError::MissingParam(missing.to_string()));
    }
    Ok(PLACEHOLDER
        .replace_all(template, |caps: &regex_lite::Captures<'_>| {
            values.get(&caps[1]).cloned().unwrap_or_default()
        })
        .into_owned())
}

/// Shapes a query parameter for use in a path or URL.
///
/// Locales shrink to their lowercase language part, realms to a dashed
/// lowercase slug, ids to integers and lists to comma-joined text.
pub fn prepare(name: &str, value: &Value) -> String {
    match (name, value) {
        (_, Value::List(items)) => items
            .iter()
            .map(|item| prepare(name, item))
            .collect::<Vec<_>>()
            .join(","),
        ("locale", _) => value
            .to_text()
            .trim()
            .to_lowercase()
            .chars()
            .take(2)
            .collect(),
        ("region" | "character" | "icon", _) => value.to_text().trim().to_lowercase(),
        ("realm", _) => value
            .to_text()
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphabetic() || *c == ' ' || *c == '-')
            .map(|c| if c == ' ' { '-' } else { c })
            .collect(),
        ("slotid" | "itemid", _) => value.to_int().to_string(),
        _ => value.to_text(),
    }
}
