//! Lookup parameter normalization.

use crate::config::Defaults;
use wowdata_types::{ParamGroup, Value};

pub const LOCALES: [&str; 10] = [
    "en_US", "es_MX", "de_DE", "en_GB", "es_ES", "fr_FR", "ru_RU", "ko_KR", "zh_TW", "zh_CN",
];

pub const REGIONS: [&str; 5] = ["us", "eu", "kr", "tw", "cn"];

/// Slug used for a realm name that has no usable characters.
pub const EMPTY_REALM_SLUG: &str = "n-a";

/// Declared type of a lookup parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Int,
    Str,
    StrList,
}

/// One recognized lookup parameter.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    /// Value is pre-shaped after coercion.
    pub prepare: Option<fn(&str) -> String>,
}

pub const PARAMS: [ParamSpec; 10] = [
    ParamSpec { name: "locale", kind: ParamKind::Str, prepare: None },
    ParamSpec { name: "region", kind: ParamKind::Str, prepare: None },
    ParamSpec { name: "realm", kind: ParamKind::Str, prepare: Some(slugify_realm) },
    ParamSpec { name: "guild", kind: ParamKind::Str, prepare: None },
    ParamSpec { name: "character", kind: ParamKind::Str, prepare: None },
    ParamSpec { name: "slotid", kind: ParamKind::Int, prepare: None },
    ParamSpec { name: "itemid", kind: ParamKind::Int, prepare: None },
    ParamSpec { name: "icon", kind: ParamKind::Str, prepare: None },
    ParamSpec { name: "filename", kind: ParamKind::Str, prepare: None },
    ParamSpec { name: "fields", kind: ParamKind::StrList, prepare: None },
];

impl ParamSpec {
    fn coerce(&self, value: &Value) -> Value {
        let shaped = match self.kind {
            ParamKind::Int => Value::Int(value.to_int()),
            ParamKind::Str => Value::Str(value.to_text()),
            ParamKind::StrList => Value::List(
                value
                    .clone()
                    .into_elements()
                    .iter()
                    .map(|v| Value::Str(v.to_text()))
                    .collect(),
            ),
        };
        match (self.prepare, &shaped) {
            (Some(prepare), Value::Str(text)) => Value::Str(prepare(text)),
            _ => shaped,
        }
    }
}

/// The defaults as a parameter group, pre-shaped like caller input.
pub fn default_group(defaults: &Defaults) -> ParamGroup {
    let raw: ParamGroup = [
        ("locale".to_string(), Value::from(defaults.locale.as_str())),
        ("region".to_string(), Value::from(defaults.region.as_str())),
        ("realm".to_string(), Value::from(defaults.realm.as_str())),
    ]
    .into_iter()
    .collect();
    shape(&ParamGroup::new(), &raw)
}

/// Merges `input` over `defaults` and shapes the result: unrecognized
/// parameters are dropped, empty values count as absent, recognized values
/// are coerced to their declared kind and pre-shaped.
pub fn normalize(input: &ParamGroup, defaults: &ParamGroup) -> ParamGroup {
    shape(defaults, input)
}

fn shape(base: &ParamGroup, input: &ParamGroup) -> ParamGroup {
    let mut group = base.clone();
    for spec in &PARAMS {
        if let Some(value) = input.get(spec.name).filter(|v| !v.is_empty()) {
            group.insert(spec.name.to_string(), spec.coerce(value));
        }
    }
    group
}

/// Turns a realm name into its URL/file slug: quotes and dashes are
/// removed, runs of anything but letters and digits become one dash, edge
/// dashes are trimmed, ASCII letters are lowercased and every remaining
/// non-ASCII-word character except `-` is dropped.
pub fn slugify_realm(name: &str) -> String {
    let unquoted: String = name
        .chars()
        .filter(|c| !matches!(c, '\'' | '"' | '-'))
        .collect();

    let mut dashed = String::with_capacity(unquoted.len());
    let mut in_gap = false;
    for c in unquoted.chars() {
        if c.is_alphabetic() || c.is_numeric() {
            dashed.push(c);
            in_gap = false;
        } else if !in_gap {
            dashed.push('-');
            in_gap = true;
        }
    }

    let slug: String = dashed
        .trim_matches('-')
        .to_ascii_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect();

    if slug.is_empty() {
        EMPTY_REALM_SLUG.to_string()
    } else {
        slug
    }
}
