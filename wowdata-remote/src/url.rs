use crate::error::{RemoteError, RemoteResult};
use crate::options::{REGION_ORDER, RemoteScheme, UrlParam};
use std::collections::BTreeMap;
use wowdata_channel::template::{fill, prepare};
use wowdata_types::{ParamGroup, Value};

/// Base path for the group's region, falling back to the first configured
/// region in [`REGION_ORDER`].
pub fn region_base<'a>(paths: &'a BTreeMap<String, String>, params: &ParamGroup) -> Option<&'a str> {
    params
        .get("region")
        .and_then(|region| paths.get(&prepare("region", region)))
        .or_else(|| REGION_ORDER.iter().find_map(|region| paths.get(*region)))
        .or_else(|| paths.values().next())
        .map(String::as_str)
}

/// Builds the request URL of one parameter group.
///
/// Mandatory parameters fill `{name}` placeholders and must be present;
/// optional ones are appended as a query string.
pub fn build_url(
    base_paths: &BTreeMap<String, String>,
    scheme: &RemoteScheme,
    params: &ParamGroup,
) -> RemoteResult<String> {
    let template = match region_base(&scheme.base_path, params) {
        Some(full) => full.to_string(),
        None => {
            let base = region_base(base_paths, params)
                .ok_or_else(|| RemoteError::Url("no base path configured".into()))?;
            format!("{base}{}", scheme.ext_path)
        }
    };

    let mut values = BTreeMap::new();
    let mut query = Vec::new();
    for (name, param) in &scheme.params {
        let given = params.get(name).filter(|v| !v.is_empty());
        if !param.optional {
            let value = given.ok_or_else(|| {
                RemoteError::Url(format!("mandatory parameter {name:?} is missing"))
            })?;
            values.insert(name.clone(), prepare(name, value));
            continue;
        }
        let value = match given {
            Some(value) => value.clone(),
            None if !param.default.is_empty() => Value::List(
                param
                    .default
                    .iter()
                    .map(|v| Value::from(v.as_str()))
                    .collect(),
            ),
            None => continue,
        };
        query.extend(query_pairs(name, param, value));
    }

    let mut url = fill(&template, &values).map_err(|e| RemoteError::Url(e.to_string()))?;
    if !query.is_empty() {
        url.push(if url.contains('?') { '&' } else { '?' });
        url.push_str(&query.join("&"));
    }
    Ok(url)
}

fn query_pairs(name: &str, param: &UrlParam, value: Value) -> Vec<String> {
    let Value::List(items) = value else {
        return vec![format!("{name}={}", prepare(name, &value))];
    };
    let items: Vec<String> = items
        .iter()
        .map(|item| prepare(name, item))
        .filter(|item| param.valid.is_empty() || param.valid.contains(item))
        .collect();
    if items.is_empty() {
        return Vec::new();
    }
    match &param.concat {
        Some(separator) => vec![format!("{name}={}", items.join(separator))],
        None => items.iter().map(|item| format!("{name}={item}")).collect(),
    }
}
