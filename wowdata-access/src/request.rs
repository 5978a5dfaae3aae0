use crate::error::{AccessError, AccessResult};
use wowdata_model::Record;
use wowdata_types::{ParamGroup, Value};

/// A lookup of one parameter group or of a batch of them.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupRequest {
    Single(ParamGroup),
    Batch(Vec<ParamGroup>),
}

impl LookupRequest {
    /// Classifies a loosely-typed request: a collection is a batch of
    /// mappings, a mapping is a single group. An empty list is an empty batch.
    pub fn from_value(value: Value) -> AccessResult<Self> {
        if matches!(&value, Value::List(items) if items.is_empty()) {
            return Ok(LookupRequest::Batch(Vec::new()));
        }
        if value.is_collection() {
            let groups = value
                .into_elements()
                .into_iter()
                .enumerate()
                .map(|(index, element)| match element {
                    Value::Map(group) => Ok(group),
                    other => Err(AccessError::InvalidRequest(format!(
                        "batch element {index} is not a parameter mapping: {other}"
                    ))),
                })
                .collect::<AccessResult<Vec<_>>>()?;
            return Ok(LookupRequest::Batch(groups));
        }
        match value {
            Value::Map(group) => Ok(LookupRequest::Single(group)),
            Value::Null => Ok(LookupRequest::Single(ParamGroup::new())),
            other => Err(AccessError::InvalidRequest(format!(
                "expected a parameter mapping, got {other}"
            ))),
        }
    }

    pub fn groups(&self) -> &[ParamGroup] {
        match self {
            LookupRequest::Single(group) => std::slice::from_ref(group),
            LookupRequest::Batch(groups) => groups,
        }
    }
}

impl From<ParamGroup> for LookupRequest {
    fn from(group: ParamGroup) -> Self {
        LookupRequest::Single(group)
    }
}

impl From<Vec<ParamGroup>> for LookupRequest {
    fn from(groups: Vec<ParamGroup>) -> Self {
        LookupRequest::Batch(groups)
    }
}

/// Result of [`crate::DataAccess::open`], shaped like its request.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupResult {
    Single(Option<Record>),
    /// One slot per requested group, in request order.
    Batch(Vec<Option<Record>>),
}

impl LookupResult {
    /// Found records, ignoring misses.
    pub fn found(&self) -> Vec<&Record> {
        match self {
            LookupResult::Single(slot) => slot.iter().collect(),
            LookupResult::Batch(slots) => slots.iter().flatten().collect(),
        }
    }
}
