use crate::entity_type::EntityType;
use crate::schema::Schema;
use crate::{ModelError, ModelResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;
use wowdata_types::{ParamGroup, Value, unix_now};

/// A schema-bound data container for one entity.
///
/// Values only enter through [`Record::set`] and [`Record::add`], so every
/// stored value has passed its field's verify steps and been cleaned.
/// Equality compares entity type and data and ignores timestamps.
#[derive(Debug, Clone)]
pub struct Record {
    entity: EntityType,
    schema: Arc<Schema>,
    data: BTreeMap<String, Value>,
    created_at: i64,
    feedback: Vec<String>,
}

/// Serialized form of a record.
#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    entity: EntityType,
    created_at: i64,
    data: BTreeMap<String, Value>,
}

impl Record {
    /// Creates an empty record of the given entity type.
    pub fn new(entity: EntityType) -> Self {
        Self::with_schema(entity, entity.schema())
    }

    /// Creates an empty record bound to an explicit schema.
    pub fn with_schema(entity: EntityType, schema: Arc<Schema>) -> Self {
        Self {
            entity,
            schema,
            data: BTreeMap::new(),
            created_at: unix_now(),
            feedback: Vec::new(),
        }
    }

    /// Creates a record and routes every input pair through [`Record::set`].
    /// Keys that fail validation are simply absent.
    pub fn from_values<K, V>(entity: EntityType, input: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<Value>,
    {
        let mut record = Self::new(entity);
        for (key, value) in input {
            record.set(key.as_ref(), value);
        }
        record
    }

    pub fn entity(&self) -> EntityType {
        self.entity
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Validates, cleans and stores `value`. Returns false when the value was
    /// rejected; the previous value (if any) is kept.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> bool {
        let outcome = self.schema.validate(field, value.into());
        self.publish(field, &outcome.feedback);
        match outcome.value {
            Some(v) => {
                self.data.insert(field.to_string(), v);
                true
            }
            None => false,
        }
    }

    /// Appends one or more elements to a `collect` field.
    pub fn add(&mut self, field: &str, value: impl Into<Value>) -> bool {
        let collects = self.schema.get(field).is_some_and(|meta| meta.collect);
        if !collects {
            let message = format!("Adding to \"{field}\" is not possible, it's not defined as a collection.");
            self.publish(field, std::slice::from_ref(&message));
            return false;
        }

        let outcome = self.schema.validate(field, value.into());
        self.publish(field, &outcome.feedback);
        let Some(Value::List(mut elements)) = outcome.value else {
            return false;
        };

        let slot = self.data.entry(field.to_string()).or_insert_with(|| Value::List(Vec::new()));
        if !matches!(slot, Value::List(_)) {
            *slot = Value::List(vec![std::mem::take(slot)]);
        }
        if let Value::List(existing) = slot {
            existing.append(&mut elements);
        }
        true
    }

    /// Stored value of one field, `None` when unset or undeclared.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.data.get(field)
    }

    /// Relabels stored values: every `(alias, field)` pair yields
    /// `alias → value of field` (null when unset).
    pub fn get_aliased(&self, aliases: &[(&str, &str)]) -> BTreeMap<String, Value> {
        aliases
            .iter()
            .map(|(alias, field)| {
                let value = self.data.get(*field).cloned().unwrap_or_default();
                (alias.to_string(), value)
            })
            .collect()
    }

    /// The entire data mapping.
    pub fn data(&self) -> &BTreeMap<String, Value> {
        &self.data
    }

    /// True iff every required field is present.
    pub fn is_valid(&self) -> bool {
        self.schema.required_fields().all(|f| self.data.contains_key(f))
    }

    /// True iff the group names a value for every bound query parameter and
    /// each of those values equals the stored one. Groups that supply only
    /// part of the identity never match.
    pub fn match_params(&self, params: &ParamGroup) -> bool {
        let bindings = self.schema.param_bindings();
        let matched = params
            .iter()
            .filter(|(param, expected)| {
                bindings
                    .get(param.as_str())
                    .and_then(|field| self.data.get(*field))
                    .is_some_and(|stored| stored.loose_eq(expected))
            })
            .count();
        matched == bindings.len()
    }

    /// The parameter group this record answers to.
    pub fn identity(&self) -> ParamGroup {
        self.schema
            .param_bindings()
            .into_iter()
            .filter_map(|(param, field)| {
                self.data
                    .get(field)
                    .map(|v| (param.to_string(), v.clone()))
            })
            .collect()
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn set_created_at(&mut self, timestamp: i64) {
        self.created_at = timestamp;
    }

    /// Feedback published by rejected values, oldest first.
    pub fn feedback(&self) -> &[String] {
        &self.feedback
    }

    /// Serializes the record to a self-describing JSON blob.
    pub fn to_blob(&self) -> ModelResult<Vec<u8>> {
        let stored = StoredRecord {
            entity: self.entity,
            created_at: self.created_at,
            data: self.data.clone(),
        };
        Ok(serde_json::to_vec(&stored)?)
    }

    /// Rebuilds a record from a blob. Every field is re-validated.
    pub fn from_blob(blob: &[u8]) -> ModelResult<Self> {
        let stored: StoredRecord = serde_json::from_slice(blob)?;
        let mut record = Self::from_values(stored.entity, stored.data);
        record.created_at = stored.created_at;
        Ok(record)
    }

    /// Like [`Record::from_blob`], but fails unless the blob holds `expected`.
    pub fn from_blob_of(expected: EntityType, blob: &[u8]) -> ModelResult<Self> {
        let record = Self::from_blob(blob)?;
        if record.entity != expected {
            return Err(ModelError::EntityMismatch {
                expected,
                found: record.entity,
            });
        }
        Ok(record)
    }

    fn publish(&mut self, field: &str, feedback: &[String]) {
        for message in feedback {
            debug!(entity = %self.entity, field, "{message}");
        }
        self.feedback.extend_from_slice(feedback);
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.entity == other.entity && self.data == other.data
    }
}
