use crate::steps::{CleanStep, VerifyStep};
use std::collections::BTreeMap;
use wowdata_types::Value;

/// Metadata for one field of an entity schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMeta {
    pub required: bool,
    /// The field holds an ordered list of elements.
    pub collect: bool,
    /// Nested field table; values must be mappings validated against it.
    pub subset: Option<Schema>,
    pub verify: Vec<VerifyStep>,
    pub clean: Vec<CleanStep>,
    /// Query parameter this field answers to in lookups.
    pub query_param: Option<String>,
}

impl FieldMeta {
    pub fn required() -> Self {
        Self {
            required: true,
            ..Self::default()
        }
    }

    pub fn optional() -> Self {
        Self::default()
    }

    pub fn collect(mut self) -> Self {
        self.collect = true;
        self
    }

    pub fn subset(mut self, schema: Schema) -> Self {
        self.subset = Some(schema);
        self
    }

    pub fn verify(mut self, step: VerifyStep) -> Self {
        self.verify.push(step);
        self
    }

    pub fn clean(mut self, step: CleanStep) -> Self {
        self.clean.push(step);
        self
    }

    pub fn param(mut self, name: &str) -> Self {
        self.query_param = Some(name.to_string());
        self
    }

    fn nested(&self) -> Option<&Schema> {
        self.subset.as_ref().filter(|s| !s.is_empty())
    }
}

/// Result of validating one field value.
///
/// `value` is the cleaned value to store, or `None` when the field was
/// rejected. `feedback` carries every failed step's message, including those
/// of collection elements that were dropped while the rest was kept.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldOutcome {
    pub value: Option<Value>,
    pub feedback: Vec<String>,
}

impl FieldOutcome {
    fn accepted(value: Value, feedback: Vec<String>) -> Self {
        Self {
            value: Some(value),
            feedback,
        }
    }

    fn rejected(feedback: Vec<String>) -> Self {
        Self {
            value: None,
            feedback,
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.value.is_some()
    }
}

/// Field table of an entity type. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    fields: BTreeMap<String, FieldMeta>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a field.
    pub fn field(mut self, name: &str, meta: FieldMeta) -> Self {
        self.fields.insert(name.to_string(), meta);
        self
    }

    /// Composes a schema from a base field table and overrides; overrides
    /// replace base fields of the same name.
    pub fn merge(base: &Schema, overrides: Schema) -> Schema {
        let mut fields = base.fields.clone();
        fields.extend(overrides.fields);
        Schema { fields }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&FieldMeta> {
        self.fields.get(field)
    }

    pub fn declares(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldMeta)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|(_, meta)| meta.required)
            .map(|(k, _)| k.as_str())
    }

    /// Query parameter name → field name, for every bound field.
    pub fn param_bindings(&self) -> BTreeMap<&str, &str> {
        self.fields
            .iter()
            .filter_map(|(field, meta)| meta.query_param.as_deref().map(|p| (p, field.as_str())))
            .collect()
    }

    /// Names among `fields` that this schema does not declare.
    pub fn undeclared<'a>(&self, fields: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
        fields.into_iter().filter(|f| !self.declares(f)).collect()
    }

    /// Required fields that are absent from `fields`.
    pub fn missing_required<'a>(&self, fields: impl IntoIterator<Item = &'a str>) -> Vec<&str> {
        let present: Vec<&str> = fields.into_iter().collect();
        self.required_fields()
            .filter(|f| !present.contains(f))
            .collect()
    }

    /// Verifies and cleans `value` for `field`.
    ///
    /// A collection given to a `collect` field is checked element-wise:
    /// failing elements are dropped, and the field is rejected only when no
    /// element survives. A bare value given to a `collect` field is stored
    /// as a one-element list. A collection given to any other field is
    /// rejected.
    pub fn validate(&self, field: &str, value: Value) -> FieldOutcome {
        let Some(meta) = self.fields.get(field) else {
            return FieldOutcome::rejected(vec![format!("Field \"{field}\" is not defined.")]);
        };

        if value.is_collection() {
            if !meta.collect {
                return FieldOutcome::rejected(vec![format!(
                    "Value of \"{field}\" must not be a collection."
                )]);
            }
            let mut kept = Vec::new();
            let mut feedback = Vec::new();
            for element in value.into_elements() {
                match validate_single(field, meta, element) {
                    Ok(v) => kept.push(v),
                    Err(mut msgs) => feedback.append(&mut msgs),
                }
            }
            if kept.is_empty() {
                return FieldOutcome::rejected(feedback);
            }
            return FieldOutcome::accepted(Value::List(kept), feedback);
        }

        match validate_single(field, meta, value) {
            Ok(v) if meta.collect => FieldOutcome::accepted(Value::List(vec![v]), Vec::new()),
            Ok(v) => FieldOutcome::accepted(v, Vec::new()),
            Err(feedback) => FieldOutcome::rejected(feedback),
        }
    }
}

fn validate_single(field: &str, meta: &FieldMeta, value: Value) -> Result<Value, Vec<String>> {
    if let Some(subset) = meta.nested() {
        let Value::Map(entries) = value else {
            return Err(vec![format!("Value of \"{field}\" must be a mapping.")]);
        };
        let mut cleaned = BTreeMap::new();
        let mut feedback = Vec::new();
        let mut rejected = false;
        for (key, sub_value) in entries {
            let outcome = subset.validate(&key, sub_value);
            feedback.extend(outcome.feedback);
            match outcome.value {
                Some(v) => {
                    cleaned.insert(key, v);
                }
                None => rejected = true,
            }
        }
        return if rejected { Err(feedback) } else { Ok(Value::Map(cleaned)) };
    }

    let failures: Vec<String> = meta
        .verify
        .iter()
        .filter(|step| !step.passes(&value))
        .map(|step| step.feedback.clone())
        .collect();
    if !failures.is_empty() {
        return Err(failures);
    }

    Ok(meta.clean.iter().fold(value, |v, step| step.apply(&v)))
}
