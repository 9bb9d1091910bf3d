//! Desired state for one reconciliation call.

use std::collections::BTreeMap;

use crate::{ConfigSettings, FieldDefault, FieldValue, RecordFamilySchema, SchemaError};

/// Immutable desired record: key fields (always present, never null) plus the
/// attribute fields the caller has an opinion about.
///
/// An attribute missing from the descriptor means "no opinion" and is left out
/// of every predicate and write. [`FieldValue::Null`] means "force NULL".
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordDescriptor {
    schema: &'static RecordFamilySchema,
    keys: BTreeMap<&'static str, FieldValue>,
    attributes: BTreeMap<&'static str, FieldValue>,
}

impl RecordDescriptor {
    pub fn builder(schema: &'static RecordFamilySchema) -> DescriptorBuilder {
        DescriptorBuilder {
            schema,
            fields: Vec::new(),
        }
    }

    pub fn schema(&self) -> &'static RecordFamilySchema {
        self.schema
    }

    pub fn key(&self, name: &str) -> Option<&FieldValue> {
        self.keys.get(name)
    }

    /// `None` when the caller expressed no opinion about `name`.
    pub fn attribute(&self, name: &str) -> Option<&FieldValue> {
        self.attributes.get(name)
    }

    /// Key fields in the family's declared order.
    pub fn keys_in_order(&self) -> Vec<(&'static str, &FieldValue)> {
        self.schema
            .key_fields
            .iter()
            .filter_map(|spec| self.keys.get(spec.name).map(|v| (spec.name, v)))
            .collect()
    }

    /// Present attribute fields in the family's declared order.
    pub fn present_attributes(&self) -> Vec<(&'static str, &FieldValue)> {
        self.schema
            .attribute_fields
            .iter()
            .filter_map(|spec| self.attributes.get(spec.name).map(|v| (spec.name, v)))
            .collect()
    }

    pub fn has_attributes(&self) -> bool {
        !self.attributes.is_empty()
    }

    pub fn config_settings(&self) -> ConfigSettings {
        self.schema.config_settings(self)
    }

    /// Human label for messages: the bare value for single-key families,
    /// `name=value` pairs otherwise.
    pub fn label(&self) -> String {
        let keys = self.keys_in_order();
        if let [(_, only)] = keys.as_slice() {
            return only.to_string();
        }
        keys.iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Collects raw fields and validates them against the schema in [`build`](Self::build).
#[derive(Clone, Debug)]
pub struct DescriptorBuilder {
    schema: &'static RecordFamilySchema,
    fields: Vec<(String, FieldValue)>,
}

impl DescriptorBuilder {
    pub fn field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Adds the field only when `value` is `Some`; `None` keeps it absent.
    pub fn field_opt<V: Into<FieldValue>>(self, name: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(v) => self.field(name, v),
            None => self,
        }
    }

    pub fn build(self) -> Result<RecordDescriptor, SchemaError> {
        let schema = self.schema;
        let mut keys = BTreeMap::new();
        let mut attributes = BTreeMap::new();

        // Last write wins for repeated names.
        for (name, value) in self.fields {
            let spec = schema.field(&name).ok_or_else(|| SchemaError::UnknownField {
                family: schema.name,
                field: name.clone(),
            })?;

            match value.kind() {
                Some(kind) if kind != spec.kind => {
                    return Err(SchemaError::KindMismatch {
                        field: spec.name,
                        expected: spec.kind,
                    });
                }
                None if schema.is_key(spec.name) => {
                    return Err(SchemaError::NullKey {
                        family: schema.name,
                        field: spec.name,
                    });
                }
                None if !spec.nullable => {
                    return Err(SchemaError::NotNullable { field: spec.name });
                }
                _ => {}
            }

            if schema.is_key(spec.name) {
                keys.insert(spec.name, value);
            } else {
                attributes.insert(spec.name, value);
            }
        }

        for spec in schema.key_fields {
            if keys.contains_key(spec.name) {
                continue;
            }
            let default = match spec.default {
                FieldDefault::Required => {
                    return Err(SchemaError::MissingKey {
                        family: schema.name,
                        field: spec.name,
                    })
                }
                FieldDefault::Bool(b) => FieldValue::Bool(b),
                FieldDefault::Int(n) => FieldValue::Int(n),
            };
            keys.insert(spec.name, default);
        }

        for check in schema.range_checks {
            let value = keys
                .get(check.field)
                .or_else(|| attributes.get(check.field))
                .and_then(FieldValue::as_int);
            if let Some(v) = value {
                if v < check.min || v > check.max {
                    return Err(SchemaError::OutOfRange {
                        field: check.field,
                        value: v,
                        min: check.min,
                        max: check.max,
                    });
                }
            }
        }

        Ok(RecordDescriptor {
            schema,
            keys,
            attributes,
        })
    }
}
