//! Object schemas and the [`pipeline::Schema`] implementation.

use async_trait::async_trait;
use pipeline::{Schema, Violation};
use serde_json::{Map, Value};
use tracing::debug;

use crate::field::{Field, Path};

/// Ordered set of named fields describing a JSON object.
///
/// Keys not declared are rejected unless [`allow_unknown`](Self::allow_unknown)
/// is set.
#[derive(Debug, Clone, Default)]
pub struct ObjectSchema {
    fields: Vec<(String, Field)>,
    allow_unknown: bool,
}

impl ObjectSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a member. Violations are reported in declaration order.
    pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
        let name = name.into();
        self.fields.retain(|(existing, _)| *existing != name);
        self.fields.push((name, field));
        self
    }

    /// Accept keys that are not declared.
    pub fn allow_unknown(mut self, allow: bool) -> Self {
        self.allow_unknown = allow;
        self
    }

    /// Looks up a declared member.
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, f)| f)
    }

    /// Validates `value`, collecting every violation.
    pub fn check(&self, value: &Value) -> Vec<Violation> {
        let mut out = Vec::new();
        let root = Path::default();
        match value {
            Value::Object(map) => self.check_members(map, &root, &mut out),
            _ => out.push(root.violation("must be of type object")),
        }
        out
    }

    pub(crate) fn check_members(
        &self,
        map: &Map<String, Value>,
        path: &Path,
        out: &mut Vec<Violation>,
    ) {
        for (name, field) in &self.fields {
            let member = path.key(name);
            match map.get(name) {
                Some(value) => field.check(value, &member, out),
                None if field.is_required() => out.push(member.violation("is required")),
                None => {}
            }
        }

        if !self.allow_unknown {
            for key in map.keys() {
                if self.get(key).is_none() {
                    out.push(path.key(key).violation("is not allowed"));
                }
            }
        }
    }
}

#[async_trait]
impl Schema for ObjectSchema {
    async fn validate(&self, body: &Value) -> Result<(), Vec<Violation>> {
        let violations = self.check(body);
        if violations.is_empty() {
            Ok(())
        } else {
            debug!(count = violations.len(), "schema violations found");
            Err(violations)
        }
    }
}
