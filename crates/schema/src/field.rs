//! Field kinds, constraints, and per-value checks.

use pipeline::Violation;
use serde_json::Value;

use crate::object::ObjectSchema;

// ---------------------------------------------------------------------------
// Path tracking
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum Segment {
    Key(String),
    Index(usize),
}

/// Location of the value currently being checked.
#[derive(Debug, Clone, Default)]
pub(crate) struct Path(Vec<Segment>);

impl Path {
    pub(crate) fn key(&self, key: &str) -> Path {
        let mut next = self.clone();
        next.0.push(Segment::Key(key.to_string()));
        next
    }

    fn index(&self, index: usize) -> Path {
        let mut next = self.clone();
        next.0.push(Segment::Index(index));
        next
    }

    /// Human label: `user.name`, `tags[1]`, `items[0].sku`; `body` at the root.
    pub(crate) fn label(&self) -> String {
        if self.0.is_empty() {
            return "body".to_string();
        }
        let mut label = String::new();
        for segment in &self.0 {
            match segment {
                Segment::Key(key) => {
                    if !label.is_empty() {
                        label.push('.');
                    }
                    label.push_str(key);
                }
                Segment::Index(i) => label.push_str(&format!("[{i}]")),
            }
        }
        label
    }

    pub(crate) fn violation(&self, message: impl AsRef<str>) -> Violation {
        let segments = self
            .0
            .iter()
            .map(|s| match s {
                Segment::Key(key) => key.clone(),
                Segment::Index(i) => i.to_string(),
            })
            .collect();
        Violation::new(segments, format!("\"{}\" {}", self.label(), message.as_ref()))
    }
}

// ---------------------------------------------------------------------------
// Field
// ---------------------------------------------------------------------------

/// Shape a field value must have.
#[derive(Debug, Clone)]
pub enum Kind {
    /// Any JSON value.
    Any,
    String,
    /// Any JSON number.
    Number,
    /// A JSON number without a fractional part.
    Integer,
    Boolean,
    Object(ObjectSchema),
    /// Every element must satisfy the item field.
    Array(Box<Field>),
}

/// One member of an [`ObjectSchema`] (or the item type of an array).
///
/// Optional and non-nullable by default.
#[derive(Debug, Clone)]
pub struct Field {
    kind: Kind,
    required: bool,
    nullable: bool,
    min_length: Option<usize>,
    max_length: Option<usize>,
    min: Option<f64>,
    max: Option<f64>,
    one_of: Vec<Value>,
}

impl Field {
    pub fn new(kind: Kind) -> Self {
        Self {
            kind,
            required: false,
            nullable: false,
            min_length: None,
            max_length: None,
            min: None,
            max: None,
            one_of: Vec::new(),
        }
    }

    pub fn any() -> Self {
        Self::new(Kind::Any)
    }

    pub fn string() -> Self {
        Self::new(Kind::String)
    }

    pub fn number() -> Self {
        Self::new(Kind::Number)
    }

    pub fn integer() -> Self {
        Self::new(Kind::Integer)
    }

    pub fn boolean() -> Self {
        Self::new(Kind::Boolean)
    }

    pub fn object(schema: ObjectSchema) -> Self {
        Self::new(Kind::Object(schema))
    }

    pub fn array(items: Field) -> Self {
        Self::new(Kind::Array(Box::new(items)))
    }

    /// The key must be present.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// `null` is accepted in place of a value.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Minimum character count (strings) or element count (arrays).
    pub fn min_length(mut self, n: usize) -> Self {
        self.min_length = Some(n);
        self
    }

    /// Maximum character count (strings) or element count (arrays).
    pub fn max_length(mut self, n: usize) -> Self {
        self.max_length = Some(n);
        self
    }

    /// Inclusive lower bound for numbers.
    pub fn min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    /// Inclusive upper bound for numbers.
    pub fn max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    /// Restricts the value to an explicit set.
    pub fn one_of<I, V>(mut self, allowed: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.one_of = allowed.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Checks a present value, appending every violation to `out`.
    pub(crate) fn check(&self, value: &Value, path: &Path, out: &mut Vec<Violation>) {
        if value.is_null() {
            if !self.nullable && !matches!(self.kind, Kind::Any) {
                out.push(path.violation(self.type_message()));
            }
            return;
        }

        match (&self.kind, value) {
            (Kind::Any, _) => {}
            (Kind::String, Value::String(s)) => self.check_length(s.chars().count(), path, out, "characters long"),
            (Kind::Number, Value::Number(n)) => self.check_range(n.as_f64(), path, out),
            (Kind::Integer, Value::Number(n)) => {
                if n.is_f64() && n.as_f64().is_some_and(|f| f.fract() != 0.0) {
                    out.push(path.violation("must be an integer"));
                    return;
                }
                self.check_range(n.as_f64(), path, out);
            }
            (Kind::Boolean, Value::Bool(_)) => {}
            (Kind::Object(schema), Value::Object(map)) => schema.check_members(map, path, out),
            (Kind::Array(items), Value::Array(elements)) => {
                self.check_length(elements.len(), path, out, "items");
                for (i, element) in elements.iter().enumerate() {
                    items.check(element, &path.index(i), out);
                }
            }
            _ => {
                out.push(path.violation(self.type_message()));
                return;
            }
        }

        if !self.one_of.is_empty() && !self.one_of.contains(value) {
            let allowed = self
                .one_of
                .iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join(", ");
            out.push(path.violation(format!("must be one of [{allowed}]")));
        }
    }

    fn type_message(&self) -> &'static str {
        match self.kind {
            Kind::Any => "must be a value",
            Kind::String => "must be a string",
            Kind::Number | Kind::Integer => "must be a number",
            Kind::Boolean => "must be a boolean",
            Kind::Object(_) => "must be of type object",
            Kind::Array(_) => "must be an array",
        }
    }

    fn check_length(&self, len: usize, path: &Path, out: &mut Vec<Violation>, unit: &str) {
        let is_string = matches!(self.kind, Kind::String);
        if let Some(min) = self.min_length {
            if len < min {
                out.push(path.violation(if is_string {
                    format!("length must be at least {min} {unit}")
                } else {
                    format!("must contain at least {min} {unit}")
                }));
            }
        }
        if let Some(max) = self.max_length {
            if len > max {
                out.push(path.violation(if is_string {
                    format!("length must be less than or equal to {max} {unit}")
                } else {
                    format!("must contain less than or equal to {max} {unit}")
                }));
            }
        }
    }

    fn check_range(&self, value: Option<f64>, path: &Path, out: &mut Vec<Violation>) {
        let Some(value) = value else { return };
        if let Some(min) = self.min {
            if value < min {
                out.push(path.violation(format!("must be greater than or equal to {min}")));
            }
        }
        if let Some(max) = self.max {
            if value > max {
                out.push(path.violation(format!("must be less than or equal to {max}")));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn check(field: &Field, value: Value) -> Vec<(String, String)> {
        let mut out = Vec::new();
        field.check(&value, &Path::default().key("field"), &mut out);
        out.into_iter().map(|v| (v.id(), v.message)).collect()
    }

    #[rstest]
    #[case(Field::string(), json!(1), "\"field\" must be a string")]
    #[case(Field::number(), json!("1"), "\"field\" must be a number")]
    #[case(Field::integer(), json!(1.5), "\"field\" must be an integer")]
    #[case(Field::boolean(), json!("yes"), "\"field\" must be a boolean")]
    #[case(Field::object(ObjectSchema::new()), json!([]), "\"field\" must be of type object")]
    #[case(Field::array(Field::any()), json!({}), "\"field\" must be an array")]
    #[case(Field::string(), Value::Null, "\"field\" must be a string")]
    fn test_type_mismatch_messages(#[case] field: Field, #[case] value: Value, #[case] message: &str) {
        assert_eq!(check(&field, value), vec![("field".to_string(), message.to_string())]);
    }

    #[rstest]
    #[case(Field::string().nullable(), Value::Null)]
    #[case(Field::any(), Value::Null)]
    #[case(Field::integer(), json!(4))]
    #[case(Field::integer(), json!(4.0))]
    #[case(Field::string().min_length(2).max_length(4), json!("abc"))]
    #[case(Field::number().min(0.0).max(1.0), json!(0.5))]
    #[case(Field::string().one_of(["red", "blue"]), json!("red"))]
    fn test_accepted_values(#[case] field: Field, #[case] value: Value) {
        assert!(check(&field, value).is_empty());
    }

    #[test]
    fn test_string_length_bounds() {
        let field = Field::string().min_length(3).max_length(5);
        assert_eq!(
            check(&field, json!("ab"))[0].1,
            "\"field\" length must be at least 3 characters long"
        );
        assert_eq!(
            check(&field, json!("abcdef"))[0].1,
            "\"field\" length must be less than or equal to 5 characters long"
        );
    }

    #[test]
    fn test_length_counts_characters_not_bytes() {
        assert!(check(&Field::string().max_length(2), json!("éé")).is_empty());
    }

    #[test]
    fn test_number_range() {
        let field = Field::number().min(1.0).max(10.0);
        assert_eq!(check(&field, json!(0))[0].1, "\"field\" must be greater than or equal to 1");
        assert_eq!(check(&field, json!(11))[0].1, "\"field\" must be less than or equal to 10");
    }

    #[test]
    fn test_one_of_lists_allowed_values() {
        let field = Field::string().one_of(["admin", "user"]);
        assert_eq!(
            check(&field, json!("root"))[0].1,
            "\"field\" must be one of [admin, user]"
        );
    }

    #[test]
    fn test_array_items_are_all_checked() {
        let field = Field::array(Field::string()).max_length(2);
        let violations = check(&field, json!(["a", 1, true]));

        assert_eq!(
            violations,
            vec![
                (
                    "field".to_string(),
                    "\"field\" must contain less than or equal to 2 items".to_string()
                ),
                ("field.1".to_string(), "\"field[1]\" must be a string".to_string()),
                ("field.2".to_string(), "\"field[2]\" must be a string".to_string()),
            ]
        );
    }

    #[test]
    fn test_root_label_is_body() {
        assert_eq!(Path::default().label(), "body");
        assert_eq!(Path::default().key("a").index(0).key("b").label(), "a[0].b");
    }
}
