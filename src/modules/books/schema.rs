//! Declared record schemas and the validator that enforces them.
//!
//! Validation semantics:
//! - every required field is present and not `null`
//! - field values match their declared JSON type exactly; no coercion, so
//!   `"1998"` is not an integer and neither is `1998.0`
//! - integer fields fit in an `i64` and honour their declared lower bound
//! - undeclared fields are rejected only by strict schemas, otherwise ignored
//!
//! All violations are collected, not just the first one.

use serde::Serialize;
use serde_json::{json, Map, Value};

/// JSON types a field may declare
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Integer,
}

impl FieldType {
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Integer => "integer",
        }
    }

    fn matches(&self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Integer => value.as_i64().is_some(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub field_type: FieldType,
    pub required: bool,
    /// Inclusive lower bound, integers only
    pub minimum: Option<i64>,
    pub description: &'static str,
}

impl FieldDef {
    pub const fn required_string(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            field_type: FieldType::String,
            required: true,
            minimum: None,
            description,
        }
    }

    pub const fn required_integer(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            field_type: FieldType::Integer,
            required: true,
            minimum: None,
            description,
        }
    }

    pub fn with_minimum(mut self, minimum: i64) -> Self {
        self.minimum = Some(minimum);
        self
    }
}

/// Which rule a violation broke
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Rule {
    Required,
    Type,
    Minimum,
    Range,
    Unknown,
    Immutable,
}

/// A single field-level failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: String,
    pub rule: Rule,
    pub message: String,
}

impl Violation {
    pub fn missing(field: &str) -> Self {
        Self {
            field: field.to_string(),
            rule: Rule::Required,
            message: format!("'{}' is required", field),
        }
    }

    pub fn wrong_type(field: &str, expected: &str, found: &Value) -> Self {
        Self {
            field: field.to_string(),
            rule: Rule::Type,
            message: format!(
                "'{}' must be of type {}, got {}",
                field,
                expected,
                json_type_name(found)
            ),
        }
    }

    pub fn below_minimum(field: &str, minimum: i64, found: i64) -> Self {
        Self {
            field: field.to_string(),
            rule: Rule::Minimum,
            message: format!("'{}' must be at least {}, got {}", field, minimum, found),
        }
    }

    pub fn out_of_range(field: &str, found: &Value) -> Self {
        Self {
            field: field.to_string(),
            rule: Rule::Range,
            message: format!(
                "'{}' must fit in a signed 64-bit integer, got {}",
                field, found
            ),
        }
    }

    pub fn unknown(field: &str) -> Self {
        Self {
            field: field.to_string(),
            rule: Rule::Unknown,
            message: format!("'{}' is not a recognised field", field),
        }
    }

    pub fn immutable(field: &str, existing: &str, attempted: &str) -> Self {
        Self {
            field: field.to_string(),
            rule: Rule::Immutable,
            message: format!(
                "'{}' cannot change from '{}' to '{}'",
                field, existing, attempted
            ),
        }
    }

    pub fn to_json(&self) -> Value {
        json!({
            "field": self.field,
            "rule": self.rule,
            "message": self.message,
        })
    }
}

/// A declared record shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub name: &'static str,
    pub fields: Vec<FieldDef>,
    pub strict: bool,
}

impl Schema {
    /// Check `document` against this schema.
    ///
    /// Pure: the document is never mutated and no I/O happens. On failure the
    /// returned list is never empty.
    pub fn validate(&self, document: &Value) -> Result<(), Vec<Violation>> {
        let Some(object) = document.as_object() else {
            return Err(vec![Violation::wrong_type("$root", "object", document)]);
        };

        let mut violations = Vec::new();

        for field in &self.fields {
            match object.get(field.name) {
                None | Some(Value::Null) => {
                    if field.required {
                        violations.push(Violation::missing(field.name));
                    }
                }
                Some(value) => {
                    if let Some(violation) = check_value(field, value) {
                        violations.push(violation);
                    }
                }
            }
        }

        if self.strict {
            violations.extend(self.unknown_fields(object).map(Violation::unknown));
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    fn unknown_fields<'a>(&'a self, object: &'a Map<String, Value>) -> impl Iterator<Item = &'a str> {
        object
            .keys()
            .map(String::as_str)
            .filter(move |key| !self.fields.iter().any(|field| field.name == *key))
    }

    /// Render as a JSON-Schema object for the OpenAPI document
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for field in &self.fields {
            let mut property = json!({
                "type": field.field_type.type_name(),
                "description": field.description,
            });
            if let Some(minimum) = field.minimum {
                property["minimum"] = json!(minimum);
            }
            properties.insert(field.name.to_string(), property);
        }

        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|field| field.required)
            .map(|field| field.name)
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
            "additionalProperties": !self.strict,
        })
    }
}

fn check_value(field: &FieldDef, value: &Value) -> Option<Violation> {
    // serde_json keeps integers above i64::MAX as u64
    if field.field_type == FieldType::Integer && value.is_u64() && value.as_i64().is_none() {
        return Some(Violation::out_of_range(field.name, value));
    }

    if !field.field_type.matches(value) {
        return Some(Violation::wrong_type(
            field.name,
            field.field_type.type_name(),
            value,
        ));
    }

    match (field.minimum, value.as_i64()) {
        (Some(minimum), Some(found)) if found < minimum => {
            Some(Violation::below_minimum(field.name, minimum, found))
        }
        _ => None,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// The book shape enforced on both create and full-replacement update
pub fn book_schema(strict: bool) -> Schema {
    Schema {
        name: "Book",
        fields: vec![
            FieldDef::required_string("isbn", "ISBN, the immutable primary key"),
            FieldDef::required_string("amazon_url", "Store link for the book"),
            FieldDef::required_string("author", "Author of the book"),
            FieldDef::required_string("language", "Language the book is written in"),
            FieldDef::required_integer("pages", "Page count").with_minimum(0),
            FieldDef::required_string("publisher", "Publisher of the book"),
            FieldDef::required_string("title", "Title of the book"),
            FieldDef::required_integer("year", "Publication year"),
        ],
        strict,
    }
}
