//! Field visibility per operation.
//!
//! Rendering never looks at serde attributes to decide what a client may see or
//! send; it consults the tables below.

use serde_json::{Map, Value};

use super::domain::{Property, RequestType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Write,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub field: &'static str,
    pub read: bool,
    pub write: bool,
}

impl FieldRule {
    const fn new(field: &'static str, read: bool, write: bool) -> Self {
        Self { field, read, write }
    }

    pub fn allows(&self, operation: Operation) -> bool {
        match operation {
            Operation::Read => self.read,
            Operation::Write => self.write,
        }
    }
}

const READ_WRITE: (bool, bool) = (true, true);
const READ_ONLY: (bool, bool) = (true, false);
const WRITE_ONLY: (bool, bool) = (false, true);
const HIDDEN: (bool, bool) = (false, false);

macro_rules! rules {
    ($($field:literal => $access:expr),* $(,)?) => {
        &[$(FieldRule::new($field, $access.0, $access.1)),*]
    };
}

pub const REQUEST_TYPE_FIELDS: &[FieldRule] = rules![
    "id" => READ_ONLY,
    "sourceOrganization" => READ_WRITE,
    "name" => READ_WRITE,
    "description" => READ_WRITE,
    "properties" => READ_WRITE,
    "extends" => WRITE_ONLY,
    "extendedBy" => HIDDEN,
    "availableFrom" => READ_WRITE,
    "availableUntil" => READ_WRITE,
];

pub const PROPERTY_FIELDS: &[FieldRule] = rules![
    "id" => READ_ONLY,
    "requestType" => HIDDEN,
    "title" => READ_WRITE,
    "name" => READ_ONLY,
    "type" => READ_WRITE,
    "format" => READ_WRITE,
    "multipleOf" => READ_WRITE,
    "minimum" => READ_WRITE,
    "exclusiveMinimum" => READ_WRITE,
    "maximum" => READ_WRITE,
    "exclusiveMaximum" => READ_WRITE,
    "minLength" => READ_WRITE,
    "maxLength" => READ_WRITE,
    "pattern" => READ_WRITE,
    "items" => READ_WRITE,
    "additionalItems" => READ_WRITE,
    "minItems" => READ_WRITE,
    "maxItems" => READ_WRITE,
    "uniqueItems" => READ_WRITE,
    "minProperties" => READ_WRITE,
    "maxProperties" => READ_WRITE,
    "enum" => READ_WRITE,
    "allOf" => READ_WRITE,
    "anyOf" => READ_WRITE,
    "oneOf" => READ_WRITE,
    "required" => READ_WRITE,
    "nullable" => READ_WRITE,
    "deprecated" => READ_WRITE,
    "readOnly" => READ_WRITE,
    "writeOnly" => READ_WRITE,
    "default" => READ_WRITE,
    "description" => READ_WRITE,
    "example" => READ_WRITE,
    "externalDoc" => READ_WRITE,
    "minDate" => READ_WRITE,
    "maxDate" => READ_WRITE,
    "availableFrom" => READ_WRITE,
    "availableUntil" => READ_WRITE,
];

/// Unknown fields are treated as hidden.
pub fn is_visible(table: &[FieldRule], field: &str, operation: Operation) -> bool {
    table
        .iter()
        .find(|rule| rule.field == field)
        .map_or(false, |rule| rule.allows(operation))
}

fn retain(map: &mut Map<String, Value>, table: &[FieldRule], operation: Operation) {
    map.retain(|field, _| is_visible(table, field, operation));
}

/// Read projection of one property, including its derived `name`.
pub fn render_property(property: &Property) -> Value {
    let mut value = serde_json::to_value(property).unwrap_or(Value::Null);
    if let Value::Object(map) = &mut value {
        map.insert("name".to_string(), Value::String(property.name()));
        retain(map, PROPERTY_FIELDS, Operation::Read);
        if let Some(Value::Array(items)) = map.get_mut("items") {
            for item in items.iter_mut() {
                render_nested_item(item);
            }
        }
    }
    value
}

fn render_nested_item(item: &mut Value) {
    if let Value::Object(map) = item {
        if let Some(title) = map.get("title").and_then(Value::as_str) {
            let name = super::naming::derive_name(title);
            map.insert("name".to_string(), Value::String(name));
        }
        retain(map, PROPERTY_FIELDS, Operation::Read);
        if let Some(Value::Array(items)) = map.get_mut("items") {
            for nested in items.iter_mut() {
                render_nested_item(nested);
            }
        }
    }
}

/// Read projection of a request type with the given property list.
///
/// `properties` is either the type's own list or a resolved effective set; both
/// render identically.
pub fn render_request_type<'a, I>(request_type: &RequestType, properties: I) -> Value
where
    I: IntoIterator<Item = &'a Property>,
{
    let mut map = match serde_json::to_value(request_type) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };
    map.insert(
        "properties".to_string(),
        Value::Array(properties.into_iter().map(render_property).collect()),
    );
    retain(&mut map, REQUEST_TYPE_FIELDS, Operation::Read);
    Value::Object(map)
}

/// Drop every key a client may not write, including inside `properties` and
/// nested `items`.
pub fn strip_unwritable(payload: &mut Value) {
    if let Value::Object(map) = payload {
        retain(map, REQUEST_TYPE_FIELDS, Operation::Write);
        if let Some(Value::Array(properties)) = map.get_mut("properties") {
            for property in properties.iter_mut() {
                strip_unwritable_property(property);
            }
        }
    }
}

fn strip_unwritable_property(property: &mut Value) {
    if let Value::Object(map) = property {
        retain(map, PROPERTY_FIELDS, Operation::Write);
        if let Some(Value::Array(items)) = map.get_mut("items") {
            for item in items.iter_mut() {
                strip_unwritable_property(item);
            }
        }
    }
}
