use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::naming::derive_name;

/// Identifier of a request type, assigned once at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestTypeId(pub Uuid);

impl RequestTypeId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for RequestTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for RequestTypeId {
    type Err = uuid::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(raw.trim()).map(Self)
    }
}

/// Identifier of a property definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyId(pub Uuid);

impl PropertyId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Primitive value type of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    String,
    Integer,
    Boolean,
    Number,
    Array,
}

impl PropertyType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Number => "number",
            Self::Array => "array",
        }
    }
}

/// Richer value descriptor, orthogonal to [`PropertyType`].
///
/// `Rsin`, `Bag`, `Bsn` and `Iban` are domain formats: an organization number,
/// an address-register lookup, a citizen service number and a bank account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PropertyFormat {
    Int32,
    Int64,
    Float,
    Double,
    Byte,
    Binary,
    Date,
    DateTime,
    Duration,
    Password,
    Boolean,
    String,
    Uuid,
    Uri,
    Email,
    Rsin,
    Bag,
    Bsn,
    Iban,
}

impl PropertyFormat {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Float => "float",
            Self::Double => "double",
            Self::Byte => "byte",
            Self::Binary => "binary",
            Self::Date => "date",
            Self::DateTime => "date-time",
            Self::Duration => "duration",
            Self::Password => "password",
            Self::Boolean => "boolean",
            Self::String => "string",
            Self::Uuid => "uuid",
            Self::Uri => "uri",
            Self::Email => "email",
            Self::Rsin => "rsin",
            Self::Bag => "bag",
            Self::Bsn => "bsn",
            Self::Iban => "iban",
        }
    }
}

/// Optional validity window shared by request types and properties.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Availability {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_from: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_until: Option<DateTime<Utc>>,
}

impl Availability {
    /// Inclusive start, exclusive end; an open side never excludes.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        let started = self.available_from.map_or(true, |from| from <= instant);
        let ended = self.available_until.map_or(false, |until| instant >= until);
        started && !ended
    }
}

/// JSON-Schema-like keywords describing a single field.
///
/// Constraints are data: nothing in this crate checks submitted values against
/// them. Definition-time consistency is checked by the definition validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertySchema {
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<PropertyFormat>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple_of: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<PropertyDraft>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_items: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_items: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_properties: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_properties: Option<u32>,

    #[serde(default, rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub any_of: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<Value>,

    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub deprecated: bool,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub write_only: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_doc: Option<String>,

    /// ISO-8601 date, date-time or duration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_date: Option<String>,
    /// ISO-8601 date, date-time or duration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_date: Option<String>,

    #[serde(flatten)]
    pub availability: Availability,
}

impl PropertySchema {
    pub fn new(property_type: PropertyType) -> Self {
        Self {
            property_type,
            format: None,
            multiple_of: None,
            minimum: None,
            exclusive_minimum: None,
            maximum: None,
            exclusive_maximum: None,
            min_length: None,
            max_length: None,
            pattern: None,
            items: Vec::new(),
            additional_items: None,
            min_items: None,
            max_items: None,
            unique_items: None,
            min_properties: None,
            max_properties: None,
            enum_values: Vec::new(),
            all_of: Vec::new(),
            any_of: Vec::new(),
            one_of: Vec::new(),
            required: false,
            nullable: false,
            deprecated: false,
            read_only: false,
            write_only: false,
            default: None,
            description: None,
            example: None,
            external_doc: None,
            min_date: None,
            max_date: None,
            availability: Availability::default(),
        }
    }

    pub fn with_format(mut self, format: PropertyFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Writable shape of a property: a title plus its schema keywords.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDraft {
    pub title: String,
    #[serde(flatten)]
    pub schema: PropertySchema,
}

impl PropertyDraft {
    pub fn new(title: impl Into<String>, schema: PropertySchema) -> Self {
        Self {
            title: title.into(),
            schema,
        }
    }

    pub fn name(&self) -> String {
        derive_name(&self.title)
    }
}

/// A stored property, owned by exactly one request type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: PropertyId,
    pub request_type: RequestTypeId,
    pub title: String,
    #[serde(flatten)]
    pub schema: PropertySchema,
}

impl Property {
    /// API-facing key, always derived from the title.
    pub fn name(&self) -> String {
        derive_name(&self.title)
    }
}

/// Writable shape of a request type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestTypeDraft {
    pub source_organization: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub properties: Vec<PropertyDraft>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<RequestTypeId>,
    #[serde(flatten)]
    pub availability: Availability,
}

/// A service request definition and the properties it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestType {
    pub id: RequestTypeId,
    pub source_organization: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub properties: Vec<Property>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<RequestTypeId>,
    #[serde(flatten)]
    pub availability: Availability,
}

impl RequestType {
    /// Materialize a draft, giving every property a fresh id owned by `id`.
    pub fn from_draft(id: RequestTypeId, draft: RequestTypeDraft) -> Self {
        Self::from_draft_reusing(id, draft, &[])
    }

    /// Like [`RequestType::from_draft`], but a property whose title matches one in
    /// `previous` keeps that property's id.
    pub fn from_draft_reusing(
        id: RequestTypeId,
        draft: RequestTypeDraft,
        previous: &[Property],
    ) -> Self {
        let mut known: HashMap<&str, PropertyId> = HashMap::new();
        for property in previous {
            known.entry(property.title.as_str()).or_insert(property.id);
        }

        let properties = draft
            .properties
            .into_iter()
            .map(|property| Property {
                id: known
                    .remove(property.title.as_str())
                    .unwrap_or_else(PropertyId::generate),
                request_type: id,
                title: property.title,
                schema: property.schema,
            })
            .collect();

        Self {
            id,
            source_organization: draft.source_organization,
            name: draft.name,
            description: draft.description,
            properties,
            extends: draft.extends,
            availability: draft.availability,
        }
    }

    pub fn is_available_at(&self, instant: DateTime<Utc>) -> bool {
        self.availability.contains(instant)
    }

    pub fn property(&self, title: &str) -> Option<&Property> {
        self.properties
            .iter()
            .find(|property| property.title == title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn draft() -> RequestTypeDraft {
        RequestTypeDraft {
            source_organization: "0000".to_string(),
            name: "Verhuizen".to_string(),
            description: Some("Het doorgeven van een verhuizing aan een gemeente".to_string()),
            properties: vec![
                PropertyDraft::new(
                    "Datum",
                    PropertySchema::new(PropertyType::String).with_format(PropertyFormat::Date),
                ),
                PropertyDraft::new(
                    "Adress",
                    PropertySchema::new(PropertyType::String)
                        .with_format(PropertyFormat::Bag)
                        .required(),
                ),
            ],
            extends: None,
            availability: Availability::default(),
        }
    }

    #[test]
    fn from_draft_assigns_owner_to_every_property() {
        let id = RequestTypeId::generate();
        let request_type = RequestType::from_draft(id, draft());

        assert_eq!(request_type.properties.len(), 2);
        assert!(request_type
            .properties
            .iter()
            .all(|property| property.request_type == id));
        assert_ne!(
            request_type.properties[0].id,
            request_type.properties[1].id
        );
    }

    #[test]
    fn from_draft_reusing_keeps_ids_for_unchanged_titles() {
        let id = RequestTypeId::generate();
        let original = RequestType::from_draft(id, draft());

        let mut changed = draft();
        changed.properties.remove(0);
        changed.properties.push(PropertyDraft::new(
            "Wie",
            PropertySchema::new(PropertyType::Array).with_format(PropertyFormat::Bsn),
        ));

        let updated = RequestType::from_draft_reusing(id, changed, &original.properties);
        let adress = updated.property("Adress").expect("adress kept");
        let wie = updated.property("Wie").expect("wie added");

        assert_eq!(adress.id, original.property("Adress").expect("present").id);
        assert!(original.properties.iter().all(|old| old.id != wie.id));
    }

    #[test]
    fn property_serializes_with_schema_keywords() {
        let request_type = RequestType::from_draft(RequestTypeId::generate(), draft());
        let value = serde_json::to_value(&request_type.properties[1]).expect("serializes");

        assert_eq!(value["title"], json!("Adress"));
        assert_eq!(value["type"], json!("string"));
        assert_eq!(value["format"], json!("bag"));
        assert_eq!(value["required"], json!(true));
        assert!(value.get("minLength").is_none());
    }

    #[test]
    fn unknown_format_is_rejected_when_parsing() {
        let payload = json!({ "title": "Type", "type": "string", "format": "strin" });
        assert!(serde_json::from_value::<PropertyDraft>(payload).is_err());
    }

    #[test]
    fn date_time_format_uses_hyphenated_label() {
        let payload = json!({ "title": "Moment", "type": "string", "format": "date-time" });
        let property: PropertyDraft = serde_json::from_value(payload).expect("parses");
        assert_eq!(property.schema.format, Some(PropertyFormat::DateTime));
        assert_eq!(PropertyFormat::DateTime.label(), "date-time");
    }

    #[test]
    fn availability_window_is_half_open() {
        let from = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let until = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let window = Availability {
            available_from: Some(from),
            available_until: Some(until),
        };

        assert!(window.contains(from));
        assert!(!window.contains(until));
        assert!(Availability::default().contains(until));
    }

    #[test]
    fn request_type_id_parses_from_text() {
        let id: RequestTypeId = "2bfb3cea-b5b5-459c-b3e0-e1100089a11a"
            .parse()
            .expect("valid uuid");
        assert_eq!(id.to_string(), "2bfb3cea-b5b5-459c-b3e0-e1100089a11a");
        assert!("not-a-uuid".parse::<RequestTypeId>().is_err());
    }
}
