//! Write-time consistency checks for request type definitions.
//!
//! Which formats a type accepts and which keywords make sense for a type are
//! kept in the two tables below rather than spread over the checks.

use std::collections::{HashMap, HashSet};
use std::fmt;

use regex::Regex;
use serde::Serialize;

use super::domain::{
    Availability, PropertyDraft, PropertyFormat, PropertySchema, PropertyType, RequestTypeDraft,
};
use super::naming::derive_name;
use crate::config::IntakeConfig;

/// Formats accepted per type. Arrays are absent: their format describes the items.
const FORMAT_RULES: &[(PropertyType, &[PropertyFormat])] = &[
    (
        PropertyType::String,
        &[
            PropertyFormat::Byte,
            PropertyFormat::Binary,
            PropertyFormat::Date,
            PropertyFormat::DateTime,
            PropertyFormat::Duration,
            PropertyFormat::Password,
            PropertyFormat::String,
            PropertyFormat::Uuid,
            PropertyFormat::Uri,
            PropertyFormat::Email,
            PropertyFormat::Rsin,
            PropertyFormat::Bag,
            PropertyFormat::Bsn,
            PropertyFormat::Iban,
        ],
    ),
    (
        PropertyType::Integer,
        &[PropertyFormat::Int32, PropertyFormat::Int64],
    ),
    (
        PropertyType::Number,
        &[
            PropertyFormat::Int32,
            PropertyFormat::Int64,
            PropertyFormat::Float,
            PropertyFormat::Double,
        ],
    ),
    (PropertyType::Boolean, &[PropertyFormat::Boolean]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keyword {
    MultipleOf,
    Minimum,
    Maximum,
    MinLength,
    MaxLength,
    Pattern,
    Items,
    MinItems,
    MaxItems,
    UniqueItems,
    MinProperties,
    MaxProperties,
    MinDate,
    MaxDate,
}

impl Keyword {
    const fn label(self) -> &'static str {
        match self {
            Self::MultipleOf => "multipleOf",
            Self::Minimum => "minimum",
            Self::Maximum => "maximum",
            Self::MinLength => "minLength",
            Self::MaxLength => "maxLength",
            Self::Pattern => "pattern",
            Self::Items => "items",
            Self::MinItems => "minItems",
            Self::MaxItems => "maxItems",
            Self::UniqueItems => "uniqueItems",
            Self::MinProperties => "minProperties",
            Self::MaxProperties => "maxProperties",
            Self::MinDate => "minDate",
            Self::MaxDate => "maxDate",
        }
    }
}

const NUMERIC: &[PropertyType] = &[PropertyType::Integer, PropertyType::Number];
// String keywords on an array constrain each item.
const TEXTUAL: &[PropertyType] = &[PropertyType::String, PropertyType::Array];
const COLLECTION: &[PropertyType] = &[PropertyType::Array];

/// Types each constraint keyword is meaningful for.
const KEYWORD_RULES: &[(Keyword, &[PropertyType])] = &[
    (Keyword::MultipleOf, NUMERIC),
    (Keyword::Minimum, NUMERIC),
    (Keyword::Maximum, NUMERIC),
    (Keyword::MinLength, TEXTUAL),
    (Keyword::MaxLength, TEXTUAL),
    (Keyword::Pattern, TEXTUAL),
    (Keyword::Items, COLLECTION),
    (Keyword::MinItems, COLLECTION),
    (Keyword::MaxItems, COLLECTION),
    (Keyword::UniqueItems, COLLECTION),
    (Keyword::MinProperties, COLLECTION),
    (Keyword::MaxProperties, COLLECTION),
    (Keyword::MinDate, TEXTUAL),
    (Keyword::MaxDate, TEXTUAL),
];

pub fn format_allowed(property_type: PropertyType, format: PropertyFormat) -> bool {
    if property_type == PropertyType::Array {
        return true;
    }
    FORMAT_RULES
        .iter()
        .find(|(rule_type, _)| *rule_type == property_type)
        .map_or(false, |(_, formats)| formats.contains(&format))
}

fn keyword_applies(keyword: Keyword, property_type: PropertyType) -> bool {
    KEYWORD_RULES
        .iter()
        .find(|(rule_keyword, _)| *rule_keyword == keyword)
        .map_or(true, |(_, types)| types.contains(&property_type))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DefinitionRule {
    BlankField,
    TitleTooShort,
    DuplicateTitle,
    NameCollision,
    FormatNotAllowed,
    KeywordNotApplicable,
    ContradictoryBounds,
    InvalidMultipleOf,
    InvalidPattern,
    DefaultOutsideEnum,
    InvalidWindow,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefinitionIssue {
    pub severity: Severity,
    pub rule: DefinitionRule,
    pub path: String,
    pub message: String,
}

impl fmt::Display for DefinitionIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Everything the validator found in one definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DefinitionReport {
    issues: Vec<DefinitionIssue>,
}

impl DefinitionReport {
    pub fn issues(&self) -> &[DefinitionIssue] {
        &self.issues
    }

    pub fn errors(&self) -> impl Iterator<Item = &DefinitionIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &DefinitionIssue> {
        self.issues
            .iter()
            .filter(|issue| issue.severity == Severity::Warning)
    }

    pub fn is_valid(&self) -> bool {
        self.errors().next().is_none()
    }

    pub fn has_rule(&self, rule: DefinitionRule) -> bool {
        self.issues.iter().any(|issue| issue.rule == rule)
    }

    pub fn summary(&self) -> String {
        self.errors()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn error(&mut self, rule: DefinitionRule, path: &str, message: String) {
        self.issues.push(DefinitionIssue {
            severity: Severity::Error,
            rule,
            path: path.to_string(),
            message,
        });
    }

    fn warning(&mut self, rule: DefinitionRule, path: &str, message: String) {
        self.issues.push(DefinitionIssue {
            severity: Severity::Warning,
            rule,
            path: path.to_string(),
            message,
        });
    }
}

/// Checks drafts before they are stored.
#[derive(Debug, Clone)]
pub struct DefinitionValidator {
    min_title_length: usize,
}

impl Default for DefinitionValidator {
    fn default() -> Self {
        Self::from_config(&IntakeConfig::default())
    }
}

impl DefinitionValidator {
    pub fn new(min_title_length: usize) -> Self {
        Self { min_title_length }
    }

    pub fn from_config(config: &IntakeConfig) -> Self {
        Self::new(config.min_title_length)
    }

    pub fn validate(&self, draft: &RequestTypeDraft) -> DefinitionReport {
        let mut report = DefinitionReport::default();

        if draft.name.trim().is_empty() {
            report.error(
                DefinitionRule::BlankField,
                "name",
                "request type name must not be blank".to_string(),
            );
        }
        if draft.source_organization.trim().is_empty() {
            report.error(
                DefinitionRule::BlankField,
                "sourceOrganization",
                "source organization must not be blank".to_string(),
            );
        }
        check_window(&mut report, "", &draft.availability);

        self.check_properties(&mut report, "properties", &draft.properties);
        report
    }

    fn check_properties(
        &self,
        report: &mut DefinitionReport,
        prefix: &str,
        properties: &[PropertyDraft],
    ) {
        let mut seen = HashSet::new();
        let mut names: HashMap<String, &str> = HashMap::new();
        for (position, property) in properties.iter().enumerate() {
            let path = if property.title.trim().is_empty() {
                format!("{prefix}/{position}")
            } else {
                format!("{prefix}/{}", property.title)
            };

            if !seen.insert(property.title.as_str()) {
                report.error(
                    DefinitionRule::DuplicateTitle,
                    &path,
                    format!(
                        "more than one property is titled '{}' at this level",
                        property.title
                    ),
                );
            } else {
                let name = derive_name(&property.title);
                if let Some(previous) = names.get(&name) {
                    report.error(
                        DefinitionRule::NameCollision,
                        &path,
                        format!(
                            "'{}' and '{previous}' both derive the name '{name}'",
                            property.title
                        ),
                    );
                } else if !name.is_empty() {
                    names.insert(name, property.title.as_str());
                }
            }

            self.check_title(report, &path, &property.title);
            self.check_schema(report, &path, &property.schema);
        }
    }

    fn check_title(&self, report: &mut DefinitionReport, path: &str, title: &str) {
        let length = title.trim().chars().count();
        if length == 0 {
            report.error(
                DefinitionRule::BlankField,
                path,
                "property title must not be blank".to_string(),
            );
        } else if length < self.min_title_length {
            report.error(
                DefinitionRule::TitleTooShort,
                path,
                format!(
                    "title has {length} characters, at least {} required",
                    self.min_title_length
                ),
            );
        }
    }

    fn check_schema(&self, report: &mut DefinitionReport, path: &str, schema: &PropertySchema) {
        let property_type = schema.property_type;

        if let Some(format) = schema.format {
            if !format_allowed(property_type, format) {
                report.error(
                    DefinitionRule::FormatNotAllowed,
                    path,
                    format!(
                        "format '{}' is not allowed for type '{}'",
                        format.label(),
                        property_type.label()
                    ),
                );
            }
        }

        for keyword in present_keywords(schema) {
            if !keyword_applies(keyword, property_type) {
                report.warning(
                    DefinitionRule::KeywordNotApplicable,
                    path,
                    format!(
                        "'{}' has no effect on type '{}'",
                        keyword.label(),
                        property_type.label()
                    ),
                );
            }
        }

        check_bounds(report, path, "minimum", schema.minimum, schema.maximum);
        check_bounds(report, path, "minLength", schema.min_length, schema.max_length);
        check_bounds(report, path, "minItems", schema.min_items, schema.max_items);
        check_bounds(
            report,
            path,
            "minProperties",
            schema.min_properties,
            schema.max_properties,
        );

        if let Some(multiple_of) = schema.multiple_of {
            if multiple_of <= 0 {
                report.error(
                    DefinitionRule::InvalidMultipleOf,
                    path,
                    format!("multipleOf must be positive, found {multiple_of}"),
                );
            }
        }

        if let Some(pattern) = &schema.pattern {
            if let Err(err) = Regex::new(pattern) {
                report.error(
                    DefinitionRule::InvalidPattern,
                    path,
                    format!("pattern is not a valid regular expression: {err}"),
                );
            }
        }

        if let Some(default) = &schema.default {
            if !schema.enum_values.is_empty() && !schema.enum_values.contains(default) {
                report.error(
                    DefinitionRule::DefaultOutsideEnum,
                    path,
                    format!("default {default} is not one of the enumerated values"),
                );
            }
        }

        check_window(report, path, &schema.availability);

        if !schema.items.is_empty() {
            self.check_properties(report, &format!("{path}/items"), &schema.items);
        }
    }
}

fn present_keywords(schema: &PropertySchema) -> Vec<Keyword> {
    [
        (Keyword::MultipleOf, schema.multiple_of.is_some()),
        (Keyword::Minimum, schema.minimum.is_some()),
        (Keyword::Maximum, schema.maximum.is_some()),
        (Keyword::MinLength, schema.min_length.is_some()),
        (Keyword::MaxLength, schema.max_length.is_some()),
        (Keyword::Pattern, schema.pattern.is_some()),
        (Keyword::Items, !schema.items.is_empty()),
        (Keyword::MinItems, schema.min_items.is_some()),
        (Keyword::MaxItems, schema.max_items.is_some()),
        (Keyword::UniqueItems, schema.unique_items.is_some()),
        (Keyword::MinProperties, schema.min_properties.is_some()),
        (Keyword::MaxProperties, schema.max_properties.is_some()),
        (Keyword::MinDate, schema.min_date.is_some()),
        (Keyword::MaxDate, schema.max_date.is_some()),
    ]
    .into_iter()
    .filter_map(|(keyword, present)| present.then_some(keyword))
    .collect()
}

fn check_bounds<T>(
    report: &mut DefinitionReport,
    path: &str,
    keyword: &str,
    lower: Option<T>,
    upper: Option<T>,
) where
    T: PartialOrd + fmt::Display,
{
    if let (Some(lower), Some(upper)) = (lower, upper) {
        if lower > upper {
            report.error(
                DefinitionRule::ContradictoryBounds,
                path,
                format!("{keyword} {lower} exceeds its upper bound {upper}"),
            );
        }
    }
}

fn check_window(report: &mut DefinitionReport, path: &str, window: &Availability) {
    if let (Some(from), Some(until)) = (window.available_from, window.available_until) {
        if from >= until {
            let path = if path.is_empty() { "availableFrom" } else { path };
            report.error(
                DefinitionRule::InvalidWindow,
                path,
                format!("availability starts at {from} but ends at {until}"),
            );
        }
    }
}
