//! Translation of list-endpoint query parameters into lead predicates.
//!
//! Every recognized query key maps to one [`LeadField`], and each field class
//! has its own small parser turning the raw string into a [`Condition`]:
//!
//! | Class   | Fields                           | Syntax                                  |
//! |---------|----------------------------------|-----------------------------------------|
//! | Text    | `email`, `company`, `city`       | `*` wildcard, otherwise exact match     |
//! | Enum    | `status`, `source`               | `a,b,c` membership, otherwise exact     |
//! | Numeric | `score`, `lead_value`            | `min-max`, `>n`, `<n`, `n`              |
//! | Date    | `created_at`, `last_activity_at` | `from,to`, `>d`, `<d`, `d`              |
//! | Boolean | `is_qualified`                   | `true`, anything else means false       |
//!
//! Numeric ranges split on the first `-` only when both halves parse as
//! numbers; otherwise the value falls through to the comparator and exact
//! forms. A negative lower bound (`-10-5`) therefore cannot be expressed.
//!
//! Predicates are store-agnostic: the in-memory store evaluates them with
//! [`Predicate::matches`], the Postgres store renders them to SQL.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use regex::{Regex, RegexBuilder};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

use crate::models::Lead;
use crate::pagination::PageRequest;

/// Errors produced while translating a filter operand.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    #[error("invalid numeric filter for '{field}': '{value}'")]
    InvalidNumber { field: LeadField, value: String },

    #[error("invalid date filter for '{field}': '{value}'")]
    InvalidDate { field: LeadField, value: String },

    #[error("invalid pattern for '{field}': {reason}")]
    InvalidPattern { field: LeadField, reason: String },
}

/// Lead fields that can be filtered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LeadField {
    Email,
    Company,
    City,
    Status,
    Source,
    Score,
    LeadValue,
    CreatedAt,
    LastActivityAt,
    IsQualified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Text,
    Enum,
    Numeric,
    Date,
    Bool,
}

impl LeadField {
    pub const ALL: [LeadField; 10] = [
        LeadField::Email,
        LeadField::Company,
        LeadField::City,
        LeadField::Status,
        LeadField::Source,
        LeadField::Score,
        LeadField::LeadValue,
        LeadField::CreatedAt,
        LeadField::LastActivityAt,
        LeadField::IsQualified,
    ];

    /// Looks up the field for a query parameter name.
    pub fn from_param(name: &str) -> Option<Self> {
        LeadField::ALL
            .into_iter()
            .find(|field| field.column() == name)
    }

    /// Query parameter name, which is also the storage column name.
    pub fn column(self) -> &'static str {
        match self {
            LeadField::Email => "email",
            LeadField::Company => "company",
            LeadField::City => "city",
            LeadField::Status => "status",
            LeadField::Source => "source",
            LeadField::Score => "score",
            LeadField::LeadValue => "lead_value",
            LeadField::CreatedAt => "created_at",
            LeadField::LastActivityAt => "last_activity_at",
            LeadField::IsQualified => "is_qualified",
        }
    }

    fn kind(self) -> FieldKind {
        match self {
            LeadField::Email | LeadField::Company | LeadField::City => FieldKind::Text,
            LeadField::Status | LeadField::Source => FieldKind::Enum,
            LeadField::Score | LeadField::LeadValue => FieldKind::Numeric,
            LeadField::CreatedAt | LeadField::LastActivityAt => FieldKind::Date,
            LeadField::IsQualified => FieldKind::Bool,
        }
    }

    fn text_value(self, lead: &Lead) -> Option<&str> {
        match self {
            LeadField::Email => Some(&lead.email),
            LeadField::Company => Some(&lead.company),
            LeadField::City => Some(&lead.city),
            LeadField::Status => Some(lead.status.as_str()),
            LeadField::Source => Some(lead.source.as_str()),
            _ => None,
        }
    }

    fn number_value(self, lead: &Lead) -> Option<f64> {
        match self {
            LeadField::Score => Some(f64::from(lead.score)),
            LeadField::LeadValue => Some(lead.lead_value),
            _ => None,
        }
    }

    fn date_value(self, lead: &Lead) -> Option<DateTime<Utc>> {
        match self {
            LeadField::CreatedAt => Some(lead.created_at),
            LeadField::LastActivityAt => lead.last_activity_at,
            _ => None,
        }
    }
}

impl fmt::Display for LeadField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Case-insensitive glob where `*` stands for any run of characters.
///
/// The pattern must cover the whole value; every other character is literal.
#[derive(Debug, Clone)]
pub struct WildcardPattern {
    glob: String,
    regex: Regex,
}

impl WildcardPattern {
    pub fn new(glob: &str) -> Result<Self, regex::Error> {
        let body = glob
            .split('*')
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*");
        let regex = RegexBuilder::new(&format!("^{}$", body))
            .case_insensitive(true)
            .dot_matches_new_line(true)
            .build()?;

        Ok(Self {
            glob: glob.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.glob
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }

    /// Equivalent SQL `LIKE` pattern using the default `\` escape character.
    pub fn to_like_pattern(&self) -> String {
        let mut pattern = String::with_capacity(self.glob.len() + 4);
        for c in self.glob.chars() {
            match c {
                '*' => pattern.push('%'),
                '%' | '_' | '\\' => {
                    pattern.push('\\');
                    pattern.push(c);
                }
                _ => pattern.push(c),
            }
        }
        pattern
    }
}

impl PartialEq for WildcardPattern {
    fn eq(&self, other: &Self) -> bool {
        self.glob == other.glob
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TextMatch {
    /// Case-sensitive equality.
    Exact(String),
    Wildcard(WildcardPattern),
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnumMatch {
    Exact(String),
    AnyOf(Vec<String>),
}

/// Ordered comparison. Both range bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Comparison<T> {
    Between(T, T),
    GreaterThan(T),
    LessThan(T),
    Equal(T),
}

impl<T: PartialOrd> Comparison<T> {
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Comparison::Between(min, max) => min <= value && value <= max,
            Comparison::GreaterThan(bound) => value > bound,
            Comparison::LessThan(bound) => value < bound,
            Comparison::Equal(expected) => value == expected,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Text(TextMatch),
    Enum(EnumMatch),
    Number(Comparison<f64>),
    Date(Comparison<DateTime<Utc>>),
    Bool(bool),
}

/// A condition bound to the field it applies to.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    field: LeadField,
    condition: Condition,
}

impl Predicate {
    /// Translates one raw query value using the parser for the field's class.
    pub fn parse(field: LeadField, raw: &str) -> Result<Self, FilterError> {
        let condition = match field.kind() {
            FieldKind::Text => parse_text(field, raw)?,
            FieldKind::Enum => parse_enum(raw),
            FieldKind::Numeric => Condition::Number(parse_numeric(field, raw)?),
            FieldKind::Date => Condition::Date(parse_date(field, raw)?),
            FieldKind::Bool => Condition::Bool(raw == "true"),
        };
        Ok(Self { field, condition })
    }

    pub fn field(&self) -> LeadField {
        self.field
    }

    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    /// Evaluates the predicate against a single record.
    ///
    /// Date comparisons against an absent timestamp never match.
    pub fn matches(&self, lead: &Lead) -> bool {
        match &self.condition {
            Condition::Text(TextMatch::Exact(expected)) => {
                self.field.text_value(lead) == Some(expected.as_str())
            }
            Condition::Text(TextMatch::Wildcard(pattern)) => self
                .field
                .text_value(lead)
                .is_some_and(|value| pattern.is_match(value)),
            Condition::Enum(EnumMatch::Exact(expected)) => {
                self.field.text_value(lead) == Some(expected.as_str())
            }
            Condition::Enum(EnumMatch::AnyOf(options)) => self
                .field
                .text_value(lead)
                .is_some_and(|value| options.iter().any(|option| option == value)),
            Condition::Number(comparison) => self
                .field
                .number_value(lead)
                .is_some_and(|value| comparison.matches(&value)),
            Condition::Date(comparison) => self
                .field
                .date_value(lead)
                .is_some_and(|value| comparison.matches(&value)),
            Condition::Bool(expected) => {
                self.field == LeadField::IsQualified && lead.is_qualified == *expected
            }
        }
    }
}

/// Conjunction of predicates. An empty filter matches every lead.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeadFilter {
    predicates: Vec<Predicate>,
}

impl LeadFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Translates query parameters, skipping keys that are not filterable fields.
    pub fn from_params<I, K, V>(params: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut filter = Self::new();
        for (key, value) in params {
            if let Some(field) = LeadField::from_param(key.as_ref()) {
                filter.push(Predicate::parse(field, value.as_ref())?);
            }
        }
        // Stable order keeps generated SQL identical for identical requests.
        filter.predicates.sort_by_key(|predicate| predicate.field);
        Ok(filter)
    }

    pub fn push(&mut self, predicate: Predicate) {
        self.predicates.push(predicate);
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn matches(&self, lead: &Lead) -> bool {
        self.predicates.iter().all(|predicate| predicate.matches(lead))
    }
}

/// Fully parsed `GET /api/leads` request: predicates plus page bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct LeadQuery {
    pub filter: LeadFilter,
    pub page: PageRequest,
}

impl LeadQuery {
    pub fn from_params(params: &HashMap<String, String>) -> Result<Self, FilterError> {
        let page = PageRequest::from_raw(
            params.get("page").map(String::as_str),
            params.get("limit").map(String::as_str),
        );
        let filter = LeadFilter::from_params(params)?;
        Ok(Self { filter, page })
    }
}

fn parse_text(field: LeadField, raw: &str) -> Result<Condition, FilterError> {
    if raw.contains('*') {
        let pattern = WildcardPattern::new(raw).map_err(|e| FilterError::InvalidPattern {
            field,
            reason: e.to_string(),
        })?;
        Ok(Condition::Text(TextMatch::Wildcard(pattern)))
    } else {
        Ok(Condition::Text(TextMatch::Exact(raw.to_string())))
    }
}

fn parse_enum(raw: &str) -> Condition {
    if raw.contains(',') {
        let options = raw.split(',').map(|s| s.trim().to_string()).collect();
        Condition::Enum(EnumMatch::AnyOf(options))
    } else {
        Condition::Enum(EnumMatch::Exact(raw.trim().to_string()))
    }
}

fn parse_numeric(field: LeadField, raw: &str) -> Result<Comparison<f64>, FilterError> {
    if let Some((min, max)) = raw.split_once('-') {
        if let (Some(min), Some(max)) = (parse_number(min), parse_number(max)) {
            return Ok(Comparison::Between(min, max));
        }
    }

    let comparison = if let Some(rest) = raw.strip_prefix('>') {
        parse_number(rest).map(Comparison::GreaterThan)
    } else if let Some(rest) = raw.strip_prefix('<') {
        parse_number(rest).map(Comparison::LessThan)
    } else {
        parse_number(raw).map(Comparison::Equal)
    };

    comparison.ok_or_else(|| FilterError::InvalidNumber {
        field,
        value: raw.to_string(),
    })
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

fn parse_date(field: LeadField, raw: &str) -> Result<Comparison<DateTime<Utc>>, FilterError> {
    let invalid = || FilterError::InvalidDate {
        field,
        value: raw.to_string(),
    };

    if let Some((from, to)) = raw.split_once(',') {
        let from = parse_instant(from).ok_or_else(invalid)?;
        let to = parse_instant(to).ok_or_else(invalid)?;
        return Ok(Comparison::Between(from, to));
    }

    let comparison = if let Some(rest) = raw.strip_prefix('>') {
        parse_instant(rest).map(Comparison::GreaterThan)
    } else if let Some(rest) = raw.strip_prefix('<') {
        parse_instant(rest).map(Comparison::LessThan)
    } else {
        parse_instant(raw).map(Comparison::Equal)
    };

    comparison.ok_or_else(invalid)
}

/// Parses an RFC 3339 timestamp, a naive `YYYY-MM-DDTHH:MM:SS[.f]` (taken as
/// UTC) or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_sql_wildcards() {
        let pattern = WildcardPattern::new("*100%_off\\*").unwrap();
        assert_eq!(pattern.to_like_pattern(), "%100\\%\\_off\\\\%");
    }

    #[test]
    fn test_wildcard_treats_regex_metacharacters_literally() {
        let pattern = WildcardPattern::new("*@example.com").unwrap();
        assert!(pattern.is_match("a@example.com"));
        assert!(!pattern.is_match("a@exampleXcom"));
    }

    #[test]
    fn test_parse_instant_formats() {
        let midnight = parse_instant("2024-01-15").unwrap();
        assert_eq!(midnight.to_rfc3339(), "2024-01-15T00:00:00+00:00");

        let naive = parse_instant("2024-01-15T10:30:00").unwrap();
        assert_eq!(naive.to_rfc3339(), "2024-01-15T10:30:00+00:00");

        let offset = parse_instant("2024-01-15T10:30:00-03:00").unwrap();
        assert_eq!(offset.to_rfc3339(), "2024-01-15T13:30:00+00:00");

        assert!(parse_instant("yesterday").is_none());
    }

    #[test]
    fn test_predicates_sorted_by_field() {
        let filter =
            LeadFilter::from_params([("score", "10"), ("email", "a@b.c"), ("status", "new")])
                .unwrap();
        let fields: Vec<_> = filter.predicates().iter().map(Predicate::field).collect();
        assert_eq!(
            fields,
            vec![LeadField::Email, LeadField::Status, LeadField::Score]
        );
    }
}
