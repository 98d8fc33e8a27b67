//! Field Validator
//!
//! Each entity kind declares a table of [`FieldRule`]s. Validating a row walks
//! the table once, coercing every present value and collecting one
//! [`ImportError`] per failing field. Nothing here raises: a bad field never
//! stops the rest of the row or the rest of the file.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use fieldops_models::{normalize_token, EntityKind, ImportError};

use super::parser::{ParsedRow, ParsedTable};
use crate::error::{FieldOpsError, FieldOpsResult};

/// Separator for multi-value cells such as site or post lists.
pub const LIST_DELIMITER: char = ',';

pub const REQUIRED_MESSAGE: &str = "required field is missing";

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Date(NaiveDate),
    Time(NaiveTime),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    List(Vec<String>),
}

/// How a raw cell becomes a typed value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Coercion {
    Text { max_len: usize },
    Date,
    Time,
    Integer { min: i64, max: i64 },
    Decimal { min: f64 },
    Boolean,
    /// Membership in a closed vocabulary, matched on the normalized token.
    Enum(&'static [&'static str]),
    List,
}

pub type FieldCheck = fn(&FieldValue) -> Result<(), String>;

#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub column: &'static str,
    pub required: bool,
    pub coerce: Coercion,
    pub validate: Option<FieldCheck>,
}

impl FieldRule {
    pub const fn required(column: &'static str, coerce: Coercion) -> Self {
        Self {
            column,
            required: true,
            coerce,
            validate: None,
        }
    }

    pub const fn optional(column: &'static str, coerce: Coercion) -> Self {
        Self {
            column,
            required: false,
            coerce,
            validate: None,
        }
    }

    pub const fn with_check(mut self, check: FieldCheck) -> Self {
        self.validate = Some(check);
        self
    }
}

/// Declarative description of one import template.
#[derive(Debug)]
pub struct EntitySchema {
    pub kind: EntityKind,
    /// Column reported when the same natural key appears twice in a file.
    pub key_column: &'static str,
    pub fields: &'static [FieldRule],
}

impl EntitySchema {
    pub fn columns(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.column)
    }

    /// Canonical header line, in template order.
    pub fn template(&self) -> String {
        let mut header = self.columns().collect::<Vec<_>>().join(",");
        header.push('\n');
        header
    }

    /// Required columns must at least appear in the header.
    pub fn check_header(&self, table: &ParsedTable) -> FieldOpsResult<()> {
        let missing: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required && !table.has_column(f.column))
            .map(|f| f.column)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(FieldOpsError::parse(format!(
                "missing required column(s) for {}: {}",
                self.kind,
                missing.join(", ")
            )))
        }
    }

    pub fn validate_row(&self, row: &ParsedRow, errors: &mut Vec<ImportError>) -> FieldValues {
        let mut values = FieldValues::default();

        for rule in self.fields {
            let raw = row.get(rule.column).map(str::trim).filter(|v| !v.is_empty());

            let Some(raw) = raw else {
                if rule.required {
                    errors.push(ImportError::new(row.number, rule.column, REQUIRED_MESSAGE));
                }
                continue;
            };

            let checked = coerce(rule.coerce, raw).and_then(|value| match rule.validate {
                Some(check) => check(&value).map(|_| value),
                None => Ok(value),
            });

            match checked {
                Ok(value) => values.insert(rule.column, value),
                Err(message) => {
                    errors.push(ImportError::new(row.number, rule.column, message).with_value(raw));
                }
            }
        }

        values
    }
}

/// Coerced values of one row, keyed by canonical column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldValues {
    values: HashMap<&'static str, FieldValue>,
}

impl FieldValues {
    pub fn insert(&mut self, column: &'static str, value: FieldValue) {
        self.values.insert(column, value);
    }

    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.values.get(column)
    }

    pub fn text(&self, column: &str) -> Option<String> {
        match self.get(column)? {
            FieldValue::Text(value) => Some(value.clone()),
            _ => None,
        }
    }

    pub fn date(&self, column: &str) -> Option<NaiveDate> {
        match self.get(column)? {
            FieldValue::Date(value) => Some(*value),
            _ => None,
        }
    }

    pub fn time(&self, column: &str) -> Option<NaiveTime> {
        match self.get(column)? {
            FieldValue::Time(value) => Some(*value),
            _ => None,
        }
    }

    pub fn integer(&self, column: &str) -> Option<i64> {
        match self.get(column)? {
            FieldValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn decimal(&self, column: &str) -> Option<f64> {
        match self.get(column)? {
            FieldValue::Decimal(value) => Some(*value),
            _ => None,
        }
    }

    pub fn boolean(&self, column: &str) -> Option<bool> {
        match self.get(column)? {
            FieldValue::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn list(&self, column: &str) -> Vec<String> {
        match self.get(column) {
            Some(FieldValue::List(items)) => items.clone(),
            _ => Vec::new(),
        }
    }

    /// Typed vocabulary value of an enum column.
    pub fn parsed<T: FromStr>(&self, column: &str) -> Option<T> {
        self.text(column)?.parse().ok()
    }
}

pub fn coerce(coercion: Coercion, raw: &str) -> Result<FieldValue, String> {
    match coercion {
        Coercion::Text { max_len } => {
            let len = raw.chars().count();
            if len > max_len {
                Err(format!("value is {} characters long, maximum is {}", len, max_len))
            } else {
                Ok(FieldValue::Text(raw.to_string()))
            }
        }
        Coercion::Date => parse_date(raw)
            .map(FieldValue::Date)
            .ok_or_else(|| "invalid date, expected YYYY-MM-DD or DD/MM/YYYY".to_string()),
        Coercion::Time => parse_time(raw)
            .map(FieldValue::Time)
            .ok_or_else(|| "invalid time, expected HH:MM".to_string()),
        Coercion::Integer { min, max } => {
            let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
            let value: i64 = compact
                .parse()
                .map_err(|_| "invalid integer".to_string())?;
            if value < min || value > max {
                Err(format!("value must be between {} and {}", min, max))
            } else {
                Ok(FieldValue::Integer(value))
            }
        }
        Coercion::Decimal { min } => {
            let compact: String = raw
                .chars()
                .filter(|c| !c.is_whitespace())
                .map(|c| if c == ',' { '.' } else { c })
                .collect();
            let value: f64 = compact
                .parse()
                .map_err(|_| "invalid number".to_string())?;
            if !value.is_finite() {
                Err("invalid number".to_string())
            } else if value < min {
                Err(format!("value must be at least {}", min))
            } else {
                Ok(FieldValue::Decimal(value))
            }
        }
        Coercion::Boolean => parse_boolean(raw)
            .map(FieldValue::Boolean)
            .ok_or_else(|| "invalid boolean, expected oui or non".to_string()),
        Coercion::Enum(allowed) => {
            let token = normalize_token(raw);
            if allowed.contains(&token.as_str()) {
                Ok(FieldValue::Text(token))
            } else {
                Err(format!(
                    "'{}' is not an accepted value, expected one of: {}",
                    raw,
                    allowed.join(", ")
                ))
            }
        }
        Coercion::List => Ok(FieldValue::List(split_list(raw))),
    }
}

/// Split a multi-value cell: trimmed, blanks dropped, case-insensitive
/// duplicates removed keeping the first spelling.
pub fn split_list(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.split(LIST_DELIMITER)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .filter(|item| seen.insert(item.to_lowercase()))
        .map(str::to_string)
        .collect()
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%d/%m/%Y"))
        .ok()
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

fn parse_boolean(raw: &str) -> Option<bool> {
    match raw.to_lowercase().as_str() {
        "oui" | "o" | "vrai" | "true" | "yes" | "y" | "1" => Some(true),
        "non" | "n" | "faux" | "false" | "no" | "0" => Some(false),
        _ => None,
    }
}

/// Adapt a string validator to a [`FieldCheck`] on text values.
pub fn check_text(value: &FieldValue, check: fn(&str) -> FieldOpsResult<()>) -> Result<(), String> {
    match value {
        FieldValue::Text(text) => check(text).map_err(FieldOpsError::into_message),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    static FIELDS: &[FieldRule] = &[
        FieldRule::required("nom", Coercion::Text { max_len: 5 }),
        FieldRule::optional("debut", Coercion::Date),
        FieldRule::optional("duree", Coercion::Integer { min: 1, max: 60 }),
        FieldRule::optional("statut", Coercion::Enum(&["actif", "en_pause"])),
    ];

    static SCHEMA: EntitySchema = EntitySchema {
        kind: EntityKind::Clients,
        key_column: "nom",
        fields: FIELDS,
    };

    fn row(number: usize, pairs: &[(&str, &str)]) -> ParsedRow {
        ParsedRow {
            number,
            values: pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        }
    }

    #[test]
    fn test_errors_accumulate_per_field() {
        let mut errors = Vec::new();
        let values = SCHEMA.validate_row(
            &row(3, &[("nom", "  "), ("debut", "31/02/2024"), ("duree", "90"), ("statut", "En pause")]),
            &mut errors,
        );

        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["nom", "debut", "duree"]);
        assert!(errors.iter().all(|e| e.row == 3));
        assert_eq!(errors[0].message, REQUIRED_MESSAGE);
        assert_eq!(errors[0].value, None);
        assert_eq!(errors[1].value.as_deref(), Some("31/02/2024"));
        assert_eq!(values.text("statut").as_deref(), Some("en_pause"));
    }

    #[test]
    fn test_coercions() {
        assert_eq!(
            coerce(Coercion::Date, "05/03/2024"),
            Ok(FieldValue::Date(NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()))
        );
        assert_eq!(
            coerce(Coercion::Time, "08:30"),
            Ok(FieldValue::Time(NaiveTime::from_hms_opt(8, 30, 0).unwrap()))
        );
        assert_eq!(coerce(Coercion::Decimal { min: 0.0 }, "1 250,50"), Ok(FieldValue::Decimal(1250.5)));
        assert!(coerce(Coercion::Decimal { min: 0.0 }, "-3").is_err());
        assert_eq!(coerce(Coercion::Boolean, "OUI"), Ok(FieldValue::Boolean(true)));
        assert!(coerce(Coercion::Boolean, "peut-être").is_err());
        assert!(coerce(Coercion::Text { max_len: 3 }, "abcd").is_err());
    }

    #[test]
    fn test_missing_required_column_is_rejected() {
        let table = ParsedTable {
            headers: vec!["debut".to_string()],
            rows: Vec::new(),
        };
        let err = SCHEMA.check_header(&table).unwrap_err();
        assert!(matches!(err, FieldOpsError::Parse { .. }));
        assert!(err.to_string().contains("nom"));
    }

    #[test]
    fn test_template_follows_rule_order() {
        assert_eq!(SCHEMA.template(), "nom,debut,duree,statut\n");
    }

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list(" Technicien , chef d'équipe,,TECHNICIEN "),
            vec!["Technicien".to_string(), "chef d'équipe".to_string()]
        );
    }

    proptest! {
        #[test]
        fn prop_split_list_is_normalized(items in prop::collection::vec("[A-Za-z]{1,8}", 0..8)) {
            let joined = items.join(" , ");
            let list = split_list(&joined);

            let folded: HashSet<String> = list.iter().map(|i| i.to_lowercase()).collect();
            prop_assert_eq!(folded.len(), list.len());
            prop_assert!(list.iter().all(|i| !i.is_empty() && i.trim() == i));
            prop_assert_eq!(split_list(&list.join(",")), list);
        }
    }
}
