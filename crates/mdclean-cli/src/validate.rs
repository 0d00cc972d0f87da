//! Row validation
//!
//! [`Validator`] binds a [`RuleSet`] to an input header once, then classifies
//! each [`RawRecord`] as valid or rejected. Validation is pure: a bad row is
//! reported through its [`RejectReason`]s, never as an error.

use crate::error::{CliError, Result};
use crate::record::{CleanRecord, RawRecord, RejectReason, RejectedRecord, ValidationResult};
use crate::rules::{collapse_whitespace, Check, FieldRule, RuleSet};
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex is valid"));

/// Separator between key parts; cannot appear in CSV text fields by accident
const KEY_SEPARATOR: char = '\u{1f}';

/// Outcome of a single field check
enum FieldOutcome {
    Ok(String),
    Malformed,
    OutOfRange,
}

/// A check with its regex compiled
#[derive(Debug)]
enum CompiledCheck {
    Email,
    Pattern(Regex),
    Integer { min: Option<i64>, max: Option<i64> },
    Decimal { min: Option<f64>, max: Option<f64> },
    Date {
        formats: Vec<String>,
        min: Option<NaiveDate>,
        max: Option<NaiveDate>,
    },
    Boolean,
    OneOf(Vec<String>),
}

impl CompiledCheck {
    fn compile(field: &str, check: &Check) -> Result<Self> {
        Ok(match check {
            Check::Email => CompiledCheck::Email,
            Check::Pattern { regex } => CompiledCheck::Pattern(Regex::new(regex).map_err(|e| {
                CliError::invalid_rules(format!("field '{field}': bad pattern: {e}"))
            })?),
            Check::Integer { min, max } => CompiledCheck::Integer {
                min: *min,
                max: *max,
            },
            Check::Decimal { min, max } => CompiledCheck::Decimal {
                min: *min,
                max: *max,
            },
            Check::Date { formats, min, max } => CompiledCheck::Date {
                formats: formats.clone(),
                min: *min,
                max: *max,
            },
            Check::Boolean => CompiledCheck::Boolean,
            Check::OneOf { values } => CompiledCheck::OneOf(values.clone()),
        })
    }

    fn apply(&self, value: &str) -> FieldOutcome {
        match self {
            CompiledCheck::Email => accept_if(EMAIL_RE.is_match(value), value),
            CompiledCheck::Pattern(re) => accept_if(re.is_match(value), value),
            CompiledCheck::Integer { min, max } => match value.parse::<i64>() {
                Ok(n) if within(n, *min, *max) => FieldOutcome::Ok(n.to_string()),
                Ok(_) => FieldOutcome::OutOfRange,
                Err(_) => FieldOutcome::Malformed,
            },
            CompiledCheck::Decimal { min, max } => match value.parse::<f64>() {
                Ok(n) if !n.is_finite() => FieldOutcome::Malformed,
                Ok(n) if within(n, *min, *max) => FieldOutcome::Ok(value.to_string()),
                Ok(_) => FieldOutcome::OutOfRange,
                Err(_) => FieldOutcome::Malformed,
            },
            CompiledCheck::Date { formats, min, max } => match parse_date(value, formats) {
                Some(date) if within(date, *min, *max) => {
                    FieldOutcome::Ok(date.format("%Y-%m-%d").to_string())
                },
                Some(_) => FieldOutcome::OutOfRange,
                None => FieldOutcome::Malformed,
            },
            CompiledCheck::Boolean => match parse_bool(value) {
                Some(b) => FieldOutcome::Ok(b.to_string()),
                None => FieldOutcome::Malformed,
            },
            CompiledCheck::OneOf(values) => accept_if(values.iter().any(|v| v == value), value),
        }
    }
}

fn accept_if(ok: bool, value: &str) -> FieldOutcome {
    if ok {
        FieldOutcome::Ok(value.to_string())
    } else {
        FieldOutcome::Malformed
    }
}

fn within<T: PartialOrd>(value: T, min: Option<T>, max: Option<T>) -> bool {
    min.map_or(true, |min| value >= min) && max.map_or(true, |max| value <= max)
}

/// Parse with the first format that matches the whole value
pub fn parse_date(value: &str, formats: &[String]) -> Option<NaiveDate> {
    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
}

/// Accepts true/1/yes/y and false/0/no/n in any case
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "y" => Some(true),
        "false" | "0" | "no" | "n" => Some(false),
        _ => None,
    }
}

#[derive(Debug)]
struct BoundField {
    index: usize,
    rule: FieldRule,
    check: Option<CompiledCheck>,
}

/// Ruleset bound to a concrete header
#[derive(Debug)]
pub struct Validator {
    width: usize,
    fields: Vec<BoundField>,
    /// Key field names with their header positions
    keys: Vec<(String, usize)>,
    key_case_sensitive: bool,
}

impl Validator {
    /// Resolve rule columns against `header`
    ///
    /// Fails with [`CliError::MissingColumns`] if the header lacks any column
    /// the ruleset names.
    pub fn new(rules: &RuleSet, header: &[String], source: &str) -> Result<Self> {
        let missing = rules.missing_columns(header);
        if !missing.is_empty() {
            return Err(CliError::MissingColumns {
                path: source.to_string(),
                missing: missing.join(", "),
            });
        }

        let index_of = |name: &str| header.iter().position(|h| h == name).unwrap_or_default();

        let fields = rules
            .fields
            .iter()
            .map(|rule| {
                let check = rule
                    .check
                    .as_ref()
                    .map(|c| CompiledCheck::compile(&rule.name, c))
                    .transpose()?;
                Ok(BoundField {
                    index: index_of(&rule.name),
                    rule: rule.clone(),
                    check,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            width: header.len(),
            fields,
            keys: rules
                .key_fields
                .iter()
                .map(|k| (k.clone(), index_of(k)))
                .collect(),
            key_case_sensitive: rules.key_case_sensitive,
        })
    }

    /// Classify one record
    pub fn validate(&self, record: &RawRecord) -> ValidationResult {
        if record.ragged {
            return self.reject(record, vec![RejectReason::Malformed("row".to_string())]);
        }

        let mut values = record.values.clone();
        let mut reasons = Vec::new();

        for field in &self.fields {
            let value = field.rule.normalized(record.get(field.index));

            if value.is_empty() {
                if field.rule.required {
                    reasons.push(RejectReason::Missing(field.rule.name.clone()));
                }
                values[field.index] = value;
                continue;
            }

            values[field.index] = match field.check.as_ref().map(|c| c.apply(&value)) {
                None => value,
                Some(FieldOutcome::Ok(canonical)) => canonical,
                Some(FieldOutcome::Malformed) => {
                    reasons.push(RejectReason::Malformed(field.rule.name.clone()));
                    value
                },
                Some(FieldOutcome::OutOfRange) => {
                    reasons.push(RejectReason::OutOfRange(field.rule.name.clone()));
                    value
                },
            };
        }

        // Key fields are always required, whatever their field rule says
        for (name, index) in &self.keys {
            let missing = RejectReason::Missing(name.clone());
            if collapse_whitespace(&values[*index]).is_empty() && !reasons.contains(&missing) {
                reasons.push(missing);
            }
        }

        if !reasons.is_empty() {
            return self.reject(record, reasons);
        }

        let key = self.natural_key(&values);
        ValidationResult::Valid(CleanRecord {
            line: record.line,
            values,
            key,
        })
    }

    /// Validate a batch, preserving input order within each side
    pub fn partition(&self, records: &[RawRecord]) -> (Vec<CleanRecord>, Vec<RejectedRecord>) {
        let mut valid = Vec::new();
        let mut rejected = Vec::new();
        for record in records {
            match self.validate(record) {
                ValidationResult::Valid(clean) => valid.push(clean),
                ValidationResult::Rejected(reject) => rejected.push(reject),
            }
        }
        (valid, rejected)
    }

    /// Key fields, whitespace-collapsed and optionally lowercased
    pub fn natural_key(&self, values: &[String]) -> String {
        self.keys
            .iter()
            .map(|&(_, i)| {
                let part = collapse_whitespace(values.get(i).map(String::as_str).unwrap_or(""));
                if self.key_case_sensitive {
                    part
                } else {
                    part.to_lowercase()
                }
            })
            .collect::<Vec<_>>()
            .join(&KEY_SEPARATOR.to_string())
    }

    fn reject(&self, record: &RawRecord, reasons: Vec<RejectReason>) -> ValidationResult {
        let mut values = record.values.clone();
        values.resize(self.width, String::new());
        ValidationResult::Rejected(RejectedRecord {
            line: record.line,
            values,
            reasons,
        })
    }
}
