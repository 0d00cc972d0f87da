//! Validation ruleset
//!
//! Which fields are required, how values are normalized, what format or range
//! each field must satisfy, and which fields form the natural key. Loaded from
//! a TOML file, or [`RuleSet::default`] when none is given.
//!
//! ```toml
//! key_fields = ["id"]
//!
//! [[fields]]
//! name = "email"
//! required = true
//! normalize = ["trim", "lowercase"]
//! check = { type = "email" }
//!
//! [[fields]]
//! name = "age"
//! check = { type = "integer", min = 16, max = 99 }
//! ```

use crate::error::{CliError, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Date formats tried in order; day-first before month-first
pub const DEFAULT_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y", "%Y/%m/%d"];

/// Value transformation applied before checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalize {
    Trim,
    /// Runs of whitespace become a single space
    CollapseWhitespace,
    Lowercase,
    Uppercase,
}

impl Normalize {
    pub fn apply(self, value: &str) -> String {
        match self {
            Normalize::Trim => value.trim().to_string(),
            Normalize::CollapseWhitespace => collapse_whitespace(value),
            Normalize::Lowercase => value.to_lowercase(),
            Normalize::Uppercase => value.to_uppercase(),
        }
    }
}

/// Trim and squeeze internal whitespace
pub fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Format or range check for a non-empty value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Check {
    Email,
    Pattern {
        regex: String,
    },
    Integer {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<i64>,
    },
    Decimal {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    /// Parsed with the first matching format, emitted as `YYYY-MM-DD`
    Date {
        #[serde(default = "default_date_formats")]
        formats: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<NaiveDate>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<NaiveDate>,
    },
    /// true/1/yes/y and false/0/no/n, emitted as `true`/`false`
    Boolean,
    OneOf {
        values: Vec<String>,
    },
}

fn default_date_formats() -> Vec<String> {
    DEFAULT_DATE_FORMATS.iter().map(|f| f.to_string()).collect()
}

fn default_normalize() -> Vec<Normalize> {
    vec![Normalize::Trim]
}

fn default_key_fields() -> Vec<String> {
    vec!["id".to_string()]
}

/// Rule for a single column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRule {
    pub name: String,

    #[serde(default)]
    pub required: bool,

    #[serde(default = "default_normalize")]
    pub normalize: Vec<Normalize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<Check>,
}

impl FieldRule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
            normalize: default_normalize(),
            check: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn normalize(mut self, steps: impl Into<Vec<Normalize>>) -> Self {
        self.normalize = steps.into();
        self
    }

    pub fn check(mut self, check: Check) -> Self {
        self.check = Some(check);
        self
    }

    /// Apply the normalization steps in order
    pub fn normalized(&self, value: &str) -> String {
        self.normalize
            .iter()
            .fold(value.to_string(), |acc, step| step.apply(&acc))
    }
}

/// Complete validation and deduplication configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    /// Fields forming the natural key, in order
    #[serde(default = "default_key_fields")]
    pub key_fields: Vec<String>,

    /// Compare key values case-sensitively
    #[serde(default)]
    pub key_case_sensitive: bool,

    #[serde(default)]
    pub fields: Vec<FieldRule>,
}

impl Default for RuleSet {
    /// Employee master data: every column required, keyed on `id`
    fn default() -> Self {
        Self {
            key_fields: default_key_fields(),
            key_case_sensitive: false,
            fields: vec![
                FieldRule::new("id").required(),
                FieldRule::new("name")
                    .required()
                    .normalize([Normalize::CollapseWhitespace]),
                FieldRule::new("email").required().check(Check::Email),
                FieldRule::new("role").required(),
                FieldRule::new("start_date").required().check(Check::Date {
                    formats: default_date_formats(),
                    min: None,
                    max: None,
                }),
                FieldRule::new("active").required().check(Check::Boolean),
            ],
        }
    }
}

impl RuleSet {
    /// Parse and validate a TOML ruleset
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let rules: RuleSet = toml::from_str(content)?;
        rules.validate()?;
        Ok(rules)
    }

    /// Load and validate a TOML rules file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| CliError::RulesFile {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Load from `path`, or fall back to the built-in rules
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.key_fields.is_empty() {
            return Err(CliError::invalid_rules("key_fields must name at least one field"));
        }

        let mut seen = HashSet::new();
        for rule in &self.fields {
            if rule.name.trim().is_empty() {
                return Err(CliError::invalid_rules("field rule with empty name"));
            }
            if !seen.insert(rule.name.as_str()) {
                return Err(CliError::invalid_rules(format!(
                    "field '{}' is declared more than once",
                    rule.name
                )));
            }
            if let Some(check) = &rule.check {
                validate_check(&rule.name, check)?;
            }
        }

        Ok(())
    }

    /// Columns the ruleset references, in first-mention order
    pub fn referenced_columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = Vec::new();
        for name in self
            .fields
            .iter()
            .map(|r| r.name.as_str())
            .chain(self.key_fields.iter().map(String::as_str))
        {
            if !columns.contains(&name) {
                columns.push(name);
            }
        }
        columns
    }

    /// Referenced columns absent from `header`
    pub fn missing_columns(&self, header: &[String]) -> Vec<String> {
        self.referenced_columns()
            .into_iter()
            .filter(|name| !header.iter().any(|h| h == name))
            .map(str::to_string)
            .collect()
    }
}

fn validate_check(field: &str, check: &Check) -> Result<()> {
    let bad_range = || CliError::invalid_rules(format!("field '{field}': min is greater than max"));

    match check {
        Check::Pattern { regex } => {
            regex::Regex::new(regex).map_err(|e| {
                CliError::invalid_rules(format!("field '{field}': bad pattern: {e}"))
            })?;
        },
        Check::Integer {
            min: Some(min),
            max: Some(max),
        } if min > max => return Err(bad_range()),
        Check::Decimal {
            min: Some(min),
            max: Some(max),
        } if min > max => return Err(bad_range()),
        Check::Date { formats, min, max } => {
            if formats.is_empty() {
                return Err(CliError::invalid_rules(format!(
                    "field '{field}': date check needs at least one format"
                )));
            }
            if let (Some(min), Some(max)) = (min, max) {
                if min > max {
                    return Err(bad_range());
                }
            }
        },
        Check::OneOf { values } if values.is_empty() => {
            return Err(CliError::invalid_rules(format!(
                "field '{field}': one_of needs at least one value"
            )));
        },
        _ => {},
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules_cover_employee_columns() {
        let rules = RuleSet::default();
        assert_eq!(
            rules.referenced_columns(),
            vec!["id", "name", "email", "role", "start_date", "active"]
        );
        assert!(rules.fields.iter().all(|f| f.required));
        assert!(rules.validate().is_ok());
    }

    #[test]
    fn test_parse_toml_rules() {
        let rules = RuleSet::from_toml_str(
            r#"
            key_fields = ["email"]

            [[fields]]
            name = "email"
            required = true
            normalize = ["trim", "lowercase"]
            check = { type = "email" }

            [[fields]]
            name = "age"
            check = { type = "integer", min = 16, max = 99 }

            [[fields]]
            name = "hired"
            check = { type = "date", min = "2000-01-01" }
            "#,
        )
        .unwrap();

        assert_eq!(rules.key_fields, vec!["email"]);
        assert!(!rules.key_case_sensitive);
        assert_eq!(rules.fields[0].normalize, vec![Normalize::Trim, Normalize::Lowercase]);
        assert_eq!(
            rules.fields[1].check,
            Some(Check::Integer {
                min: Some(16),
                max: Some(99)
            })
        );
        // Omitted normalize falls back to trim
        assert_eq!(rules.fields[1].normalize, vec![Normalize::Trim]);
        match &rules.fields[2].check {
            Some(Check::Date { formats, min, max }) => {
                assert_eq!(formats.len(), DEFAULT_DATE_FORMATS.len());
                assert_eq!(*min, NaiveDate::from_ymd_opt(2000, 1, 1));
                assert!(max.is_none());
            },
            other => panic!("unexpected check: {other:?}"),
        }
    }

    #[test]
    fn test_key_fields_default_to_id() {
        let rules = RuleSet::from_toml_str("[[fields]]\nname = \"name\"\n").unwrap();
        assert_eq!(rules.key_fields, vec!["id"]);
    }

    #[test]
    fn test_rejects_duplicate_fields() {
        let err = RuleSet::from_toml_str(
            "[[fields]]\nname = \"id\"\n\n[[fields]]\nname = \"id\"\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_rejects_bad_pattern_and_range() {
        let bad_regex = r#"
            [[fields]]
            name = "zip"
            check = { type = "pattern", regex = "([0-9" }
        "#;
        assert!(matches!(
            RuleSet::from_toml_str(bad_regex),
            Err(CliError::InvalidRules(_))
        ));

        let bad_range = r#"
            [[fields]]
            name = "age"
            check = { type = "integer", min = 10, max = 1 }
        "#;
        assert!(RuleSet::from_toml_str(bad_range)
            .unwrap_err()
            .to_string()
            .contains("min is greater than max"));
    }

    #[test]
    fn test_rejects_empty_key_fields() {
        assert!(RuleSet::from_toml_str("key_fields = []\n").is_err());
    }

    #[test]
    fn test_unknown_check_type_is_parse_error() {
        let err = RuleSet::from_toml_str(
            "[[fields]]\nname = \"x\"\ncheck = { type = \"uuid\" }\n",
        )
        .unwrap_err();
        assert!(matches!(err, CliError::TomlParse(_)));
    }

    #[test]
    fn test_missing_columns() {
        let header: Vec<String> = ["id", "name", "email"].iter().map(|s| s.to_string()).collect();
        assert_eq!(
            RuleSet::default().missing_columns(&header),
            vec!["role", "start_date", "active"]
        );
    }

    #[test]
    fn test_toml_round_trip_of_defaults() {
        let rules = RuleSet::default();
        let rendered = rules.to_toml().unwrap();
        assert!(rendered.contains("key_fields"));
        assert_eq!(RuleSet::from_toml_str(&rendered).unwrap(), rules);
    }

    #[test]
    fn test_normalization_order() {
        let rule = FieldRule::new("name").normalize([Normalize::CollapseWhitespace, Normalize::Uppercase]);
        assert_eq!(rule.normalized("  ada   lovelace "), "ADA LOVELACE");
        assert_eq!(collapse_whitespace("a \t b\n c"), "a b c");
    }

    #[test]
    fn test_load_falls_back_to_default() {
        assert_eq!(RuleSet::load(None).unwrap(), RuleSet::default());
        assert!(matches!(
            RuleSet::load(Some(Path::new("/no/such/rules.toml"))),
            Err(CliError::RulesFile { .. })
        ));
    }

    #[test]
    fn test_products_demo_rules_parse() {
        let rules = RuleSet::from_toml_str(include_str!("../../../demos/products_rules.toml")).unwrap();
        assert_eq!(rules.key_fields, vec!["sku", "plant"]);
        assert_eq!(rules.fields[0].normalized(" abc-0001 "), "ABC-0001");
        assert!(matches!(
            rules.fields[4].check,
            Some(Check::Date { ref formats, min: Some(_), .. }) if formats.len() == DEFAULT_DATE_FORMATS.len()
        ));
    }
}
