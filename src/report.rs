//! Turns `validate_all_fields` result rows into per-record failures.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::{
    builder::{ErrorKind, FieldCheck},
    executor::Row,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub column: String,
    pub kind: ErrorKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordFailure {
    /// Staging record id, which is the CSV data row number.
    pub record_id: Value,
    pub errors: Vec<FieldError>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    failures: Vec<RecordFailure>,
}

impl ValidationReport {
    /// Reads the `<column>_<kind>` flag of every check from each row. Errors
    /// keep the order of `checks`, which is schema order; result columns that
    /// are not check aliases are ignored, as are rows with no flag set.
    pub fn from_rows(rows: &[Row], record_id: &str, checks: &[FieldCheck]) -> Self {
        let aliases = checks.iter().map(FieldCheck::alias).collect::<Vec<_>>();
        let mut failures = Vec::new();
        for row in rows {
            let errors = checks
                .iter()
                .zip(&aliases)
                .filter(|(_, alias)| row.get(alias.as_str()).is_some_and(is_set))
                .map(|(check, _)| FieldError {
                    column: check.column.clone(),
                    kind: check.kind,
                })
                .collect::<Vec<_>>();
            if errors.is_empty() {
                continue;
            }
            failures.push(RecordFailure {
                record_id: row.get(record_id).cloned().unwrap_or(Value::Null),
                errors,
            });
        }
        Self { failures }
    }

    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[RecordFailure] {
        &self.failures
    }

    pub fn error_count(&self) -> usize {
        self.failures.iter().map(|failure| failure.errors.len()).sum()
    }

    /// Number of failures per `<column>_<kind>` alias.
    pub fn counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for error in self.failures.iter().flat_map(|failure| &failure.errors) {
            *counts
                .entry(format!("{}_{}", error.column, error.kind))
                .or_insert(0) += 1;
        }
        counts
    }
}

fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().is_some_and(|n| n != 0.0),
        Value::String(text) => !(text.is_empty() || text == "0"),
        Value::Array(_) | Value::Object(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn row(value: Value) -> Row {
        value.as_object().cloned().expect("object row")
    }

    fn check(column: &str, kind: ErrorKind) -> FieldCheck {
        FieldCheck {
            column: column.to_string(),
            kind,
            expression: String::new(),
        }
    }

    fn checks() -> Vec<FieldCheck> {
        vec![
            check("productName", ErrorKind::MaxLength),
            check("productName", ErrorKind::Required),
            check("price", ErrorKind::MaxLength),
            check("price", ErrorKind::NotInteger),
        ]
    }

    #[test]
    fn set_flags_become_field_errors_in_check_order() {
        let rows = vec![
            row(json!({
                "id": 2,
                "price_maxlength": 0,
                "price_notinteger": 1,
                "productName_required": "1",
                "unrelated_required": 1,
            })),
            row(json!({"id": "5", "price_maxlength": "0", "price_notinteger": null})),
        ];
        let report = ValidationReport::from_rows(&rows, "id", &checks());
        assert!(!report.is_valid());
        assert_eq!(report.failures().len(), 1);
        let failure = &report.failures()[0];
        assert_eq!(failure.record_id, json!(2));
        assert_eq!(
            failure.errors,
            vec![
                FieldError {
                    column: "productName".to_string(),
                    kind: ErrorKind::Required
                },
                FieldError {
                    column: "price".to_string(),
                    kind: ErrorKind::NotInteger
                },
            ]
        );
        assert_eq!(report.error_count(), 2);
        assert_eq!(report.counts().get("price_notinteger"), Some(&1));
    }

    #[test]
    fn empty_result_is_valid() {
        let report = ValidationReport::from_rows(&[], "id", &checks());
        assert!(report.is_valid());
        assert!(report.counts().is_empty());
    }
}
