//! Schema-driven row validation.
//!
//! Every raw row gets a verdict; output preserves input order and count
//! exactly (row index is the caller's only handle on a row). Rows are
//! independent of each other, so the batch is validated in parallel and
//! collected back in order.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use serde_json::{Map, Number, Value};

use common::model::schema::{ColumnSpec, DataType};
use common::model::session::{RawRow, RowOutcome, RowRecord};

static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^https?://.+").expect("url regex"));

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Validates all rows against `schema`, 1:1 and order-preserving.
pub fn validate_rows(raw_rows: &[RawRow], schema: &[ColumnSpec]) -> Vec<RowRecord> {
    raw_rows
        .par_iter()
        .enumerate()
        .map(|(index, raw)| validate_row(index, raw, schema))
        .collect()
}

fn validate_row(row_index: usize, raw: &RawRow, schema: &[ColumnSpec]) -> RowRecord {
    let mut errors = Vec::new();
    let mut normalized = Map::new();

    for col in schema {
        let value = raw
            .get(col.key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty());

        match value {
            None => {
                if col.required {
                    errors.push(format!("{} is required", col.label));
                } else if let Some(default) = col.default {
                    // Defaults come from the schema itself and always coerce.
                    if let Ok(value) = coerce(col, default) {
                        normalized.insert(col.key.to_string(), value);
                    }
                }
            }
            Some(v) => match coerce(col, v) {
                Ok(value) => {
                    check_allowed(col, v, &mut errors);
                    check_bounds(col, &value, &mut errors);
                    normalized.insert(col.key.to_string(), value);
                }
                Err(message) => {
                    errors.push(message);
                    // Keep the raw string so nothing is silently dropped.
                    normalized.insert(col.key.to_string(), Value::String(v.to_string()));
                }
            },
        }
    }

    RowRecord {
        row_index,
        raw: raw.clone(),
        normalized,
        is_valid: errors.is_empty(),
        validation_errors: errors,
        outcome: RowOutcome::Pending,
    }
}

fn coerce(col: &ColumnSpec, value: &str) -> Result<Value, String> {
    match col.data_type {
        DataType::String => Ok(Value::String(value.to_string())),
        DataType::Number => value
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| format!("{} must be a number", col.label)),
        DataType::Date => parse_date(value)
            .map(Value::String)
            .ok_or_else(|| format!("{} must be a date in YYYY-MM-DD format", col.label)),
        DataType::Boolean => match value.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(Value::Bool(true)),
            "false" | "0" | "no" => Ok(Value::Bool(false)),
            _ => Err(format!("{} must be true or false", col.label)),
        },
        DataType::Url => {
            if URL_RE.is_match(value) {
                Ok(Value::String(value.to_string()))
            } else {
                Err(format!(
                    "{} must be a valid URL starting with http:// or https://",
                    col.label
                ))
            }
        }
        DataType::StringList => Ok(Value::Array(
            value
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| Value::String(s.to_string()))
                .collect(),
        )),
    }
}

/// Canonicalizes an accepted date to `YYYY-MM-DD`.
fn parse_date(value: &str) -> Option<String> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .map(|date| date.format("%Y-%m-%d").to_string())
}

fn check_allowed(col: &ColumnSpec, value: &str, errors: &mut Vec<String>) {
    if let Some(allowed) = col.allowed {
        if !allowed.contains(&value) {
            errors.push(format!(
                "invalid value '{}' for {}; allowed values: {}",
                value,
                col.label,
                allowed.join(", ")
            ));
        }
    }
}

fn check_bounds(col: &ColumnSpec, value: &Value, errors: &mut Vec<String>) {
    let Some(number) = value.as_f64() else {
        return;
    };
    if let Some(bound) = col.gt {
        if number <= bound {
            errors.push(format!(
                "{} must be greater than {}",
                col.label,
                fmt_bound(bound)
            ));
        }
    }
    if let Some(bound) = col.min {
        if number < bound {
            errors.push(format!("{} must be at least {}", col.label, fmt_bound(bound)));
        }
    }
    if let Some(bound) = col.max {
        if number > bound {
            errors.push(format!("{} must be at most {}", col.label, fmt_bound(bound)));
        }
    }
}

fn fmt_bound(bound: f64) -> String {
    if bound.fract() == 0.0 {
        format!("{}", bound as i64)
    } else {
        bound.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::model::schema::campaign_schema;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn complete_row(name: &str) -> RawRow {
        row(&[
            ("campaign_name", name),
            ("objective", "SALES"),
            ("budget_type", "DAILY"),
            ("budget", "1000"),
            ("bid_strategy", "LOWEST_COST"),
            ("start_date", "2024-01-01"),
            ("adset_name", "Set A"),
            ("ad_name", "Ad A"),
            ("headline", "Headline"),
            ("description", "Description"),
            ("website_url", "https://example.com"),
            ("image_url", "https://example.com/a.jpg"),
        ])
    }

    #[test]
    fn complete_rows_are_valid() {
        let records = validate_rows(&[complete_row("Alpha")], campaign_schema());
        assert!(records[0].is_valid, "errors: {:?}", records[0].validation_errors);
        assert!(records[0].outcome.is_pending());
    }

    #[test]
    fn output_is_one_to_one_and_in_order() {
        let rows: Vec<RawRow> = (0..5).map(|i| complete_row(&format!("c{i}"))).collect();
        let records = validate_rows(&rows, campaign_schema());
        assert_eq!(records.len(), 5);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.row_index, i);
            assert_eq!(
                record.raw.get("campaign_name").unwrap(),
                &format!("c{i}")
            );
        }
    }

    #[test]
    fn missing_required_field_names_the_label() {
        let mut raw = complete_row("Alpha");
        raw.shift_remove("budget");
        let records = validate_rows(&[raw], campaign_schema());
        assert!(!records[0].is_valid);
        assert!(records[0]
            .validation_errors
            .contains(&"Budget is required".to_string()));
    }

    #[test]
    fn blank_value_counts_as_missing() {
        let mut raw = complete_row("Alpha");
        raw.insert("headline".into(), "   ".into());
        let records = validate_rows(&[raw], campaign_schema());
        assert!(records[0]
            .validation_errors
            .contains(&"Headline is required".to_string()));
    }

    #[test]
    fn one_invalid_row_does_not_taint_siblings() {
        let mut bad = complete_row("Bad");
        bad.shift_remove("campaign_name");
        let rows = vec![complete_row("A"), bad, complete_row("B")];
        let records = validate_rows(&rows, campaign_schema());
        assert_eq!(
            records.iter().map(|r| r.is_valid).collect::<Vec<_>>(),
            vec![true, false, true]
        );
    }

    #[test]
    fn enum_violation_names_value_and_allowed_set() {
        let mut raw = complete_row("Alpha");
        raw.insert("objective".into(), "WORLD_DOMINATION".into());
        let records = validate_rows(&[raw], campaign_schema());
        let message = &records[0].validation_errors[0];
        assert!(message.contains("WORLD_DOMINATION"), "{message}");
        assert!(message.contains("SALES"), "{message}");
    }

    #[test]
    fn bad_number_keeps_raw_string_in_normalized() {
        let mut raw = complete_row("Alpha");
        raw.insert("budget".into(), "lots".into());
        let records = validate_rows(&[raw], campaign_schema());
        assert!(!records[0].is_valid);
        assert_eq!(records[0].normalized["budget"], Value::String("lots".into()));
        assert!(records[0]
            .validation_errors
            .contains(&"Budget must be a number".to_string()));
    }

    #[test]
    fn budget_must_be_positive() {
        let mut raw = complete_row("Alpha");
        raw.insert("budget".into(), "0".into());
        let records = validate_rows(&[raw], campaign_schema());
        assert!(records[0]
            .validation_errors
            .contains(&"Budget must be greater than 0".to_string()));
    }

    #[test]
    fn age_bounds_are_schema_driven() {
        let mut raw = complete_row("Alpha");
        raw.insert("age_min".into(), "12".into());
        raw.insert("age_max".into(), "70".into());
        let records = validate_rows(&[raw], campaign_schema());
        assert!(records[0]
            .validation_errors
            .contains(&"Minimum age must be at least 13".to_string()));
        assert!(records[0]
            .validation_errors
            .contains(&"Maximum age must be at most 65".to_string()));
    }

    #[test]
    fn dates_are_canonicalized() {
        let mut raw = complete_row("Alpha");
        raw.insert("start_date".into(), "2024/03/05".into());
        let records = validate_rows(&[raw], campaign_schema());
        assert!(records[0].is_valid);
        assert_eq!(
            records[0].normalized["start_date"],
            Value::String("2024-03-05".into())
        );
    }

    #[test]
    fn bad_url_is_rejected() {
        let mut raw = complete_row("Alpha");
        raw.insert("website_url".into(), "example.com".into());
        let records = validate_rows(&[raw], campaign_schema());
        assert!(!records[0].is_valid);
    }

    #[test]
    fn string_lists_split_on_commas() {
        let mut raw = complete_row("Alpha");
        raw.insert("locations".into(), "JP, US,,DE".into());
        let records = validate_rows(&[raw], campaign_schema());
        assert_eq!(
            records[0].normalized["locations"],
            serde_json::json!(["JP", "US", "DE"])
        );
    }

    #[test]
    fn defaultable_optionals_are_filled_in_silently() {
        let records = validate_rows(&[complete_row("Alpha")], campaign_schema());
        let normalized = &records[0].normalized;
        assert_eq!(normalized["age_min"], serde_json::json!(13.0));
        assert_eq!(normalized["age_max"], serde_json::json!(65.0));
        assert_eq!(normalized["gender"], Value::String("all".into()));
        assert_eq!(normalized["attribution_window"], Value::String("click_7d".into()));
        assert_eq!(normalized["campaign_status"], Value::String("PAUSED".into()));
        assert!(records[0].is_valid);
    }

    #[test]
    fn optionals_without_default_stay_absent() {
        let records = validate_rows(&[complete_row("Alpha")], campaign_schema());
        assert!(!records[0].normalized.contains_key("end_date"));
        assert!(!records[0].normalized.contains_key("notes"));
    }

    #[test]
    fn unknown_extra_columns_do_not_invalidate() {
        let mut raw = complete_row("Alpha");
        raw.insert("mystery_column".into(), "whatever".into());
        let records = validate_rows(&[raw], campaign_schema());
        assert!(records[0].is_valid);
        assert!(!records[0].normalized.contains_key("mystery_column"));
        assert_eq!(records[0].raw.get("mystery_column").unwrap(), "whatever");
    }

    #[test]
    fn validation_is_deterministic() {
        let mut raw = complete_row("Alpha");
        raw.insert("budget".into(), "-5".into());
        let first = validate_rows(std::slice::from_ref(&raw), campaign_schema());
        let second = validate_rows(std::slice::from_ref(&raw), campaign_schema());
        assert_eq!(first[0].is_valid, second[0].is_valid);
        assert_eq!(first[0].validation_errors, second[0].validation_errors);
    }

    #[test]
    fn scenario_three_rows_one_missing_required() {
        let mut middle = complete_row("Beta");
        middle.shift_remove("website_url");
        let rows = vec![complete_row("Alpha"), middle, complete_row("Gamma")];
        let records = validate_rows(&rows, campaign_schema());

        assert_eq!(records.len(), 3);
        assert!(records[0].is_valid);
        assert!(!records[1].is_valid);
        assert!(records[2].is_valid);
        assert_eq!(
            records[1].validation_errors,
            vec!["Website URL is required".to_string()]
        );
    }
}
