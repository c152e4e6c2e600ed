use chrono::{DateTime, NaiveDate};
use serde::Serialize;
use serde_json::Value;

use crate::types::GENDERS;

/// One failed constraint on one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Declarative constraints evaluated over a JSON payload field.
#[derive(Debug, Clone, Copy)]
pub enum Constraint {
    Required,
    IsString,
    IsNumber,
    IsInteger,
    IsBoolean,
    IsDate,
    IsEmail,
    Positive,
    Min(f64),
    Max(f64),
    OneOf(&'static [&'static str]),
    /// Fixed-length array, reported as
    /// "Array at property `<field>` must contain exactly `<n>` elements".
    ArrayOfSize(usize),
    EachNumber,
    EachPositive,
}

pub struct FieldRules {
    pub field: &'static str,
    pub constraints: &'static [Constraint],
}

pub type RuleSet = &'static [FieldRules];

use Constraint::*;

pub const USERS_CREATE: RuleSet = &[
    FieldRules { field: "firstName", constraints: &[Required, IsString] },
    FieldRules { field: "lastName", constraints: &[Required, IsString] },
    FieldRules { field: "email", constraints: &[Required, IsEmail] },
    FieldRules { field: "birthDay", constraints: &[Required, IsDate] },
    FieldRules { field: "height", constraints: &[Required, IsInteger, Min(50.0), Max(270.0)] },
    FieldRules { field: "gender", constraints: &[Required, OneOf(&GENDERS)] },
    FieldRules { field: "password", constraints: &[Required, IsString] },
];

// email is deliberately absent: it is immutable and rejected upstream.
pub const USERS_UPDATE: RuleSet = &[
    FieldRules { field: "firstName", constraints: &[IsString] },
    FieldRules { field: "lastName", constraints: &[IsString] },
    FieldRules { field: "birthDay", constraints: &[IsDate] },
    FieldRules { field: "height", constraints: &[IsInteger, Min(50.0), Max(270.0)] },
    FieldRules { field: "gender", constraints: &[OneOf(&GENDERS)] },
    FieldRules { field: "password", constraints: &[IsString] },
    FieldRules { field: "status", constraints: &[IsBoolean] },
];

const MEASUREMENT_PAIR: &[Constraint] = &[Required, ArrayOfSize(2), EachNumber, EachPositive];
const MEASUREMENT_PAIR_OPT: &[Constraint] = &[ArrayOfSize(2), EachNumber, EachPositive];

pub const METRICS_CREATE: RuleSet = &[
    FieldRules { field: "weight", constraints: &[Required, IsNumber, Positive] },
    FieldRules { field: "armsCircumference", constraints: MEASUREMENT_PAIR },
    FieldRules { field: "forearmsCircumference", constraints: MEASUREMENT_PAIR },
    FieldRules { field: "wristsCircumference", constraints: MEASUREMENT_PAIR },
    FieldRules { field: "legsUpCircumference", constraints: MEASUREMENT_PAIR },
    FieldRules { field: "calfsCircumference", constraints: MEASUREMENT_PAIR },
    FieldRules { field: "waistCircumference", constraints: &[Required, IsNumber, Positive] },
    FieldRules { field: "hipCircumference", constraints: &[Required, IsNumber, Positive] },
    FieldRules { field: "bmi", constraints: &[IsNumber, Positive, Max(50.0)] },
    FieldRules { field: "bodyFatPercentage", constraints: &[IsNumber, Positive, Max(100.0)] },
    FieldRules { field: "muscleMass", constraints: &[IsNumber, Positive] },
];

pub const METRICS_UPDATE: RuleSet = &[
    FieldRules { field: "weight", constraints: &[IsNumber, Positive] },
    FieldRules { field: "armsCircumference", constraints: MEASUREMENT_PAIR_OPT },
    FieldRules { field: "forearmsCircumference", constraints: MEASUREMENT_PAIR_OPT },
    FieldRules { field: "wristsCircumference", constraints: MEASUREMENT_PAIR_OPT },
    FieldRules { field: "legsUpCircumference", constraints: MEASUREMENT_PAIR_OPT },
    FieldRules { field: "calfsCircumference", constraints: MEASUREMENT_PAIR_OPT },
    FieldRules { field: "waistCircumference", constraints: &[IsNumber, Positive] },
    FieldRules { field: "hipCircumference", constraints: &[IsNumber, Positive] },
    FieldRules { field: "bmi", constraints: &[IsNumber, Positive, Max(50.0)] },
    FieldRules { field: "bodyFatPercentage", constraints: &[IsNumber, Positive, Max(100.0)] },
    FieldRules { field: "muscleMass", constraints: &[IsNumber, Positive] },
];

/// Evaluate a rule table against a payload, accumulating every field
/// failure. Missing and `null` fields only fail `Required`; the other
/// constraints are skipped for them.
pub fn validate_payload(payload: &Value, rules: RuleSet) -> Result<(), Vec<FieldError>> {
    let mut errors = vec![];
    for rule in rules {
        let value = payload.get(rule.field).filter(|v| !v.is_null());
        match value {
            None => {
                if rule.constraints.iter().any(|c| matches!(c, Required)) {
                    errors.push(FieldError {
                        field: rule.field.to_string(),
                        message: format!("{} should not be empty", rule.field),
                    });
                }
            }
            Some(value) => {
                for constraint in rule.constraints {
                    if let Some(message) = check(rule.field, constraint, value) {
                        errors.push(FieldError {
                            field: rule.field.to_string(),
                            message,
                        });
                    }
                }
            }
        }
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check(field: &str, constraint: &Constraint, value: &Value) -> Option<String> {
    let failed = match constraint {
        Required => false,
        IsString => !value.is_string(),
        IsNumber => !value.is_number(),
        IsInteger => !is_integer(value),
        IsBoolean => !value.is_boolean(),
        IsDate => !value.as_str().map(is_date_string).unwrap_or(false),
        IsEmail => !value.as_str().map(is_email_shape).unwrap_or(false),
        Positive => !matches!(value.as_f64(), Some(n) if n > 0.0),
        Min(min) => !matches!(value.as_f64(), Some(n) if n >= *min),
        Max(max) => !matches!(value.as_f64(), Some(n) if n <= *max),
        OneOf(allowed) => !value
            .as_str()
            .map(|s| allowed.contains(&s))
            .unwrap_or(false),
        ArrayOfSize(size) => !matches!(value.as_array(), Some(arr) if arr.len() == *size),
        EachNumber => !each_element(value, Value::is_number),
        EachPositive => !each_element(value, |v| matches!(v.as_f64(), Some(n) if n > 0.0)),
    };
    failed.then(|| message_for(field, constraint))
}

fn message_for(field: &str, constraint: &Constraint) -> String {
    match constraint {
        Required => format!("{} should not be empty", field),
        IsString => format!("{} must be a string", field),
        IsNumber => format!("{} must be a number", field),
        IsInteger => format!("{} must be an integer number", field),
        IsBoolean => format!("{} must be a boolean value", field),
        IsDate => format!("{} must be a valid ISO 8601 date string", field),
        IsEmail => format!("{} must be an email", field),
        Positive => format!("{} must be a positive number", field),
        Min(min) => format!("{} must not be less than {}", field, fmt_bound(*min)),
        Max(max) => format!("{} must not be greater than {}", field, fmt_bound(*max)),
        OneOf(allowed) => format!(
            "{} must be one of the following values: {}",
            field,
            allowed.join(", ")
        ),
        ArrayOfSize(size) => format!(
            "Array at property {} must contain exactly {} elements",
            field, size
        ),
        EachNumber => format!("each value in {} must be a number", field),
        EachPositive => format!("each value in {} must be a positive number", field),
    }
}

fn fmt_bound(bound: f64) -> String {
    if bound.fract() == 0.0 {
        format!("{}", bound as i64)
    } else {
        format!("{}", bound)
    }
}

/// JSON has one number type, so `70.0` counts as an integer.
fn is_integer(value: &Value) -> bool {
    match value {
        Value::Number(n) => {
            n.as_i64().is_some()
                || n.as_u64().is_some()
                || n.as_f64().map(|f| f.fract() == 0.0).unwrap_or(false)
        }
        _ => false,
    }
}

fn is_date_string(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok() || NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

fn is_email_shape(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain.contains('.')
        && !s.contains(char::is_whitespace)
}

fn each_element(value: &Value, check: impl Fn(&Value) -> bool) -> bool {
    match value.as_array() {
        Some(arr) => arr.iter().all(check),
        None => false,
    }
}
