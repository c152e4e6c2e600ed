use serde_json::Value;

use super::error::FilterError;
use super::types::FilterOp;

/// Parsed WHERE tree of a Mongo-style filter document.
///
/// Parsed once, rendered two ways: `to_sql` emits JSONB predicates for the
/// Postgres store, `matches` evaluates the same conditions against an
/// in-memory document. WHERE fields address document fields only; record ids
/// go through the by-id store operations.
#[derive(Debug, Clone)]
pub struct FilterWhere {
    conditions: Vec<Condition>,
}

#[derive(Debug, Clone)]
enum Condition {
    Compare {
        path: Vec<String>,
        op: FilterOp,
        value: Value,
    },
    In {
        path: Vec<String>,
        values: Vec<Value>,
    },
    And(Vec<FilterWhere>),
    Or(Vec<FilterWhere>),
}

impl FilterWhere {
    pub fn empty() -> Self {
        Self { conditions: vec![] }
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn parse(where_data: &Value) -> Result<Self, FilterError> {
        let obj = match where_data {
            Value::Null => return Ok(Self::empty()),
            Value::Object(obj) => obj,
            _ => {
                return Err(FilterError::InvalidWhereClause(
                    "WHERE must be an object".to_string(),
                ))
            }
        };

        let mut conditions = vec![];
        for (key, value) in obj {
            if key.starts_with('$') {
                conditions.push(Self::parse_logical(key, value)?);
            } else {
                Self::parse_field(key, value, &mut conditions)?;
            }
        }
        Ok(Self { conditions })
    }

    fn parse_logical(op: &str, value: &Value) -> Result<Condition, FilterError> {
        match op {
            "$and" | "$or" => {
                let arr = value.as_array().ok_or_else(|| {
                    FilterError::InvalidOperatorData(format!("{} requires an array", op))
                })?;
                if arr.is_empty() {
                    return Err(FilterError::InvalidOperatorData(format!(
                        "{} requires a non-empty array",
                        op
                    )));
                }
                let subs = arr.iter().map(Self::parse).collect::<Result<Vec<_>, _>>()?;
                Ok(if op == "$and" {
                    Condition::And(subs)
                } else {
                    Condition::Or(subs)
                })
            }
            other => Err(FilterError::UnsupportedOperator(other.to_string())),
        }
    }

    fn parse_field(
        field: &str,
        value: &Value,
        conditions: &mut Vec<Condition>,
    ) -> Result<(), FilterError> {
        let path = parse_field_path(field)?;

        // An object whose keys are operators expands to one condition per
        // operator; any other value is an implicit equality match.
        if let Value::Object(obj) = value {
            if obj.keys().any(|k| k.starts_with('$')) {
                for (op_key, op_val) in obj {
                    match op_key.as_str() {
                        "$in" => {
                            let values = op_val.as_array().ok_or_else(|| {
                                FilterError::InvalidOperatorData(
                                    "$in requires an array".to_string(),
                                )
                            })?;
                            conditions.push(Condition::In {
                                path: path.clone(),
                                values: values.clone(),
                            });
                        }
                        other => {
                            let op = map_operator(other)?;
                            conditions.push(Condition::Compare {
                                path: path.clone(),
                                op,
                                value: op_val.clone(),
                            });
                        }
                    }
                }
                return Ok(());
            }
        }

        conditions.push(Condition::Compare {
            path,
            op: FilterOp::Eq,
            value: value.clone(),
        });
        Ok(())
    }

    /// Render to a SQL predicate over the `doc` JSONB column.
    ///
    /// `starting_param_index` is the number of placeholders already consumed
    /// by the surrounding query; every produced parameter binds as jsonb.
    pub fn to_sql(&self, starting_param_index: usize) -> Result<(String, Vec<Value>), FilterError> {
        let mut params = vec![];
        let sql = self.render(&mut params, starting_param_index)?;
        Ok((sql, params))
    }

    fn render(
        &self,
        params: &mut Vec<Value>,
        base: usize,
    ) -> Result<String, FilterError> {
        if self.conditions.is_empty() {
            return Ok("1=1".to_string());
        }
        let parts = self
            .conditions
            .iter()
            .map(|c| Self::render_condition(c, params, base))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(parts.join(" AND "))
    }

    fn render_condition(
        condition: &Condition,
        params: &mut Vec<Value>,
        base: usize,
    ) -> Result<String, FilterError> {
        match condition {
            Condition::Compare { path, op, value } => {
                let accessor = doc_accessor(path);
                Ok(match op {
                    FilterOp::Eq => {
                        if value.is_null() {
                            format!("({a} IS NULL OR {a} = 'null'::jsonb)", a = accessor)
                        } else {
                            format!("{} = {}", accessor, push_param(params, base, value.clone()))
                        }
                    }
                    FilterOp::Ne => {
                        if value.is_null() {
                            format!("({a} IS NOT NULL AND {a} <> 'null'::jsonb)", a = accessor)
                        } else {
                            // Absent fields count as "not equal", like the
                            // document databases this mirrors.
                            format!(
                                "({a} IS NULL OR {a} <> {p})",
                                a = accessor,
                                p = push_param(params, base, value.clone())
                            )
                        }
                    }
                    FilterOp::Gt => format!("{} > {}", accessor, push_param(params, base, value.clone())),
                    FilterOp::Gte => format!("{} >= {}", accessor, push_param(params, base, value.clone())),
                    FilterOp::Lt => format!("{} < {}", accessor, push_param(params, base, value.clone())),
                    FilterOp::Lte => format!("{} <= {}", accessor, push_param(params, base, value.clone())),
                    FilterOp::In => unreachable!("$in parses to Condition::In"),
                })
            }
            Condition::In { path, values } => {
                if values.is_empty() {
                    return Ok("1=0".to_string());
                }
                let accessor = doc_accessor(path);
                let mut null_match = false;
                let mut placeholders = vec![];
                for v in values {
                    if v.is_null() {
                        null_match = true;
                    } else {
                        placeholders.push(push_param(params, base, v.clone()));
                    }
                }
                let in_clause = if placeholders.is_empty() {
                    "1=0".to_string()
                } else {
                    format!("{} IN ({})", accessor, placeholders.join(", "))
                };
                Ok(if null_match {
                    format!(
                        "({a} IS NULL OR {a} = 'null'::jsonb OR {in_clause})",
                        a = accessor,
                        in_clause = in_clause
                    )
                } else {
                    in_clause
                })
            }
            Condition::And(subs) => {
                let parts = subs
                    .iter()
                    .map(|s| s.render(params, base))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(format!("({})", parts.join(" AND ")))
            }
            Condition::Or(subs) => {
                let parts = subs
                    .iter()
                    .map(|s| s.render(params, base))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(format!("({})", parts.join(" OR ")))
            }
        }
    }

    /// Evaluate against an in-memory document. Must agree with `to_sql` for
    /// same-typed values.
    pub fn matches(&self, doc: &Value) -> bool {
        self.conditions.iter().all(|c| Self::condition_matches(c, doc))
    }

    fn condition_matches(condition: &Condition, doc: &Value) -> bool {
        match condition {
            Condition::Compare { path, op, value } => {
                let target = resolve_path(doc, path);
                match op {
                    FilterOp::Eq => {
                        if value.is_null() {
                            is_nullish(target)
                        } else {
                            target.map(|t| json_eq(t, value)).unwrap_or(false)
                        }
                    }
                    FilterOp::Ne => {
                        if value.is_null() {
                            !is_nullish(target)
                        } else {
                            !target.map(|t| json_eq(t, value)).unwrap_or(false)
                        }
                    }
                    FilterOp::Gt => cmp_matches(target, value, |o| o == std::cmp::Ordering::Greater),
                    FilterOp::Gte => cmp_matches(target, value, |o| o != std::cmp::Ordering::Less),
                    FilterOp::Lt => cmp_matches(target, value, |o| o == std::cmp::Ordering::Less),
                    FilterOp::Lte => cmp_matches(target, value, |o| o != std::cmp::Ordering::Greater),
                    FilterOp::In => unreachable!("$in parses to Condition::In"),
                }
            }
            Condition::In { path, values } => {
                let target = resolve_path(doc, path);
                values.iter().any(|v| {
                    if v.is_null() {
                        is_nullish(target)
                    } else {
                        target.map(|t| json_eq(t, v)).unwrap_or(false)
                    }
                })
            }
            Condition::And(subs) => subs.iter().all(|s| s.matches(doc)),
            Condition::Or(subs) => subs.iter().any(|s| s.matches(doc)),
        }
    }
}

fn map_operator(op_key: &str) -> Result<FilterOp, FilterError> {
    Ok(match op_key {
        "$eq" => FilterOp::Eq,
        "$ne" => FilterOp::Ne,
        "$gt" => FilterOp::Gt,
        "$gte" => FilterOp::Gte,
        "$lt" => FilterOp::Lt,
        "$lte" => FilterOp::Lte,
        other => return Err(FilterError::UnsupportedOperator(other.to_string())),
    })
}

/// Split a dotted field into validated path segments.
pub(crate) fn parse_field_path(field: &str) -> Result<Vec<String>, FilterError> {
    if field.is_empty() {
        return Err(FilterError::InvalidFieldName("empty field name".to_string()));
    }
    field
        .split('.')
        .map(|segment| {
            if segment.is_empty()
                || !segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
            {
                Err(FilterError::InvalidFieldName(field.to_string()))
            } else {
                Ok(segment.to_string())
            }
        })
        .collect()
}

/// JSONB accessor for a validated path; segments are alphanumeric so literal
/// embedding is safe.
fn doc_accessor(path: &[String]) -> String {
    format!("doc #> '{{{}}}'", path.join(","))
}

fn push_param(params: &mut Vec<Value>, base: usize, value: Value) -> String {
    params.push(value);
    format!("${}", base + params.len())
}

fn cmp_matches(
    target: Option<&Value>,
    value: &Value,
    check: impl Fn(std::cmp::Ordering) -> bool,
) -> bool {
    target
        .and_then(|t| json_cmp(t, value))
        .map(check)
        .unwrap_or(false)
}

fn is_nullish(target: Option<&Value>) -> bool {
    matches!(target, None | Some(Value::Null))
}

/// Walk a dotted path through nested objects (and array indices).
pub(crate) fn resolve_path<'a>(doc: &'a Value, path: &[String]) -> Option<&'a Value> {
    let mut current = doc;
    for segment in path {
        current = match current {
            Value::Object(obj) => obj.get(segment)?,
            Value::Array(arr) => arr.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Value equality with numeric widening, mirroring JSONB's canonical numbers.
pub(crate) fn json_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => a == b,
        },
        _ => a == b,
    }
}

/// Ordering for same-typed scalars; None for cross-type or non-scalar pairs.
pub(crate) fn json_cmp(a: &Value, b: &Value) -> Option<std::cmp::Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}
