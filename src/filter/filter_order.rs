use serde_json::Value;

use super::error::FilterError;
use super::filter_where::parse_field_path;
use super::types::{FilterOrderInfo, SortDirection};

/// Parsed ORDER BY clause.
///
/// Accepts a single spec or an array of specs, where each spec is either a
/// string (`"weight"`, `"weight desc"`) or an object (`{"weight": "desc"}`,
/// `{"weight": -1}`). System fields map to their real columns; everything
/// else sorts on the JSONB document.
#[derive(Debug, Clone, Default)]
pub struct FilterOrder {
    orders: Vec<FilterOrderInfo>,
}

impl FilterOrder {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn orders(&self) -> &[FilterOrderInfo] {
        &self.orders
    }

    pub fn parse(order_data: &Value) -> Result<Self, FilterError> {
        let mut orders = vec![];
        match order_data {
            Value::Null => {}
            Value::Array(arr) => {
                for entry in arr {
                    Self::parse_entry(entry, &mut orders)?;
                }
            }
            other => Self::parse_entry(other, &mut orders)?,
        }
        Ok(Self { orders })
    }

    fn parse_entry(entry: &Value, orders: &mut Vec<FilterOrderInfo>) -> Result<(), FilterError> {
        match entry {
            Value::String(spec) => {
                let mut parts = spec.split_whitespace();
                let field = parts.next().unwrap_or_default();
                let sort = match parts.next() {
                    None => SortDirection::Asc,
                    Some(dir) => parse_direction_name(dir)?,
                };
                if parts.next().is_some() {
                    return Err(FilterError::InvalidOrder(spec.clone()));
                }
                orders.push(Self::order_info(field, sort)?);
            }
            Value::Object(obj) => {
                for (field, dir) in obj {
                    let sort = parse_direction_value(dir)?;
                    orders.push(Self::order_info(field, sort)?);
                }
            }
            other => return Err(FilterError::InvalidOrder(other.to_string())),
        }
        Ok(())
    }

    fn order_info(field: &str, sort: SortDirection) -> Result<FilterOrderInfo, FilterError> {
        // Validates segments even for system fields so hostile input never
        // reaches the SQL renderer.
        parse_field_path(field)?;
        Ok(FilterOrderInfo {
            field: field.to_string(),
            sort,
        })
    }

    /// Render the `ORDER BY` fragment, or an empty string when unsorted.
    pub fn to_sql(&self) -> Result<String, FilterError> {
        if self.orders.is_empty() {
            return Ok(String::new());
        }
        let parts = self
            .orders
            .iter()
            .map(|info| {
                let accessor = order_accessor(&info.field)?;
                Ok(format!("{} {}", accessor, info.sort.to_sql()))
            })
            .collect::<Result<Vec<_>, FilterError>>()?;
        Ok(format!("ORDER BY {}", parts.join(", ")))
    }
}

fn order_accessor(field: &str) -> Result<String, FilterError> {
    Ok(match field {
        "id" => "id".to_string(),
        "createdAt" => "created_at".to_string(),
        "updatedAt" => "updated_at".to_string(),
        _ => {
            let path = parse_field_path(field)?;
            format!("doc #> '{{{}}}'", path.join(","))
        }
    })
}

fn parse_direction_name(dir: &str) -> Result<SortDirection, FilterError> {
    match dir.to_ascii_lowercase().as_str() {
        "asc" | "ascending" => Ok(SortDirection::Asc),
        "desc" | "descending" => Ok(SortDirection::Desc),
        other => Err(FilterError::InvalidOrder(other.to_string())),
    }
}

fn parse_direction_value(dir: &Value) -> Result<SortDirection, FilterError> {
    match dir {
        Value::String(name) => parse_direction_name(name),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Ok(SortDirection::Asc),
            Some(-1) => Ok(SortDirection::Desc),
            _ => Err(FilterError::InvalidOrder(n.to_string())),
        },
        other => Err(FilterError::InvalidOrder(other.to_string())),
    }
}
