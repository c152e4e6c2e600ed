use serde_json::Value;

use super::error::FilterError;
use super::filter_where::FilterWhere;
use super::types::SqlResult;

/// Validated filter over the documents of one collection.
///
/// Construction is the validation step: `parse` rejects unknown operators
/// and hostile field names, so a `Filter` in hand always renders to safe,
/// fully parameterized SQL.
#[derive(Debug, Clone)]
pub struct Filter {
    where_clause: FilterWhere,
}

impl Filter {
    /// Matches every document.
    pub fn empty() -> Self {
        Self {
            where_clause: FilterWhere::empty(),
        }
    }

    pub fn parse(where_data: &Value) -> Result<Self, FilterError> {
        Ok(Self {
            where_clause: FilterWhere::parse(where_data)?,
        })
    }

    /// Single equality condition, for programmatic lookups.
    pub fn where_eq(field: &str, value: Value) -> Result<Self, FilterError> {
        let mut obj = serde_json::Map::new();
        obj.insert(field.to_string(), value);
        Self::parse(&Value::Object(obj))
    }

    pub fn is_empty(&self) -> bool {
        self.where_clause.is_empty()
    }

    /// WHERE predicate with parameters numbered after `starting_param_index`.
    pub fn to_where_sql(&self, starting_param_index: usize) -> Result<SqlResult, FilterError> {
        let (query, params) = self.where_clause.to_sql(starting_param_index)?;
        Ok(SqlResult { query, params })
    }

    pub fn matches(&self, doc: &Value) -> bool {
        self.where_clause.matches(doc)
    }
}
