use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::filter::{Filter, FilterError};

use super::store::{
    merge_system_fields, project_fields, validate_collection_name, CollectionSpec, DocumentStore,
    FindOptions, StoreError, UpdateManyResult,
};
use super::update::UpdateDocument;

/// Postgres-backed `DocumentStore`.
///
/// Each collection is a table of `(id, doc JSONB, created_at, updated_at)`.
/// Filters render to predicates over the `doc` column with every value
/// bound, and dot-path updates compile to one `jsonb_set` chain so a
/// partial update is a single atomic statement.
pub struct PostgresStore {
    pool: PgPool,
}

/// Bound statement parameters, in placeholder order.
enum SqlParam {
    Json(Value),
    TextArray(Vec<String>),
    Uuid(Uuid),
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl DocumentStore for PostgresStore {
    async fn ensure_collection(&self, spec: &CollectionSpec) -> Result<(), StoreError> {
        validate_collection_name(spec.name)?;
        let ddl = format!(
            r#"CREATE TABLE IF NOT EXISTS "{table}" (
                id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
                doc JSONB NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )"#,
            table = spec.name
        );
        sqlx::query(&ddl).execute(&self.pool).await?;

        for index in &spec.unique {
            let expression = if index.case_insensitive {
                format!("(lower(doc->>'{}'))", index.field)
            } else {
                format!("((doc->>'{}'))", index.field)
            };
            let ddl = format!(
                r#"CREATE UNIQUE INDEX IF NOT EXISTS "{table}_{field}_unique" ON "{table}" {expression}"#,
                table = spec.name,
                field = index.field,
                expression = expression
            );
            sqlx::query(&ddl).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn insert(&self, collection: &str, doc: Value) -> Result<Value, StoreError> {
        validate_collection_name(collection)?;
        if !doc.is_object() {
            return Err(StoreError::InvalidDocument);
        }
        let sql = format!(
            r#"INSERT INTO "{table}" (doc) VALUES ($1) RETURNING id, created_at, updated_at, doc"#,
            table = collection
        );
        let row = bind_params(sqlx::query(&sql), &[SqlParam::Json(doc)])
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error(collection, e))?;
        Ok(decode_row(&row)?)
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Value>, StoreError> {
        validate_collection_name(collection)?;
        let mut params = vec![];
        let where_clause = render_where(filter, &mut params)?;
        let order_clause = options.sort.to_sql()?;

        let mut sql = format!(
            r#"SELECT id, created_at, updated_at, doc FROM "{table}""#,
            table = collection
        );
        if let Some(where_clause) = where_clause {
            sql.push_str(&format!(" WHERE {}", where_clause));
        }
        if !order_clause.is_empty() {
            sql.push_str(&format!(" {}", order_clause));
        }
        if let Some(limit) = options.limit {
            sql.push_str(&format!(" LIMIT {}", limit.max(0)));
        }
        if let Some(skip) = options.skip {
            sql.push_str(&format!(" OFFSET {}", skip.max(0)));
        }

        let rows = bind_params(sqlx::query(&sql), &params)
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| decode_row(row).map_err(StoreError::from))
            .collect()
    }

    async fn find_by_id(&self, collection: &str, id: Uuid) -> Result<Option<Value>, StoreError> {
        validate_collection_name(collection)?;
        let sql = format!(
            r#"SELECT id, created_at, updated_at, doc FROM "{table}" WHERE id = $1"#,
            table = collection
        );
        let row = bind_params(sqlx::query(&sql), &[SqlParam::Uuid(id)])
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(decode_row).transpose().map_err(StoreError::from)
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: &Filter,
        select: Option<&[String]>,
    ) -> Result<Option<Value>, StoreError> {
        validate_collection_name(collection)?;
        let mut params = vec![];
        let where_clause = render_where(filter, &mut params)?;
        let mut sql = format!(
            r#"SELECT id, created_at, updated_at, doc FROM "{table}""#,
            table = collection
        );
        if let Some(where_clause) = where_clause {
            sql.push_str(&format!(" WHERE {}", where_clause));
        }
        sql.push_str(" ORDER BY created_at, id LIMIT 1");

        let row = bind_params(sqlx::query(&sql), &params)
            .fetch_optional(&self.pool)
            .await?;
        let doc = row.as_ref().map(decode_row).transpose()?;
        Ok(match (doc, select) {
            (Some(doc), Some(select)) => Some(project_fields(doc, select)),
            (doc, _) => doc,
        })
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: Uuid,
        update: &UpdateDocument,
    ) -> Result<Option<Value>, StoreError> {
        validate_collection_name(collection)?;
        let mut params = vec![];
        let expr = update_expr(update, "doc", &mut params);
        params.push(SqlParam::Uuid(id));
        let sql = format!(
            r#"UPDATE "{table}" SET doc = {expr}, updated_at = now() WHERE id = ${id_param} RETURNING id, created_at, updated_at, doc"#,
            table = collection,
            expr = expr,
            id_param = params.len()
        );
        let row = bind_params(sqlx::query(&sql), &params)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error(collection, e))?;
        row.as_ref().map(decode_row).transpose().map_err(StoreError::from)
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &UpdateDocument,
    ) -> Result<Option<Value>, StoreError> {
        validate_collection_name(collection)?;
        let mut params = vec![];
        let expr = update_expr(update, "doc", &mut params);
        let where_clause = render_where(filter, &mut params)?.unwrap_or_else(|| "1=1".to_string());
        let sql = format!(
            r#"UPDATE "{table}" SET doc = {expr}, updated_at = now()
               WHERE id = (SELECT id FROM "{table}" WHERE {where_clause} ORDER BY created_at, id LIMIT 1)
               RETURNING id, created_at, updated_at, doc"#,
            table = collection,
            expr = expr,
            where_clause = where_clause
        );
        let row = bind_params(sqlx::query(&sql), &params)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_db_error(collection, e))?;
        row.as_ref().map(decode_row).transpose().map_err(StoreError::from)
    }

    async fn update_many(
        &self,
        collection: &str,
        filter: &Filter,
        update: &UpdateDocument,
    ) -> Result<UpdateManyResult, StoreError> {
        validate_collection_name(collection)?;
        let mut params = vec![];
        let expr = update_expr(update, "t.doc", &mut params);
        let where_clause = render_where(filter, &mut params)?.unwrap_or_else(|| "1=1".to_string());
        let sql = format!(
            r#"WITH before AS (
                SELECT id, doc FROM "{table}" WHERE {where_clause}
            ),
            changed AS (
                UPDATE "{table}" AS t
                SET doc = {expr}, updated_at = now()
                FROM before
                WHERE t.id = before.id
                RETURNING t.doc AS new_doc, before.doc AS old_doc
            )
            SELECT count(*) AS matched,
                   count(*) FILTER (WHERE new_doc IS DISTINCT FROM old_doc) AS modified
            FROM changed"#,
            table = collection,
            where_clause = where_clause,
            expr = expr
        );
        let row = bind_params(sqlx::query(&sql), &params)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_db_error(collection, e))?;
        let matched: i64 = row.try_get("matched")?;
        let modified: i64 = row.try_get("modified")?;
        Ok(UpdateManyResult {
            matched: matched.max(0) as u64,
            modified: modified.max(0) as u64,
        })
    }

    async fn delete_by_id(&self, collection: &str, id: Uuid) -> Result<Option<Value>, StoreError> {
        validate_collection_name(collection)?;
        let sql = format!(
            r#"DELETE FROM "{table}" WHERE id = $1 RETURNING id, created_at, updated_at, doc"#,
            table = collection
        );
        let row = bind_params(sqlx::query(&sql), &[SqlParam::Uuid(id)])
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(decode_row).transpose().map_err(StoreError::from)
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<u64, StoreError> {
        validate_collection_name(collection)?;
        let mut params = vec![];
        let where_clause = render_where(filter, &mut params)?;
        let mut sql = format!(r#"DELETE FROM "{table}""#, table = collection);
        if let Some(where_clause) = where_clause {
            sql.push_str(&format!(" WHERE {}", where_clause));
        }
        let result = bind_params(sqlx::query(&sql), &params)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

fn render_where(
    filter: &Filter,
    params: &mut Vec<SqlParam>,
) -> Result<Option<String>, FilterError> {
    if filter.is_empty() {
        return Ok(None);
    }
    let rendered = filter.to_where_sql(params.len())?;
    params.extend(rendered.params.into_iter().map(SqlParam::Json));
    Ok(Some(rendered.query))
}

/// Compile an `UpdateDocument` to a nested `jsonb_set` chain over
/// `doc_column`. Missing or non-object parents are seeded as `{}` first
/// (shortest path first), then the leaves are written in entry order; an
/// empty update leaves the column expression as-is.
fn update_expr(update: &UpdateDocument, doc_column: &str, params: &mut Vec<SqlParam>) -> String {
    let mut expr = doc_column.to_string();
    for prefix in update.parent_paths() {
        let path = push_param(params, SqlParam::TextArray(prefix.clone()));
        expr = format!(
            "jsonb_set({expr}, {path}, CASE WHEN jsonb_typeof({col} #> {path}) = 'object' THEN {col} #> {path} ELSE '{{}}'::jsonb END, true)",
            expr = expr,
            path = path,
            col = doc_column
        );
    }
    for (path, value) in update.entries() {
        let path = push_param(params, SqlParam::TextArray(path.clone()));
        let value = push_param(params, SqlParam::Json(value.clone()));
        expr = format!("jsonb_set({expr}, {path}, {value}, true)", expr = expr, path = path, value = value);
    }
    expr
}

fn push_param(params: &mut Vec<SqlParam>, param: SqlParam) -> String {
    params.push(param);
    format!("${}", params.len())
}

fn bind_params<'q>(
    mut query: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    params: &'q [SqlParam],
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    for param in params {
        query = match param {
            SqlParam::Json(value) => query.bind(value),
            SqlParam::TextArray(path) => query.bind(path),
            SqlParam::Uuid(id) => query.bind(*id),
        };
    }
    query
}

fn decode_row(row: &PgRow) -> Result<Value, sqlx::Error> {
    let id: Uuid = row.try_get("id")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at")?;
    let doc: Value = row.try_get("doc")?;
    Ok(merge_system_fields(id, created_at, updated_at, doc))
}

/// Unique index violations surface as `UniqueViolation` with the field name
/// recovered from the constraint; everything else passes through.
fn map_db_error(collection: &str, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.code().as_deref() == Some("23505") {
            let prefix = format!("{}_", collection);
            let field = db
                .constraint()
                .and_then(|name| name.strip_prefix(prefix.as_str()))
                .and_then(|name| name.strip_suffix("_unique"))
                .unwrap_or("unknown")
                .to_string();
            return StoreError::UniqueViolation { field };
        }
    }
    StoreError::Database(err)
}
