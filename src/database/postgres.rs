use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use sqlx::{postgres::PgArguments, types::Json, PgPool, Postgres, Row};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::document::{into_body, unique_fields, validate_collection};
use super::manager::DatabaseError;
use super::store::{DeleteResult, DocumentStore, InsertOneResult, UpdateOptions, UpdateResult};
use super::update::Update;
use crate::config::DatabaseConfig;
use crate::filter::{Filter, SqlResult};

/// Document store over Postgres: one table per collection, documents in a JSONB column
pub struct PgDocumentStore {
    pool: PgPool,
    log_queries: bool,
    slow_query_threshold: Duration,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool, config: &DatabaseConfig) -> Self {
        Self {
            pool,
            log_queries: config.enable_query_logging,
            slow_query_threshold: Duration::from_millis(config.slow_query_threshold_ms),
        }
    }

    /// Creates the backing table of each collection if it does not exist yet
    pub async fn ensure_collections(&self, names: &[&str]) -> Result<(), DatabaseError> {
        for name in names {
            validate_collection(name)?;
            let ddl = format!(
                r#"
                CREATE TABLE IF NOT EXISTS "{}" (
                    "id" UUID PRIMARY KEY,
                    "seq" BIGSERIAL,
                    "doc" JSONB NOT NULL DEFAULT '{{}}'::jsonb,
                    "created_at" TIMESTAMPTZ NOT NULL DEFAULT now(),
                    "updated_at" TIMESTAMPTZ NOT NULL DEFAULT now()
                )
                "#,
                name
            );
            sqlx::query(&ddl).execute(&self.pool).await?;

            for field in unique_fields(name) {
                let index = format!(
                    "CREATE UNIQUE INDEX IF NOT EXISTS \"{t}_{f}_key\" ON \"{t}\" ((\"doc\" ->> '{f}'))",
                    t = name,
                    f = field
                );
                sqlx::query(&index).execute(&self.pool).await?;
            }
        }
        info!("Ensured {} document collections", names.len());
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn insert_with_id(&self, collection: &str, id: Uuid, document: Value) -> Result<(), DatabaseError> {
        let query = format!("INSERT INTO \"{}\" (\"id\", \"doc\") VALUES ($1, $2)", collection);
        let started = Instant::now();
        sqlx::query(&query)
            .bind(id)
            .bind(Json(document))
            .execute(&self.pool)
            .await?;
        self.observe(&query, started);
        Ok(())
    }

    async fn update_matching(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
        single: bool,
    ) -> Result<(u64, u64), DatabaseError> {
        validate_collection(collection)?;

        let SqlResult { query: where_clause, mut params } = filter.to_where_sql(0);
        let limit = if single { " ORDER BY \"seq\" ASC LIMIT 1" } else { "" };

        // $inc on a non-numeric value fails the whole update, as the memory store does
        if let Some(guard) = update.inc_conflict_sql() {
            let query = format!(
                "SELECT EXISTS (SELECT 1 FROM (SELECT \"doc\" FROM \"{t}\" WHERE {w}{l}) AS \"matched\" WHERE {g})",
                t = collection,
                w = where_clause,
                l = limit,
                g = guard
            );
            let started = Instant::now();
            let conflict: bool = bind_params(sqlx::query(&query), &params).fetch_one(&self.pool).await?.try_get(0)?;
            self.observe(&query, started);
            if conflict {
                return Err(DatabaseError::InvalidUpdate("cannot apply $inc to a non-numeric field".to_string()));
            }
        }

        let expr = update.to_sql_expr(&mut params);

        let query = format!(
            "WITH matched AS (SELECT \"id\" FROM \"{t}\" WHERE {w}{l}), \
             updated AS (UPDATE \"{t}\" SET \"doc\" = {e}, \"updated_at\" = now() \
             WHERE \"id\" IN (SELECT \"id\" FROM matched) AND \"doc\" IS DISTINCT FROM {e} RETURNING \"id\") \
             SELECT (SELECT COUNT(*) FROM matched) AS matched, (SELECT COUNT(*) FROM updated) AS modified",
            t = collection,
            w = where_clause,
            l = limit,
            e = expr
        );

        let started = Instant::now();
        let row = bind_params(sqlx::query(&query), &params).fetch_one(&self.pool).await?;
        self.observe(&query, started);

        let matched: i64 = row.try_get("matched")?;
        let modified: i64 = row.try_get("modified")?;
        Ok((matched as u64, modified as u64))
    }

    async fn delete_matching(&self, collection: &str, filter: &Filter, single: bool) -> Result<DeleteResult, DatabaseError> {
        validate_collection(collection)?;

        let where_sql = filter.to_where_sql(0);
        let query = if single {
            format!(
                "DELETE FROM \"{t}\" WHERE \"id\" IN (SELECT \"id\" FROM \"{t}\" WHERE {w} ORDER BY \"seq\" ASC LIMIT 1)",
                t = collection,
                w = where_sql.query
            )
        } else {
            format!("DELETE FROM \"{}\" WHERE {}", collection, where_sql.query)
        };

        let started = Instant::now();
        let result = bind_params(sqlx::query(&query), &where_sql.params)
            .execute(&self.pool)
            .await?;
        self.observe(&query, started);

        Ok(DeleteResult::new(result.rows_affected()))
    }

    fn observe(&self, query: &str, started: Instant) {
        let elapsed = started.elapsed();
        if self.log_queries {
            debug!(elapsed_ms = elapsed.as_millis() as u64, "SQL: {}", query);
        }
        if elapsed > self.slow_query_threshold {
            warn!(elapsed_ms = elapsed.as_millis() as u64, "Slow query: {}", query);
        }
    }
}

fn bind_params<'q>(
    mut q: sqlx::query::Query<'q, Postgres, PgArguments>,
    params: &[Value],
) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    for p in params {
        q = q.bind(Json(p.clone()));
    }
    q
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn find(&self, collection: &str, filter: &Filter) -> Result<Vec<Value>, DatabaseError> {
        validate_collection(collection)?;

        let sql = filter.to_sql(collection);
        let mut q = sqlx::query_scalar::<_, Json<Value>>(&sql.query);
        for p in &sql.params {
            q = q.bind(Json(p.clone()));
        }

        let started = Instant::now();
        let rows = q.fetch_all(&self.pool).await?;
        self.observe(&sql.query, started);

        Ok(rows.into_iter().map(|Json(doc)| filter.project(doc)).collect())
    }

    async fn insert_one(&self, collection: &str, document: Value) -> Result<InsertOneResult, DatabaseError> {
        validate_collection(collection)?;
        let body = into_body(document)?;
        let id = Uuid::new_v4();
        self.insert_with_id(collection, id, Value::Object(body)).await?;
        Ok(InsertOneResult::new(id.to_string()))
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        update: &Update,
        options: UpdateOptions,
    ) -> Result<UpdateResult, DatabaseError> {
        let (matched, modified) = self.update_matching(collection, filter, update, true).await?;
        if matched == 0 && options.upsert {
            let (id, body) = update.upsert_document(filter)?;
            self.insert_with_id(collection, id, Value::Object(body)).await?;
            return Ok(UpdateResult::upserted(id.to_string()));
        }
        Ok(UpdateResult::updated(matched, modified))
    }

    async fn update_many(&self, collection: &str, filter: &Filter, update: &Update) -> Result<UpdateResult, DatabaseError> {
        let (matched, modified) = self.update_matching(collection, filter, update, false).await?;
        Ok(UpdateResult::updated(matched, modified))
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<DeleteResult, DatabaseError> {
        self.delete_matching(collection, filter, true).await
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<DeleteResult, DatabaseError> {
        self.delete_matching(collection, filter, false).await
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, DatabaseError> {
        validate_collection(collection)?;

        let sql = filter.to_count_sql(collection);
        let mut q = sqlx::query_scalar::<_, i64>(&sql.query);
        for p in &sql.params {
            q = q.bind(Json(p.clone()));
        }

        let started = Instant::now();
        let count = q.fetch_one(&self.pool).await?;
        self.observe(&sql.query, started);
        Ok(count as u64)
    }

    async fn ping(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
