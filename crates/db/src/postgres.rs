//! PostgreSQL-backed [`DocumentStore`].
//!
//! All collections share the `documents` table; bodies live in a JSONB
//! column. Filters compile to `fields -> $n <op> $m` so field names are bound
//! parameters, never spliced into SQL. Change notifications are published to
//! an in-process [`ChangeFeed`], so only writes made through this process
//! reach subscribers.

use async_trait::async_trait;
use atelier_core::document::{
    is_meta_field, value_text, Direction, Document, Fields, Filter, FilterOp, ListQuery,
    FIELD_CREATED_AT, FIELD_ID, FIELD_UPDATED_AT,
};
use atelier_core::types::Timestamp;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tokio::sync::broadcast;

use crate::store::{
    new_document_id, ChangeFeed, ChangeKind, DocumentStore, StoreChange, StoreError,
};

/// Column list for `documents` queries.
const COLUMNS: &str = "id, fields, created_at, updated_at";

/// A row from the `documents` table.
#[derive(Debug, FromRow)]
struct DocumentRow {
    id: String,
    fields: Json<Fields>,
    created_at: Timestamp,
    updated_at: Timestamp,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Document {
            id: row.id,
            fields: row.fields.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Document store over a PostgreSQL pool.
pub struct PgDocumentStore {
    pool: PgPool,
    feed: ChangeFeed,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            feed: ChangeFeed::new(),
        }
    }

    async fn notify(&self, collection: &str, kind: ChangeKind, id: &str, document: Option<Document>) {
        self.feed
            .publish(StoreChange {
                collection: collection.to_string(),
                kind,
                id: id.to_string(),
                document,
            })
            .await;
    }
}

fn strip_meta(mut fields: Fields) -> Fields {
    fields.retain(|key, _| !is_meta_field(key));
    fields
}

/// Append one filter predicate to `qb`.
fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &Filter) {
    let op = filter.op.as_sql();
    match filter.field.as_str() {
        FIELD_ID => {
            qb.push(format!(" AND id {op} "));
            qb.push_bind(value_text(&filter.value));
        }
        FIELD_CREATED_AT | FIELD_UPDATED_AT => {
            qb.push(format!(" AND {} {op} ", filter.field));
            qb.push_bind(value_text(&filter.value));
            qb.push("::timestamptz");
        }
        field => {
            if filter.op != FilterOp::Eq {
                // Range comparisons only match values of the operand's JSON type.
                qb.push(" AND jsonb_typeof(fields -> ");
                qb.push_bind(field.to_string());
                qb.push(") = jsonb_typeof(");
                qb.push_bind(filter.value.clone());
                qb.push(")");
            }
            qb.push(" AND fields -> ");
            qb.push_bind(field.to_string());
            qb.push(format!(" {op} "));
            qb.push_bind(filter.value.clone());
        }
    }
}

/// Build the `SELECT` for a list query.
fn build_list_query<'a>(collection: &'a str, query: &ListQuery) -> QueryBuilder<'a, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT {COLUMNS} FROM documents WHERE collection = "
    ));
    qb.push_bind(collection);

    for filter in &query.filters {
        push_filter(&mut qb, filter);
    }

    match &query.order_by {
        Some(order) => {
            // Missing fields sort lowest in either direction.
            let (dir, nulls) = match order.direction {
                Direction::Asc => ("ASC", "NULLS FIRST"),
                Direction::Desc => ("DESC", "NULLS LAST"),
            };
            match order.field.as_str() {
                FIELD_ID | FIELD_CREATED_AT | FIELD_UPDATED_AT => {
                    qb.push(format!(" ORDER BY {} {dir}", order.field));
                }
                field => {
                    qb.push(" ORDER BY fields -> ");
                    qb.push_bind(field.to_string());
                    qb.push(format!(" {dir} {nulls}"));
                }
            }
            qb.push(format!(", id {dir}"));
        }
        None => {
            qb.push(" ORDER BY id ASC");
        }
    }

    if let Some(limit) = query.limit {
        qb.push(" LIMIT ");
        qb.push_bind(i64::try_from(limit).unwrap_or(i64::MAX));
    }

    qb
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool).await?;
        Ok(())
    }

    async fn list(&self, collection: &str, query: &ListQuery) -> Result<Vec<Document>, StoreError> {
        let mut qb = build_list_query(collection, query);
        let rows = qb
            .build_query_as::<DocumentRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let query = format!("SELECT {COLUMNS} FROM documents WHERE collection = $1 AND id = $2");
        let row = sqlx::query_as::<_, DocumentRow>(&query)
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Document::from))
    }

    async fn create(&self, collection: &str, fields: Fields) -> Result<Document, StoreError> {
        let query = format!(
            "INSERT INTO documents (collection, id, fields) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, DocumentRow>(&query)
            .bind(collection)
            .bind(new_document_id())
            .bind(Json(strip_meta(fields)))
            .fetch_one(&self.pool)
            .await?;
        let doc = Document::from(row);
        self.notify(collection, ChangeKind::Added, &doc.id, Some(doc.clone()))
            .await;
        Ok(doc)
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<Document, StoreError> {
        // `xmax = 0` is true only for freshly inserted rows.
        let query = format!(
            "INSERT INTO documents (collection, id, fields) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (collection, id) DO UPDATE SET \
                 fields = EXCLUDED.fields, \
                 updated_at = now() \
             RETURNING {COLUMNS}, (xmax = 0) AS inserted"
        );
        let (row, inserted): (DocumentRow, bool) = {
            let pg_row = sqlx::query(&query)
                .bind(collection)
                .bind(id)
                .bind(Json(strip_meta(fields)))
                .fetch_one(&self.pool)
                .await?;
            let inserted: bool = sqlx::Row::try_get(&pg_row, "inserted")?;
            (DocumentRow::from_row(&pg_row)?, inserted)
        };
        let doc = Document::from(row);
        let kind = if inserted {
            ChangeKind::Added
        } else {
            ChangeKind::Modified
        };
        self.notify(collection, kind, id, Some(doc.clone())).await;
        Ok(doc)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Fields,
    ) -> Result<Option<Document>, StoreError> {
        let query = format!(
            "UPDATE documents SET \
                 fields = fields || $3, \
                 updated_at = now() \
             WHERE collection = $1 AND id = $2 \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, DocumentRow>(&query)
            .bind(collection)
            .bind(id)
            .bind(Json(strip_meta(fields)))
            .fetch_optional(&self.pool)
            .await?;
        let doc = row.map(Document::from);
        if let Some(doc) = &doc {
            self.notify(collection, ChangeKind::Modified, id, Some(doc.clone()))
                .await;
        }
        Ok(doc)
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .execute(&self.pool)
            .await?;
        let removed = result.rows_affected() > 0;
        if removed {
            self.notify(collection, ChangeKind::Removed, id, None).await;
        }
        Ok(removed)
    }

    async fn subscribe(&self, collection: &str) -> broadcast::Receiver<StoreChange> {
        self.feed.subscribe(collection).await
    }
}
