//! Database Connection Pool Module
//!
//! PostgreSQL backend for the Benchlog storage traits, using
//! deadpool-postgres for pooling.
//!
//! Rows travel as JSON in both directions: reads go through `row_to_json`
//! and are deserialized into the core entity types, writes go through
//! `jsonb_populate_record` with the entity's column list. Field mapping
//! therefore lives in one place, the serde derive on each entity.

use std::time::Duration;

use async_trait::async_trait;
use benchlog_core::{
    Attachment, BenchError, BenchResult, Entity, EntityKind, Equipment, ExperimentRecord,
    ExperimentTemplate, Facility, LinkKind, LinkSet, ListOrder, NewAttachment, NewUser, Reagent,
    RowId, SearchQuery, Searchable, Sop, StorageError, User,
};
use benchlog_storage::{
    AttachmentStore, EntityStore, LabStore, LinkStore, SearchStore, UserStore,
};
use deadpool_postgres::{Config, ManagerConfig, Pool, PoolError, RecyclingMethod, Runtime};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tokio_postgres::error::SqlState;
use tokio_postgres::{GenericClient, NoTls, Row};

use crate::error::{ApiError, ApiResult};

// ============================================================================
// CONNECTION POOL CONFIGURATION
// ============================================================================

/// Database connection pool configuration.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// PostgreSQL host
    pub host: String,
    /// PostgreSQL port
    pub port: u16,
    /// Database name
    pub dbname: String,
    /// Database user
    pub user: String,
    /// Database password
    pub password: String,
    /// Maximum pool size
    pub max_size: usize,
    /// Connection wait timeout
    pub timeout: Duration,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            dbname: "benchlog".to_string(),
            user: "postgres".to_string(),
            password: "".to_string(),
            max_size: 16,
            timeout: Duration::from_secs(30),
        }
    }
}

impl DbConfig {
    /// Create a new database configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("BENCHLOG_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("BENCHLOG_DB_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(5432),
            dbname: std::env::var("BENCHLOG_DB_NAME").unwrap_or_else(|_| "benchlog".to_string()),
            user: std::env::var("BENCHLOG_DB_USER").unwrap_or_else(|_| "postgres".to_string()),
            password: std::env::var("BENCHLOG_DB_PASSWORD").unwrap_or_default(),
            max_size: std::env::var("BENCHLOG_DB_POOL_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(16),
            timeout: Duration::from_secs(
                std::env::var("BENCHLOG_DB_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
            ),
        }
    }

    /// Create a connection pool from this configuration.
    ///
    /// No connection is opened until the first checkout.
    pub fn create_pool(&self) -> ApiResult<Pool> {
        let mut cfg = Config::new();
        cfg.host = Some(self.host.clone());
        cfg.port = Some(self.port);
        cfg.dbname = Some(self.dbname.clone());
        cfg.user = Some(self.user.clone());
        cfg.password = Some(self.password.clone());

        cfg.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });

        let mut pool_cfg = deadpool_postgres::PoolConfig::new(self.max_size);
        pool_cfg.timeouts.wait = Some(self.timeout);
        cfg.pool = Some(pool_cfg);

        let pool = cfg
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| ApiError::database_error(format!("Failed to create pool: {}", e)))?;

        Ok(pool)
    }
}

// ============================================================================
// SCHEMA
// ============================================================================

/// Advisory lock key held while the schema is applied.
const MIGRATION_LOCK_KEY: i64 = 0x6265_6e63_686c_6f67;

/// Idempotent schema setup, run at startup.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS facilities (
    id                  BIGSERIAL PRIMARY KEY,
    name                TEXT NOT NULL,
    facility_type       TEXT NOT NULL DEFAULT 'other',
    location            TEXT NOT NULL DEFAULT '',
    access_conditions   TEXT NOT NULL DEFAULT '',
    bsl_level           TEXT NOT NULL DEFAULT 'n/a',
    hours               TEXT NOT NULL DEFAULT '',
    manager             TEXT NOT NULL DEFAULT '',
    emergency_contact   TEXT NOT NULL DEFAULT '',
    rules_summary       TEXT NOT NULL DEFAULT '',
    incident_response   TEXT NOT NULL DEFAULT '',
    waste_flow          TEXT NOT NULL DEFAULT '',
    tags                TEXT NOT NULL DEFAULT '',
    created_at          TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at          TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS equipment (
    id                      BIGSERIAL PRIMARY KEY,
    name                    TEXT NOT NULL,
    model_vendor            TEXT NOT NULL DEFAULT '',
    asset_no                TEXT NOT NULL DEFAULT '',
    status                  TEXT NOT NULL DEFAULT 'in use',
    domain                  TEXT NOT NULL DEFAULT 'shared',
    hazards                 TEXT NOT NULL DEFAULT '',
    facility_id             BIGINT,
    location_detail         TEXT NOT NULL DEFAULT '',
    owner                   TEXT NOT NULL DEFAULT '',
    training_required       BOOLEAN NOT NULL DEFAULT FALSE,
    usage_frequency         TEXT NOT NULL DEFAULT 'irregular',
    key_parameters          TEXT NOT NULL DEFAULT '',
    precheck_summary        TEXT NOT NULL DEFAULT '',
    postclean_summary       TEXT NOT NULL DEFAULT '',
    maintenance_cycle       TEXT NOT NULL DEFAULT 'quarterly',
    last_maintenance_date   TEXT NOT NULL DEFAULT '',
    next_maintenance_date   TEXT NOT NULL DEFAULT '',
    manual_url              TEXT NOT NULL DEFAULT '',
    tags                    TEXT NOT NULL DEFAULT '',
    body_markdown           TEXT NOT NULL DEFAULT '',
    created_at              TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at              TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS reagents (
    id                  BIGSERIAL PRIMARY KEY,
    name                TEXT NOT NULL,
    category            TEXT NOT NULL DEFAULT 'other',
    vendor              TEXT NOT NULL DEFAULT '',
    cat_no              TEXT NOT NULL DEFAULT '',
    lot_no              TEXT NOT NULL DEFAULT '',
    concentration_form  TEXT NOT NULL DEFAULT '',
    storage_temp        TEXT NOT NULL DEFAULT 'RT',
    light_sensitive     BOOLEAN NOT NULL DEFAULT FALSE,
    open_date           TEXT NOT NULL DEFAULT '',
    expiry_date         TEXT NOT NULL DEFAULT '',
    stock_status        TEXT NOT NULL DEFAULT 'normal',
    min_stock           INTEGER NOT NULL DEFAULT 0,
    qty_est             INTEGER NOT NULL DEFAULT 0,
    storage_location    TEXT NOT NULL DEFAULT '',
    hazards             TEXT NOT NULL DEFAULT '',
    ppe                 TEXT NOT NULL DEFAULT '',
    sds_url             TEXT NOT NULL DEFAULT '',
    prep_dilution       TEXT NOT NULL DEFAULT '',
    usage_summary       TEXT NOT NULL DEFAULT '',
    cautions            TEXT NOT NULL DEFAULT '',
    tags                TEXT NOT NULL DEFAULT '',
    body_markdown       TEXT NOT NULL DEFAULT '',
    created_at          TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at          TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS sops (
    id              BIGSERIAL PRIMARY KEY,
    title           TEXT NOT NULL,
    version         TEXT NOT NULL DEFAULT 'v1.0',
    domain          TEXT NOT NULL DEFAULT 'shared',
    summary         TEXT NOT NULL DEFAULT '',
    body_markdown   TEXT NOT NULL DEFAULT '',
    tags            TEXT NOT NULL DEFAULT '',
    created_at      TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at      TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS experiment_templates (
    id              BIGSERIAL PRIMARY KEY,
    title           TEXT NOT NULL,
    experiment_type TEXT NOT NULL DEFAULT 'other',
    summary         TEXT NOT NULL DEFAULT '',
    body_markdown   TEXT NOT NULL DEFAULT '',
    tags            TEXT NOT NULL DEFAULT '',
    created_at      TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at      TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS experiment_records (
    id                          BIGSERIAL PRIMARY KEY,
    title                       TEXT NOT NULL,
    date                        TEXT NOT NULL DEFAULT '',
    performer                   TEXT NOT NULL DEFAULT '',
    project                     TEXT NOT NULL DEFAULT '',
    experiment_type             TEXT NOT NULL DEFAULT 'other',
    purpose                     TEXT NOT NULL DEFAULT '',
    status                      TEXT NOT NULL DEFAULT 'completed',
    sample_summary              TEXT NOT NULL DEFAULT '',
    key_parameters              TEXT NOT NULL DEFAULT '',
    method_markdown             TEXT NOT NULL DEFAULT '',
    results_summary             TEXT NOT NULL DEFAULT '',
    conclusion                  TEXT NOT NULL DEFAULT '',
    issues_deviation            TEXT NOT NULL DEFAULT '',
    followup_recommendations    TEXT NOT NULL DEFAULT '',
    raw_data_url                TEXT NOT NULL DEFAULT '',
    tags                        TEXT NOT NULL DEFAULT '',
    sop_id                      BIGINT,
    template_id                 BIGINT,
    created_at                  TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at                  TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS record_equipment_links (
    record_id       BIGINT NOT NULL REFERENCES experiment_records (id) ON DELETE CASCADE,
    equipment_id    BIGINT NOT NULL REFERENCES equipment (id) ON DELETE CASCADE,
    PRIMARY KEY (record_id, equipment_id)
);

CREATE TABLE IF NOT EXISTS record_reagent_links (
    record_id       BIGINT NOT NULL REFERENCES experiment_records (id) ON DELETE CASCADE,
    reagent_id      BIGINT NOT NULL REFERENCES reagents (id) ON DELETE CASCADE,
    PRIMARY KEY (record_id, reagent_id)
);

CREATE TABLE IF NOT EXISTS attachments (
    id              BIGSERIAL PRIMARY KEY,
    entity_type     TEXT NOT NULL,
    entity_id       BIGINT NOT NULL,
    filename        TEXT NOT NULL,
    content_type    TEXT NOT NULL DEFAULT '',
    stored_path     TEXT NOT NULL,
    note            TEXT NOT NULL DEFAULT '',
    created_at      TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at      TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS attachments_owner_idx ON attachments (entity_type, entity_id);

CREATE TABLE IF NOT EXISTS users (
    id              BIGSERIAL PRIMARY KEY,
    email           TEXT NOT NULL UNIQUE,
    name            TEXT NOT NULL DEFAULT '',
    password_hash   TEXT NOT NULL,
    created_at      TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at      TIMESTAMPTZ NOT NULL DEFAULT now()
);
"#;

// ============================================================================
// TABLE MAPPING
// ============================================================================

/// An entity stored in its own PostgreSQL table.
pub trait PgTable: Entity {
    const TABLE: &'static str;

    /// Statements run inside the delete transaction before the row itself
    /// is removed. Each is bound to the row id as `$1`.
    const DELETE_FIRST: &'static [&'static str] = &[];
}

impl PgTable for Facility {
    const TABLE: &'static str = "facilities";
}

impl PgTable for Equipment {
    const TABLE: &'static str = "equipment";
    const DELETE_FIRST: &'static [&'static str] =
        &["DELETE FROM record_equipment_links WHERE equipment_id = $1"];
}

impl PgTable for Reagent {
    const TABLE: &'static str = "reagents";
    const DELETE_FIRST: &'static [&'static str] =
        &["DELETE FROM record_reagent_links WHERE reagent_id = $1"];
}

impl PgTable for Sop {
    const TABLE: &'static str = "sops";
}

impl PgTable for ExperimentTemplate {
    const TABLE: &'static str = "experiment_templates";
}

impl PgTable for ExperimentRecord {
    const TABLE: &'static str = "experiment_records";
    const DELETE_FIRST: &'static [&'static str] = &[
        "DELETE FROM record_equipment_links WHERE record_id = $1",
        "DELETE FROM record_reagent_links WHERE record_id = $1",
    ];
}

/// `(link table, target column, target table)` for a link kind.
fn link_table(kind: LinkKind) -> (&'static str, &'static str, &'static str) {
    match kind {
        LinkKind::Equipment => ("record_equipment_links", "equipment_id", Equipment::TABLE),
        LinkKind::Reagent => ("record_reagent_links", "reagent_id", Reagent::TABLE),
    }
}

/// `ORDER BY` clause matching the in-memory listing order.
fn order_clause<E: Entity>() -> String {
    match E::ORDER {
        ListOrder::NewestFirst => "t.id DESC".to_string(),
        // Byte-wise collation, same as the in-memory backend
        ListOrder::ByLabel => format!("t.{} COLLATE \"C\" ASC, t.id ASC", E::LABEL_FIELD),
    }
}

/// `WHERE` predicate for a search, with the pattern bound as `$1`.
fn search_predicate<E: Searchable>() -> String {
    E::SEARCH_FIELDS
        .iter()
        .map(|field| format!("t.{} LIKE $1 ESCAPE '\\'", field))
        .collect::<Vec<_>>()
        .join(" OR ")
}

// ============================================================================
// ERROR MAPPING
// ============================================================================

fn db_error(err: tokio_postgres::Error) -> BenchError {
    tracing::error!("Database error: {:?}", err);
    StorageError::Backend {
        reason: err.to_string(),
    }
    .into()
}

fn pool_error(err: PoolError) -> BenchError {
    tracing::error!("Connection pool error: {:?}", err);
    match err {
        PoolError::Timeout(_) => StorageError::Unavailable {
            reason: "connection pool exhausted".to_string(),
        },
        PoolError::Closed => StorageError::Unavailable {
            reason: "connection pool is closed".to_string(),
        },
        other => StorageError::Backend {
            reason: other.to_string(),
        },
    }
    .into()
}

fn decode_row<T: DeserializeOwned>(row: &Row) -> BenchResult<T> {
    let doc: JsonValue = row.try_get(0).map_err(db_error)?;
    serde_json::from_value(doc).map_err(|e| {
        BenchError::Storage(StorageError::Backend {
            reason: format!("failed to decode row: {}", e),
        })
    })
}

fn encode_doc<T: serde::Serialize>(value: &T) -> BenchResult<JsonValue> {
    serde_json::to_value(value).map_err(|e| {
        BenchError::Storage(StorageError::Backend {
            reason: format!("failed to encode row: {}", e),
        })
    })
}

// ============================================================================
// DATABASE CLIENT WRAPPER
// ============================================================================

/// PostgreSQL-backed `LabStore`.
#[derive(Clone)]
pub struct DbClient {
    pool: Pool,
}

impl DbClient {
    /// Create a new database client with the given pool.
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create a new database client from configuration.
    pub fn from_config(config: &DbConfig) -> ApiResult<Self> {
        let pool = config.create_pool()?;
        Ok(Self::new(pool))
    }

    /// Get the current pool size for observability.
    pub fn pool_size(&self) -> usize {
        self.pool.status().size
    }

    /// Create tables and indexes that do not exist yet.
    ///
    /// Concurrent callers are serialized on an advisory lock.
    pub async fn migrate(&self) -> ApiResult<()> {
        let mut conn = self.pool.get().await?;
        let tx = conn.transaction().await?;
        tx.execute("SELECT pg_advisory_xact_lock($1)", &[&MIGRATION_LOCK_KEY])
            .await?;
        tx.batch_execute(SCHEMA).await?;
        tx.commit().await?;
        tracing::info!("Database schema is up to date");
        Ok(())
    }

    async fn get_conn(&self) -> BenchResult<deadpool_postgres::Object> {
        self.pool.get().await.map_err(pool_error)
    }

    /// Lock one row for the rest of the transaction and return it.
    async fn lock_row<E: PgTable, C: GenericClient + Sync>(
        client: &C,
        id: RowId,
    ) -> BenchResult<E> {
        let sql = format!(
            "SELECT row_to_json(t) FROM {} t WHERE t.id = $1 FOR UPDATE",
            E::TABLE
        );
        let row = client
            .query_opt(sql.as_str(), &[&id])
            .await
            .map_err(db_error)?
            .ok_or_else(|| BenchError::not_found(E::KIND, id))?;
        decode_row(&row)
    }

    /// Write every column of `row` back to its table.
    async fn write_row<E: PgTable, C: GenericClient + Sync>(client: &C, row: &E) -> BenchResult<()> {
        let cols = E::FIELDS.join(", ");
        let sql = format!(
            "UPDATE {table} SET ({cols}, updated_at) = \
             (SELECT {cols}, updated_at FROM jsonb_populate_record(NULL::{table}, $2::jsonb)) \
             WHERE id = $1",
            table = E::TABLE,
            cols = cols,
        );
        let doc = encode_doc(row)?;
        client
            .execute(sql.as_str(), &[&row.id(), &doc])
            .await
            .map_err(db_error)?;
        Ok(())
    }

    /// Load a row under lock, change it in Rust, write it back; one transaction.
    async fn modify<E: PgTable>(
        &self,
        id: RowId,
        change: impl FnOnce(&mut E) + Send,
    ) -> BenchResult<E> {
        let mut conn = self.get_conn().await?;
        let tx = conn.transaction().await.map_err(db_error)?;

        let mut row: E = Self::lock_row(&*tx, id).await?;
        change(&mut row);
        Self::write_row(&*tx, &row).await?;

        tx.commit().await.map_err(db_error)?;
        Ok(row)
    }
}

// ============================================================================
// ENTITY OPERATIONS
// ============================================================================

#[async_trait]
impl<E: PgTable> EntityStore<E> for DbClient {
    async fn get(&self, id: RowId) -> BenchResult<Option<E>> {
        let conn = self.get_conn().await?;
        let sql = format!("SELECT row_to_json(t) FROM {} t WHERE t.id = $1", E::TABLE);
        let row = conn
            .query_opt(sql.as_str(), &[&id])
            .await
            .map_err(db_error)?;
        row.as_ref().map(decode_row).transpose()
    }

    async fn list(&self) -> BenchResult<Vec<E>> {
        let conn = self.get_conn().await?;
        let sql = format!(
            "SELECT row_to_json(t) FROM {} t ORDER BY {}",
            E::TABLE,
            order_clause::<E>()
        );
        let rows = conn.query(sql.as_str(), &[]).await.map_err(db_error)?;
        rows.iter().map(decode_row).collect()
    }

    async fn create(&self, draft: E::Draft) -> BenchResult<E> {
        E::check_draft(&draft)?;
        let doc = encode_doc(&draft)?;

        let cols = E::FIELDS.join(", ");
        let sql = format!(
            "WITH ins AS ( \
                 INSERT INTO {table} ({cols}) \
                 SELECT {cols} FROM jsonb_populate_record(NULL::{table}, $1::jsonb) \
                 RETURNING * \
             ) SELECT row_to_json(ins) FROM ins",
            table = E::TABLE,
            cols = cols,
        );

        let conn = self.get_conn().await?;
        let row = conn.query_one(sql.as_str(), &[&doc]).await.map_err(|e| {
            tracing::error!("Insert into {} failed: {:?}", E::TABLE, e);
            BenchError::Storage(StorageError::InsertFailed {
                entity_type: E::KIND,
                reason: e.to_string(),
            })
        })?;
        decode_row(&row)
    }

    async fn update(&self, id: RowId, patch: E::Patch) -> BenchResult<E> {
        E::check_patch(&patch)?;
        let now = chrono::Utc::now();
        self.modify::<E>(id, move |row| row.apply_patch(patch, now))
            .await
    }

    async fn replace(&self, id: RowId, draft: E::Draft) -> BenchResult<E> {
        E::check_draft(&draft)?;
        let now = chrono::Utc::now();
        self.modify::<E>(id, move |row| row.replace(draft, now)).await
    }

    async fn delete(&self, id: RowId) -> BenchResult<()> {
        let mut conn = self.get_conn().await?;
        let tx = conn.transaction().await.map_err(db_error)?;

        let _: E = Self::lock_row(&*tx, id).await?;
        for statement in E::DELETE_FIRST {
            tx.execute(*statement, &[&id]).await.map_err(db_error)?;
        }
        let sql = format!("DELETE FROM {} WHERE id = $1", E::TABLE);
        tx.execute(sql.as_str(), &[&id]).await.map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        tracing::debug!(kind = %E::KIND, id, "Deleted row");
        Ok(())
    }
}

// ============================================================================
// LINK OPERATIONS
// ============================================================================

#[async_trait]
impl LinkStore for DbClient {
    async fn linked_ids(&self, record_id: RowId, kind: LinkKind) -> BenchResult<Vec<RowId>> {
        let (table, column, _) = link_table(kind);
        let sql = format!(
            "SELECT {column} FROM {table} WHERE record_id = $1 ORDER BY {column}",
            column = column,
            table = table,
        );
        let conn = self.get_conn().await?;
        let rows = conn
            .query(sql.as_str(), &[&record_id])
            .await
            .map_err(db_error)?;
        rows.iter()
            .map(|row| row.try_get::<_, i64>(0).map_err(db_error))
            .collect()
    }

    async fn replace_links(
        &self,
        record_id: RowId,
        kind: LinkKind,
        links: &LinkSet,
    ) -> BenchResult<()> {
        let (table, column, target_table) = link_table(kind);
        let ids: Vec<i64> = links.ids().iter().copied().collect();

        let mut conn = self.get_conn().await?;
        let tx = conn.transaction().await.map_err(db_error)?;

        // Serializes concurrent replacements of the same record
        let _: ExperimentRecord = Self::lock_row(&*tx, record_id).await?;

        if !ids.is_empty() {
            let sql = format!(
                "SELECT id FROM {} WHERE id = ANY($1) FOR KEY SHARE",
                target_table
            );
            let found = tx
                .query(sql.as_str(), &[&ids])
                .await
                .map_err(db_error)?
                .iter()
                .map(|row| row.try_get::<_, i64>(0).map_err(db_error))
                .collect::<BenchResult<std::collections::BTreeSet<i64>>>()?;
            if let Some(missing) = ids.iter().find(|id| !found.contains(id)) {
                return Err(BenchError::not_found(kind.target(), *missing));
            }
        }

        let clear = format!("DELETE FROM {} WHERE record_id = $1", table);
        tx.execute(clear.as_str(), &[&record_id])
            .await
            .map_err(db_error)?;

        if !ids.is_empty() {
            let insert = format!(
                "INSERT INTO {table} (record_id, {column}) \
                 SELECT $1, unnest($2::bigint[]) ON CONFLICT DO NOTHING",
                table = table,
                column = column,
            );
            tx.execute(insert.as_str(), &[&record_id, &ids])
                .await
                .map_err(db_error)?;
        }

        tx.commit().await.map_err(db_error)?;
        tracing::debug!(record_id, %kind, stored = ids.len(), "Replaced record links");
        Ok(())
    }
}

// ============================================================================
// SEARCH
// ============================================================================

#[async_trait]
impl<E: PgTable + Searchable> SearchStore<E> for DbClient {
    async fn search(&self, query: &SearchQuery) -> BenchResult<Vec<E>> {
        let sql = format!(
            "SELECT row_to_json(t) FROM {} t WHERE {} ORDER BY {}",
            E::TABLE,
            search_predicate::<E>(),
            order_clause::<E>()
        );
        let pattern = query.like_pattern();
        let conn = self.get_conn().await?;
        let rows = conn
            .query(sql.as_str(), &[&pattern])
            .await
            .map_err(db_error)?;
        rows.iter().map(decode_row).collect()
    }
}

// ============================================================================
// ATTACHMENTS + USERS
// ============================================================================

#[async_trait]
impl AttachmentStore for DbClient {
    async fn attachment_create(&self, new: NewAttachment) -> BenchResult<Attachment> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_one(
                "WITH ins AS ( \
                     INSERT INTO attachments \
                         (entity_type, entity_id, filename, content_type, stored_path, note) \
                     VALUES ($1, $2, $3, $4, $5, $6) \
                     RETURNING * \
                 ) SELECT row_to_json(ins) FROM ins",
                &[
                    &new.entity_type.as_str(),
                    &new.entity_id,
                    &new.filename,
                    &new.content_type,
                    &new.stored_path,
                    &new.note,
                ],
            )
            .await
            .map_err(db_error)?;
        decode_row(&row)
    }

    async fn attachments_for(
        &self,
        kind: EntityKind,
        entity_id: RowId,
    ) -> BenchResult<Vec<Attachment>> {
        let conn = self.get_conn().await?;
        let rows = conn
            .query(
                "SELECT row_to_json(t) FROM attachments t \
                 WHERE t.entity_type = $1 AND t.entity_id = $2 ORDER BY t.id",
                &[&kind.as_str(), &entity_id],
            )
            .await
            .map_err(db_error)?;
        rows.iter().map(decode_row).collect()
    }
}

#[async_trait]
impl UserStore for DbClient {
    async fn user_by_email(&self, email: &str) -> BenchResult<Option<User>> {
        let conn = self.get_conn().await?;
        let row = conn
            .query_opt(
                "SELECT row_to_json(t) FROM users t WHERE t.email = $1",
                &[&email],
            )
            .await
            .map_err(db_error)?;
        row.as_ref().map(decode_row).transpose()
    }

    async fn user_create(&self, new: NewUser) -> BenchResult<User> {
        let conn = self.get_conn().await?;
        let result = conn
            .query_one(
                "WITH ins AS ( \
                     INSERT INTO users (email, name, password_hash) VALUES ($1, $2, $3) \
                     RETURNING * \
                 ) SELECT row_to_json(ins) FROM ins",
                &[&new.email, &new.name, &new.password_hash],
            )
            .await;

        match result {
            Ok(row) => decode_row(&row),
            Err(err) if err.code() == Some(&SqlState::UNIQUE_VIOLATION) => {
                Err(BenchError::Storage(StorageError::Duplicate {
                    entity_type: EntityKind::User,
                    reason: "Email already registered".to_string(),
                }))
            }
            Err(err) => Err(db_error(err)),
        }
    }
}

#[async_trait]
impl LabStore for DbClient {
    async fn ping(&self) -> BenchResult<()> {
        let conn = self.get_conn().await?;
        conn.execute("SELECT 1", &[]).await.map_err(db_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DbConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 5432);
        assert_eq!(config.dbname, "benchlog");
        assert_eq!(config.max_size, 16);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_pool_creation_does_not_connect() -> ApiResult<()> {
        let db = DbClient::from_config(&DbConfig::default())?;
        assert_eq!(db.pool_size(), 0);
        Ok(())
    }

    #[test]
    fn test_order_clause_follows_entity_order() {
        assert_eq!(order_clause::<ExperimentRecord>(), "t.id DESC");
        assert_eq!(order_clause::<ExperimentTemplate>(), "t.id DESC");
        assert_eq!(
            order_clause::<Sop>(),
            "t.title COLLATE \"C\" ASC, t.id ASC"
        );
        assert_eq!(
            order_clause::<Equipment>(),
            "t.name COLLATE \"C\" ASC, t.id ASC"
        );
    }

    #[test]
    fn test_search_predicate_covers_search_fields() {
        assert_eq!(
            search_predicate::<Equipment>(),
            "t.name LIKE $1 ESCAPE '\\' OR t.tags LIKE $1 ESCAPE '\\' OR t.asset_no LIKE $1 ESCAPE '\\'"
        );
        assert_eq!(search_predicate::<Reagent>().matches(" OR ").count(), 3);
    }

    #[test]
    fn test_link_tables() {
        assert_eq!(
            link_table(LinkKind::Equipment),
            ("record_equipment_links", "equipment_id", "equipment")
        );
        assert_eq!(
            link_table(LinkKind::Reagent),
            ("record_reagent_links", "reagent_id", "reagents")
        );
    }

    #[test]
    fn test_schema_has_a_table_per_entity() {
        for table in [
            Facility::TABLE,
            Equipment::TABLE,
            Reagent::TABLE,
            Sop::TABLE,
            ExperimentTemplate::TABLE,
            ExperimentRecord::TABLE,
        ] {
            assert!(
                SCHEMA.contains(&format!("CREATE TABLE IF NOT EXISTS {} (", table)),
                "missing table {}",
                table
            );
        }
    }

    #[test]
    fn test_schema_has_every_entity_column() {
        fn check<E: PgTable>() {
            let start = SCHEMA
                .find(&format!("CREATE TABLE IF NOT EXISTS {} (", E::TABLE))
                .unwrap_or(0);
            let body = &SCHEMA[start..];
            let end = body.find(");").unwrap_or(body.len());
            let body = &body[..end];
            for field in E::FIELDS {
                assert!(
                    body.lines().any(|line| line.trim_start().starts_with(&format!("{} ", field))),
                    "{} is missing column {}",
                    E::TABLE,
                    field
                );
            }
        }
        check::<Facility>();
        check::<Equipment>();
        check::<Reagent>();
        check::<Sop>();
        check::<ExperimentTemplate>();
        check::<ExperimentRecord>();
    }
}
