//! Identifier record table
//!
//! One row per minted DOI. `metadata` holds the last submitted document, or
//! the failure cause when the status is FAILED.

use super::{DbError, DbResult};
use crate::doi::store::{DoiData, DoiStore, IdentifierRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use doisync_common::types::{Doi, DoiStatus, DoiType};
use sqlx::PgPool;
use url::Url;

const SELECT_COLUMNS: &str = "SELECT doi, type AS kind, owner_key, status, target, metadata, created, modified FROM gbif_doi";

#[derive(Debug, sqlx::FromRow)]
struct DoiRow {
    doi: String,
    kind: String,
    owner_key: Option<String>,
    status: String,
    target: Option<String>,
    metadata: Option<String>,
    created: DateTime<Utc>,
    modified: DateTime<Utc>,
}

impl TryFrom<DoiRow> for IdentifierRecord {
    type Error = DbError;

    fn try_from(row: DoiRow) -> DbResult<Self> {
        let decode = |e: doisync_common::DoisyncError| DbError::Decode(e.to_string());
        Ok(Self {
            doi: row.doi.parse().map_err(decode)?,
            kind: row.kind.parse().map_err(decode)?,
            owner_key: row.owner_key,
            status: row.status.parse().map_err(decode)?,
            target: row
                .target
                .as_deref()
                .map(Url::parse)
                .transpose()
                .map_err(|e| DbError::Decode(format!("target of {}: {}", row.doi, e)))?,
            metadata: row.metadata,
            created: row.created,
            modified: row.modified,
        })
    }
}

/// Postgres-backed [`DoiStore`]
#[derive(Clone)]
pub struct PgDoiStore {
    pool: PgPool,
}

impl PgDoiStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DoiStore for PgDoiStore {
    async fn create(&self, doi: &Doi, kind: DoiType) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO gbif_doi (doi, type, status, created, modified)
            VALUES ($1, $2, $3, NOW(), NOW())
            "#,
        )
        .bind(doi.doi_name())
        .bind(kind.as_str())
        .bind(DoiStatus::New.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from_insert(e, "DOI", &doi.to_string()))?;

        Ok(())
    }

    async fn get(&self, doi: &Doi) -> DbResult<Option<IdentifierRecord>> {
        let row = sqlx::query_as::<_, DoiRow>(&format!("{} WHERE doi = $1", SELECT_COLUMNS))
            .bind(doi.doi_name())
            .fetch_optional(&self.pool)
            .await?;

        row.map(IdentifierRecord::try_from).transpose()
    }

    async fn update(&self, doi: &Doi, data: &DoiData, metadata: Option<&str>) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE gbif_doi
            SET status = $2,
                target = $3,
                metadata = COALESCE($4, metadata),
                modified = NOW()
            WHERE doi = $1
            "#,
        )
        .bind(doi.doi_name())
        .bind(data.status.as_str())
        .bind(data.target.as_ref().map(Url::as_str))
        .bind(metadata)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("DOI", &doi.to_string()));
        }

        Ok(())
    }

    async fn set_owner_key(&self, doi: &Doi, owner_key: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE gbif_doi SET owner_key = $2, modified = NOW() WHERE doi = $1")
            .bind(doi.doi_name())
            .bind(owner_key)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("DOI", &doi.to_string()));
        }

        Ok(())
    }

    async fn delete(&self, doi: &Doi) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM gbif_doi WHERE doi = $1")
            .bind(doi.doi_name())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("DOI", &doi.to_string()));
        }

        Ok(())
    }

    async fn list(&self, status: DoiStatus) -> DbResult<Vec<IdentifierRecord>> {
        let rows = sqlx::query_as::<_, DoiRow>(&format!(
            "{} WHERE status = $1 ORDER BY doi",
            SELECT_COLUMNS
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(IdentifierRecord::try_from).collect()
    }

    async fn ping(&self) -> DbResult<()> {
        super::health_check(&self.pool).await
    }
}
