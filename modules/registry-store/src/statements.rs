use registry_common::{
    validate_statement, LinkCheck, LinkCheckPolicy, RegistryError, Result, Statement,
    StatementDetail, StatementInput, UrlCheckStatus,
};
use sqlx::PgPool;
use tracing::debug;

use crate::search::SearchCriteria;

/// Statement persistence. Built with the link-check policy in force, which
/// decides the `url_checked` status every save starts from.
#[derive(Clone)]
pub struct StatementStore {
    pool: PgPool,
    policy: LinkCheckPolicy,
}

impl StatementStore {
    pub fn new(pool: PgPool, policy: LinkCheckPolicy) -> Self {
        Self { pool, policy }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn policy(&self) -> &LinkCheckPolicy {
        &self.policy
    }

    fn status_after_save(&self) -> UrlCheckStatus {
        if self.policy.enabled {
            UrlCheckStatus::Pending
        } else {
            UrlCheckStatus::Skipped
        }
    }

    /// Validate and insert a statement. `date_seen` defaults to today.
    pub async fn create(&self, input: &StatementInput) -> Result<Statement> {
        validate_statement(input)?;

        let date_seen = input
            .date_seen
            .unwrap_or_else(|| chrono::Utc::now().date_naive());

        let statement = sqlx::query_as::<_, Statement>(
            r#"
            INSERT INTO statements (
                company_id, url, url_checked, date_seen, published,
                approved_by_board, approved_by, signed_by_director, signed_by,
                link_on_front_page, verified_by_id, contributor_email
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(input.company_id)
        .bind(input.url.trim())
        .bind(self.status_after_save().as_str())
        .bind(date_seen)
        .bind(input.published)
        .bind(&input.approved_by_board)
        .bind(&input.approved_by)
        .bind(input.signed_by_director)
        .bind(&input.signed_by)
        .bind(input.link_on_front_page)
        .bind(input.verified_by_id)
        .bind(&input.contributor_email)
        .fetch_one(&self.pool)
        .await?;

        debug!(statement_id = statement.id, url_checked = %statement.url_checked, "Statement created");
        Ok(statement)
    }

    /// Validate and update a statement. `date_seen` is never touched; every
    /// save queues a fresh URL check.
    pub async fn update(&self, id: i64, input: &StatementInput) -> Result<Statement> {
        validate_statement(input)?;

        let statement = sqlx::query_as::<_, Statement>(
            r#"
            UPDATE statements SET
                company_id = $2,
                url = $3,
                url_checked = $4,
                published = $5,
                approved_by_board = $6,
                approved_by = $7,
                signed_by_director = $8,
                signed_by = $9,
                link_on_front_page = $10,
                verified_by_id = $11,
                contributor_email = $12,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.company_id)
        .bind(input.url.trim())
        .bind(self.status_after_save().as_str())
        .bind(input.published)
        .bind(&input.approved_by_board)
        .bind(&input.approved_by)
        .bind(input.signed_by_director)
        .bind(&input.signed_by)
        .bind(input.link_on_front_page)
        .bind(input.verified_by_id)
        .bind(&input.contributor_email)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| RegistryError::not_found("statement", id))?;

        debug!(statement_id = id, url_checked = %statement.url_checked, "Statement updated");
        Ok(statement)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Statement> {
        self.find_optional(id)
            .await?
            .ok_or_else(|| RegistryError::not_found("statement", id))
    }

    pub async fn find_optional(&self, id: i64) -> Result<Option<Statement>> {
        sqlx::query_as::<_, Statement>("SELECT * FROM statements WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Into::into)
    }

    /// Newest statement per company, optionally restricted to published ones.
    pub async fn newest(&self, published_only: bool) -> Result<Vec<StatementDetail>> {
        self.search(&SearchCriteria::default(), !published_only).await
    }

    /// Write back a URL check. Only applies while the row still holds the url
    /// that was checked; returns whether it did.
    pub async fn record_link_check(
        &self,
        id: i64,
        checked_url: &str,
        outcome: &LinkCheck,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE statements SET
                url = $3,
                broken_url = $4,
                url_checked = 'checked',
                updated_at = NOW()
            WHERE id = $1 AND url = $2
            "#,
        )
        .bind(id)
        .bind(checked_url)
        .bind(&outcome.url)
        .bind(outcome.broken_url)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Ids still waiting for a URL check, oldest first, starting after
    /// `after_id`.
    pub async fn pending_link_checks(&self, after_id: i64, limit: i64) -> Result<Vec<i64>> {
        let rows = sqlx::query_as::<_, (i64,)>(
            r#"
            SELECT id FROM statements
            WHERE url_checked = 'pending' AND id > $1
            ORDER BY id ASC
            LIMIT $2
            "#,
        )
        .bind(after_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }

    pub async fn all_ids(&self) -> Result<Vec<i64>> {
        let rows = sqlx::query_as::<_, (i64,)>("SELECT id FROM statements ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
