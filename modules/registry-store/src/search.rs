//! Statement search: newest statement per company, filtered by company name,
//! sector and country, with unpublished statements hidden from visitors.

use registry_common::{Result, StatementDetail};
use serde::{Deserialize, Serialize};
use sqlx::{Postgres, QueryBuilder};

use crate::statements::StatementStore;

/// Visitor-supplied filters. Empty fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub company_name: Option<String>,
    /// Sector ids (the `industries` parameter).
    pub sector_ids: Vec<i64>,
    pub country_ids: Vec<i64>,
    /// Accepted and carried through, but not applied: statements are not
    /// linked to legislation.
    pub legislations: Vec<String>,
}

impl SearchCriteria {
    /// `ILIKE` pattern for the company-name filter, with wildcards in the
    /// user's text escaped.
    pub fn company_name_pattern(&self) -> Option<String> {
        let name = self.company_name.as_deref()?.trim();
        if name.is_empty() {
            return None;
        }
        Some(format!("%{}%", escape_like(name)))
    }
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// One page of results plus the size of the full result set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    /// 1-based.
    pub page: i64,
    pub per_page: i64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> i64 {
        if self.total == 0 {
            1
        } else {
            (self.total + self.per_page - 1) / self.per_page
        }
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }
}

/// Columns of [`StatementDetail`], selected from the ranked set.
const DETAIL_COLUMNS: &str = r#"
    s.id, s.company_id, c.name AS company_name,
    sec.name AS sector_name, co.name AS country_name,
    s.url, s.broken_url, s.date_seen, s.published,
    s.approved_by_board, s.approved_by, s.signed_by_director, s.signed_by,
    s.link_on_front_page, u.email AS verified_by_email, s.contributor_email
"#;

/// Push `WITH ranked AS (...)`: every matching statement numbered within its
/// company, newest `date_seen` first and lowest id on ties. Filters run before
/// ranking, so visitors get the newest *published* statement per company.
fn push_ranked_cte(qb: &mut QueryBuilder<'_, Postgres>, criteria: &SearchCriteria, privileged: bool) {
    qb.push(
        "WITH ranked AS ( \
         SELECT s.id, ROW_NUMBER() OVER ( \
             PARTITION BY s.company_id ORDER BY s.date_seen DESC, s.id ASC \
         ) AS company_rank \
         FROM statements s \
         JOIN companies c ON c.id = s.company_id \
         WHERE TRUE ",
    );

    if !privileged {
        qb.push("AND s.published ");
    }

    if let Some(pattern) = criteria.company_name_pattern() {
        qb.push("AND c.name ILIKE ");
        qb.push_bind(pattern);
        qb.push(" ");
    }

    if !criteria.sector_ids.is_empty() {
        qb.push("AND c.sector_id = ANY(");
        qb.push_bind(criteria.sector_ids.clone());
        qb.push(") ");
    }

    if !criteria.country_ids.is_empty() {
        qb.push("AND c.country_id = ANY(");
        qb.push_bind(criteria.country_ids.clone());
        qb.push(") ");
    }

    qb.push(") ");
}

fn push_detail_select(qb: &mut QueryBuilder<'_, Postgres>) {
    qb.push("SELECT ");
    qb.push(DETAIL_COLUMNS);
    qb.push(
        "FROM ranked r \
         JOIN statements s ON s.id = r.id \
         JOIN companies c ON c.id = s.company_id \
         LEFT JOIN sectors sec ON sec.id = c.sector_id \
         LEFT JOIN countries co ON co.id = c.country_id \
         LEFT JOIN users u ON u.id = s.verified_by_id \
         WHERE r.company_rank = 1 \
         ORDER BY s.company_id ASC ",
    );
}

impl StatementStore {
    /// One statement with its company, sector, country and verifier resolved.
    /// `None` when it does not exist or has no company.
    pub async fn find_detail(&self, id: i64) -> Result<Option<StatementDetail>> {
        let mut qb = QueryBuilder::new("SELECT ");
        qb.push(DETAIL_COLUMNS);
        qb.push(
            "FROM statements s \
             JOIN companies c ON c.id = s.company_id \
             LEFT JOIN sectors sec ON sec.id = c.sector_id \
             LEFT JOIN countries co ON co.id = c.country_id \
             LEFT JOIN users u ON u.id = s.verified_by_id \
             WHERE s.id = ",
        );
        qb.push_bind(id);

        qb.build_query_as::<StatementDetail>()
            .fetch_optional(self.pool())
            .await
            .map_err(Into::into)
    }

    /// The full result set, for CSV export.
    pub async fn search(
        &self,
        criteria: &SearchCriteria,
        privileged: bool,
    ) -> Result<Vec<StatementDetail>> {
        let mut qb = QueryBuilder::new("");
        push_ranked_cte(&mut qb, criteria, privileged);
        push_detail_select(&mut qb);

        qb.build_query_as::<StatementDetail>()
            .fetch_all(self.pool())
            .await
            .map_err(Into::into)
    }

    /// One page of the result set, for the HTML listing. `page` is 1-based and
    /// clamped to at least 1. A page whose offset overflows is empty.
    pub async fn search_page(
        &self,
        criteria: &SearchCriteria,
        privileged: bool,
        page: i64,
        per_page: i64,
    ) -> Result<Page<StatementDetail>> {
        let page = page.max(1);
        let per_page = per_page.max(1);

        let mut count = QueryBuilder::new("");
        push_ranked_cte(&mut count, criteria, privileged);
        count.push("SELECT COUNT(*) FROM ranked WHERE company_rank = 1");
        let (total,) = count
            .build_query_as::<(i64,)>()
            .fetch_one(self.pool())
            .await?;

        let Some(offset) = (page - 1).checked_mul(per_page) else {
            return Ok(Page {
                items: Vec::new(),
                total,
                page,
                per_page,
            });
        };

        let mut qb = QueryBuilder::new("");
        push_ranked_cte(&mut qb, criteria, privileged);
        push_detail_select(&mut qb);
        qb.push("LIMIT ");
        qb.push_bind(per_page);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        let items = qb
            .build_query_as::<StatementDetail>()
            .fetch_all(self.pool())
            .await?;

        Ok(Page {
            items,
            total,
            page,
            per_page,
        })
    }
}
