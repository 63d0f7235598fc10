use chrono::{DateTime, Utc};
use registry_common::Result;
use sqlx::PgPool;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// A captured copy of a statement page: the original document and/or a
/// screenshot of it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Snapshot {
    pub id: i64,
    pub statement_id: Option<i64>,
    pub content_type: Option<String>,
    pub content_data: Option<Vec<u8>>,
    pub image_content_type: Option<String>,
    pub image_content_data: Option<Vec<u8>>,
    pub created_at: DateTime<Utc>,
}

/// A borrowed view of one stored file. Only present when it has bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attachment<'a> {
    pub data: &'a [u8],
    pub content_type: &'a str,
}

impl<'a> Attachment<'a> {
    fn from_parts(data: &'a Option<Vec<u8>>, content_type: &'a Option<String>) -> Option<Self> {
        let data = data.as_deref().filter(|d| !d.is_empty())?;
        Some(Self {
            data,
            content_type: content_type.as_deref().unwrap_or(DEFAULT_CONTENT_TYPE),
        })
    }
}

impl Snapshot {
    pub async fn create(
        statement_id: i64,
        original: Option<(&[u8], &str)>,
        screenshot: Option<(&[u8], &str)>,
        pool: &PgPool,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO snapshots
                (statement_id, content_data, content_type, image_content_data, image_content_type)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(statement_id)
        .bind(original.map(|(data, _)| data))
        .bind(original.map(|(_, content_type)| content_type))
        .bind(screenshot.map(|(data, _)| data))
        .bind(screenshot.map(|(_, content_type)| content_type))
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Most recent snapshot taken for a statement.
    pub async fn latest_for_statement(statement_id: i64, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM snapshots
            WHERE statement_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(statement_id)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    pub fn original(&self) -> Option<Attachment<'_>> {
        Attachment::from_parts(&self.content_data, &self.content_type)
    }

    pub fn screenshot(&self) -> Option<Attachment<'_>> {
        Attachment::from_parts(&self.image_content_data, &self.image_content_type)
    }

    /// The file that best represents the statement visually: screenshot first,
    /// then the original.
    pub fn screenshot_or_original(&self) -> Option<Attachment<'_>> {
        [self.screenshot(), self.original()].into_iter().flatten().next()
    }

    /// An HTML original is only previewable through its screenshot.
    pub fn previewable(&self) -> bool {
        !self.original_is_html() || self.screenshot().is_some()
    }

    pub fn original_is_pdf(&self) -> bool {
        self.original_content_type_contains("pdf")
    }

    fn original_is_html(&self) -> bool {
        self.original_content_type_contains("html")
    }

    fn original_content_type_contains(&self, needle: &str) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.contains(needle))
    }
}
