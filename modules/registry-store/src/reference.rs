use chrono::{DateTime, Utc};
use registry_common::Result;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// An industry sector. The public UI calls these "industries".
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Sector {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Sector {
    pub async fn create(name: &str, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>("INSERT INTO sectors (name) VALUES ($1) RETURNING *")
            .bind(name)
            .fetch_one(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM sectors ORDER BY name ASC")
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Country {
    pub id: i64,
    /// ISO 3166-1 alpha-2.
    pub code: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Country {
    pub async fn create(code: &str, name: &str, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO countries (code, name) VALUES ($1, $2) RETURNING *",
        )
        .bind(code)
        .bind(name)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM countries ORDER BY name ASC")
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }
}
