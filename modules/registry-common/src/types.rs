use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

// --- Verification values ---

/// Whether the company's board approved the statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ApprovedByBoard {
    Yes,
    No,
    #[serde(rename = "Not explicit")]
    NotExplicit,
}

impl ApprovedByBoard {
    pub const ALL: [ApprovedByBoard; 3] = [Self::Yes, Self::No, Self::NotExplicit];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yes => "Yes",
            Self::No => "No",
            Self::NotExplicit => "Not explicit",
        }
    }
}

impl fmt::Display for ApprovedByBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApprovedByBoard {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| RegistryError::InvalidValue {
                field: "approved_by_board",
                value: s.to_string(),
            })
    }
}

// --- URL check status ---

/// Where a statement is in the asynchronous URL liveness check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlCheckStatus {
    /// Saved, waiting for the link-check worker.
    Pending,
    /// `broken_url` reflects the url currently stored.
    Checked,
    /// Checks were disabled when the statement was last saved.
    Skipped,
}

impl UrlCheckStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Checked => "checked",
            Self::Skipped => "skipped",
        }
    }
}

impl fmt::Display for UrlCheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for UrlCheckStatus {
    type Error = RegistryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "pending" => Ok(Self::Pending),
            "checked" => Ok(Self::Checked),
            "skipped" => Ok(Self::Skipped),
            _ => Err(RegistryError::InvalidValue {
                field: "url_checked",
                value,
            }),
        }
    }
}

/// Outcome of a URL liveness check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkCheck {
    /// The url to store: the fetched URL on success, the submitted one otherwise.
    pub url: String,
    pub broken_url: bool,
}

impl LinkCheck {
    pub fn reachable(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            broken_url: false,
        }
    }

    pub fn broken(submitted: impl Into<String>) -> Self {
        Self {
            url: submitted.into(),
            broken_url: true,
        }
    }
}

// --- Statement ---

/// A company's modern-slavery statement as stored.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Statement {
    pub id: i64,
    pub company_id: Option<i64>,
    pub url: String,
    pub broken_url: bool,
    #[sqlx(try_from = "String")]
    pub url_checked: UrlCheckStatus,
    pub date_seen: NaiveDate,
    pub published: bool,
    pub approved_by_board: Option<String>,
    pub approved_by: Option<String>,
    pub signed_by_director: Option<bool>,
    pub signed_by: Option<String>,
    pub link_on_front_page: Option<bool>,
    pub verified_by_id: Option<i64>,
    pub contributor_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Statement {
    pub fn verified(&self) -> bool {
        self.verified_by_id.is_some()
    }

    /// The editable fields, for building an update.
    pub fn to_input(&self) -> StatementInput {
        StatementInput {
            company_id: self.company_id,
            url: self.url.clone(),
            date_seen: Some(self.date_seen),
            published: self.published,
            approved_by_board: self.approved_by_board.clone(),
            approved_by: self.approved_by.clone(),
            signed_by_director: self.signed_by_director,
            signed_by: self.signed_by.clone(),
            link_on_front_page: self.link_on_front_page,
            verified_by_id: self.verified_by_id,
            contributor_email: self.contributor_email.clone(),
        }
    }
}

/// Fields accepted when creating or updating a statement.
///
/// `date_seen` is only read on create; updates never change it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementInput {
    pub company_id: Option<i64>,
    pub url: String,
    pub date_seen: Option<NaiveDate>,
    #[serde(default)]
    pub published: bool,
    pub approved_by_board: Option<String>,
    pub approved_by: Option<String>,
    pub signed_by_director: Option<bool>,
    pub signed_by: Option<String>,
    pub link_on_front_page: Option<bool>,
    pub verified_by_id: Option<i64>,
    pub contributor_email: Option<String>,
}

impl StatementInput {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn verified(&self) -> bool {
        self.verified_by_id.is_some()
    }
}

/// A newest-per-company search result with its company, sector, country and
/// verifier already resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct StatementDetail {
    pub id: i64,
    pub company_id: i64,
    pub company_name: String,
    pub sector_name: Option<String>,
    pub country_name: Option<String>,
    pub url: String,
    pub broken_url: bool,
    pub date_seen: NaiveDate,
    pub published: bool,
    pub approved_by_board: Option<String>,
    pub approved_by: Option<String>,
    pub signed_by_director: Option<bool>,
    pub signed_by: Option<String>,
    pub link_on_front_page: Option<bool>,
    pub verified_by_email: Option<String>,
    pub contributor_email: Option<String>,
}
