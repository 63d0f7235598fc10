//! CSV export of search results.
//!
//! Everyone gets the five basic columns. Administrators also get the
//! verification columns, appended in a fixed order.

use std::io::Write;

use chrono::NaiveDate;
use registry_common::StatementDetail;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Export is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// One exported column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    CompanyName,
    Url,
    SectorName,
    CountryName,
    DateSeen,
    ApprovedByBoard,
    ApprovedBy,
    SignedByDirector,
    SignedBy,
    LinkOnFrontPage,
    Published,
    VerifiedByEmail,
    ContributorEmail,
    BrokenUrl,
}

pub const BASIC_COLUMNS: [Column; 5] = [
    Column::CompanyName,
    Column::Url,
    Column::SectorName,
    Column::CountryName,
    Column::DateSeen,
];

pub const EXTRA_COLUMNS: [Column; 9] = [
    Column::ApprovedByBoard,
    Column::ApprovedBy,
    Column::SignedByDirector,
    Column::SignedBy,
    Column::LinkOnFrontPage,
    Column::Published,
    Column::VerifiedByEmail,
    Column::ContributorEmail,
    Column::BrokenUrl,
];

impl Column {
    pub fn heading(self) -> &'static str {
        match self {
            Self::CompanyName => "Company",
            Self::Url => "URL",
            Self::SectorName => "Sector",
            Self::CountryName => "HQ",
            Self::DateSeen => "Date Added",
            Self::ApprovedByBoard => "Approved by Board",
            Self::ApprovedBy => "Approved by",
            Self::SignedByDirector => "Signed by Director",
            Self::SignedBy => "Signed by",
            Self::LinkOnFrontPage => "Link on Front Page",
            Self::Published => "Published",
            Self::VerifiedByEmail => "Verified by",
            Self::ContributorEmail => "Contributed by",
            Self::BrokenUrl => "Broken URL",
        }
    }

    /// Cell text. Dates are ISO-8601, booleans `true`/`false`, absent values
    /// empty.
    pub fn value(self, s: &StatementDetail) -> String {
        match self {
            Self::CompanyName => s.company_name.clone(),
            Self::Url => s.url.clone(),
            Self::SectorName => text(&s.sector_name),
            Self::CountryName => text(&s.country_name),
            Self::DateSeen => iso_date(s.date_seen),
            Self::ApprovedByBoard => text(&s.approved_by_board),
            Self::ApprovedBy => text(&s.approved_by),
            Self::SignedByDirector => flag(s.signed_by_director),
            Self::SignedBy => text(&s.signed_by),
            Self::LinkOnFrontPage => flag(s.link_on_front_page),
            Self::Published => s.published.to_string(),
            Self::VerifiedByEmail => text(&s.verified_by_email),
            Self::ContributorEmail => text(&s.contributor_email),
            Self::BrokenUrl => s.broken_url.to_string(),
        }
    }
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

fn flag(value: Option<bool>) -> String {
    value.map(|b| b.to_string()).unwrap_or_default()
}

fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Columns for a caller: basic, plus the verification columns when
/// privileged.
pub fn columns(privileged: bool) -> Vec<Column> {
    let mut columns = BASIC_COLUMNS.to_vec();
    if privileged {
        columns.extend(EXTRA_COLUMNS);
    }
    columns
}

/// Write a header row and one row per statement, in the order given.
pub fn write_csv<W: Write>(
    out: W,
    statements: &[StatementDetail],
    privileged: bool,
) -> Result<W, ExportError> {
    let columns = columns(privileged);
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(out);

    writer.write_record(columns.iter().map(|c| c.heading()))?;
    for statement in statements {
        writer.write_record(columns.iter().map(|c| c.value(statement)))?;
    }

    writer.flush()?;
    writer.into_inner().map_err(|e| e.into_error().into())
}

pub fn to_csv(statements: &[StatementDetail], privileged: bool) -> Result<String, ExportError> {
    let bytes = write_csv(Vec::new(), statements, privileged)?;
    Ok(String::from_utf8(bytes)?)
}
