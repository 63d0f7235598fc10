use registry_common::StatementDetail;
use registry_store::{Country, Page, Sector};

use crate::params::ExploreParams;

pub mod explore;
pub mod layout;

pub use explore::render_explore;

// --- View Models ---

#[derive(Clone, PartialEq)]
pub struct StatementRow {
    pub id: i64,
    pub company_name: String,
    pub url: String,
    pub sector: String,
    pub country: String,
    pub date_seen: String,
    pub broken_url: bool,
    pub published: bool,
}

#[derive(Clone, PartialEq)]
pub struct FilterOption {
    pub id: i64,
    pub name: String,
    pub selected: bool,
}

#[derive(Clone, PartialEq)]
pub struct ExploreView {
    pub rows: Vec<StatementRow>,
    pub total: i64,
    pub page: i64,
    pub total_pages: i64,
    pub previous_href: Option<String>,
    pub next_href: Option<String>,
    pub download_href: String,
    pub company_name: String,
    pub industries: Vec<FilterOption>,
    pub countries: Vec<FilterOption>,
    /// Administrators also see unpublished and broken-link markers.
    pub admin: bool,
}

pub fn statement_to_row(s: &StatementDetail) -> StatementRow {
    StatementRow {
        id: s.id,
        company_name: s.company_name.clone(),
        url: s.url.clone(),
        sector: s.sector_name.clone().unwrap_or_default(),
        country: s.country_name.clone().unwrap_or_default(),
        date_seen: s.date_seen.format("%Y-%m-%d").to_string(),
        broken_url: s.broken_url,
        published: s.published,
    }
}

fn options<'a>(all: impl Iterator<Item = (i64, &'a str)>, selected: &[i64]) -> Vec<FilterOption> {
    all.map(|(id, name)| FilterOption {
        id,
        name: name.to_string(),
        selected: selected.contains(&id),
    })
    .collect()
}

pub fn explore_to_view(
    page: &Page<StatementDetail>,
    params: &ExploreParams,
    sectors: &[Sector],
    countries: &[Country],
    admin: bool,
) -> ExploreView {
    ExploreView {
        rows: page.items.iter().map(statement_to_row).collect(),
        total: page.total,
        page: page.page,
        total_pages: page.total_pages(),
        previous_href: page
            .has_previous()
            .then(|| params.page_href(page.page - 1)),
        next_href: page.has_next().then(|| params.page_href(page.page + 1)),
        download_href: params.download_href(),
        company_name: params.company_name.clone().unwrap_or_default(),
        industries: options(
            sectors.iter().map(|s| (s.id, s.name.as_str())),
            &params.industries,
        ),
        countries: options(
            countries.iter().map(|c| (c.id, c.name.as_str())),
            &params.countries,
        ),
        admin,
    }
}
