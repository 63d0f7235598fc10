//! Explore-page query parameters.
//!
//! List filters arrive in every shape browsers and old links produce:
//! repeated keys (`countries=1&countries=2`), bracketed keys
//! (`countries[]=1`) and comma lists (`countries=1,2`). All three are
//! accepted and merged.

use registry_store::SearchCriteria;
use url::form_urlencoded;

/// Upper bound for the `page` parameter.
pub const MAX_PAGE: i64 = 1_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExploreParams {
    pub company_name: Option<String>,
    pub industries: Vec<i64>,
    pub countries: Vec<i64>,
    pub legislations: Vec<String>,
    /// 1-based, at most [`MAX_PAGE`].
    pub page: i64,
    pub format: Option<String>,
}

impl Default for ExploreParams {
    fn default() -> Self {
        Self {
            company_name: None,
            industries: Vec::new(),
            countries: Vec::new(),
            legislations: Vec::new(),
            page: 1,
            format: None,
        }
    }
}

impl ExploreParams {
    pub fn from_query(query: Option<&str>) -> Self {
        let mut params = Self::default();
        let Some(query) = query else {
            return params;
        };

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let key = key.strip_suffix("[]").unwrap_or(&*key);
            match key {
                "company_name" => {
                    let name = value.trim();
                    params.company_name = (!name.is_empty()).then(|| name.to_string());
                }
                "industries" => params.industries.extend(ids(&value)),
                "countries" => params.countries.extend(ids(&value)),
                "legislations" => params.legislations.extend(
                    list(&value).map(str::to_string),
                ),
                "page" => {
                    params.page = value.trim().parse::<i64>().unwrap_or(1).clamp(1, MAX_PAGE);
                }
                "format" => params.format = Some(value.trim().to_ascii_lowercase()),
                _ => {}
            }
        }

        params
    }

    pub fn wants_csv(&self) -> bool {
        self.format.as_deref() == Some("csv")
    }

    pub fn to_criteria(&self) -> SearchCriteria {
        SearchCriteria {
            company_name: self.company_name.clone(),
            sector_ids: self.industries.clone(),
            country_ids: self.countries.clone(),
            legislations: self.legislations.clone(),
        }
    }

    /// Link to the CSV of the current result set.
    pub fn download_href(&self) -> String {
        let mut query = self.filter_query();
        query.append_pair("format", "csv");
        format!("/explore?{}", query.finish())
    }

    /// Link to another page of the current result set.
    pub fn page_href(&self, page: i64) -> String {
        let mut query = self.filter_query();
        query.append_pair("page", &page.to_string());
        format!("/explore?{}", query.finish())
    }

    fn filter_query(&self) -> form_urlencoded::Serializer<'static, String> {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if let Some(name) = &self.company_name {
            query.append_pair("company_name", name);
        }
        for id in &self.industries {
            query.append_pair("industries[]", &id.to_string());
        }
        for id in &self.countries {
            query.append_pair("countries[]", &id.to_string());
        }
        for legislation in &self.legislations {
            query.append_pair("legislations[]", legislation);
        }
        query
    }
}

fn list(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|v| !v.is_empty())
}

/// Ids in a parameter value. Anything that is not a number is ignored.
fn ids(value: &str) -> impl Iterator<Item = i64> + '_ {
    list(value).filter_map(|v| v.parse().ok())
}
