use std::sync::Arc;

use axum::{
    extract::{RawQuery, State},
    http::header,
    response::{Html, IntoResponse, Response},
};
use chrono::NaiveDate;
use registry_store::{Country, Sector};
use tracing::info;

use crate::auth::CurrentUser;
use crate::components::{explore_to_view, render_explore};
use crate::error::ApiError;
use crate::params::ExploreParams;
use crate::AppState;

/// `GET /explore`: paginated HTML listing, or the CSV when `format=csv`.
pub async fn explore(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    let params = ExploreParams::from_query(query.as_deref());
    if params.wants_csv() {
        return export_csv(&state, &user, &params).await;
    }

    let admin = user.is_admin();
    let page = state
        .store
        .search_page(&params.to_criteria(), admin, params.page, state.page_size)
        .await?;
    let sectors = Sector::list_all(state.store.pool()).await?;
    let countries = Country::list_all(state.store.pool()).await?;

    let view = explore_to_view(&page, &params, &sectors, &countries, admin);
    Ok(Html(render_explore(view)).into_response())
}

/// `GET /explore.csv`
pub async fn explore_csv(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    let params = ExploreParams::from_query(query.as_deref());
    export_csv(&state, &user, &params).await
}

async fn export_csv(
    state: &AppState,
    user: &CurrentUser,
    params: &ExploreParams,
) -> Result<Response, ApiError> {
    let privileged = user.is_admin();
    let statements = state.store.search(&params.to_criteria(), privileged).await?;
    let body = registry_export::to_csv(&statements, privileged)?;

    info!(rows = statements.len(), privileged, "Statements exported");

    let disposition = format!(
        "attachment; filename=\"{}\"",
        csv_filename(chrono::Utc::now().date_naive())
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

pub fn csv_filename(date: NaiveDate) -> String {
    format!("modernslaveryregistry-{}.csv", date.format("%Y-%m-%d"))
}
