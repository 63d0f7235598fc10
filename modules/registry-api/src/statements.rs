use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use registry_common::{RegistryError, Statement, StatementInput, UrlCheckStatus};
use registry_store::{Company, Snapshot};
use serde::Deserialize;
use tracing::info;

use crate::auth::AdminUser;
use crate::error::ApiError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmitStatement {
    pub company_id: Option<i64>,
    #[serde(default)]
    pub url: String,
    pub contributor_email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyStatement {
    pub approved_by_board: Option<String>,
    pub approved_by: Option<String>,
    pub signed_by_director: Option<bool>,
    pub signed_by: Option<String>,
    pub link_on_front_page: Option<bool>,
    /// Left as stored when absent.
    pub published: Option<bool>,
}

impl AppState {
    fn queue_link_check(&self, statement: &Statement) {
        if statement.url_checked != UrlCheckStatus::Pending {
            return;
        }
        if let Some(queue) = &self.link_checks {
            queue.enqueue(statement.id);
        }
    }
}

/// `POST /api/statements`: a contributor suggests a statement. It starts
/// unverified and unpublished.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SubmitStatement>,
) -> Result<(StatusCode, Json<Statement>), ApiError> {
    if let Some(company_id) = body.company_id {
        Company::find_by_id(company_id, state.store.pool()).await?;
    }

    let input = StatementInput {
        company_id: body.company_id,
        contributor_email: body.contributor_email,
        ..StatementInput::new(body.url)
    };
    let statement = state.store.create(&input).await?;
    state.queue_link_check(&statement);

    info!(statement_id = statement.id, "Statement submitted");
    Ok((StatusCode::CREATED, Json(statement)))
}

/// `PUT /api/statements/{id}/verification`: an administrator records the
/// verification fields and becomes the verifier.
pub async fn verify(
    State(state): State<Arc<AppState>>,
    AdminUser(admin): AdminUser,
    Path(id): Path<i64>,
    Json(body): Json<VerifyStatement>,
) -> Result<Json<Statement>, ApiError> {
    let existing = state.store.find_by_id(id).await?;
    let published = body.published.unwrap_or(existing.published);

    let input = StatementInput {
        approved_by_board: body.approved_by_board,
        approved_by: body.approved_by,
        signed_by_director: body.signed_by_director,
        signed_by: body.signed_by,
        link_on_front_page: body.link_on_front_page,
        published,
        verified_by_id: Some(admin.id),
        ..existing.to_input()
    };
    let statement = state.store.update(id, &input).await?;
    state.queue_link_check(&statement);

    info!(statement_id = id, verified_by = admin.id, published = statement.published, "Statement verified");
    Ok(Json(statement))
}

/// `GET /statements/{id}/snapshot`: the screenshot if there is one, else the
/// captured original.
pub async fn snapshot(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    let snapshot = Snapshot::latest_for_statement(id, state.store.pool())
        .await?
        .ok_or_else(|| RegistryError::not_found("snapshot", id))?;
    let visual = snapshot
        .screenshot_or_original()
        .ok_or_else(|| RegistryError::not_found("snapshot", id))?;

    Ok((
        [(header::CONTENT_TYPE, visual.content_type.to_string())],
        visual.data.to_vec(),
    )
        .into_response())
}
