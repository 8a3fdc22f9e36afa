use crate::AppState;
use crate::acl::AccessTarget;
use crate::api::headers::Token;
use crate::errors::ReadRejection;
use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use tracing::instrument;

/// Asks the ACL service which document `token` grants for `target`, then reads it from the
/// category's store.
async fn read_document(state: &AppState, token: &str, target: AccessTarget) -> Result<Response, ReadRejection> {
    let access = state.verifier.verify(token, target).await?;
    let content = state.documents.get(target.category()).read(&access).await?;
    Ok(([(header::CONTENT_TYPE, "application/octet-stream")], content).into_response())
}

/// `GET /api/document/{documentId}`
#[instrument(skip_all, fields(document_id = document_id))]
pub async fn get_user_document(
    State(state): State<AppState>,
    Token(token): Token,
    Path(document_id): Path<i64>,
) -> Result<Response, ReadRejection> {
    read_document(&state, &token, AccessTarget::UserDocument(document_id)).await
}

/// `GET /api/attachment/{attachmentId}`
#[instrument(skip_all, fields(attachment_id = attachment_id))]
pub async fn get_attachment(
    State(state): State<AppState>,
    Token(token): Token,
    Path(attachment_id): Path<i64>,
) -> Result<Response, ReadRejection> {
    read_document(&state, &token, AccessTarget::Attachment(attachment_id)).await
}

/// `GET /api/performance`, the caller's own report
#[instrument(skip_all)]
pub async fn get_performance_result(State(state): State<AppState>, Token(token): Token) -> Result<Response, ReadRejection> {
    read_document(&state, &token, AccessTarget::PerformanceResult).await
}
