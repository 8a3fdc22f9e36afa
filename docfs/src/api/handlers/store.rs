use crate::AppState;
use crate::api::headers::ApiKey;
use crate::api::models::documents::{AttachmentPath, UserDocumentPath};
use crate::errors::{Error, WriteRejection};
use crate::types::{CreateRequest, DocumentCategory, RemoveRequest};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use tracing::{info, instrument};

async fn write_document(
    state: &AppState,
    api_key: &str,
    body: Result<Json<CreateRequest>, JsonRejection>,
    category: DocumentCategory,
) -> Result<(StatusCode, Json<bool>), WriteRejection> {
    let Json(request) = body.map_err(|rejection| Error::invalid_request(rejection.body_text()))?;
    state.key_cache.check_or_set(api_key).await?;
    state.documents.get(category).write(&request).await?;

    info!(%category, organization_id = %request.organization_id, file_name = %request.file_name, "Document stored");
    Ok((StatusCode::CREATED, Json(true)))
}

async fn remove_document(
    state: &AppState,
    api_key: &str,
    request: RemoveRequest,
    category: DocumentCategory,
) -> Result<(StatusCode, Json<bool>), WriteRejection> {
    state.key_cache.check_or_set(api_key).await?;
    state.documents.get(category).remove(&request).await?;

    info!(%category, organization_id = %request.organization_id, file_name = %request.file_name, "Document removed");
    Ok((StatusCode::ACCEPTED, Json(true)))
}

/// `POST /api/document`
#[instrument(skip_all)]
pub async fn create_user_document(
    State(state): State<AppState>,
    ApiKey(api_key): ApiKey,
    body: Result<Json<CreateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<bool>), WriteRejection> {
    write_document(&state, &api_key, body, DocumentCategory::UserDocument).await
}

/// `POST /api/attachment`
#[instrument(skip_all)]
pub async fn create_attachment(
    State(state): State<AppState>,
    ApiKey(api_key): ApiKey,
    body: Result<Json<CreateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<bool>), WriteRejection> {
    write_document(&state, &api_key, body, DocumentCategory::Attachment).await
}

/// `DELETE /api/document/{organizationId}/{userId}/{fileName}`
#[instrument(skip_all)]
pub async fn remove_user_document(
    State(state): State<AppState>,
    ApiKey(api_key): ApiKey,
    Path(path): Path<UserDocumentPath>,
) -> Result<(StatusCode, Json<bool>), WriteRejection> {
    remove_document(&state, &api_key, path.into(), DocumentCategory::UserDocument).await
}

/// `DELETE /api/attachment/{organizationId}/{fileName}`
#[instrument(skip_all)]
pub async fn remove_attachment(
    State(state): State<AppState>,
    ApiKey(api_key): ApiKey,
    Path(path): Path<AttachmentPath>,
) -> Result<(StatusCode, Json<bool>), WriteRejection> {
    remove_document(&state, &api_key, path.into(), DocumentCategory::Attachment).await
}
