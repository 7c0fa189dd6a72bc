//! HTTP handlers for document operations.
//! Thin adapters over `DocumentService`: multipart uploads are collected
//! into memory, downloads stream from disk without buffering.

use crate::{
    errors::AppError,
    models::document::Document,
    services::document_service::{DocumentService, UploadFile},
};
use axum::{
    Json,
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tokio_util::io::ReaderStream;

/// Query params accepted by the search endpoint.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub query: String,
}

/// Request body for metadata-only document creation.
#[derive(Debug, Deserialize)]
pub struct CreateDocumentReq {
    pub title: String,
    pub content: Option<String>,
}

/// GET `/documents` — list every document.
pub async fn list_documents(
    State(service): State<DocumentService>,
) -> Result<Json<Vec<Document>>, AppError> {
    let docs = service.list_documents().await?;
    tracing::debug!("retrieved {} documents", docs.len());
    Ok(Json(docs))
}

/// GET `/documents/search?query=` — case-sensitive substring search over
/// title and content.
pub async fn search_documents(
    State(service): State<DocumentService>,
    Query(params): Query<SearchQuery>,
) -> Result<Json<Vec<Document>>, AppError> {
    if params.query.is_empty() {
        return Err(AppError::bad_request("query must not be empty"));
    }
    Ok(Json(service.search_documents(&params.query).await?))
}

/// POST `/documents` — create a document from bare metadata, no file.
pub async fn create_document(
    State(service): State<DocumentService>,
    Json(payload): Json<CreateDocumentReq>,
) -> Result<Json<Document>, AppError> {
    let doc = service
        .create_document(
            &payload.title,
            payload.content.as_deref().unwrap_or_default(),
            service.default_owner_id,
        )
        .await?;
    Ok(Json(doc))
}

/// GET `/documents/{id}` — fetch a single document.
pub async fn get_document(
    State(service): State<DocumentService>,
    Path(id): Path<i64>,
) -> Result<Json<Document>, AppError> {
    let doc = service
        .get_document(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("document {} not found", id)))?;
    Ok(Json(doc))
}

/// DELETE `/documents/{id}` — delete a document; idempotent.
pub async fn delete_document(
    State(service): State<DocumentService>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    service.delete_document(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST `/documents/upload` — ingest every multipart field carrying a
/// filename. The whole batch succeeds or the call fails on the first bad
/// file.
pub async fn upload_documents(
    State(service): State<DocumentService>,
    mut multipart: Multipart,
) -> Result<Json<Vec<Document>>, AppError> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::bad_request(err.to_string()))?
    {
        // fields without a filename are form values, not uploads
        let Some(original_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|err| AppError::bad_request(err.to_string()))?;
        files.push(UploadFile {
            original_name,
            content_type,
            data,
        });
    }

    let docs = service
        .ingest_files(files, service.default_owner_id)
        .await?;
    Ok(Json(docs))
}

/// GET `/documents/download/{id}` — stream the stored file back as an
/// attachment named after the document's filename.
pub async fn download_document(
    State(service): State<DocumentService>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    let (doc, file) = service.open_download(id).await?;
    let length = file.metadata().await.ok().map(|m| m.len());

    let stream = ReaderStream::new(file);
    let mut response = Response::new(Body::from_stream(stream));
    let headers = response.headers_mut();

    let content_type = doc
        .filetype
        .clone()
        .unwrap_or_else(|| "application/octet-stream".into());
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(&content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream")),
    );

    if let Some(length) = length {
        headers.insert(
            header::CONTENT_LENGTH,
            HeaderValue::from_str(&length.to_string())
                .unwrap_or_else(|_| HeaderValue::from_static("0")),
        );
    }

    let filename = doc.filename.as_deref().unwrap_or("download");
    let disposition = format!("attachment; filename=\"{}\"", filename);
    if let Ok(value) = HeaderValue::from_str(&disposition) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }

    Ok(response)
}
