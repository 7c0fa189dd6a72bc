//! Defines routes for all document operations.
//!
//! ## Structure
//! - **Collection endpoints**
//!   - `GET    /documents` — list all documents
//!   - `POST   /documents` — create a metadata-only document
//!   - `GET    /documents/search?query=` — substring search over title/content
//!   - `POST   /documents/upload` — multipart file upload (batch)
//!
//! - **Single-document endpoints**
//!   - `GET    /documents/{id}` — fetch one document
//!   - `DELETE /documents/{id}` — delete one document
//!   - `GET    /documents/download/{id}` — download the stored file
//!
//! Static segments (`search`, `upload`, `download`) take precedence over the
//! `{id}` capture.

use crate::{
    handlers::{
        document_handlers::{
            create_document, delete_document, download_document, get_document, list_documents,
            search_documents, upload_documents,
        },
        health_handlers::{healthz, readyz},
    },
    services::document_service::DocumentService,
};
use axum::{
    Router,
    routing::{get, post},
};

/// Build and return the router for all document routes.
///
/// The router carries shared state (`DocumentService`) to all handlers.
pub fn routes() -> Router<DocumentService> {
    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // collection routes
        .route("/documents", get(list_documents).post(create_document))
        .route("/documents/search", get(search_documents))
        .route("/documents/upload", post(upload_documents))
        // single-document routes
        .route("/documents/download/{id}", get(download_document))
        .route(
            "/documents/{id}",
            get(get_document).delete(delete_document),
        )
}
