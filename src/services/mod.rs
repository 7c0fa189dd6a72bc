//! Service layer: the document ingestion and retrieval core.

pub mod document_service;
