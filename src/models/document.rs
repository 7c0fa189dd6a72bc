//! Represents a document: metadata for an uploaded file, or a bare
//! title/content record created without one.

use serde::Serialize;
use sqlx::FromRow;

/// A single document record.
///
/// Documents created through file ingestion always carry `filename`,
/// `filetype`, and `file_url`; documents created from plain metadata have
/// all three absent. The record stores metadata plus any derived text
/// content, never the raw file bytes.
#[derive(Serialize, Clone, FromRow, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Integer identifier assigned by the store on creation.
    pub id: i64,

    /// Display name. For ingested files this is the final storage filename.
    pub title: String,

    /// Textual body: decoded file content for text uploads, a generated
    /// placeholder for everything else, or caller-supplied text.
    pub content: String,

    /// Final collision-resistant name used on disk.
    pub filename: Option<String>,

    /// Declared MIME type, as supplied by the uploading client.
    pub filetype: Option<String>,

    /// Storage path where the bytes live. Authoritative for retrieval.
    pub file_url: Option<String>,

    /// Owning user. Internal reference, never exposed over the API.
    #[serde(skip_serializing)]
    pub user_id: i64,
}
