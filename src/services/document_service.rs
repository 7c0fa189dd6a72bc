//! src/services/document_service.rs
//!
//! DocumentService — document ingestion and retrieval backed by SQLite for
//! metadata and local disk for file payloads. Uploaded files land directly
//! beneath `storage_root` under a collision-resistant
//! `<uuid>_<sanitized-name>` filename; one metadata row is inserted per
//! stored file.

use crate::models::{document::Document, user::User};
use bytes::Bytes;
use chrono::{SecondsFormat, Utc};
use sqlx::SqlitePool;
use std::{
    io,
    path::{Component, Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;
use tokio::fs::{self, File};
use tracing::{debug, warn};
use uuid::Uuid;

/// One inbound file as received from the upload endpoint.
#[derive(Clone, Debug)]
pub struct UploadFile {
    /// Name the client declared for the file.
    pub original_name: String,

    /// Declared MIME type, trusted but not verified against the bytes.
    pub content_type: Option<String>,

    /// The raw payload, fully buffered.
    pub data: Bytes,
}

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("no files provided")]
    NoFiles,
    #[error("invalid file name `{0}`")]
    InvalidFileName(String),
    #[error("unknown owner {0}")]
    UnknownOwner(i64),
    #[error("document {0} not found")]
    NotFound(i64),
    #[error("document {0} has no stored file")]
    MissingFile(i64),
    #[error("stored location for document {id} is outside the storage root")]
    InvalidLocation { id: i64 },
    #[error("failed to store file `{name}`: {source}")]
    WriteFailed {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to read stored file `{name}`: {source}")]
    RetrievalFailed {
        name: String,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type DocumentResult<T> = Result<T, DocumentError>;

const DOCUMENT_COLUMNS: &str = "id, title, content, filename, filetype, file_url, user_id";

/// DocumentService provides the core operations of the service:
/// - Ingest uploaded files (write bytes to disk, derive metadata, insert a row)
/// - Create metadata-only documents
/// - List, search, fetch, and delete documents
/// - Open a stored file for download, validating its location
///
/// This struct intentionally keeps a minimal surface area so it is easy to
/// test and reason about. Each operation runs to completion independently;
/// there is no transaction spanning the disk write and the metadata insert.
#[derive(Clone)]
pub struct DocumentService {
    /// Shared SQLite connection pool used for metadata operations.
    pub db: Arc<SqlitePool>,

    /// Base directory on disk where uploaded files are stored.
    pub storage_root: PathBuf,

    /// Owner assigned to documents when the caller does not authenticate.
    pub default_owner_id: i64,
}

impl DocumentService {
    /// Create a new DocumentService backed by the provided SQLite pool and
    /// using `storage_root` as the directory for uploaded files.
    pub fn new(db: Arc<SqlitePool>, storage_root: impl Into<PathBuf>, default_owner_id: i64) -> Self {
        Self {
            db,
            storage_root: storage_root.into(),
            default_owner_id,
        }
    }

    /// Fetch an owning user row.
    ///
    /// Returns UnknownOwner if missing. Every create/ingest path validates
    /// the owner up front; documents never reference a nonexistent user.
    async fn fetch_owner(&self, id: i64) -> DocumentResult<User> {
        sqlx::query_as::<_, User>("SELECT id, username, created_at FROM users WHERE id = ?")
            .bind(id)
            .fetch_one(&*self.db)
            .await
            .map_err(|err| match err {
                sqlx::Error::RowNotFound => DocumentError::UnknownOwner(id),
                other => DocumentError::Sqlx(other),
            })
    }

    /// List every document, ordered by id.
    pub async fn list_documents(&self) -> DocumentResult<Vec<Document>> {
        let rows = sqlx::query_as::<_, Document>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents ORDER BY id"
        ))
        .fetch_all(&*self.db)
        .await?;
        Ok(rows)
    }

    /// Search documents whose title or content contains `query` as a
    /// case-sensitive substring. A match on either field returns the
    /// document once.
    ///
    /// Uses `instr()` rather than `LIKE`: LIKE is case-insensitive for
    /// ASCII in SQLite and would widen the match set.
    pub async fn search_documents(&self, query: &str) -> DocumentResult<Vec<Document>> {
        let rows = sqlx::query_as::<_, Document>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents \
             WHERE instr(title, ?) > 0 OR instr(content, ?) > 0 ORDER BY id"
        ))
        .bind(query)
        .bind(query)
        .fetch_all(&*self.db)
        .await?;
        Ok(rows)
    }

    /// Fetch a single document by id.
    pub async fn get_document(&self, id: i64) -> DocumentResult<Option<Document>> {
        let row = sqlx::query_as::<_, Document>(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&*self.db)
        .await?;
        Ok(row)
    }

    /// Create a metadata-only document (no stored file).
    pub async fn create_document(
        &self,
        title: &str,
        content: &str,
        owner_id: i64,
    ) -> DocumentResult<Document> {
        let owner = self.fetch_owner(owner_id).await?;
        let doc = sqlx::query_as::<_, Document>(&format!(
            "INSERT INTO documents (title, content, user_id) VALUES (?, ?, ?) \
             RETURNING {DOCUMENT_COLUMNS}"
        ))
        .bind(title)
        .bind(content)
        .bind(owner.id)
        .fetch_one(&*self.db)
        .await?;
        Ok(doc)
    }

    /// Delete a document by id.
    ///
    /// Idempotent: a missing id is a no-op, not an error. When the record
    /// referenced a stored file, the file is removed after the row delete,
    /// best-effort and only if its path resolves inside the storage root;
    /// a failed removal leaves an orphaned file and a warning, never an
    /// error.
    pub async fn delete_document(&self, id: i64) -> DocumentResult<()> {
        let Some(doc) = self.get_document(id).await? else {
            debug!("delete of unknown document {} ignored", id);
            return Ok(());
        };

        sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(id)
            .execute(&*self.db)
            .await?;

        if let Some(url) = &doc.file_url {
            match self.resolve_stored_path(doc.id, url).await {
                Ok(path) => match fs::remove_file(&path).await {
                    Ok(()) => debug!("removed stored file {}", path.display()),
                    Err(err) if err.kind() == io::ErrorKind::NotFound => {
                        debug!("stored file {} already missing", path.display());
                    }
                    Err(err) => {
                        warn!("failed to remove stored file {}: {}", path.display(), err);
                    }
                },
                Err(err) => warn!("skipping file cleanup for document {}: {}", id, err),
            }
        }

        Ok(())
    }

    /// Ingest a single uploaded file and return the created document.
    pub async fn ingest_file(&self, file: UploadFile, owner_id: i64) -> DocumentResult<Document> {
        let owner = self.fetch_owner(owner_id).await?;
        self.store_file(file, &owner).await
    }

    /// Ingest a batch of uploaded files, strictly in order.
    ///
    /// Fail-fast: the first failing file aborts the call and no further
    /// files are attempted. Files already written for earlier entries in
    /// the batch are not rolled back.
    pub async fn ingest_files(
        &self,
        files: Vec<UploadFile>,
        owner_id: i64,
    ) -> DocumentResult<Vec<Document>> {
        if files.is_empty() {
            return Err(DocumentError::NoFiles);
        }
        let owner = self.fetch_owner(owner_id).await?;

        let mut saved = Vec::with_capacity(files.len());
        for file in files {
            saved.push(self.store_file(file, &owner).await?);
        }
        Ok(saved)
    }

    /// Store one file: name it, write the bytes, classify, insert metadata.
    ///
    /// The write overwrites any existing file at the computed path; the
    /// random token makes a collision functionally impossible, so no
    /// existence check is performed. If the metadata insert fails the
    /// just-written file is removed again.
    async fn store_file(&self, file: UploadFile, owner: &User) -> DocumentResult<Document> {
        let sanitized = sanitize_file_name(&file.original_name)?;
        let stored_name = assign_storage_name(&sanitized);
        let path = self.storage_root.join(&stored_name);

        fs::write(&path, &file.data)
            .await
            .map_err(|source| DocumentError::WriteFailed {
                name: stored_name.clone(),
                source,
            })?;

        let (title, content) = classify_upload(&stored_name, file.content_type.as_deref(), &file.data);

        let insert = sqlx::query_as::<_, Document>(&format!(
            "INSERT INTO documents (title, content, filename, filetype, file_url, user_id) \
             VALUES (?, ?, ?, ?, ?, ?) RETURNING {DOCUMENT_COLUMNS}"
        ))
        .bind(&title)
        .bind(&content)
        .bind(&stored_name)
        .bind(&file.content_type)
        .bind(path.display().to_string())
        .bind(owner.id)
        .fetch_one(&*self.db)
        .await;

        match insert {
            Ok(doc) => {
                debug!("ingested `{}` as document {}", stored_name, doc.id);
                Ok(doc)
            }
            Err(err) => {
                let _ = fs::remove_file(&path).await;
                Err(DocumentError::Sqlx(err))
            }
        }
    }

    /// Open a document's stored file for download.
    ///
    /// Returns the record and an opened File handle ready for streaming.
    /// A record without a stored file answers MissingFile; a stored path
    /// escaping the storage root answers InvalidLocation and is never
    /// served.
    pub async fn open_download(&self, id: i64) -> DocumentResult<(Document, File)> {
        let doc = self
            .get_document(id)
            .await?
            .ok_or(DocumentError::NotFound(id))?;
        let Some(url) = doc.file_url.clone() else {
            return Err(DocumentError::MissingFile(id));
        };

        let path = self.resolve_stored_path(id, &url).await?;
        let file = File::open(&path)
            .await
            .map_err(|source| DocumentError::RetrievalFailed { name: url, source })?;

        Ok((doc, file))
    }

    /// Resolve a stored path and verify it lies inside the storage root.
    ///
    /// Rejects lexical `..` components outright, then compares the
    /// canonicalized path against the canonicalized root. Metadata-only
    /// creation never sets `file_url`, so any record failing this check
    /// was inserted outside the ingestion pipeline.
    async fn resolve_stored_path(&self, id: i64, stored: &str) -> DocumentResult<PathBuf> {
        let candidate = Path::new(stored);
        if candidate
            .components()
            .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(DocumentError::InvalidLocation { id });
        }

        let root = fs::canonicalize(&self.storage_root)
            .await
            .map_err(|source| DocumentError::RetrievalFailed {
                name: stored.to_string(),
                source,
            })?;
        let resolved = fs::canonicalize(candidate)
            .await
            .map_err(|source| DocumentError::RetrievalFailed {
                name: stored.to_string(),
                source,
            })?;

        if !resolved.starts_with(&root) {
            return Err(DocumentError::InvalidLocation { id });
        }
        Ok(resolved)
    }
}

/// Sanitize a caller-declared file name into a single flat path segment.
///
/// Backslashes are normalized to `/`, `.` and empty segments are dropped,
/// and `..` segments are resolved against what precedes them. A `..` with
/// nothing left to consume would escape upward and is rejected, as are
/// control bytes and NUL in the final name. Uploads are flat: only the
/// final segment survives.
fn sanitize_file_name(original: &str) -> DocumentResult<String> {
    let invalid = || DocumentError::InvalidFileName(original.to_string());

    let normalized = original.trim().replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();
    for segment in normalized.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                if segments.pop().is_none() {
                    return Err(invalid());
                }
            }
            other => segments.push(other),
        }
    }

    let name = segments.last().copied().ok_or_else(invalid)?;
    if name.bytes().any(|b| b.is_ascii_control() || b == b'\0') {
        return Err(invalid());
    }
    Ok(name.to_string())
}

/// Prefix a sanitized name with a fresh random token.
///
/// The v4 UUID carries 122 bits of entropy; two uploads of the same name
/// receive distinct storage names without consulting the filesystem.
fn assign_storage_name(sanitized: &str) -> String {
    format!("{}_{}", Uuid::new_v4(), sanitized)
}

/// Derive (title, content) for a stored file from its declared type.
///
/// A declared type with the case-insensitive prefix `text` selects lossy
/// UTF-8 decoding of the bytes; anything else gets a generated placeholder
/// carrying the ingestion timestamp. The title is the stored filename in
/// both cases.
fn classify_upload(stored_name: &str, content_type: Option<&str>, data: &[u8]) -> (String, String) {
    let content = if is_text_type(content_type) {
        String::from_utf8_lossy(data).into_owned()
    } else {
        format!(
            "File uploaded on {}",
            Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
        )
    };
    (stored_name.to_string(), content)
}

fn is_text_type(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|t| t.get(..4).is_some_and(|p| p.eq_ignore_ascii_case("text")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;
    use tempfile::TempDir;
    use tokio::io::AsyncReadExt;

    const DEFAULT_OWNER: i64 = 1;

    async fn setup_service() -> (TempDir, DocumentService) {
        let temp_dir = TempDir::new().unwrap();
        let db = Arc::new(
            SqlitePoolOptions::new()
                .max_connections(1)
                .connect("sqlite::memory:")
                .await
                .unwrap(),
        );
        for stmt in include_str!("../../migrations/0001_init.sql")
            .split(';')
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            sqlx::query(stmt).execute(&*db).await.unwrap();
        }
        let service = DocumentService::new(db, temp_dir.path(), DEFAULT_OWNER);
        (temp_dir, service)
    }

    fn text_file(name: &str, body: &str) -> UploadFile {
        UploadFile {
            original_name: name.to_string(),
            content_type: Some("text/plain".to_string()),
            data: Bytes::copy_from_slice(body.as_bytes()),
        }
    }

    fn stored_file_count(dir: &TempDir) -> usize {
        std::fs::read_dir(dir.path()).unwrap().count()
    }

    #[test]
    fn test_sanitize_plain_name() {
        assert_eq!(sanitize_file_name("notes.txt").unwrap(), "notes.txt");
        assert_eq!(sanitize_file_name("  notes.txt  ").unwrap(), "notes.txt");
    }

    #[test]
    fn test_sanitize_takes_final_segment() {
        assert_eq!(sanitize_file_name("a/b/notes.txt").unwrap(), "notes.txt");
        assert_eq!(sanitize_file_name("a\\b\\notes.txt").unwrap(), "notes.txt");
        assert_eq!(sanitize_file_name("./notes.txt").unwrap(), "notes.txt");
        // `a/../b.txt` resolves cleanly to `b.txt`
        assert_eq!(sanitize_file_name("a/../b.txt").unwrap(), "b.txt");
    }

    #[test]
    fn test_sanitize_rejects_escaping_traversal() {
        assert!(matches!(
            sanitize_file_name("../evil.txt"),
            Err(DocumentError::InvalidFileName(_))
        ));
        assert!(matches!(
            sanitize_file_name("a/../../evil.txt"),
            Err(DocumentError::InvalidFileName(_))
        ));
        assert!(matches!(
            sanitize_file_name("..\\evil.txt"),
            Err(DocumentError::InvalidFileName(_))
        ));
    }

    #[test]
    fn test_sanitize_rejects_empty_and_control() {
        assert!(sanitize_file_name("").is_err());
        assert!(sanitize_file_name("   ").is_err());
        assert!(sanitize_file_name("/").is_err());
        assert!(sanitize_file_name("evil\0.txt").is_err());
        assert!(sanitize_file_name("evil\n.txt").is_err());
    }

    #[test]
    fn test_assign_storage_name_unique() {
        let a = assign_storage_name("notes.txt");
        let b = assign_storage_name("notes.txt");
        assert_ne!(a, b);
        assert!(a.ends_with("_notes.txt"));
        let (token, rest) = a.split_once('_').unwrap();
        assert!(Uuid::parse_str(token).is_ok());
        assert_eq!(rest, "notes.txt");
    }

    #[test]
    fn test_classify_text() {
        let (title, content) = classify_upload("x_notes.txt", Some("text/plain"), b"hello");
        assert_eq!(title, "x_notes.txt");
        assert_eq!(content, "hello");

        // prefix match is case-insensitive
        let (_, content) = classify_upload("x_notes.txt", Some("TEXT/PLAIN"), b"hello");
        assert_eq!(content, "hello");

        // empty text content is valid
        let (_, content) = classify_upload("x_empty.txt", Some("text/plain"), b"");
        assert_eq!(content, "");

        // invalid sequences decode lossily, never fatally
        let (_, content) = classify_upload("x_bad.txt", Some("text/plain"), &[0x68, 0xff, 0x69]);
        assert_eq!(content, "h\u{fffd}i");
    }

    #[test]
    fn test_classify_non_text() {
        let (title, content) = classify_upload("x_photo.png", Some("image/png"), &[1, 2, 3]);
        assert_eq!(title, "x_photo.png");
        assert!(content.starts_with("File uploaded on "));

        let (_, content) = classify_upload("x_blob", None, &[1, 2, 3]);
        assert!(content.starts_with("File uploaded on "));

        assert!(!is_text_type(Some("tex")));
        assert!(is_text_type(Some("text/csv")));
    }

    #[tokio::test]
    async fn test_ingest_text_file() {
        let (dir, service) = setup_service().await;

        let doc = service
            .ingest_file(text_file("notes.txt", "hello"), DEFAULT_OWNER)
            .await
            .unwrap();

        assert_eq!(doc.content, "hello");
        assert_eq!(doc.filetype.as_deref(), Some("text/plain"));
        let filename = doc.filename.as_deref().unwrap();
        assert!(filename.ends_with("_notes.txt"));
        let (token, _) = filename.split_once('_').unwrap();
        assert!(Uuid::parse_str(token).is_ok());
        assert_eq!(doc.title, filename);
        assert_eq!(doc.user_id, DEFAULT_OWNER);

        // bytes landed under the storage root at file_url
        let url = doc.file_url.as_deref().unwrap();
        assert_eq!(std::fs::read(url).unwrap(), b"hello");
        assert_eq!(stored_file_count(&dir), 1);
    }

    #[tokio::test]
    async fn test_ingest_non_text_file() {
        let (_dir, service) = setup_service().await;

        let doc = service
            .ingest_file(
                UploadFile {
                    original_name: "photo.png".to_string(),
                    content_type: Some("image/png".to_string()),
                    data: Bytes::from_static(&[0x89, 0x50, 0x4e, 0x47]),
                },
                DEFAULT_OWNER,
            )
            .await
            .unwrap();

        assert!(doc.content.starts_with("File uploaded on "));
        assert!(doc.filename.unwrap().ends_with("_photo.png"));
    }

    #[tokio::test]
    async fn test_ingest_batch_preserves_order() {
        let (_dir, service) = setup_service().await;

        let docs = service
            .ingest_files(
                vec![text_file("a.txt", "first"), text_file("b.txt", "second")],
                DEFAULT_OWNER,
            )
            .await
            .unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].content, "first");
        assert_eq!(docs[1].content, "second");
        assert!(docs[0].id < docs[1].id);
    }

    #[tokio::test]
    async fn test_ingest_empty_batch() {
        let (_dir, service) = setup_service().await;
        assert!(matches!(
            service.ingest_files(Vec::new(), DEFAULT_OWNER).await,
            Err(DocumentError::NoFiles)
        ));
    }

    #[tokio::test]
    async fn test_ingest_traversal_writes_nothing() {
        let (dir, service) = setup_service().await;

        let result = service
            .ingest_files(vec![text_file("../evil.txt", "boom")], DEFAULT_OWNER)
            .await;

        assert!(matches!(result, Err(DocumentError::InvalidFileName(_))));
        assert_eq!(stored_file_count(&dir), 0);
        assert!(service.list_documents().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ingest_unknown_owner() {
        let (dir, service) = setup_service().await;

        let result = service
            .ingest_files(vec![text_file("notes.txt", "hello")], 42)
            .await;

        assert!(matches!(result, Err(DocumentError::UnknownOwner(42))));
        assert_eq!(stored_file_count(&dir), 0);
    }

    #[tokio::test]
    async fn test_batch_aborts_on_first_failure() {
        let (dir, service) = setup_service().await;

        let result = service
            .ingest_files(
                vec![
                    text_file("good.txt", "kept"),
                    text_file("../evil.txt", "boom"),
                    text_file("never.txt", "unreached"),
                ],
                DEFAULT_OWNER,
            )
            .await;

        assert!(matches!(result, Err(DocumentError::InvalidFileName(_))));
        // the earlier write is not rolled back, the later file never happens
        assert_eq!(stored_file_count(&dir), 1);
        assert_eq!(service.list_documents().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_search_title_and_content() {
        let (_dir, service) = setup_service().await;

        service
            .create_document("Alpha Report", "hello world", DEFAULT_OWNER)
            .await
            .unwrap();
        service
            .create_document("Beta Notes", "nothing here", DEFAULT_OWNER)
            .await
            .unwrap();

        let by_title = service.search_documents("Alpha").await.unwrap();
        assert_eq!(by_title.len(), 1);
        assert_eq!(by_title[0].title, "Alpha Report");

        let by_content = service.search_documents("world").await.unwrap();
        assert_eq!(by_content.len(), 1);

        // a document matching both fields is returned once
        let both = service.search_documents("o").await.unwrap();
        assert_eq!(both.len(), 2);

        assert!(service.search_documents("zzz").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_is_case_sensitive() {
        let (_dir, service) = setup_service().await;
        service
            .create_document("Alpha", "hello", DEFAULT_OWNER)
            .await
            .unwrap();

        assert_eq!(service.search_documents("Alpha").await.unwrap().len(), 1);
        assert!(service.search_documents("alpha").await.unwrap().is_empty());
        assert!(service.search_documents("HELLO").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_idempotent() {
        let (_dir, service) = setup_service().await;
        service
            .create_document("Alpha", "hello", DEFAULT_OWNER)
            .await
            .unwrap();

        let first = service.search_documents("ell").await.unwrap();
        let second = service.search_documents("ell").await.unwrap();
        assert_eq!(first.len(), second.len());
        assert_eq!(first[0].id, second[0].id);
    }

    #[tokio::test]
    async fn test_delete_removes_record_and_file() {
        let (dir, service) = setup_service().await;

        let doc = service
            .ingest_file(text_file("notes.txt", "hello"), DEFAULT_OWNER)
            .await
            .unwrap();
        assert_eq!(stored_file_count(&dir), 1);

        service.delete_document(doc.id).await.unwrap();

        assert!(service.get_document(doc.id).await.unwrap().is_none());
        assert_eq!(stored_file_count(&dir), 0);
    }

    #[tokio::test]
    async fn test_delete_unknown_id_is_noop() {
        let (_dir, service) = setup_service().await;
        service
            .create_document("keep", "me", DEFAULT_OWNER)
            .await
            .unwrap();

        service.delete_document(999).await.unwrap();

        assert_eq!(service.list_documents().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_metadata_only_document() {
        let (dir, service) = setup_service().await;
        let doc = service
            .create_document("bare", "no file", DEFAULT_OWNER)
            .await
            .unwrap();

        service.delete_document(doc.id).await.unwrap();

        assert!(service.get_document(doc.id).await.unwrap().is_none());
        assert_eq!(stored_file_count(&dir), 0);
    }

    #[tokio::test]
    async fn test_download_round_trip() {
        let (_dir, service) = setup_service().await;
        let doc = service
            .ingest_file(text_file("notes.txt", "hello"), DEFAULT_OWNER)
            .await
            .unwrap();

        let (found, mut file) = service.open_download(doc.id).await.unwrap();
        assert_eq!(found.id, doc.id);

        let mut body = Vec::new();
        file.read_to_end(&mut body).await.unwrap();
        assert_eq!(body, b"hello");
    }

    #[tokio::test]
    async fn test_download_unknown_id() {
        let (_dir, service) = setup_service().await;
        assert!(matches!(
            service.open_download(999).await,
            Err(DocumentError::NotFound(999))
        ));
    }

    #[tokio::test]
    async fn test_download_without_stored_file() {
        let (_dir, service) = setup_service().await;
        let doc = service
            .create_document("bare", "no file", DEFAULT_OWNER)
            .await
            .unwrap();

        assert!(matches!(
            service.open_download(doc.id).await,
            Err(DocumentError::MissingFile(_))
        ));
    }

    #[tokio::test]
    async fn test_download_rejects_foreign_location() {
        let (_dir, service) = setup_service().await;
        let doc = service
            .create_document("planted", "record", DEFAULT_OWNER)
            .await
            .unwrap();

        // a record pointing at an existing file outside the storage root
        let outside = TempDir::new().unwrap();
        let foreign = outside.path().join("secret.txt");
        std::fs::write(&foreign, b"secret").unwrap();
        sqlx::query("UPDATE documents SET file_url = ?, filename = 'secret.txt' WHERE id = ?")
            .bind(foreign.display().to_string())
            .bind(doc.id)
            .execute(&*service.db)
            .await
            .unwrap();

        assert!(matches!(
            service.open_download(doc.id).await,
            Err(DocumentError::InvalidLocation { .. })
        ));
        assert_eq!(std::fs::read(&foreign).unwrap(), b"secret");
    }

    #[tokio::test]
    async fn test_download_rejects_lexical_traversal() {
        let (_dir, service) = setup_service().await;
        let doc = service
            .create_document("planted", "record", DEFAULT_OWNER)
            .await
            .unwrap();

        sqlx::query("UPDATE documents SET file_url = '../outside.txt' WHERE id = ?")
            .bind(doc.id)
            .execute(&*service.db)
            .await
            .unwrap();

        assert!(matches!(
            service.open_download(doc.id).await,
            Err(DocumentError::InvalidLocation { .. })
        ));
    }

    #[tokio::test]
    async fn test_download_missing_physical_file() {
        let (_dir, service) = setup_service().await;
        let doc = service
            .ingest_file(text_file("notes.txt", "hello"), DEFAULT_OWNER)
            .await
            .unwrap();

        std::fs::remove_file(doc.file_url.as_deref().unwrap()).unwrap();

        // the record still exists, so this is a retrieval fault, not absence
        assert!(matches!(
            service.open_download(doc.id).await,
            Err(DocumentError::RetrievalFailed { .. })
        ));
    }
}
