//! Health & readiness handlers.
//!
//! - GET /healthz  -> simple liveness ("ok")
//! - GET /readyz   -> readiness that checks the metadata store and the
//!   storage root

use crate::services::document_service::DocumentService;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use tokio::fs;
use uuid::Uuid;

/// `GET /healthz`
///
/// Liveness probe — always 200 OK, never performs I/O.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// `GET /readyz`
///
/// Readiness probe: a `SELECT 1` against SQLite plus a write/read/delete
/// round trip under the storage root. 200 when both pass, 503 otherwise.
pub async fn readyz(State(service): State<DocumentService>) -> impl IntoResponse {
    let sqlite = probe_sqlite(&service).await;
    let disk = probe_storage_root(&service.storage_root).await;

    let overall_ok = sqlite.is_ok() && disk.is_ok();

    let mut checks = HashMap::new();
    checks.insert("sqlite", CheckStatus::from(sqlite));
    checks.insert("disk", CheckStatus::from(disk));

    let body = ReadyResponse {
        status: if overall_ok {
            "ok".into()
        } else {
            "error".into()
        },
        checks,
    };

    let status = if overall_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}

async fn probe_sqlite(service: &DocumentService) -> Result<(), String> {
    match sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&*service.db)
        .await
    {
        Ok(1) => Ok(()),
        Ok(v) => Err(format!("unexpected result: {}", v)),
        Err(e) => Err(format!("error: {}", e)),
    }
}

/// Write, read back, and remove a probe file under the storage root.
async fn probe_storage_root(root: &Path) -> Result<(), String> {
    let tmp_path = root.join(format!(".readyz-{}", Uuid::new_v4()));

    fs::write(&tmp_path, b"readyz")
        .await
        .map_err(|e| format!("could not write tmp file: {}", e))?;

    let read_back = fs::read(&tmp_path).await;
    // best-effort cleanup regardless of the read result
    let removed = fs::remove_file(&tmp_path).await;

    match read_back {
        Ok(bytes) if bytes == b"readyz" => {
            removed.map_err(|e| format!("could not remove tmp file: {}", e))
        }
        Ok(_) => Err("file content mismatch".to_string()),
        Err(e) => Err(format!("could not read tmp file: {}", e)),
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: String,
    checks: HashMap<&'static str, CheckStatus>,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    error: Option<String>,
}

impl From<Result<(), String>> for CheckStatus {
    fn from(result: Result<(), String>) -> Self {
        match result {
            Ok(()) => CheckStatus {
                ok: true,
                error: None,
            },
            Err(error) => CheckStatus {
                ok: false,
                error: Some(error),
            },
        }
    }
}
