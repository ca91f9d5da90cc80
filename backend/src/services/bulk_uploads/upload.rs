use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use futures_util::StreamExt;
use md5::Context;
use serde_json::from_slice;
use uuid::Uuid;

use crate::error::{PipelineError, StoreError};
use crate::pipeline::{parser, validator};
use crate::AppState;
use common::model::schema::campaign_schema;
use common::model::session::UploadSession;
use common::requests::{RowValidationResult, UploadRequest, UploadResponse};

/// HTTP handler wrapper that converts the internal result to an
/// `HttpResponse`.
///
/// - On success: `200 OK` with the per-row validation report.
/// - On a file-level problem (empty, unparseable): `400 Bad Request`.
/// - On a storage fault: `500 Internal Server Error`.
pub async fn process(payload: Multipart, state: web::Data<AppState>) -> impl Responder {
    match upload_and_validate(payload, &state).await {
        Ok(response) => HttpResponse::Ok().json(response),
        Err(e) if e.is_file_error() => HttpResponse::BadRequest().body(format!("Error: {e}")),
        Err(e) => {
            log::error!("upload failed: {e}");
            HttpResponse::InternalServerError().body(format!("Error: {e}"))
        }
    }
}

/// Reads the multipart payload, parses and validates the file, and persists
/// the resulting session. Submission does not start here.
async fn upload_and_validate(
    mut payload: Multipart,
    state: &AppState,
) -> Result<UploadResponse, PipelineError> {
    let mut request = UploadRequest::default();
    let mut file_name: Option<String> = None;
    let mut file_bytes: Vec<u8> = Vec::new();
    let mut md5_hasher = Context::new();

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| PipelineError::Parse(e.to_string()))?;
        let part_name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));

        match part_name.as_deref() {
            Some("file") => {
                file_name = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename().map(|f| f.to_string()));
                while let Some(chunk) = field.next().await {
                    let chunk = chunk.map_err(|e| PipelineError::Parse(e.to_string()))?;
                    md5_hasher.consume(&chunk);
                    file_bytes.extend_from_slice(&chunk);
                }
            }
            Some("json") => {
                let mut bytes = Vec::new();
                while let Some(chunk) = field.next().await {
                    let chunk = chunk.map_err(|e| PipelineError::Parse(e.to_string()))?;
                    bytes.extend_from_slice(&chunk);
                }
                request = from_slice(&bytes)
                    .map_err(|e| PipelineError::Parse(format!("invalid json part: {e}")))?;
            }
            _ => {}
        }
    }

    let file_name = file_name.ok_or_else(|| PipelineError::Parse("missing file part".into()))?;
    if file_bytes.is_empty() {
        return Err(PipelineError::EmptyFile);
    }
    let checksum = format!("{:x}", md5_hasher.finalize());

    // Parsing and validation are CPU-bound; keep them off the reactor.
    let records = web::block(move || {
        let rows = parser::parse(&file_bytes, &file_name)?;
        Ok::<_, PipelineError>((file_name, validator::validate_rows(&rows, campaign_schema())))
    })
    .await
    // A blocking-pool fault is infrastructure, not a bad file.
    .map_err(|e| PipelineError::Storage(StoreError::Backend(e.to_string())))?;
    let (file_name, records) = records?;

    let results: Vec<RowValidationResult> = records
        .iter()
        .map(|r| RowValidationResult {
            row_index: r.row_index,
            is_valid: r.is_valid,
            errors: r.validation_errors.clone(),
        })
        .collect();
    let valid_rows = results.iter().filter(|r| r.is_valid).count();

    let session = UploadSession::new(
        Uuid::new_v4().to_string(),
        file_name,
        checksum,
        request.account_id,
        records,
    );
    state.store.create(&session)?;

    log::info!(
        "session {}: stored {} rows ({} valid) from {}",
        session.id,
        session.total_rows,
        valid_rows,
        session.source_file_name
    );

    Ok(UploadResponse {
        session_id: session.id,
        total_rows: session.total_rows,
        valid_rows,
        invalid_rows: session.total_rows - valid_rows,
        results,
    })
}
