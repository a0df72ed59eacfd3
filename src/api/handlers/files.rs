use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::Json,
};
use serde::Deserialize;

use crate::api::errors::ApiError;
use crate::api::router::AppState;
use crate::domain::value_objects::FileValidationResult;
use crate::infrastructure::files::InMemoryFile;

#[derive(Deserialize)]
pub struct FileQuery {
    name: String,
}

/// POST /v1/files/validate?name=
/// Validate a raw upload body; the declared type comes from `Content-Type`
pub async fn validate_file_handler(
    State(state): State<AppState>,
    Query(query): Query<FileQuery>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<FileValidationResult>), ApiError> {
    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::payload_too_large(state.max_body_size)
        } else {
            ApiError::bad_request(rejection.body_text())
        }
    })?;

    let mime_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream");

    let file = InMemoryFile::new(query.name, mime_type, body);
    let result = state
        .upload_validator
        .validate_file(&file, &state.file_config)
        .await;

    let status = if result.is_valid {
        StatusCode::OK
    } else {
        StatusCode::BAD_REQUEST
    };
    Ok((status, Json(result)))
}
