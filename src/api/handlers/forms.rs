use axum::{extract::State, http::StatusCode, response::Json};
use serde::Serialize;
use serde_json::Value;

use crate::api::errors::ApiError;
use crate::api::router::AppState;
use crate::application::form_value::FormValue;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormValidationResponse {
    pub is_valid: bool,
    pub sanitized: Value,
    pub errors: Vec<String>,
}

/// POST /v1/forms/validate
/// Sanitize a JSON form submission and return the cleaned tree
pub async fn validate_form_handler(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<FormValidationResponse>), ApiError> {
    let result = state
        .form_validator
        .validate_form_data(&FormValue::from(body));

    if !result.is_valid {
        return Err(ApiError::validation_failed(result.errors));
    }

    Ok((
        StatusCode::OK,
        Json(FormValidationResponse {
            is_valid: true,
            sanitized: result.sanitized.to_json(),
            errors: result.errors,
        }),
    ))
}
