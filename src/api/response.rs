use serde::Serialize;
use axum::Json;
use axum::http::StatusCode;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn success<T: Serialize>(data: T) -> (StatusCode, Json<T>) {
    (StatusCode::OK, Json(data))
}

pub fn error(status: StatusCode, message: String) -> (StatusCode, Json<ErrorResponse>) {
    (status, Json(ErrorResponse { error: message }))
}
