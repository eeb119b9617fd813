// --- File: crates/bodyshop_common/src/http.rs ---
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::error::{BodyshopError, HttpStatusCode};

/// Extension trait for BodyshopError to convert it to an Axum HTTP response.
pub trait IntoHttpResponse {
    fn into_http_response(self) -> Response;
}

impl IntoHttpResponse for BodyshopError {
    fn into_http_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = Json(json!({
            "error": {
                "message": self.to_string(),
                "code": status_code.as_u16(),
                "details": self.details(),
            }
        }));

        (status_code, body).into_response()
    }
}

impl IntoResponse for BodyshopError {
    fn into_response(self) -> Response {
        self.into_http_response()
    }
}

/// Maps a domain result into a JSON response, rendering errors through [`IntoHttpResponse`].
pub fn handle_json_result<T>(result: Result<T, BodyshopError>) -> Result<Json<T>, Response>
where
    T: serde::Serialize,
{
    result.map(Json).map_err(|err| err.into_response())
}
