use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use utoipa::ToSchema;

/// Outcome of a mutation, e.g. `{"result": "user jdoe created"}`
#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "user jdoe created")]
    pub result: String,
}

impl MessageResponse {
    pub fn new(result: impl Into<String>) -> Self {
        Self {
            result: result.into(),
        }
    }
}

/// Created response helper for POST endpoints
pub struct Created<T: Serialize>(pub T);

impl<T: Serialize> IntoResponse for Created<T> {
    fn into_response(self) -> axum::response::Response {
        (StatusCode::CREATED, Json(self.0)).into_response()
    }
}
