//! User handlers.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};

use crate::api::extractors::ValidatedJson;
use crate::api::AppState;
use crate::domain::{UserPayload, UserView};
use crate::errors::{AppResult, ErrorResponse, OptionExt};
use crate::types::{Created, MessageResponse};

/// Create user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_user))
        .route(
            "/:userid",
            get(get_user).put(update_user).delete(delete_user),
        )
}

/// Get a user and the names of its groups
#[utoipa::path(
    get,
    path = "/users/{userid}",
    tag = "Users",
    params(("userid" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User found", body = UserView),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(userid): Path<String>,
) -> AppResult<Json<UserView>> {
    let view = state
        .user_service
        .get_with_groups(&userid)
        .await?
        .ok_or_not_found(format!("user {}", userid))?;

    Ok(Json(view))
}

/// Create a user and link it to existing groups
#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    request_body = UserPayload,
    responses(
        (status = 201, description = "User created", body = MessageResponse),
        (status = 400, description = "Validation error or duplicate userid", body = ErrorResponse)
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<UserPayload>,
) -> AppResult<Created<MessageResponse>> {
    let userid = payload.userid.clone();
    state.user_service.create_with_groups(payload).await?;

    Ok(Created(MessageResponse::new(format!("user {} created", userid))))
}

/// Replace a user's names and group list
///
/// The user named by the body's `userid` is updated; the path segment only
/// identifies the resource.
#[utoipa::path(
    put,
    path = "/users/{userid}",
    tag = "Users",
    params(("userid" = String, Path, description = "User id")),
    request_body = UserPayload,
    responses(
        (status = 200, description = "User updated", body = MessageResponse),
        (status = 400, description = "Validation error", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(userid): Path<String>,
    ValidatedJson(payload): ValidatedJson<UserPayload>,
) -> AppResult<Json<MessageResponse>> {
    if payload.userid != userid {
        tracing::debug!(
            "PUT /users/{} carries userid {}, updating the latter",
            userid,
            payload.userid
        );
    }

    let target = payload.userid.clone();
    state.user_service.update_with_groups(payload).await?;

    Ok(Json(MessageResponse::new(format!("user {} updated", target))))
}

/// Delete a user and its memberships
#[utoipa::path(
    delete,
    path = "/users/{userid}",
    tag = "Users",
    params(("userid" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 404, description = "User not found", body = ErrorResponse)
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(userid): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.user_service.delete(&userid).await?;

    Ok(Json(MessageResponse::new(format!("user {} deleted", userid))))
}
