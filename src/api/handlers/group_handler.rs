//! Group handlers.

use axum::{
    extract::{Path, State},
    response::Json,
    routing::{get, post},
    Router,
};

use crate::api::extractors::ValidatedJson;
use crate::api::AppState;
use crate::domain::{GroupMembers, GroupPayload, GroupView};
use crate::errors::{AppResult, ErrorResponse, OptionExt};
use crate::types::{Created, MessageResponse};

/// Create group routes
pub fn group_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_group))
        .route(
            "/:name",
            get(get_group).put(update_group).delete(delete_group),
        )
}

/// List the userids of a group's members
#[utoipa::path(
    get,
    path = "/groups/{name}",
    tag = "Groups",
    params(("name" = String, Path, description = "Group name")),
    responses(
        (status = 200, description = "Group found", body = GroupView),
        (status = 404, description = "Group not found", body = ErrorResponse)
    )
)]
pub async fn get_group(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<GroupView>> {
    let view = state
        .group_service
        .get_with_users(&name)
        .await?
        .ok_or_not_found(format!("group {}", name))?;

    Ok(Json(view))
}

/// Create an empty group
#[utoipa::path(
    post,
    path = "/groups",
    tag = "Groups",
    request_body = GroupPayload,
    responses(
        (status = 201, description = "Group created", body = MessageResponse),
        (status = 400, description = "Validation error or duplicate name", body = ErrorResponse)
    )
)]
pub async fn create_group(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<GroupPayload>,
) -> AppResult<Created<MessageResponse>> {
    let name = payload.name.clone();
    state.group_service.create(payload).await?;

    Ok(Created(MessageResponse::new(format!("group {} created", name))))
}

/// Replace a group's members
#[utoipa::path(
    put,
    path = "/groups/{name}",
    tag = "Groups",
    params(("name" = String, Path, description = "Group name")),
    request_body = GroupMembers,
    responses(
        (status = 200, description = "Membership replaced", body = MessageResponse),
        (status = 400, description = "Malformed body", body = ErrorResponse),
        (status = 404, description = "Group not found", body = ErrorResponse)
    )
)]
pub async fn update_group(
    State(state): State<AppState>,
    Path(name): Path<String>,
    ValidatedJson(members): ValidatedJson<GroupMembers>,
) -> AppResult<Json<MessageResponse>> {
    state
        .group_service
        .update_membership(&name, members.userids)
        .await?;

    Ok(Json(MessageResponse::new(format!("group {} updated", name))))
}

/// Delete a group and its memberships
#[utoipa::path(
    delete,
    path = "/groups/{name}",
    tag = "Groups",
    params(("name" = String, Path, description = "Group name")),
    responses(
        (status = 200, description = "Group deleted", body = MessageResponse),
        (status = 404, description = "Group not found", body = ErrorResponse)
    )
)]
pub async fn delete_group(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state.group_service.delete(&name).await?;

    Ok(Json(MessageResponse::new(format!("group {} deleted", name))))
}
