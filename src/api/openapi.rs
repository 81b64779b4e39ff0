//! OpenAPI documentation configuration.
//!
//! Provides Swagger UI for API exploration and testing.

use utoipa::OpenApi;

use crate::api::handlers::{group_handler, user_handler};
use crate::domain::{GroupMembers, GroupPayload, GroupView, UserPayload, UserView};
use crate::errors::ErrorResponse;
use crate::types::MessageResponse;

/// OpenAPI documentation for the membership service
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Membership Service",
        version = "0.1.0",
        description = "Users, groups and the membership between them",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    paths(
        // User endpoints
        user_handler::get_user,
        user_handler::create_user,
        user_handler::update_user,
        user_handler::delete_user,
        // Group endpoints
        group_handler::get_group,
        group_handler::create_group,
        group_handler::update_group,
        group_handler::delete_group,
    ),
    components(
        schemas(
            UserPayload,
            UserView,
            GroupPayload,
            GroupMembers,
            GroupView,
            MessageResponse,
            ErrorResponse,
        )
    ),
    tags(
        (name = "Users", description = "Users and their group lists"),
        (name = "Groups", description = "Groups and their members")
    )
)]
pub struct ApiDoc;
