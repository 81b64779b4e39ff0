//! Group domain entity and related types.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::user::User;

/// Group domain entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Surrogate key assigned by the store
    pub id: i64,
    /// Natural key supplied by the caller
    pub name: String,
}

/// Request body for creating a group.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct GroupPayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "name field must be populated"))]
    #[schema(example = "admins")]
    pub name: String,
}

/// Request body replacing a group's members.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct GroupMembers {
    /// User ids to link; unknown ids are ignored, an empty or missing list changes nothing
    #[serde(default)]
    #[schema(example = json!(["jdoe", "asmith"]))]
    pub userids: Option<Vec<String>>,
}

/// The members of a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct GroupView {
    pub userids: Vec<String>,
}

impl GroupView {
    pub fn from_users(users: Vec<User>) -> Self {
        Self {
            userids: users.into_iter().map(|u| u.userid).collect(),
        }
    }
}
