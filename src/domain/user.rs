//! User domain entity and related types.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::group::Group;

/// User domain entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Surrogate key assigned by the store
    pub id: i64,
    /// Natural key supplied by the caller
    pub userid: String,
    pub first_name: String,
    pub last_name: String,
}

/// User fields without the surrogate key, as written on insert and update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserData {
    pub userid: String,
    pub first_name: String,
    pub last_name: String,
}

/// Request body for creating or replacing a user and its group list.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UserPayload {
    #[serde(default)]
    #[validate(length(min = 1, message = "first_name must be populated"))]
    #[schema(example = "Jane")]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "last_name must be populated"))]
    #[schema(example = "Doe")]
    pub last_name: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "userid must be populated"))]
    #[schema(example = "jdoe")]
    pub userid: String,
    /// Names of the groups the user belongs to; unknown names are ignored
    #[serde(default)]
    #[schema(example = json!(["admins", "users"]))]
    pub groups: Option<Vec<String>>,
}

impl UserPayload {
    /// Split the payload into the entity fields and the desired group names.
    pub fn into_parts(self) -> (UserData, Vec<String>) {
        (
            UserData {
                userid: self.userid,
                first_name: self.first_name,
                last_name: self.last_name,
            },
            self.groups.unwrap_or_default(),
        )
    }
}

/// A user together with the names of its groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserView {
    pub first_name: String,
    pub last_name: String,
    pub userid: String,
    pub groups: Vec<String>,
}

impl UserView {
    pub fn merge(user: User, groups: Vec<Group>) -> Self {
        Self {
            first_name: user.first_name,
            last_name: user.last_name,
            userid: user.userid,
            groups: groups.into_iter().map(|g| g.name).collect(),
        }
    }
}
