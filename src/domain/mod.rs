//! Domain layer - Core business entities and logic
//!
//! Users and groups are identified by a store-assigned surrogate key and a
//! caller-supplied natural key (`userid`, group `name`). Membership is the
//! attribute-less many-to-many relation between them.

pub mod group;
pub mod user;

pub use group::{Group, GroupMembers, GroupPayload, GroupView};
pub use user::{User, UserData, UserPayload, UserView};
