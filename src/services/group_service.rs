//! Group service - the group side of the membership engine.
//!
//! Groups are created empty. Member replacement is a standalone store call
//! with no paired entity write, so it does not open a unit of work here.

use async_trait::async_trait;
use std::sync::Arc;
use validator::Validate;

use crate::domain::{GroupPayload, GroupView};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UnitOfWork;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Group service trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait GroupService: Send + Sync {
    /// Get the userids of a group's members; `None` if the group is absent
    async fn get_with_users(&self, name: &str) -> AppResult<Option<GroupView>>;

    /// Create an empty group
    async fn create(&self, payload: GroupPayload) -> AppResult<i64>;

    /// Replace the group's members with the resolvable subset of `userids`
    async fn update_membership(&self, name: &str, userids: Option<Vec<String>>)
        -> AppResult<()>;

    /// Delete a group; the store drops its memberships
    async fn delete(&self, name: &str) -> AppResult<()>;
}

/// Concrete implementation of GroupService using Unit of Work.
pub struct GroupManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> GroupManager<U> {
    /// Create new group service instance with Unit of Work
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> GroupService for GroupManager<U> {
    async fn get_with_users(&self, name: &str) -> AppResult<Option<GroupView>> {
        let Some(group) = self.uow.groups().find_by_name(name).await? else {
            return Ok(None);
        };

        let users = self.uow.memberships().users_for_group(group.id).await?;
        Ok(Some(GroupView::from_users(users)))
    }

    async fn create(&self, payload: GroupPayload) -> AppResult<i64> {
        payload.validate()?;

        let name = payload.name;
        let id = self
            .uow
            .groups()
            .insert(name.clone())
            .await
            .map_err(|e| match e {
                AppError::Conflict(_) => AppError::conflict(format!("group {}", name)),
                other => other,
            })?;

        tracing::info!("Group created: {} (id {})", name, id);
        Ok(id)
    }

    async fn update_membership(
        &self,
        name: &str,
        userids: Option<Vec<String>>,
    ) -> AppResult<()> {
        // The replace call is a no-op on an empty list, so existence is checked up front.
        self.uow
            .groups()
            .find_by_name(name)
            .await?
            .ok_or_not_found(format!("group {}", name))?;

        let userids = userids.unwrap_or_default();
        let requested = userids.len();
        self.uow
            .memberships()
            .replace_links_for_group(name, userids)
            .await?;

        tracing::info!("Group membership replaced: {} ({} requested)", name, requested);
        Ok(())
    }

    async fn delete(&self, name: &str) -> AppResult<()> {
        self.uow.groups().delete(name).await?;
        tracing::info!("Group deleted: {}", name);
        Ok(())
    }
}
