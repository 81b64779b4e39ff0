//! User service - the user side of the membership engine.
//!
//! Creates and updates run the entity write and the link replacement in one
//! unit of work, entity first. Reads are not transactional.

use async_trait::async_trait;
use std::sync::Arc;
use validator::Validate;

use crate::domain::{UserPayload, UserView};
use crate::errors::{AppError, AppResult};
use crate::infra::UnitOfWork;
use crate::with_transaction;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User service trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserService: Send + Sync {
    /// Get a user with the names of its groups; `None` if the user is absent
    async fn get_with_groups(&self, userid: &str) -> AppResult<Option<UserView>>;

    /// Create a user and link it to the named groups
    async fn create_with_groups(&self, payload: UserPayload) -> AppResult<i64>;

    /// Overwrite the user named by `payload.userid` and replace its groups
    async fn update_with_groups(&self, payload: UserPayload) -> AppResult<i64>;

    /// Delete a user; the store drops its memberships
    async fn delete(&self, userid: &str) -> AppResult<()>;
}

/// Concrete implementation of UserService using Unit of Work.
pub struct UserManager<U: UnitOfWork> {
    uow: Arc<U>,
}

impl<U: UnitOfWork> UserManager<U> {
    /// Create new user service instance with Unit of Work
    pub fn new(uow: Arc<U>) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl<U: UnitOfWork> UserService for UserManager<U> {
    async fn get_with_groups(&self, userid: &str) -> AppResult<Option<UserView>> {
        let Some(user) = self.uow.users().find_by_userid(userid).await? else {
            return Ok(None);
        };

        // A failed group lookup degrades to an empty list instead of failing the read.
        let groups = match self.uow.memberships().groups_for_user(user.id).await {
            Ok(groups) => groups,
            Err(e) => {
                tracing::warn!("Group lookup for user {} failed: {}", userid, e);
                Vec::new()
            }
        };

        Ok(Some(UserView::merge(user, groups)))
    }

    async fn create_with_groups(&self, payload: UserPayload) -> AppResult<i64> {
        payload.validate()?;

        let (user, groups) = payload.into_parts();
        let userid = user.userid.clone();

        let id = with_transaction!(self.uow, |ctx| {
            let id = ctx.users().insert(user).await?;
            if !groups.is_empty() {
                ctx.memberships().replace_links_for_user(id, groups).await?;
            }
            Ok::<_, AppError>(id)
        })
        .map_err(|e| match e {
            AppError::Conflict(_) => AppError::conflict(format!("user {}", userid)),
            other => other,
        })?;

        tracing::info!("User created: {} (id {})", userid, id);
        Ok(id)
    }

    async fn update_with_groups(&self, payload: UserPayload) -> AppResult<i64> {
        payload.validate()?;

        let (user, groups) = payload.into_parts();
        let userid = user.userid.clone();

        let id = with_transaction!(self.uow, |ctx| {
            let id = ctx.users().update(user).await?;
            ctx.memberships().replace_links_for_user(id, groups).await?;
            Ok::<_, AppError>(id)
        })
        .map_err(|e| match e {
            // An update renames nothing, so a unique violation is a store fault.
            AppError::Conflict(detail) => AppError::internal(format!(
                "unique violation updating user {}: {}",
                userid, detail
            )),
            other => other,
        })?;

        tracing::info!("User updated: {} (id {})", userid, id);
        Ok(id)
    }

    async fn delete(&self, userid: &str) -> AppResult<()> {
        self.uow.users().delete(userid).await?;
        tracing::info!("User deleted: {}", userid);
        Ok(())
    }
}
