//! Group entity store.

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter, Set,
};

use super::entities::group::{self, ActiveModel, Entity as GroupEntity};
use crate::domain::Group;
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Group repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait GroupRepository: Send + Sync {
    /// Find a group by name
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Group>>;

    /// Insert an empty group and return its surrogate key
    async fn insert(&self, name: String) -> AppResult<i64>;

    /// Delete a group by name; its memberships go with it
    async fn delete(&self, name: &str) -> AppResult<()>;
}

/// Concrete implementation of GroupRepository
pub struct GroupStore {
    db: DatabaseConnection,
}

impl GroupStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl GroupRepository for GroupStore {
    async fn find_by_name(&self, name: &str) -> AppResult<Option<Group>> {
        let result = GroupEntity::find()
            .filter(group::Column::Name.eq(name))
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(Group::from))
    }

    async fn insert(&self, name: String) -> AppResult<i64> {
        let active_model = ActiveModel {
            id: NotSet,
            name: Set(name),
        };

        let model = active_model.insert(&self.db).await.map_err(AppError::from)?;
        Ok(model.id)
    }

    async fn delete(&self, name: &str) -> AppResult<()> {
        let result = GroupEntity::delete_many()
            .filter(group::Column::Name.eq(name))
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;

        if result.rows_affected == 0 {
            return Err(AppError::not_found(format!("group {}", name)));
        }

        Ok(())
    }
}
