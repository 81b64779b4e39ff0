//! User entity store.
//!
//! Reads and deletes run on the shared connection. Inserts and updates only
//! happen inside a unit of work, through [`UserWriter`].

use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, NotSet,
    QueryFilter, Set,
};

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use crate::domain::{User, UserData};
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find a user by natural key
    async fn find_by_userid(&self, userid: &str) -> AppResult<Option<User>>;

    /// Delete a user by natural key; its memberships go with it
    async fn delete(&self, userid: &str) -> AppResult<()>;
}

/// Transaction-scoped user writes.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserWriter: Send + Sync {
    /// Insert a new user and return its surrogate key
    async fn insert(&self, user: UserData) -> AppResult<i64>;

    /// Overwrite the user matching `user.userid` and return its surrogate key
    async fn update(&self, user: UserData) -> AppResult<i64>;
}

/// Concrete implementation of UserRepository
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_userid(&self, userid: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::Userid.eq(userid))
            .one(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(result.map(User::from))
    }

    async fn delete(&self, userid: &str) -> AppResult<()> {
        let result = UserEntity::delete_many()
            .filter(user::Column::Userid.eq(userid))
            .exec(&self.db)
            .await
            .map_err(AppError::from)?;

        if result.rows_affected == 0 {
            return Err(AppError::not_found(format!("user {}", userid)));
        }

        Ok(())
    }
}

pub(crate) async fn insert_user<C: ConnectionTrait>(db: &C, user: UserData) -> AppResult<i64> {
    let active_model = ActiveModel {
        id: NotSet,
        userid: Set(user.userid),
        first_name: Set(user.first_name),
        last_name: Set(user.last_name),
    };

    let model = active_model.insert(db).await.map_err(AppError::from)?;
    Ok(model.id)
}

pub(crate) async fn update_user<C: ConnectionTrait>(db: &C, user: UserData) -> AppResult<i64> {
    let existing = UserEntity::find()
        .filter(user::Column::Userid.eq(user.userid.as_str()))
        .one(db)
        .await?
        .ok_or_else(|| AppError::not_found(format!("user {}", user.userid)))?;

    let mut active: ActiveModel = existing.into();
    active.first_name = Set(user.first_name);
    active.last_name = Set(user.last_name);

    let model = active.update(db).await.map_err(AppError::from)?;
    Ok(model.id)
}
