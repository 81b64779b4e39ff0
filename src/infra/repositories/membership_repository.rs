//! Membership store - the user/group link table.
//!
//! Replace-links semantics, for both sides of the relation:
//! - an empty set is a no-op, no statement is issued;
//! - otherwise the side's links become exactly the resolvable subset of the
//!   given names, and names that match nothing are dropped silently.

use async_trait::async_trait;
use sea_orm::{
    sea_query::OnConflict, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

use super::entities::{
    group::{self, Entity as GroupEntity},
    membership::{self, Entity as MembershipEntity},
    user::{self, Entity as UserEntity},
};
use crate::domain::{Group, User};
use crate::errors::{AppError, AppResult, OptionExt};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Membership repository trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait MembershipRepository: Send + Sync {
    /// Groups linked to the user, ordered by name
    async fn groups_for_user(&self, user_id: i64) -> AppResult<Vec<Group>>;

    /// Users linked to the group, ordered by userid
    async fn users_for_group(&self, group_id: i64) -> AppResult<Vec<User>>;

    /// Replace the group's members. Runs in its own transaction and fails
    /// with `NotFound` if the group does not exist.
    async fn replace_links_for_group(&self, group_name: &str, userids: Vec<String>)
        -> AppResult<()>;
}

/// Transaction-scoped membership writes.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait MembershipWriter: Send + Sync {
    /// Replace the user's groups within the caller's transaction
    async fn replace_links_for_user(&self, user_id: i64, group_names: Vec<String>)
        -> AppResult<()>;
}

/// Concrete implementation of MembershipRepository
pub struct MembershipStore {
    db: DatabaseConnection,
}

impl MembershipStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MembershipRepository for MembershipStore {
    async fn groups_for_user(&self, user_id: i64) -> AppResult<Vec<Group>> {
        let models = GroupEntity::find()
            .inner_join(MembershipEntity)
            .filter(membership::Column::UserId.eq(user_id))
            .order_by_asc(group::Column::Name)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(Group::from).collect())
    }

    async fn users_for_group(&self, group_id: i64) -> AppResult<Vec<User>> {
        let models = UserEntity::find()
            .inner_join(MembershipEntity)
            .filter(membership::Column::GroupId.eq(group_id))
            .order_by_asc(user::Column::Userid)
            .all(&self.db)
            .await
            .map_err(AppError::from)?;

        Ok(models.into_iter().map(User::from).collect())
    }

    async fn replace_links_for_group(
        &self,
        group_name: &str,
        userids: Vec<String>,
    ) -> AppResult<()> {
        if userids.is_empty() {
            return Ok(());
        }

        // Dropped without commit on any early return, which rolls back.
        let txn = self.db.begin().await?;

        let group_id: i64 = GroupEntity::find()
            .select_only()
            .column(group::Column::Id)
            .filter(group::Column::Name.eq(group_name))
            .into_tuple::<i64>()
            .one(&txn)
            .await?
            .ok_or_not_found(format!("group {}", group_name))?;

        let user_ids: Vec<i64> = UserEntity::find()
            .select_only()
            .column(user::Column::Id)
            .filter(user::Column::Userid.is_in(userids))
            .into_tuple::<i64>()
            .all(&txn)
            .await?;

        MembershipEntity::delete_many()
            .filter(membership::Column::GroupId.eq(group_id))
            .exec(&txn)
            .await?;

        insert_links(
            &txn,
            user_ids.into_iter().map(|user_id| (user_id, group_id)).collect(),
        )
        .await?;

        txn.commit().await?;
        Ok(())
    }
}

pub(crate) async fn replace_user_links<C: ConnectionTrait>(
    db: &C,
    user_id: i64,
    group_names: Vec<String>,
) -> AppResult<()> {
    if group_names.is_empty() {
        return Ok(());
    }

    let group_ids: Vec<i64> = GroupEntity::find()
        .select_only()
        .column(group::Column::Id)
        .filter(group::Column::Name.is_in(group_names))
        .into_tuple::<i64>()
        .all(db)
        .await?;

    MembershipEntity::delete_many()
        .filter(membership::Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    insert_links(
        db,
        group_ids.into_iter().map(|group_id| (user_id, group_id)).collect(),
    )
    .await
}

/// Insert `(user_id, group_id)` rows. A row that a concurrent writer
/// committed after our delete is kept as is, so the last commit wins.
async fn insert_links<C: ConnectionTrait>(db: &C, links: Vec<(i64, i64)>) -> AppResult<()> {
    if links.is_empty() {
        return Ok(());
    }

    MembershipEntity::insert_many(links.into_iter().map(|(user_id, group_id)| {
        membership::ActiveModel {
            user_id: Set(user_id),
            group_id: Set(group_id),
        }
    }))
    .on_conflict(
        OnConflict::columns([membership::Column::UserId, membership::Column::GroupId])
            .do_nothing()
            .to_owned(),
    )
    .exec_without_returning(db)
    .await?;

    Ok(())
}
