//! Unit of Work pattern implementation.
//!
//! Gives the membership engine one place to reach every store and to run a
//! multi-step write (entity upsert, then link replacement) atomically.

use async_trait::async_trait;
use sea_orm::{
    AccessMode, DatabaseConnection, DatabaseTransaction, IsolationLevel, TransactionTrait,
};
use std::sync::Arc;

use super::repositories::{
    insert_user, replace_user_links, update_user, GroupRepository, GroupStore,
    MembershipRepository, MembershipStore, MembershipWriter, UserRepository, UserStore, UserWriter,
};
use crate::domain::UserData;
use crate::errors::{AppError, AppResult};

/// Unit of Work trait for dependency injection.
///
/// Provides centralized access to all repositories and transaction management.
/// Not object safe because of the generic `transaction`; services take it as
/// a type parameter instead.
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// Get user repository
    fn users(&self) -> Arc<dyn UserRepository>;

    /// Get group repository
    fn groups(&self) -> Arc<dyn GroupRepository>;

    /// Get membership repository
    fn memberships(&self) -> Arc<dyn MembershipRepository>;

    /// Execute a closure within a transaction.
    ///
    /// The transaction is committed when the closure returns `Ok` and rolled
    /// back when it returns `Err`; the closure's error is returned unchanged.
    /// If the returned future is dropped before completion (request cancelled
    /// or timed out) or the closure panics, nothing is committed.
    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = AppResult<T>> + Send + 'a>,
            > + Send,
        T: Send;
}

/// Transaction context providing writer access within a transaction.
///
/// Every writer handed out by one context is bound to the same transaction.
#[derive(Clone, Copy)]
pub struct TransactionContext<'a> {
    users: &'a dyn UserWriter,
    memberships: &'a dyn MembershipWriter,
}

impl<'a> TransactionContext<'a> {
    /// Create a new transaction context
    pub fn new(users: &'a dyn UserWriter, memberships: &'a dyn MembershipWriter) -> Self {
        Self { users, memberships }
    }

    /// Get user writer for this transaction
    pub fn users(&self) -> &'a dyn UserWriter {
        self.users
    }

    /// Get membership writer for this transaction
    pub fn memberships(&self) -> &'a dyn MembershipWriter {
        self.memberships
    }
}

/// Concrete implementation of UnitOfWork
pub struct Persistence {
    db: DatabaseConnection,
    user_repo: Arc<UserStore>,
    group_repo: Arc<GroupStore>,
    membership_repo: Arc<MembershipStore>,
}

impl Persistence {
    /// Create new UnitOfWork instance
    pub fn new(db: DatabaseConnection) -> Self {
        let user_repo = Arc::new(UserStore::new(db.clone()));
        let group_repo = Arc::new(GroupStore::new(db.clone()));
        let membership_repo = Arc::new(MembershipStore::new(db.clone()));
        Self {
            db,
            user_repo,
            group_repo,
            membership_repo,
        }
    }
}

#[async_trait]
impl UnitOfWork for Persistence {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.user_repo.clone()
    }

    fn groups(&self) -> Arc<dyn GroupRepository> {
        self.group_repo.clone()
    }

    fn memberships(&self) -> Arc<dyn MembershipRepository> {
        self.membership_repo.clone()
    }

    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = AppResult<T>> + Send + 'a>,
            > + Send,
        T: Send,
    {
        let txn = self
            .db
            .begin_with_config(
                Some(IsolationLevel::ReadCommitted),
                Some(AccessMode::ReadWrite),
            )
            .await
            .map_err(AppError::from)?;

        let users = TxUserRepository::new(&txn);
        let memberships = TxMembershipRepository::new(&txn);

        let outcome = f(TransactionContext::new(&users, &memberships)).await;

        match outcome {
            Ok(result) => {
                txn.commit().await.map_err(AppError::from)?;
                Ok(result)
            }
            Err(e) => {
                if let Err(rollback_err) = txn.rollback().await {
                    tracing::error!("Transaction rollback failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }
}

/// Transaction-aware user writer.
pub struct TxUserRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TxUserRepository<'a> {
    fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }
}

#[async_trait]
impl<'a> UserWriter for TxUserRepository<'a> {
    async fn insert(&self, user: UserData) -> AppResult<i64> {
        insert_user(self.txn, user).await
    }

    async fn update(&self, user: UserData) -> AppResult<i64> {
        update_user(self.txn, user).await
    }
}

/// Transaction-aware membership writer.
pub struct TxMembershipRepository<'a> {
    txn: &'a DatabaseTransaction,
}

impl<'a> TxMembershipRepository<'a> {
    fn new(txn: &'a DatabaseTransaction) -> Self {
        Self { txn }
    }
}

#[async_trait]
impl<'a> MembershipWriter for TxMembershipRepository<'a> {
    async fn replace_links_for_user(
        &self,
        user_id: i64,
        group_names: Vec<String>,
    ) -> AppResult<()> {
        replace_user_links(self.txn, user_id, group_names).await
    }
}

/// Simpler API for executing transactional operations.
///
/// This helper macro reduces boilerplate when using transactions.
#[macro_export]
macro_rules! with_transaction {
    ($uow:expr, |$ctx:ident| $body:expr) => {
        $uow.transaction(|$ctx| Box::pin(async move { $body })).await
    };
}
