//! Unit of Work double for engine tests.
//!
//! Hands out mock stores and mock writers, and counts how many transactions
//! were begun, committed and rolled back.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::errors::AppResult;
use crate::infra::{
    GroupRepository, MembershipRepository, MockGroupRepository, MockMembershipRepository,
    MockMembershipWriter, MockUserRepository, MockUserWriter, TransactionContext, UnitOfWork,
    UserRepository,
};

#[derive(Default)]
pub(crate) struct TestUnitOfWork {
    users: Arc<MockUserRepository>,
    groups: Arc<MockGroupRepository>,
    memberships: Arc<MockMembershipRepository>,
    user_writer: MockUserWriter,
    membership_writer: MockMembershipWriter,
    pub begun: AtomicUsize,
    pub committed: AtomicUsize,
    pub rolled_back: AtomicUsize,
}

impl TestUnitOfWork {
    pub fn with_users(mut self, users: MockUserRepository) -> Self {
        self.users = Arc::new(users);
        self
    }

    pub fn with_groups(mut self, groups: MockGroupRepository) -> Self {
        self.groups = Arc::new(groups);
        self
    }

    pub fn with_memberships(mut self, memberships: MockMembershipRepository) -> Self {
        self.memberships = Arc::new(memberships);
        self
    }

    pub fn with_user_writer(mut self, writer: MockUserWriter) -> Self {
        self.user_writer = writer;
        self
    }

    pub fn with_membership_writer(mut self, writer: MockMembershipWriter) -> Self {
        self.membership_writer = writer;
        self
    }
}

#[async_trait]
impl UnitOfWork for TestUnitOfWork {
    fn users(&self) -> Arc<dyn UserRepository> {
        self.users.clone()
    }

    fn groups(&self) -> Arc<dyn GroupRepository> {
        self.groups.clone()
    }

    fn memberships(&self) -> Arc<dyn MembershipRepository> {
        self.memberships.clone()
    }

    async fn transaction<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'a> FnOnce(TransactionContext<'a>) -> std::pin::Pin<
                Box<dyn std::future::Future<Output = AppResult<T>> + Send + 'a>,
            > + Send,
        T: Send,
    {
        self.begun.fetch_add(1, Ordering::SeqCst);

        let outcome = f(TransactionContext::new(
            &self.user_writer,
            &self.membership_writer,
        ))
        .await;

        if outcome.is_ok() {
            self.committed.fetch_add(1, Ordering::SeqCst);
        } else {
            self.rolled_back.fetch_add(1, Ordering::SeqCst);
        }
        outcome
    }
}
