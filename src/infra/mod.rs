//! Infrastructure layer - External systems integration
//!
//! This module handles all external system concerns:
//! - Database connection and migrations
//! - Entity and membership repositories
//! - Unit of Work for transaction management

pub mod db;
pub mod repositories;
pub mod unit_of_work;

pub use db::{Database, Migrator};
pub use repositories::{
    GroupRepository, GroupStore, MembershipRepository, MembershipStore, MembershipWriter,
    UserRepository, UserStore, UserWriter,
};
pub use unit_of_work::{
    Persistence, TransactionContext, TxMembershipRepository, TxUserRepository, UnitOfWork,
};

#[cfg(any(test, feature = "test-utils"))]
pub use repositories::{
    MockGroupRepository, MockMembershipRepository, MockMembershipWriter, MockUserRepository,
    MockUserWriter,
};
