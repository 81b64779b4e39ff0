//! Repository layer - Data access abstraction
//!
//! The entity stores (users, groups) and the membership store. Each exposes a
//! trait for connection-level calls, and user/membership also expose a
//! writer trait whose implementations are bound to one transaction.

pub(crate) mod entities;
mod group_repository;
mod membership_repository;
mod user_repository;

pub use group_repository::{GroupRepository, GroupStore};
pub use membership_repository::{MembershipRepository, MembershipStore, MembershipWriter};
pub use user_repository::{UserRepository, UserStore, UserWriter};

pub(crate) use membership_repository::replace_user_links;
pub(crate) use user_repository::{insert_user, update_user};

// Export mocks for tests (both unit and integration)
#[cfg(any(test, feature = "test-utils"))]
pub use group_repository::MockGroupRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use membership_repository::{MockMembershipRepository, MockMembershipWriter};
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::{MockUserRepository, MockUserWriter};
