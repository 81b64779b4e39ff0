//! Application services layer - the membership engine.
//!
//! Services orchestrate the entity and membership stores to fulfill the
//! user and group use cases. They depend on abstractions (traits) and reach
//! every store through the Unit of Work.

pub mod container;
mod group_service;
mod user_service;

#[cfg(test)]
mod testing;

// Service Container
pub use container::{ServiceContainer, Services};

// Service traits and implementations
pub use group_service::{GroupManager, GroupService};
pub use user_service::{UserManager, UserService};

#[cfg(any(test, feature = "test-utils"))]
pub use container::MockServiceContainer;
#[cfg(any(test, feature = "test-utils"))]
pub use group_service::MockGroupService;
#[cfg(any(test, feature = "test-utils"))]
pub use user_service::MockUserService;
