//! Service Container - Centralized service access.
//!
//! Builds the membership engine over one shared unit of work and hands the
//! services out behind their traits.

use std::sync::Arc;

use super::{GroupManager, GroupService, UserManager, UserService};
use crate::infra::Persistence;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Service container trait for dependency injection.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait ServiceContainer: Send + Sync {
    /// Get user service
    fn users(&self) -> Arc<dyn UserService>;

    /// Get group service
    fn groups(&self) -> Arc<dyn GroupService>;
}

/// Concrete implementation of ServiceContainer
pub struct Services {
    user_service: Arc<dyn UserService>,
    group_service: Arc<dyn GroupService>,
}

impl Services {
    /// Create a new service container from already built services
    pub fn new(user_service: Arc<dyn UserService>, group_service: Arc<dyn GroupService>) -> Self {
        Self {
            user_service,
            group_service,
        }
    }

    /// Create service container from database connection
    pub fn from_connection(db: sea_orm::DatabaseConnection) -> Self {
        let uow = Arc::new(Persistence::new(db));
        let user_service = Arc::new(UserManager::new(uow.clone()));
        let group_service = Arc::new(GroupManager::new(uow));

        Self {
            user_service,
            group_service,
        }
    }
}

impl ServiceContainer for Services {
    fn users(&self) -> Arc<dyn UserService> {
        self.user_service.clone()
    }

    fn groups(&self) -> Arc<dyn GroupService> {
        self.group_service.clone()
    }
}
