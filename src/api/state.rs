//! Application state - Dependency injection container.
//!
//! Provides centralized access to the membership services and the database.

use std::sync::Arc;

use crate::infra::Database;
use crate::services::{GroupService, ServiceContainer, Services, UserService};

/// Application state containing all services (DI container).
#[derive(Clone)]
pub struct AppState {
    /// User service
    pub user_service: Arc<dyn UserService>,
    /// Group service
    pub group_service: Arc<dyn GroupService>,
    /// Database connection, used by the health check
    pub database: Arc<Database>,
}

impl AppState {
    /// Create application state backed by the database's Unit of Work.
    pub fn from_database(database: Arc<Database>) -> Self {
        let container = Services::from_connection(database.get_connection());

        Self {
            user_service: container.users(),
            group_service: container.groups(),
            database,
        }
    }

    /// Create new application state with manually injected services.
    pub fn new(
        user_service: Arc<dyn UserService>,
        group_service: Arc<dyn GroupService>,
        database: Arc<Database>,
    ) -> Self {
        Self {
            user_service,
            group_service,
            database,
        }
    }
}
