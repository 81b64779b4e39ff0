//! HTTP request handlers.

pub mod group_handler;
pub mod user_handler;

pub use group_handler::group_routes;
pub use user_handler::user_routes;
