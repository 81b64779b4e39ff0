//! Application configuration module
//!
//! Handles the layered dotenv/environment settings and application-wide constants.

mod constants;
mod settings;

pub use constants::*;
pub use settings::Config;
