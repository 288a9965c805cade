pub mod catalog;
pub mod config;
pub mod error;
pub mod index;
pub mod install;
pub mod logging;
pub mod platform;
pub mod resolver;
pub mod version;
