//! Command implementations for the ohmyblog CLI

pub mod db;
pub mod locales;
pub mod serve;
pub mod site;

pub use db::run_db;
pub use locales::run_locales;
pub use serve::run_serve;
pub use site::run_site;
