pub mod composition;
pub mod config;
pub mod generate;
pub mod library;
pub mod manifest;
pub mod validate;
