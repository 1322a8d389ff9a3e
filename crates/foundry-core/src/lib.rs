pub mod composition;
pub mod config;
pub mod diff;
pub mod error;
pub mod generator;
pub mod git;
pub mod io;
pub mod library;
pub mod manifest;
pub mod overlay;
pub mod paths;
pub mod stages;
pub mod template;
pub mod types;
pub mod validate;

pub use error::{FoundryError, Result};
