//! Core errors and constants for the `assetcache` workspace.
//!
//! - **`errors`**: the application-level `Error` enum and `Result` alias used
//!   at crate boundaries (utilities, configuration loading, the CLI).
//! - **`constants`**: shared names such as environment variables, default
//!   file names and the default retention window.

pub mod constants;
pub mod errors;

pub use self::{
    constants::*,
    errors::{Error, Result, ResultExt},
};
