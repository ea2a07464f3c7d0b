//! Shared utilities for assetcache
//!
//! Path resolution, atomic file writes, human readable formatting and
//! logging setup used by the cache library and the command line tool.

pub mod atomic_file;
pub mod format;
pub mod tracing;
pub mod xdg;

pub use atomic_file::*;
pub use format::*;
pub use xdg::*;
