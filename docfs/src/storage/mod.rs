//! Document storage on the local filesystem.
//!
//! - **[`paths`]**: maps an identification triple to a path, one strategy per category
//! - **[`file_store`]**: asynchronous filesystem primitives backed by a bounded blocking pool
//! - **[`documents`]**: per-category read/write/remove pipelines and the strategy table
//!
//! File names are joined to the category roots as given; they are not sanitized against
//! path traversal.

pub mod documents;
pub mod file_store;
pub mod paths;

pub use documents::{DocumentStore, DocumentStores};
pub use file_store::{FileStore, LocalFileStore};
pub use paths::PathResolver;
