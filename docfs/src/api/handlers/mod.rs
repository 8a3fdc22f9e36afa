//! HTTP request handlers.
//!
//! - [`documents`]: token-authorized document reads
//! - [`store`]: API-key-authorized document writes and removals

pub mod documents;
pub mod store;
