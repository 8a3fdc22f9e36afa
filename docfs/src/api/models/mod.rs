//! HTTP-specific request shapes.
//!
//! JSON bodies reuse [`crate::types::CreateRequest`] directly; only the removal routes, which
//! carry their identification fields in the path, need their own types here.

pub mod documents;
