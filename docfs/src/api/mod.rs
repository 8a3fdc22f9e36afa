//! API layer for HTTP request handling and data models.
//!
//! This module contains the REST surface, organized into:
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: Path parameters and other request shapes specific to HTTP
//! - **[`headers`]**: Extractors for the credential headers
//!
//! # API Structure
//!
//! - **Reads** (`GET /api/document/{id}`, `/api/attachment/{id}`, `/api/performance`): authorized
//!   by the end user's `Token` header. Any failure is an empty 404.
//! - **Writes and removals** (`POST /api/document`, `/api/attachment`, `DELETE ...`): authorized by
//!   the calling application's `ApiKey` header. Any failure is a 400 with body `false`.

pub mod handlers;
pub mod headers;
pub mod models;
