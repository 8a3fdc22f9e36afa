//! Common type definitions shared by the storage, ACL and API layers.
//!
//! This module defines:
//! - [`DocumentCategory`]: the kind of document being addressed, which selects both the path
//!   layout and the identification fields that must be present
//! - [`AccessDescriptor`]: the (organization, user, file) triple returned by the ACL service
//! - [`CreateRequest`] and [`RemoveRequest`]: write-side requests sent by trusted applications
//! - [`ApplicationAuth`]: the ACL answer for an API key
//!
//! # Identification Fields
//!
//! A document is only ever addressed through the triple `(organizationId, userId, fileName)`.
//! Not every category uses all three, and attachments differ between reads and writes:
//!
//! | Category            | organizationId | userId                             | fileName |
//! |---------------------|----------------|------------------------------------|----------|
//! | `UserDocument`      | required       | required                           | required |
//! | `Attachment`        | required       | required to read, ignored to write | required |
//! | `PerformanceResult` | required       | required                           | ignored  |
//!
//! An attachment is shared by the whole organization, so its path has no user in it. A read is
//! still on behalf of a user, and an access grant naming no user is a denial.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// The kinds of documents the server stores. Each category has its own root directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentCategory {
    /// Private user documents, sharded by part of the user id
    UserDocument,
    /// Organization-wide attachments shared by every user of the organization
    Attachment,
    /// Per-user performance reports, the user id is the file name
    PerformanceResult,
}

impl DocumentCategory {
    pub const ALL: [DocumentCategory; 3] = [Self::UserDocument, Self::Attachment, Self::PerformanceResult];

    /// Whether the user id takes part in the storage path
    pub fn requires_user_id(self) -> bool {
        matches!(self, Self::UserDocument | Self::PerformanceResult)
    }

    /// Whether the file name takes part in the storage path
    pub fn requires_file_name(self) -> bool {
        matches!(self, Self::UserDocument | Self::Attachment)
    }

    /// Returns the first field a read of this category needs but which is blank.
    ///
    /// Reads always need the user, even for attachments whose path does not use it.
    pub fn missing_read_field(self, organization_id: &str, user_id: &str, file_name: &str) -> Option<&'static str> {
        first_blank(organization_id, Some(user_id), self.requires_file_name().then_some(file_name))
    }

    /// Returns the first field a write or removal of this category needs but which is blank.
    pub fn missing_write_field(self, organization_id: &str, user_id: &str, file_name: &str) -> Option<&'static str> {
        first_blank(
            organization_id,
            self.requires_user_id().then_some(user_id),
            self.requires_file_name().then_some(file_name),
        )
    }
}

fn first_blank(organization_id: &str, user_id: Option<&str>, file_name: Option<&str>) -> Option<&'static str> {
    if is_blank(organization_id) {
        Some("organizationId")
    } else if user_id.is_some_and(is_blank) {
        Some("userId")
    } else if file_name.is_some_and(is_blank) {
        Some("fileName")
    } else {
        None
    }
}

impl fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UserDocument => write!(f, "user document"),
            Self::Attachment => write!(f, "attachment"),
            Self::PerformanceResult => write!(f, "performance result"),
        }
    }
}

/// Identifies one document. Produced by the ACL service, empty fields signal a denial.
///
/// The service sends a denied field as missing, empty or `null`; all three read as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccessDescriptor {
    #[serde(deserialize_with = "null_as_empty")]
    pub organization_id: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub user_id: String,
    #[serde(deserialize_with = "null_as_empty")]
    pub file_name: String,
}

impl AccessDescriptor {
    pub fn new(organization_id: impl Into<String>, user_id: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            organization_id: organization_id.into(),
            user_id: user_id.into(),
            file_name: file_name.into(),
        }
    }
}

/// Request to store a document; `content` is standard Base64.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    pub organization_id: String,
    #[serde(default)]
    pub user_id: String,
    pub file_name: String,
    pub content: String,
}

/// Request to remove a document. Carries the same identification fields as [`AccessDescriptor`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveRequest {
    pub organization_id: String,
    #[serde(default)]
    pub user_id: String,
    pub file_name: String,
}

/// Result of a remote API key validation.
///
/// The ACL service answers either with a bare JSON boolean or with `{"authorized": bool}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ApplicationAuthWire")]
pub struct ApplicationAuth {
    pub authorized: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ApplicationAuthWire {
    Bare(bool),
    Object { authorized: bool },
}

impl From<ApplicationAuthWire> for ApplicationAuth {
    fn from(wire: ApplicationAuthWire) -> Self {
        match wire {
            ApplicationAuthWire::Bare(authorized) | ApplicationAuthWire::Object { authorized } => Self { authorized },
        }
    }
}

pub(crate) fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}
