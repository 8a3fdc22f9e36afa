//! Storage path resolution, one strategy per [`DocumentCategory`].

use crate::errors::{Error, Result};
use crate::types::DocumentCategory;
use std::path::{Path, PathBuf};

/// Number of leading user id characters dropped to get the shard folder name.
///
/// With 7 character user ids, users `2312345` and `3423945` share the folder `45`.
pub const USER_SHARD_OFFSET: usize = 5;

/// Maps an identification triple to an absolute path below a category root.
///
/// Resolution is pure: it never touches the filesystem and does not check for blank fields,
/// callers validate first.
#[derive(Debug, Clone)]
pub struct PathResolver {
    category: DocumentCategory,
    root: PathBuf,
}

impl PathResolver {
    pub fn new(category: DocumentCategory, root: impl Into<PathBuf>) -> Self {
        Self {
            category,
            root: root.into(),
        }
    }

    pub fn category(&self) -> DocumentCategory {
        self.category
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, organization_id: &str, user_id: &str, file_name: &str) -> Result<PathBuf> {
        let organization = self.root.join(organization_id.to_lowercase());
        match self.category {
            DocumentCategory::UserDocument => Ok(organization.join(user_shard(user_id)?).join(file_name)),
            DocumentCategory::Attachment => Ok(organization.join(file_name)),
            DocumentCategory::PerformanceResult => Ok(organization.join(user_id.to_lowercase())),
        }
    }
}

/// Shard folder of a user: the lower-cased user id without its first five characters.
fn user_shard(user_id: &str) -> Result<String> {
    let lowered = user_id.to_lowercase();
    match lowered.char_indices().nth(USER_SHARD_OFFSET) {
        Some((offset, _)) => Ok(lowered[offset..].to_string()),
        None => Err(Error::invalid_request(format!(
            "User id must be longer than {USER_SHARD_OFFSET} characters to derive its shard folder"
        ))),
    }
}
