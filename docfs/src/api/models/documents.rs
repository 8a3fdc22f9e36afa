use crate::types::RemoveRequest;
use serde::Deserialize;

/// Path of `DELETE /api/document/{organizationId}/{userId}/{fileName}`
#[derive(Debug, Deserialize)]
pub struct UserDocumentPath {
    pub organization_id: String,
    pub user_id: String,
    pub file_name: String,
}

/// Path of `DELETE /api/attachment/{organizationId}/{fileName}`
#[derive(Debug, Deserialize)]
pub struct AttachmentPath {
    pub organization_id: String,
    pub file_name: String,
}

impl From<UserDocumentPath> for RemoveRequest {
    fn from(path: UserDocumentPath) -> Self {
        RemoveRequest {
            organization_id: path.organization_id,
            user_id: path.user_id,
            file_name: path.file_name,
        }
    }
}

impl From<AttachmentPath> for RemoveRequest {
    fn from(path: AttachmentPath) -> Self {
        RemoveRequest {
            organization_id: path.organization_id,
            user_id: String::new(),
            file_name: path.file_name,
        }
    }
}
