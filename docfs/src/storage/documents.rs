use crate::errors::{Error, Result};
use crate::storage::file_store::FileStore;
use crate::storage::paths::PathResolver;
use crate::types::{AccessDescriptor, CreateRequest, DocumentCategory, RemoveRequest, is_blank};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Reads, writes and removes the documents of one category.
///
/// Every operation validates its input before touching the filesystem, so an invalid request
/// never has side effects.
#[derive(Clone)]
pub struct DocumentStore {
    resolver: PathResolver,
    files: Arc<dyn FileStore>,
}

impl DocumentStore {
    pub fn new(resolver: PathResolver, files: Arc<dyn FileStore>) -> Self {
        Self { resolver, files }
    }

    pub fn category(&self) -> DocumentCategory {
        self.resolver.category()
    }

    /// Reads the document identified by an ACL access descriptor.
    ///
    /// Documents are loaded whole, which is fine for the report and attachment sizes this
    /// server handles.
    #[instrument(skip_all, fields(category = %self.category()))]
    pub async fn read(&self, access: &AccessDescriptor) -> Result<Bytes> {
        let category = self.category();
        if let Some(field) = category.missing_read_field(&access.organization_id, &access.user_id, &access.file_name) {
            return Err(unidentified(category, field));
        }
        let path = self.resolver.resolve(&access.organization_id, &access.user_id, &access.file_name)?;
        self.files.read(&path).await
    }

    /// Decodes the Base64 content and stores it, creating the parent directory first.
    ///
    /// A directory created for a write that then fails is left in place.
    #[instrument(skip_all, fields(category = %self.category()))]
    pub async fn write(&self, request: &CreateRequest) -> Result<()> {
        let path = self.document_path(&request.organization_id, &request.user_id, &request.file_name)?;
        if is_blank(&request.content) {
            return Err(Error::invalid_request(format!("{} content must not be blank", self.category())));
        }
        let content = STANDARD
            .decode(request.content.trim())
            .map_err(|source| Error::InvalidContent { source })?;

        if let Some(parent) = path.parent() {
            self.files.mkdirs(parent).await?;
        }
        self.files.write(&path, Bytes::from(content)).await?;
        debug!(path = %path.display(), "Document file is written");
        Ok(())
    }

    /// Removes a document. Removing a document that does not exist succeeds.
    #[instrument(skip_all, fields(category = %self.category()))]
    pub async fn remove(&self, request: &RemoveRequest) -> Result<()> {
        let path = self.document_path(&request.organization_id, &request.user_id, &request.file_name)?;
        self.files.delete(&path).await
    }

    /// Path of a document about to be written or removed.
    fn document_path(&self, organization_id: &str, user_id: &str, file_name: &str) -> Result<PathBuf> {
        let category = self.category();
        if let Some(field) = category.missing_write_field(organization_id, user_id, file_name) {
            return Err(unidentified(category, field));
        }
        self.resolver.resolve(organization_id, user_id, file_name)
    }
}

fn unidentified(category: DocumentCategory, field: &str) -> Error {
    Error::invalid_request(format!("{category} file cannot be identified: {field} is blank"))
}

/// Strategy table holding one [`DocumentStore`] per category, built once at startup.
#[derive(Clone)]
pub struct DocumentStores {
    user_documents: DocumentStore,
    attachments: DocumentStore,
    performance_results: DocumentStore,
}

impl DocumentStores {
    pub fn new(
        user_documents_root: impl Into<PathBuf>,
        attachments_root: impl Into<PathBuf>,
        performance_results_root: impl Into<PathBuf>,
        files: Arc<dyn FileStore>,
    ) -> Self {
        let store = |category, root: PathBuf| DocumentStore::new(PathResolver::new(category, root), files.clone());
        Self {
            user_documents: store(DocumentCategory::UserDocument, user_documents_root.into()),
            attachments: store(DocumentCategory::Attachment, attachments_root.into()),
            performance_results: store(DocumentCategory::PerformanceResult, performance_results_root.into()),
        }
    }

    pub fn get(&self, category: DocumentCategory) -> &DocumentStore {
        match category {
            DocumentCategory::UserDocument => &self.user_documents,
            DocumentCategory::Attachment => &self.attachments,
            DocumentCategory::PerformanceResult => &self.performance_results,
        }
    }
}
