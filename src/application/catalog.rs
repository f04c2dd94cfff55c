use super::upload::{validate_upload, PDF_CONTENT_TYPE};
use super::{CreateResourceRequest, FileDescriptor, ResourceError, ResourcesResponse};
use crate::domain::{Resource, ResourceFilter};
use crate::infrastructure::database::ResourceRepository;
use crate::infrastructure::placeholder::placeholder_pdf;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use tracing::{debug, info};

/// A download: the updated record plus the bytes to send.
#[derive(Debug, Clone)]
pub struct Download {
    pub resource: Resource,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

/// RFC 5987 `attr-char`: everything else is percent-encoded.
const ATTR_CHAR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

impl Download {
    /// Quoted ASCII `filename`, plus `filename*` when the name is not ASCII.
    pub fn content_disposition(&self) -> String {
        let name = &self.resource.file_name;
        let fallback: String = name
            .chars()
            .map(|c| match c {
                '"' | '\\' => '_',
                c if c.is_ascii() && !c.is_ascii_control() => c,
                _ => '_',
            })
            .collect();

        if name.is_ascii() {
            format!("attachment; filename=\"{}\"", fallback)
        } else {
            format!(
                "attachment; filename=\"{}\"; filename*=UTF-8''{}",
                fallback,
                utf8_percent_encode(name, ATTR_CHAR)
            )
        }
    }
}

/// Authoritative CRUD over the resource collection.
pub struct ResourceCatalog {
    repository: Box<dyn ResourceRepository>,
}

impl ResourceCatalog {
    pub fn new(repository: Box<dyn ResourceRepository>) -> Self {
        Self { repository }
    }

    pub fn list(&self, filter: &ResourceFilter) -> Result<ResourcesResponse, ResourceError> {
        let resources = self.repository.list(filter)?;
        debug!(?filter, matched = resources.len(), "Listed resources");
        Ok(ResourcesResponse::new(resources))
    }

    pub fn get(&self, id: &str) -> Result<Resource, ResourceError> {
        self.repository
            .find_by_id(id)
            .map_err(|e| ResourceError::from_repository(id, e))
    }

    pub fn create(
        &mut self,
        metadata: CreateResourceRequest,
        file: FileDescriptor,
        uploaded_by: &str,
    ) -> Result<Resource, ResourceError> {
        let draft = validate_upload(metadata, file, uploaded_by)?;
        let resource = Resource::new(draft);

        self.repository.save(&resource)?;
        info!(id = %resource.id, title = %resource.title, "Resource created");

        Ok(resource)
    }

    /// Counts one download and returns the payload. The counter never moves
    /// for an unknown id.
    pub fn record_download(&mut self, id: &str) -> Result<Download, ResourceError> {
        let mut resource = self.get(id)?;
        resource.download_count = resource.download_count.saturating_add(1);

        self.repository
            .update(&resource)
            .map_err(|e| ResourceError::from_repository(id, e))?;
        debug!(id, downloads = resource.download_count, "Download recorded");

        let body = placeholder_pdf(&resource.title);
        Ok(Download {
            resource,
            content_type: PDF_CONTENT_TYPE,
            body,
        })
    }

    /// Removes the record and returns it.
    pub fn delete(&mut self, id: &str) -> Result<Resource, ResourceError> {
        let resource = self.get(id)?;
        self.repository
            .delete(id)
            .map_err(|e| ResourceError::from_repository(id, e))?;
        info!(id, "Resource deleted");

        Ok(resource)
    }

    pub fn count(&self) -> Result<usize, ResourceError> {
        Ok(self.repository.count()?)
    }
}
