use super::{CreateResourceRequest, FileDescriptor, ResourceError};
use crate::domain::ResourceDraft;

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// 50 MiB
pub const MAX_UPLOAD_BYTES: u64 = 50 * 1024 * 1024;

/// Cap on the `metadata` multipart field.
pub const MAX_METADATA_BYTES: u64 = 64 * 1024;

/// Recorded as the uploader when no session accompanies the upload.
pub const DEFAULT_UPLOADER: &str = "Current User";

/// Parses the `metadata` multipart field. An absent field is an empty object.
pub fn parse_metadata(raw: Option<&str>) -> Result<CreateResourceRequest, ResourceError> {
    let raw = match raw {
        Some(raw) if !raw.trim().is_empty() => raw,
        _ => "{}",
    };

    serde_json::from_str(raw).map_err(|_| ResourceError::validation("Invalid metadata format"))
}

/// Only non-empty PDFs up to `max_bytes` are accepted.
pub fn check_pdf_file(
    content_type: Option<&str>,
    size: u64,
    max_bytes: u64,
) -> Result<(), ResourceError> {
    let is_pdf = content_type
        .and_then(|value| value.parse::<mime::Mime>().ok())
        .map(|m| m.essence_str() == PDF_CONTENT_TYPE)
        .unwrap_or(false);

    if !is_pdf {
        return Err(ResourceError::validation("Only PDF files are allowed"));
    }

    if size == 0 {
        return Err(ResourceError::validation("File is empty"));
    }

    if size > max_bytes {
        return Err(ResourceError::validation(format!(
            "File size must be less than {}MB",
            max_bytes / (1024 * 1024)
        )));
    }

    Ok(())
}

/// Turns upload metadata into a draft, or fails without side effects.
pub fn validate_upload(
    metadata: CreateResourceRequest,
    file: FileDescriptor,
    uploaded_by: &str,
) -> Result<ResourceDraft, ResourceError> {
    let title = metadata.title.trim();
    let subject = metadata.subject.trim();

    let category = match metadata.category {
        Some(category) if !title.is_empty() && !subject.is_empty() => category,
        _ => {
            return Err(ResourceError::validation(
                "Missing required metadata: title, category, and subject are required",
            ))
        }
    };

    Ok(ResourceDraft {
        title: title.to_string(),
        description: metadata.description.trim().to_string(),
        category,
        subject: subject.to_string(),
        tags: normalize_tags(metadata.tags),
        file_name: file.file_name,
        file_size: file.size,
        uploaded_by: uploaded_by.to_string(),
    })
}

/// Trims labels, drops blanks and repeats; first occurrence keeps its place.
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !normalized.iter().any(|t| t == tag) {
            normalized.push(tag.to_string());
        }
    }
    normalized
}
