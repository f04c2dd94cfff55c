mod auth;
mod catalog;
mod error;
mod types;
mod upload;

pub use auth::{AuthError, AuthService, Authenticator, SessionStore};
pub use catalog::{Download, ResourceCatalog};
pub use error::ResourceError;
pub use types::{
    CreateResourceRequest, Credentials, ErrorResponse, FileDescriptor, MessageResponse,
    PingResponse, Registration, ResourcesResponse, UploadResponse,
};
pub use upload::{
    check_pdf_file, parse_metadata, validate_upload, DEFAULT_UPLOADER, MAX_METADATA_BYTES,
    MAX_UPLOAD_BYTES, PDF_CONTENT_TYPE,
};
