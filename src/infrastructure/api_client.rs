use crate::application::{
    check_pdf_file, CreateResourceRequest, Credentials, MessageResponse, ResourcesResponse,
    UploadResponse, MAX_UPLOAD_BYTES, PDF_CONTENT_TYPE,
};
use crate::domain::{Resource, ResourceFilter, Session};
use hyper::client::HttpConnector;
use hyper::{header, Body, Client, Method, Request, StatusCode};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::form_urlencoded;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] hyper::Error),

    #[error("Invalid request: {0}")]
    Request(#[from] hyper::http::Error),

    #[error("Server responded {status}: {message}")]
    Status { status: StatusCode, message: String },

    #[error("Could not decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    InvalidFile(String),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// A file picked for upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn pdf(file_name: &str, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.to_string(),
            content_type: PDF_CONTENT_TYPE.to_string(),
            bytes,
        }
    }

    /// Checks made before anything is sent: PDF only, at most 50 MiB.
    pub fn validate(&self) -> Result<(), ClientError> {
        check_pdf_file(
            Some(self.content_type.as_str()),
            self.bytes.len() as u64,
            MAX_UPLOAD_BYTES,
        )
        .map_err(|e| ClientError::InvalidFile(e.to_string()))
    }
}

/// HTTP client for the resource API.
///
/// `base_url` is the mount point, e.g. `http://127.0.0.1:8080/api`.
pub struct ResourceApiClient {
    client: Client<HttpConnector>,
    base_url: String,
    token: Option<String>,
}

impl ResourceApiClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Sends `Authorization: Bearer <token>` with every request.
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub async fn fetch_resources(
        &self,
        filter: &ResourceFilter,
    ) -> Result<ResourcesResponse, ClientError> {
        let query = query_string(filter);
        let uri = if query.is_empty() {
            format!("{}/resources", self.base_url)
        } else {
            format!("{}/resources?{}", self.base_url, query)
        };

        let request = self.request(Method::GET, &uri).body(Body::empty())?;
        self.send_json(request).await
    }

    pub async fn fetch_resource(&self, id: &str) -> Result<Resource, ClientError> {
        let uri = format!("{}/resources/{}", self.base_url, encode_segment(id));
        let request = self.request(Method::GET, &uri).body(Body::empty())?;
        self.send_json(request).await
    }

    pub async fn upload(
        &self,
        file: &UploadFile,
        metadata: &CreateResourceRequest,
    ) -> Result<Resource, ClientError> {
        file.validate()?;

        let boundary = format!("resource-hub-{}", uuid::Uuid::new_v4().simple());
        let metadata_json = serde_json::to_string(metadata)?;
        let body = multipart_body(&boundary, &metadata_json, file);

        let request = self
            .request(Method::POST, &format!("{}/resources", self.base_url))
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))?;

        let response: UploadResponse = self.send_json(request).await?;
        response.resource.ok_or_else(|| ClientError::Status {
            status: StatusCode::OK,
            message: response.message,
        })
    }

    pub async fn download(&self, id: &str) -> Result<Vec<u8>, ClientError> {
        let uri = format!("{}/resources/{}/download", self.base_url, encode_segment(id));
        let request = self.request(Method::GET, &uri).body(Body::empty())?;
        let body = self.send(request).await?;
        Ok(body.to_vec())
    }

    pub async fn delete(&self, id: &str) -> Result<MessageResponse, ClientError> {
        let uri = format!("{}/resources/{}", self.base_url, encode_segment(id));
        let request = self.request(Method::DELETE, &uri).body(Body::empty())?;
        self.send_json(request).await
    }

    pub async fn login(&self, credentials: &Credentials) -> Result<Session, ClientError> {
        let request = self
            .request(Method::POST, &format!("{}/auth/login", self.base_url))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(credentials)?))?;
        self.send_json(request).await
    }

    fn request(&self, method: Method, uri: &str) -> hyper::http::request::Builder {
        let builder = Request::builder().method(method).uri(uri);
        match &self.token {
            Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {}", token)),
            None => builder,
        }
    }

    async fn send(&self, request: Request<Body>) -> Result<hyper::body::Bytes, ClientError> {
        let response = self.client.request(request).await?;
        let status = response.status();
        let body = hyper::body::to_bytes(response.into_body()).await?;

        if !status.is_success() {
            return Err(ClientError::Status {
                status,
                message: error_message(&body),
            });
        }

        Ok(body)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: Request<Body>) -> Result<T, ClientError> {
        let body = self.send(request).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

fn query_string(filter: &ResourceFilter) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    if let Some(category) = filter.category {
        serializer.append_pair("category", category.as_str());
    }
    if let Some(subject) = &filter.subject {
        serializer.append_pair("subject", subject);
    }
    if let Some(search) = &filter.search {
        serializer.append_pair("search", search);
    }
    serializer.finish()
}

fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, NON_ALPHANUMERIC).to_string()
}

/// The server reports failures as `{error}` or `{message}`.
fn error_message(body: &[u8]) -> String {
    serde_json::from_slice::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .or_else(|| value.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| String::from_utf8_lossy(body).into_owned())
}

fn multipart_body(boundary: &str, metadata_json: &str, file: &UploadFile) -> Vec<u8> {
    let file_name = file.file_name.replace(&['"', '\r', '\n'][..], "_");
    let mut body = Vec::with_capacity(file.bytes.len() + metadata_json.len() + 512);

    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"metadata\"\r\n\r\n{metadata_json}\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\nContent-Type: {}\r\n\r\n",
            file.content_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(&file.bytes);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    body
}
