use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use hyper::header::{HeaderValue, AUTHORIZATION, CONTENT_DISPOSITION, CONTENT_TYPE};
use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server, StatusCode};
use multer::{Constraints, Multipart, SizeLimit};
use percent_encoding::percent_decode_str;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{error, info, warn};
use url::form_urlencoded;

use crate::application::{
    check_pdf_file, parse_metadata, AuthError, Credentials, ErrorResponse, FileDescriptor,
    MessageResponse, PingResponse, Registration, ResourceError, UploadResponse, DEFAULT_UPLOADER,
    MAX_METADATA_BYTES,
};
use crate::domain::ResourceFilter;
use crate::state::AppState;

/// Prefix some deployments mount the API under. Routes answer with and
/// without it.
const API_PREFIX: &str = "/api";

/// Headroom for part headers, boundaries and stray small fields.
const MULTIPART_OVERHEAD_BYTES: u64 = 16 * 1024;

/// Binds `addr` and returns the bound address with the server future, which
/// resolves once `shutdown` completes.
pub fn bind(
    addr: SocketAddr,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(SocketAddr, impl Future<Output = Result<(), hyper::Error>>), hyper::Error> {
    let make_svc = make_service_fn(move |_conn| {
        let state = state.clone();

        async move {
            Ok::<_, Infallible>(service_fn(move |req| route(req, state.clone())))
        }
    });

    let server = Server::try_bind(&addr)?.serve(make_svc);
    let local_addr = server.local_addr();

    Ok((local_addr, server.with_graceful_shutdown(shutdown)))
}

pub async fn route(req: Request<Body>, state: Arc<AppState>) -> Result<Response<Body>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let segments = path_segments(&path);
    let segments: Vec<&str> = segments.iter().map(String::as_str).collect();

    let response = match (&method, segments.as_slice()) {
        (&Method::GET, ["ping"]) => json_response(
            StatusCode::OK,
            &PingResponse {
                message: "pong".to_string(),
            },
        ),
        (&Method::GET, ["resources"]) => list_resources(req.uri().query(), &state),
        (&Method::POST, ["resources"]) => upload_resource(req, &state).await,
        (&Method::GET, ["resources", id]) => get_resource(id, &state),
        (&Method::DELETE, ["resources", id]) => delete_resource(id, &state),
        (&Method::GET, ["resources", id, "download"]) => download_resource(id, &state),
        (&Method::POST, ["auth", "login"]) => login(req, &state).await,
        (&Method::POST, ["auth", "signup"]) => signup(req, &state).await,
        (&Method::POST, ["auth", "logout"]) => logout(&req, &state),
        (&Method::GET, ["auth", "session"]) => current_session(&req, &state),
        (
            _,
            ["ping"]
            | ["resources"]
            | ["resources", _]
            | ["resources", _, "download"]
            | ["auth", "login" | "signup" | "logout" | "session"],
        ) => json_response(
            StatusCode::METHOD_NOT_ALLOWED,
            &ErrorResponse::new("Method not allowed"),
        ),
        _ => json_response(StatusCode::NOT_FOUND, &ErrorResponse::new("Not found")),
    };

    info!(
        %method,
        path = %path,
        status = response.status().as_u16(),
        "Handled request"
    );
    Ok(response)
}

/// Decoded, non-empty path segments with the optional `/api` prefix removed.
fn path_segments(path: &str) -> Vec<String> {
    let path = match path.strip_prefix(API_PREFIX) {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => path,
    };

    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| percent_decode_str(segment).decode_utf8_lossy().into_owned())
        .collect()
}

/// Blank values and unknown categories are ignored.
pub fn parse_filter(query: Option<&str>) -> ResourceFilter {
    let mut filter = ResourceFilter::default();

    for (key, value) in form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
        if value.trim().is_empty() {
            continue;
        }
        match key.as_ref() {
            "category" => filter.category = value.parse().ok(),
            "subject" => filter.subject = Some(value.into_owned()),
            "search" => filter.search = Some(value.into_owned()),
            _ => {}
        }
    }

    filter
}

fn list_resources(query: Option<&str>, state: &AppState) -> Response<Body> {
    let filter = parse_filter(query);

    match state.with_catalog(|catalog| catalog.list(&filter)) {
        Ok(list) => json_response(StatusCode::OK, &list),
        Err(e) => error_response(e, "Failed to fetch resources"),
    }
}

fn get_resource(id: &str, state: &AppState) -> Response<Body> {
    match state.with_catalog(|catalog| catalog.get(id)) {
        Ok(resource) => json_response(StatusCode::OK, &resource),
        Err(e) => error_response(e, "Failed to fetch resource"),
    }
}

fn download_resource(id: &str, state: &AppState) -> Response<Body> {
    let download = match state.with_catalog(|catalog| catalog.record_download(id)) {
        Ok(download) => download,
        Err(e) => return error_response(e, "Failed to download resource"),
    };

    let disposition = HeaderValue::from_str(&download.content_disposition())
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"));

    let mut response = Response::new(Body::from(download.body));
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(download.content_type));
    response.headers_mut().insert(CONTENT_DISPOSITION, disposition);
    response
}

fn delete_resource(id: &str, state: &AppState) -> Response<Body> {
    match state.with_catalog(|catalog| catalog.delete(id)) {
        Ok(_) => json_response(
            StatusCode::OK,
            &MessageResponse::ok("Resource deleted successfully"),
        ),
        Err(e) => error_response(e, "Failed to delete resource"),
    }
}

#[derive(Default)]
struct UploadForm {
    file: Option<FileDescriptor>,
    metadata: Option<String>,
}

async fn upload_resource(req: Request<Body>, state: &AppState) -> Response<Body> {
    let uploaded_by = bearer_token(&req)
        .and_then(|token| state.auth.current_user(&token).ok())
        .map(|user| user.name)
        .unwrap_or_else(|| DEFAULT_UPLOADER.to_string());

    let form = match read_upload_form(req, state.config.max_upload_bytes).await {
        Ok(form) => form,
        Err(e) => return upload_failure(e),
    };

    let file = match form.file {
        Some(file) => file,
        None => return upload_failure(ResourceError::validation("No file provided")),
    };

    let metadata = match parse_metadata(form.metadata.as_deref()) {
        Ok(metadata) => metadata,
        Err(e) => return upload_failure(e),
    };

    match state.with_catalog(|catalog| catalog.create(metadata, file, &uploaded_by)) {
        Ok(resource) => json_response(StatusCode::OK, &UploadResponse::created(resource)),
        Err(e) => upload_failure(e),
    }
}

async fn read_upload_form(req: Request<Body>, max_bytes: u64) -> Result<UploadForm, ResourceError> {
    let boundary = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| multer::parse_boundary(value).ok())
        .ok_or_else(|| ResourceError::validation("Expected a multipart/form-data body"))?;

    let limits = SizeLimit::new()
        .whole_stream(max_bytes + MAX_METADATA_BYTES + MULTIPART_OVERHEAD_BYTES)
        .for_field("file", max_bytes)
        .for_field("metadata", MAX_METADATA_BYTES);
    let constraints = Constraints::new().size_limit(limits);
    let mut multipart = Multipart::with_constraints(req.into_body(), boundary, constraints);
    let mut form = UploadForm::default();

    let multipart_error = |e: multer::Error| match e {
        multer::Error::FieldSizeExceeded { field_name, .. }
            if field_name.as_deref() == Some("metadata") =>
        {
            ResourceError::validation(format!(
                "Metadata must be less than {}KB",
                MAX_METADATA_BYTES / 1024
            ))
        }
        multer::Error::FieldSizeExceeded { .. } => ResourceError::validation(format!(
            "File size must be less than {}MB",
            max_bytes / (1024 * 1024)
        )),
        multer::Error::StreamSizeExceeded { .. } => {
            ResourceError::validation("Upload body is too large")
        }
        other => ResourceError::validation(format!("Malformed multipart body: {}", other)),
    };

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("file") => {
                let file_name = field.file_name().unwrap_or("upload.pdf").to_string();
                let content_type = field.content_type().map(|m| m.to_string());
                let bytes = field.bytes().await.map_err(multipart_error)?;
                let size = bytes.len() as u64;

                check_pdf_file(content_type.as_deref(), size, max_bytes)?;
                form.file = Some(FileDescriptor {
                    file_name,
                    size,
                    content_type,
                });
            }
            Some("metadata") => {
                form.metadata = Some(field.text().await.map_err(multipart_error)?);
            }
            // skipped by the next call to next_field
            _ => {}
        }
    }

    Ok(form)
}

fn upload_failure(error: ResourceError) -> Response<Body> {
    match error {
        ResourceError::Validation(message) => {
            warn!("Upload rejected: {}", message);
            json_response(StatusCode::BAD_REQUEST, &UploadResponse::failed(message))
        }
        ResourceError::NotFound(id) => json_response(
            StatusCode::NOT_FOUND,
            &UploadResponse::failed(format!("Resource {} not found", id)),
        ),
        ResourceError::Internal(message) => {
            error!("Error uploading resource: {}", message);
            json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &UploadResponse::failed("Failed to upload resource"),
            )
        }
    }
}

async fn login(req: Request<Body>, state: &AppState) -> Response<Body> {
    let credentials: Credentials = match read_json(req).await {
        Ok(credentials) => credentials,
        Err(response) => return response,
    };

    match state.auth.login(&credentials) {
        Ok(session) => json_response(StatusCode::OK, &session),
        Err(e) => auth_error_response(e),
    }
}

async fn signup(req: Request<Body>, state: &AppState) -> Response<Body> {
    let registration: Registration = match read_json(req).await {
        Ok(registration) => registration,
        Err(response) => return response,
    };

    match state.auth.signup(&registration) {
        Ok(session) => json_response(StatusCode::OK, &session),
        Err(e) => auth_error_response(e),
    }
}

fn logout(req: &Request<Body>, state: &AppState) -> Response<Body> {
    let result = bearer_token(req)
        .ok_or(AuthError::SessionNotFound)
        .and_then(|token| state.auth.logout(&token));

    match result {
        Ok(()) => json_response(StatusCode::OK, &MessageResponse::ok("Logged out")),
        Err(e) => auth_error_response(e),
    }
}

fn current_session(req: &Request<Body>, state: &AppState) -> Response<Body> {
    let result = bearer_token(req)
        .ok_or(AuthError::SessionNotFound)
        .and_then(|token| state.auth.current_user(&token));

    match result {
        Ok(user) => json_response(StatusCode::OK, &user),
        Err(e) => auth_error_response(e),
    }
}

fn bearer_token(req: &Request<Body>) -> Option<String> {
    req.headers()
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

async fn read_json<T: DeserializeOwned>(req: Request<Body>) -> Result<T, Response<Body>> {
    let body = hyper::body::to_bytes(req.into_body()).await.map_err(|e| {
        warn!("Failed to read request body: {}", e);
        json_response(StatusCode::BAD_REQUEST, &ErrorResponse::new("Unreadable body"))
    })?;

    serde_json::from_slice(&body).map_err(|e| {
        json_response(
            StatusCode::BAD_REQUEST,
            &ErrorResponse::new(format!("Invalid request format: {}", e)),
        )
    })
}

fn auth_error_response(error: AuthError) -> Response<Body> {
    let status = match error {
        AuthError::InvalidCredentials | AuthError::SessionNotFound => StatusCode::UNAUTHORIZED,
        AuthError::EmailTaken => StatusCode::CONFLICT,
        AuthError::InvalidRegistration(_) => StatusCode::BAD_REQUEST,
    };
    json_response(status, &ErrorResponse::new(error.to_string()))
}

/// 4xx carry the error's own message; 5xx are logged and answered with
/// `context` only.
fn error_response(error: ResourceError, context: &str) -> Response<Body> {
    match error {
        ResourceError::Validation(message) => {
            json_response(StatusCode::BAD_REQUEST, &ErrorResponse::new(message))
        }
        ResourceError::NotFound(_) => json_response(
            StatusCode::NOT_FOUND,
            &ErrorResponse::new("Resource not found"),
        ),
        ResourceError::Internal(message) => {
            error!("{}: {}", context, message);
            json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &ErrorResponse::new(context),
            )
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Body> {
    let (status, bytes) = match serde_json::to_vec(body) {
        Ok(bytes) => (status, bytes),
        Err(e) => {
            error!("Failed to serialize response: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                br#"{"error":"Internal server error"}"#.to_vec(),
            )
        }
    };

    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
