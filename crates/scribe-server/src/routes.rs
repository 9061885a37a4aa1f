//! HTTP routes
//!
//! - `POST /api/compose`: run the composition pipeline
//! - `GET|POST|DELETE /api/brand`: read, summarize or clear the brand voice
//! - `GET /health`: liveness probe
//!
//! Handlers never reject; every outcome, including malformed bodies, is
//! rendered as a JSON response.

use crate::cookies;
use crate::identity::{self, USER_HEADER};
use scribe_core::{
    BrandService, CallerContext, ClientCookie, ComposeError, ComposePipeline, ComposeRequest,
    FieldErrors, GUEST_BRAND_COOKIE, GUEST_USAGE_COOKIE,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;
use warp::http::header::{CONTENT_TYPE, SET_COOKIE};
use warp::http::{Response, StatusCode};
use warp::hyper::body::Bytes;
use warp::hyper::Body;
use warp::{Filter, Rejection, Reply};

/// Largest accepted request body
pub const MAX_BODY_BYTES: u64 = 64 * 1024;

/// Application state shared across handlers
pub struct AppState {
    /// Composition pipeline
    pub pipeline: ComposePipeline,
    /// Brand profile operations
    pub brands: BrandService,
    /// Process start, for uptime
    pub started: Instant,
}

impl AppState {
    /// Create state around a wired pipeline
    #[must_use]
    pub fn new(pipeline: ComposePipeline) -> Self {
        Self {
            brands: pipeline.brand_service(),
            pipeline,
            started: Instant::now(),
        }
    }
}

type SharedState = Arc<AppState>;

/// All routes, with rejections rendered as JSON
pub fn routes(
    state: SharedState,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    health_route(state.clone())
        .or(compose_route(state.clone()))
        .or(brand_routes(state))
        .recover(handle_rejection)
}

fn with_state(
    state: SharedState,
) -> impl Filter<Extract = (SharedState,), Error = Infallible> + Clone {
    warp::any().map(move || state.clone())
}

fn caller() -> impl Filter<Extract = (CallerContext,), Error = Rejection> + Clone {
    warp::header::optional::<String>(USER_HEADER)
        .and(warp::cookie::optional::<String>(GUEST_USAGE_COOKIE))
        .and(warp::cookie::optional::<String>(GUEST_BRAND_COOKIE))
        .map(|user: Option<String>, usage: Option<String>, brand: Option<String>| {
            identity::caller_context(user.as_deref(), usage, brand.as_deref())
        })
}

fn json_body() -> impl Filter<Extract = (Bytes,), Error = Rejection> + Clone {
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::bytes())
}

/// Decode a JSON body, filing any failure under the field it concerns
///
/// Keys use the same dotted camelCase paths as request validation, so
/// `{"settings":{"characterLength":"abc"}}` reports
/// `settings.characterLength`. Syntax errors and failures at the document
/// root are filed under `body`.
fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, ComposeError> {
    let mut deserializer = serde_json::Deserializer::from_slice(body);
    let value = serde_path_to_error::deserialize(&mut deserializer).map_err(|e| {
        let field = field_key(&e.path().to_string(), e.inner());
        ComposeError::invalid_field(field, e.inner().to_string())
    })?;
    deserializer
        .end()
        .map_err(|e| ComposeError::invalid_field("body", e.to_string()))?;
    Ok(value)
}

fn field_key(path: &str, error: &serde_json::Error) -> String {
    if error.is_syntax() || error.is_eof() {
        return "body".to_string();
    }

    let message = error.to_string();
    let missing = message
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next());

    match (path, missing) {
        (".", Some(field)) => field.to_string(),
        (".", None) => "body".to_string(),
        (parent, Some(field)) => format!("{parent}.{field}"),
        (parent, None) => parent.to_string(),
    }
}

// ============================================================================
// Health
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthBody {
    status: &'static str,
    version: &'static str,
    uptime_secs: u64,
    generation_configured: bool,
}

fn health_route(
    state: SharedState,
) -> impl Filter<Extract = (Response<Body>,), Error = Rejection> + Clone {
    warp::path!("health")
        .and(warp::get())
        .and(with_state(state))
        .map(|state: SharedState| {
            let body = HealthBody {
                status: "ok",
                version: scribe_core::VERSION,
                uptime_secs: state.started.elapsed().as_secs(),
                generation_configured: state.pipeline.generation().is_some(),
            };
            json_response(StatusCode::OK, &body, &[])
        })
}

// ============================================================================
// Compose
// ============================================================================

fn compose_route(
    state: SharedState,
) -> impl Filter<Extract = (Response<Body>,), Error = Rejection> + Clone {
    warp::path!("api" / "compose")
        .and(warp::post())
        .and(with_state(state))
        .and(caller())
        .and(json_body())
        .and_then(handle_compose)
}

async fn handle_compose(
    state: SharedState,
    caller: CallerContext,
    body: Bytes,
) -> Result<Response<Body>, Infallible> {
    let request: ComposeRequest = match parse_body(&body) {
        Ok(request) => request,
        Err(e) => return Ok(error_response(&e)),
    };

    match state.pipeline.compose(request, &caller).await {
        Ok(outcome) => Ok(json_response(
            StatusCode::OK,
            &outcome.response,
            &outcome.client_writes,
        )),
        Err(e) => Ok(error_response(&e)),
    }
}

// ============================================================================
// Brand
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BrandSourceBody {
    source_text: String,
}

fn brand_routes(
    state: SharedState,
) -> impl Filter<Extract = (Response<Body>,), Error = Rejection> + Clone {
    let base = warp::path!("api" / "brand").and(with_state(state)).and(caller());

    let get = base
        .clone()
        .and(warp::get())
        .then(|state: SharedState, caller: CallerContext| async move {
            let profile = state.brands.get(&caller).await;
            json_response(StatusCode::OK, &profile, &[])
        });

    let post = base
        .clone()
        .and(warp::post())
        .and(json_body())
        .and_then(handle_brand_summary);

    let delete = base
        .and(warp::delete())
        .then(|state: SharedState, caller: CallerContext| async move {
            let outcome = state.brands.clear(&caller).await;
            json_response(StatusCode::OK, &outcome.profile, &outcome.client_writes)
        });

    get.or(post).unify().or(delete).unify()
}

async fn handle_brand_summary(
    state: SharedState,
    caller: CallerContext,
    body: Bytes,
) -> Result<Response<Body>, Infallible> {
    let source: BrandSourceBody = match parse_body(&body) {
        Ok(source) => source,
        Err(e) => return Ok(error_response(&e)),
    };

    match state.brands.summarize_and_store(&caller, &source.source_text).await {
        Ok(outcome) => Ok(json_response(
            StatusCode::OK,
            &outcome.profile,
            &outcome.client_writes,
        )),
        Err(e) => Ok(error_response(&e)),
    }
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody<'a> {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    fields: Option<&'a FieldErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    require_auth: Option<bool>,
}

fn json_response<T: Serialize>(
    status: StatusCode,
    body: &T,
    writes: &[ClientCookie],
) -> Response<Body> {
    let payload = match serde_json::to_vec(body) {
        Ok(payload) => payload,
        Err(e) => {
            tracing::error!(error = %e, "failed to serialize response body");
            return plain_status(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    let mut builder = Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json");
    for write in writes {
        builder = builder.header(SET_COOKIE, cookies::set_cookie_header(write));
    }

    builder.body(Body::from(payload)).unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to build response");
        plain_status(StatusCode::INTERNAL_SERVER_ERROR)
    })
}

fn error_response(error: &ComposeError) -> Response<Body> {
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        tracing::error!(status = status.as_u16(), error = %error, "request failed");
    } else {
        tracing::info!(status = status.as_u16(), error = %error, "request rejected");
    }

    let body = ErrorBody {
        error: error.public_message(),
        fields: match error {
            ComposeError::Validation(fields) => Some(fields),
            _ => None,
        },
        require_auth: error.require_auth().then_some(true),
    };
    json_response(status, &body, &[])
}

fn plain_status(status: StatusCode) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
}

async fn handle_rejection(rejection: Rejection) -> Result<Response<Body>, Infallible> {
    let (status, message) = if rejection.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found")
    } else if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    } else if rejection.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")
    } else if rejection.find::<warp::reject::LengthRequired>().is_some() {
        (StatusCode::LENGTH_REQUIRED, "Content-Length required")
    } else {
        tracing::error!(rejection = ?rejection, "unhandled rejection");
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
    };

    let body = ErrorBody {
        error: message.to_string(),
        fields: None,
        require_auth: None,
    };
    Ok(json_response(status, &body, &[]))
}
