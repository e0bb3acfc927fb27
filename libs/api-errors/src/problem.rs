use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{
        header, request::Parts, HeaderMap, HeaderName, HeaderValue, Request, StatusCode, Uri,
    },
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Content type for Problem Details as per RFC 9457.
pub const APPLICATION_PROBLEM_JSON: &str = "application/problem+json";

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// RFC 9457 Problem Details for HTTP APIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(
    title = "Problem",
    description = "RFC 9457 Problem Details for HTTP APIs"
)]
pub struct Problem {
    /// A URI reference that identifies the problem type.
    #[serde(rename = "type")]
    pub type_url: String,
    /// A short, human-readable summary of the problem type.
    pub title: String,
    /// The HTTP status code for this occurrence of the problem.
    pub status: u16,
    /// A human-readable explanation specific to this occurrence of the problem.
    pub detail: String,
    /// The request path this problem occurred on.
    pub instance: String,
    /// Machine-readable error code, e.g. `USERS_NOT_FOUND`.
    pub code: String,
    /// Request id copied from `x-request-id`, when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl Problem {
    pub fn new(status: StatusCode, title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            type_url: "about:blank".to_string(),
            title: title.into(),
            status: status.as_u16(),
            detail: detail.into(),
            instance: String::new(),
            code: String::new(),
            request_id: None,
        }
    }

    pub fn with_type(mut self, type_url: impl Into<String>) -> Self {
        self.type_url = type_url.into();
        self
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = code.into();
        self
    }

    /// Fill `instance` and `request_id` from the request the problem belongs to.
    pub fn with_context(mut self, ctx: &ProblemContext) -> Self {
        self.instance = ctx.instance.clone();
        self.request_id = ctx.request_id.clone();
        self
    }
}

/// Axum response wrapper that renders `Problem` with correct status & content type.
///
/// Extra headers (e.g. an auth challenge) are appended after the body headers.
#[derive(Debug, Clone)]
pub struct ProblemResponse {
    pub problem: Problem,
    headers: HeaderMap,
}

impl ProblemResponse {
    pub fn new(problem: Problem) -> Self {
        Self {
            problem,
            headers: HeaderMap::new(),
        }
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.problem.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ProblemResponse {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut resp = axum::Json(self.problem).into_response();
        *resp.status_mut() = status;
        resp.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(APPLICATION_PROBLEM_JSON),
        );
        resp.headers_mut().extend(self.headers);
        resp
    }
}

/// Request-derived fields every problem carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProblemContext {
    pub instance: String,
    pub request_id: Option<String>,
}

impl ProblemContext {
    pub fn from_parts(parts: &Parts) -> Self {
        Self::from_head(&parts.uri, &parts.headers)
    }

    /// For middleware that holds the whole request rather than its parts.
    pub fn from_request<B>(req: &Request<B>) -> Self {
        Self::from_head(req.uri(), req.headers())
    }

    fn from_head(uri: &Uri, headers: &HeaderMap) -> Self {
        Self {
            instance: uri.path().to_string(),
            request_id: headers
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned),
        }
    }
}

impl<S> FromRequestParts<S> for ProblemContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts))
    }
}
