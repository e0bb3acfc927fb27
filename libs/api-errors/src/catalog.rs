//! Static error definitions shared by the ingress and the REST modules.
use http::StatusCode;

use crate::problem::{Problem, ProblemContext, ProblemResponse};

/// Static error definition from the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrDef {
    pub status: u16,
    pub title: &'static str,
    pub code: &'static str,
    pub type_url: &'static str,
}

impl ErrDef {
    /// Convert this error definition into a Problem with the given detail
    #[inline]
    pub fn to_problem(&self, detail: impl Into<String>) -> Problem {
        Problem::new(
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            self.title,
            detail.into(),
        )
        .with_code(self.code)
        .with_type(self.type_url)
    }

    /// Build a response for the request described by `ctx`.
    pub fn respond(&self, detail: impl Into<String>, ctx: &ProblemContext) -> ProblemResponse {
        let problem = self.to_problem(detail).with_context(ctx);
        tracing::debug!(code = self.code, status = self.status, "problem response");
        ProblemResponse::new(problem)
    }
}

macro_rules! err_def {
    ($name:ident, $status:literal, $title:literal, $code:literal) => {
        pub const $name: ErrDef = ErrDef {
            status: $status,
            title: $title,
            code: $code,
            type_url: concat!("https://errors.users-server.local/", $code),
        };
    };
}

err_def!(UNAUTHORIZED, 401, "Unauthorized", "AUTH_UNAUTHORIZED");
err_def!(USERS_NOT_FOUND, 404, "User not found", "USERS_NOT_FOUND");
err_def!(USERS_VALIDATION, 400, "Validation error", "USERS_VALIDATION");
err_def!(USERS_INVALID_EMAIL, 400, "Invalid email", "USERS_INVALID_EMAIL");
err_def!(USERS_INVALID_BODY, 400, "Invalid request body", "USERS_INVALID_BODY");
err_def!(USERS_INVALID_ID, 400, "Invalid user id", "USERS_INVALID_ID");
err_def!(INTERNAL, 500, "Internal error", "INTERNAL");
