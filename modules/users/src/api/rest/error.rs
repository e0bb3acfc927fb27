use api_errors::{catalog, ProblemContext, ProblemResponse};
use axum::extract::rejection::{JsonRejection, PathRejection};

use crate::domain::error::DomainError;

/// Map domain error to RFC9457 ProblemResponse
pub fn map_domain_error(e: &DomainError, ctx: &ProblemContext) -> ProblemResponse {
    match e {
        DomainError::UserNotFound { id } => catalog::USERS_NOT_FOUND
            .respond(format!("User with id {} was not found", id), ctx),
        DomainError::InvalidEmail { email } => {
            catalog::USERS_INVALID_EMAIL.respond(format!("Email '{}' is invalid", email), ctx)
        }
        DomainError::EmptyUsername | DomainError::PasswordTooShort { .. } => {
            catalog::USERS_VALIDATION.respond(e.to_string(), ctx)
        }
        DomainError::Storage { .. } => {
            // Log the internal error details but don't expose them to the client
            tracing::error!(error = ?e, "Storage error occurred");
            catalog::INTERNAL.respond("An internal storage error occurred", ctx)
        }
    }
}

/// Malformed JSON, wrong types and missing fields are all client errors.
pub fn map_json_rejection(rejection: &JsonRejection, ctx: &ProblemContext) -> ProblemResponse {
    catalog::USERS_INVALID_BODY.respond(rejection.body_text(), ctx)
}

pub fn map_path_rejection(rejection: &PathRejection, ctx: &ProblemContext) -> ProblemResponse {
    catalog::USERS_INVALID_ID.respond(
        format!("User id must be a non-negative integer ({})", rejection.body_text()),
        ctx,
    )
}
