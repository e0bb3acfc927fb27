use std::sync::Arc;

use api_errors::{Problem, ProblemContext, ProblemResponse};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path,
    },
    http::StatusCode,
    response::Json,
    Extension,
};
use tracing::{error, info};

use crate::api::rest::dto::{CreateUserReq, UpdateUserReq, UserDto};
use crate::api::rest::error::{map_domain_error, map_json_rejection, map_path_rejection};
use crate::contract::model::UserPatch;
use crate::domain::service::Service;

type UserId = Result<Path<u64>, PathRejection>;

fn user_id(id: UserId, ctx: &ProblemContext) -> Result<u64, ProblemResponse> {
    id.map(|Path(id)| id)
        .map_err(|rejection| map_path_rejection(&rejection, ctx))
}

fn json_body<T>(
    body: Result<Json<T>, JsonRejection>,
    ctx: &ProblemContext,
) -> Result<T, ProblemResponse> {
    body.map(|Json(v)| v)
        .map_err(|rejection| map_json_rejection(&rejection, ctx))
}

/// List all users
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    operation_id = "users.list_users",
    responses(
        (status = 200, description = "All users ordered by id", body = [UserDto]),
        (status = 401, description = "Unauthorized", body = Problem, content_type = "application/problem+json"),
        (status = 500, description = "Internal Server Error", body = Problem, content_type = "application/problem+json")
    ),
    security(("basic_auth" = []))
)]
pub async fn list_users(
    Extension(svc): Extension<Arc<Service>>,
    ctx: ProblemContext,
) -> Result<Json<Vec<UserDto>>, ProblemResponse> {
    info!("Listing users");

    match svc.list_users().await {
        Ok(users) => Ok(Json(users.into_iter().map(UserDto::from).collect())),
        Err(e) => {
            error!("Failed to list users: {}", e);
            Err(map_domain_error(&e, &ctx))
        }
    }
}

/// Get a specific user by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    operation_id = "users.get_user",
    params(("id" = u64, Path, description = "User id")),
    responses(
        (status = 200, description = "User found", body = UserDto),
        (status = 400, description = "Invalid id", body = Problem, content_type = "application/problem+json"),
        (status = 401, description = "Unauthorized", body = Problem, content_type = "application/problem+json"),
        (status = 404, description = "Not Found", body = Problem, content_type = "application/problem+json")
    ),
    security(("basic_auth" = []))
)]
pub async fn get_user(
    Extension(svc): Extension<Arc<Service>>,
    ctx: ProblemContext,
    id: UserId,
) -> Result<Json<UserDto>, ProblemResponse> {
    let id = user_id(id, &ctx)?;
    info!("Getting user with id: {}", id);

    match svc.get_user(id).await {
        Ok(user) => Ok(Json(UserDto::from(user))),
        Err(e) => {
            error!("Failed to get user {}: {}", id, e);
            Err(map_domain_error(&e, &ctx))
        }
    }
}

/// Create a new user
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    operation_id = "users.create_user",
    request_body = CreateUserReq,
    responses(
        (status = 201, description = "Created user", body = UserDto),
        (status = 400, description = "Bad Request", body = Problem, content_type = "application/problem+json"),
        (status = 401, description = "Unauthorized", body = Problem, content_type = "application/problem+json")
    ),
    security(("basic_auth" = []))
)]
pub async fn create_user(
    Extension(svc): Extension<Arc<Service>>,
    ctx: ProblemContext,
    body: Result<Json<CreateUserReq>, JsonRejection>,
) -> Result<(StatusCode, Json<UserDto>), ProblemResponse> {
    let req = json_body(body, &ctx)?;
    info!("Creating user: {}", req.username);

    match svc.create_user(req.into()).await {
        Ok(user) => Ok((StatusCode::CREATED, Json(UserDto::from(user)))),
        Err(e) => {
            error!("Failed to create user: {}", e);
            Err(map_domain_error(&e, &ctx))
        }
    }
}

/// Replace every field of an existing user
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    operation_id = "users.replace_user",
    params(("id" = u64, Path, description = "User id")),
    request_body = CreateUserReq,
    responses(
        (status = 200, description = "Replaced user", body = UserDto),
        (status = 400, description = "Bad Request", body = Problem, content_type = "application/problem+json"),
        (status = 401, description = "Unauthorized", body = Problem, content_type = "application/problem+json"),
        (status = 404, description = "Not Found", body = Problem, content_type = "application/problem+json")
    ),
    security(("basic_auth" = []))
)]
pub async fn replace_user(
    Extension(svc): Extension<Arc<Service>>,
    ctx: ProblemContext,
    id: UserId,
    body: Result<Json<CreateUserReq>, JsonRejection>,
) -> Result<Json<UserDto>, ProblemResponse> {
    let id = user_id(id, &ctx)?;
    let req = json_body(body, &ctx)?;
    info!("Replacing user {}", id);

    match svc.replace_user(id, req.into()).await {
        Ok(user) => Ok(Json(UserDto::from(user))),
        Err(e) => {
            error!("Failed to replace user {}: {}", id, e);
            Err(map_domain_error(&e, &ctx))
        }
    }
}

/// Update an existing user
#[utoipa::path(
    patch,
    path = "/users/{id}",
    tag = "users",
    operation_id = "users.update_user",
    params(("id" = u64, Path, description = "User id")),
    request_body = UpdateUserReq,
    responses(
        (status = 200, description = "Updated user", body = UserDto),
        (status = 400, description = "Bad Request", body = Problem, content_type = "application/problem+json"),
        (status = 401, description = "Unauthorized", body = Problem, content_type = "application/problem+json"),
        (status = 404, description = "Not Found", body = Problem, content_type = "application/problem+json")
    ),
    security(("basic_auth" = []))
)]
pub async fn update_user(
    Extension(svc): Extension<Arc<Service>>,
    ctx: ProblemContext,
    id: UserId,
    body: Result<Json<UpdateUserReq>, JsonRejection>,
) -> Result<Json<UserDto>, ProblemResponse> {
    let id = user_id(id, &ctx)?;
    let patch: UserPatch = json_body(body, &ctx)?.into();
    info!("Updating user {} with: {:?}", id, patch);

    match svc.update_user(id, patch).await {
        Ok(user) => Ok(Json(UserDto::from(user))),
        Err(e) => {
            error!("Failed to update user {}: {}", id, e);
            Err(map_domain_error(&e, &ctx))
        }
    }
}

/// Delete a user by ID
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    operation_id = "users.delete_user",
    params(("id" = u64, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Invalid id", body = Problem, content_type = "application/problem+json"),
        (status = 401, description = "Unauthorized", body = Problem, content_type = "application/problem+json"),
        (status = 404, description = "Not Found", body = Problem, content_type = "application/problem+json")
    ),
    security(("basic_auth" = []))
)]
pub async fn delete_user(
    Extension(svc): Extension<Arc<Service>>,
    ctx: ProblemContext,
    id: UserId,
) -> Result<StatusCode, ProblemResponse> {
    let id = user_id(id, &ctx)?;
    info!("Deleting user: {}", id);

    match svc.delete_user(id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => {
            error!("Failed to delete user {}: {}", id, e);
            Err(map_domain_error(&e, &ctx))
        }
    }
}
