use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::{Modify, OpenApi};

use api_errors::Problem;

use crate::api::rest::dto::{CreateUserReq, UpdateUserReq, UserDto};
use crate::api::rest::handlers;

/// OpenAPI document for the users resource.
#[derive(OpenApi)]
#[openapi(
    info(title = "Users API", description = "CRUD over in-memory user records"),
    paths(
        handlers::list_users,
        handlers::get_user,
        handlers::create_user,
        handlers::replace_user,
        handlers::update_user,
        handlers::delete_user,
    ),
    components(schemas(UserDto, CreateUserReq, UpdateUserReq, Problem)),
    modifiers(&BasicAuthAddon),
    tags((name = "users", description = "User management"))
)]
pub struct UsersApiDoc;

struct BasicAuthAddon;

impl Modify for BasicAuthAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "basic_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Basic)),
        );
    }
}
