use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

use crate::contract::model::{NewUser, User, UserPatch};

/// REST DTO for user representation with serde/utoipa
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserDto {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "johndoe")]
    pub username: String,
    #[schema(example = "john.doe@example.com")]
    pub email: String,
    /// Always serialized; `null` when unset.
    #[schema(example = "John Doe")]
    pub full_name: Option<String>,
}

/// REST DTO for creating a user or replacing one (PUT)
#[derive(Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateUserReq {
    #[schema(example = "johndoe")]
    pub username: String,
    #[schema(example = "john.doe@example.com")]
    pub email: String,
    #[serde(default)]
    #[schema(example = "John Doe")]
    pub full_name: Option<String>,
    /// Validated, then discarded.
    #[schema(example = "secret123", min_length = 6)]
    pub password: String,
}

/// REST DTO for updating a user (partial)
///
/// Absent keys are left untouched. `"full_name": null` clears the name.
#[derive(Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateUserReq {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "john.new@example.com")]
    pub email: Option<String>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Option<String>, example = "John New")]
    pub full_name: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "newpass123", min_length = 6)]
    pub password: Option<String>,
}

/// Maps a present key to `Some(..)`, including an explicit `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

// Conversion implementations between REST DTOs and contract models

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
        }
    }
}

impl From<CreateUserReq> for NewUser {
    fn from(req: CreateUserReq) -> Self {
        Self {
            username: req.username,
            email: req.email,
            full_name: req.full_name,
            password: req.password,
        }
    }
}

impl From<UpdateUserReq> for UserPatch {
    fn from(req: UpdateUserReq) -> Self {
        Self {
            email: req.email,
            full_name: req.full_name,
            password: req.password,
        }
    }
}
