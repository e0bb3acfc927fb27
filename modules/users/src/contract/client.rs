use async_trait::async_trait;

use crate::contract::{
    error::UsersError,
    model::{NewUser, User, UserPatch},
};

/// Public API trait for the users module that other modules can use
#[async_trait]
pub trait UsersApi: Send + Sync {
    /// Get a user by ID
    async fn get_user(&self, id: u64) -> Result<User, UsersError>;

    /// List all users
    async fn list_users(&self) -> Result<Vec<User>, UsersError>;

    /// Create a new user
    async fn create_user(&self, new_user: NewUser) -> Result<User, UsersError>;

    /// Replace every editable field of an existing user
    async fn replace_user(&self, id: u64, user: NewUser) -> Result<User, UsersError>;

    /// Update a user with partial data
    async fn update_user(&self, id: u64, patch: UserPatch) -> Result<User, UsersError>;

    /// Delete a user by ID
    async fn delete_user(&self, id: u64) -> Result<(), UsersError>;
}
