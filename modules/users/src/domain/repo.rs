use crate::contract::model::User;
use async_trait::async_trait;

/// A user record before the store has assigned its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDraft {
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
}

impl UserDraft {
    pub fn with_id(self, id: u64) -> User {
        User {
            id,
            username: self.username,
            email: self.email,
            full_name: self.full_name,
        }
    }
}

/// Port for the domain layer: persistence operations the domain needs.
/// Object-safe and async-friendly via `async_trait`.
#[async_trait]
pub trait UsersRepository: Send + Sync {
    /// Load a user by id.
    async fn find_by_id(&self, id: u64) -> anyhow::Result<Option<User>>;
    /// All users in ascending id order.
    async fn list(&self) -> anyhow::Result<Vec<User>>;
    /// Assign the next id and persist the record in one step.
    ///
    /// Ids start at 1, grow by one per insert and are never reused.
    async fn insert(&self, draft: UserDraft) -> anyhow::Result<User>;
    /// Overwrite an existing user (by `u.id`). Returns false if it does not exist.
    async fn update(&self, u: User) -> anyhow::Result<bool>;
    /// Delete by id. Returns true if a record was deleted.
    async fn delete(&self, id: u64) -> anyhow::Result<bool>;
}
