use async_trait::async_trait;
use std::sync::Arc;

use crate::contract::{
    client::UsersApi,
    error::UsersError,
    model::{NewUser, User, UserPatch},
};
use crate::domain::service::Service;

/// Local implementation of the UsersApi trait that delegates to the domain service
pub struct UsersLocalClient {
    service: Arc<Service>,
}

impl UsersLocalClient {
    pub fn new(service: Arc<Service>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl UsersApi for UsersLocalClient {
    async fn get_user(&self, id: u64) -> Result<User, UsersError> {
        self.service.get_user(id).await.map_err(Into::into)
    }

    async fn list_users(&self) -> Result<Vec<User>, UsersError> {
        self.service.list_users().await.map_err(Into::into)
    }

    async fn create_user(&self, new_user: NewUser) -> Result<User, UsersError> {
        self.service.create_user(new_user).await.map_err(Into::into)
    }

    async fn replace_user(&self, id: u64, user: NewUser) -> Result<User, UsersError> {
        self.service
            .replace_user(id, user)
            .await
            .map_err(Into::into)
    }

    async fn update_user(&self, id: u64, patch: UserPatch) -> Result<User, UsersError> {
        self.service
            .update_user(id, patch)
            .await
            .map_err(Into::into)
    }

    async fn delete_user(&self, id: u64) -> Result<(), UsersError> {
        self.service.delete_user(id).await.map_err(Into::into)
    }
}
