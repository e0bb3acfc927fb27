use std::sync::Arc;

use crate::contract::model::{NewUser, User, UserPatch};
use crate::domain::error::DomainError;
use crate::domain::repo::{UserDraft, UsersRepository};
use tracing::{debug, info, instrument};
use validator::ValidateEmail;

/// Domain service with business rules for user management.
/// Depends only on the repository port, not on infra types.
#[derive(Clone)]
pub struct Service {
    repo: Arc<dyn UsersRepository>,
    config: ServiceConfig,
}

/// Configuration for the domain service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub min_password_length: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            min_password_length: 6,
        }
    }
}

impl Service {
    /// Create a service with dependencies.
    pub fn new(repo: Arc<dyn UsersRepository>, config: ServiceConfig) -> Self {
        Self { repo, config }
    }

    #[instrument(name = "users.service.get_user", skip(self), fields(user_id = id))]
    pub async fn get_user(&self, id: u64) -> Result<User, DomainError> {
        debug!("Getting user by id");

        let user = self
            .repo
            .find_by_id(id)
            .await
            .map_err(|e| DomainError::storage(e.to_string()))?
            .ok_or_else(|| DomainError::user_not_found(id))?;
        debug!("Successfully retrieved user");
        Ok(user)
    }

    #[instrument(name = "users.service.list_users", skip(self))]
    pub async fn list_users(&self) -> Result<Vec<User>, DomainError> {
        let users = self
            .repo
            .list()
            .await
            .map_err(|e| DomainError::storage(e.to_string()))?;
        debug!("Listed {} users", users.len());
        Ok(users)
    }

    #[instrument(
        name = "users.service.create_user",
        skip(self, new_user),
        fields(username = %new_user.username, email = %new_user.email)
    )]
    pub async fn create_user(&self, new_user: NewUser) -> Result<User, DomainError> {
        info!("Creating new user");

        let draft = self.validate_new_user(new_user)?;
        let user = self
            .repo
            .insert(draft)
            .await
            .map_err(|e| DomainError::storage(e.to_string()))?;

        info!("Successfully created user with id={}", user.id);
        Ok(user)
    }

    #[instrument(
        name = "users.service.replace_user",
        skip(self, replacement),
        fields(user_id = id)
    )]
    pub async fn replace_user(&self, id: u64, replacement: NewUser) -> Result<User, DomainError> {
        info!("Replacing user");

        let user = self.validate_new_user(replacement)?.with_id(id);
        let replaced = self
            .repo
            .update(user.clone())
            .await
            .map_err(|e| DomainError::storage(e.to_string()))?;
        if !replaced {
            return Err(DomainError::user_not_found(id));
        }

        info!("Successfully replaced user");
        Ok(user)
    }

    #[instrument(
        name = "users.service.update_user",
        skip(self),
        fields(user_id = id)
    )]
    pub async fn update_user(&self, id: u64, patch: UserPatch) -> Result<User, DomainError> {
        info!("Updating user");

        self.validate_user_patch(&patch)?;

        let mut current = self
            .repo
            .find_by_id(id)
            .await
            .map_err(|e| DomainError::storage(e.to_string()))?
            .ok_or_else(|| DomainError::user_not_found(id))?;

        if patch.is_empty() {
            debug!("Empty patch, nothing to apply");
            return Ok(current);
        }

        patch.apply_to(&mut current);

        // A concurrent delete between load and store surfaces as not found.
        let updated = self
            .repo
            .update(current.clone())
            .await
            .map_err(|e| DomainError::storage(e.to_string()))?;
        if !updated {
            return Err(DomainError::user_not_found(id));
        }

        info!("Successfully updated user");
        Ok(current)
    }

    #[instrument(
        name = "users.service.delete_user",
        skip(self),
        fields(user_id = id)
    )]
    pub async fn delete_user(&self, id: u64) -> Result<(), DomainError> {
        info!("Deleting user");

        let deleted = self
            .repo
            .delete(id)
            .await
            .map_err(|e| DomainError::storage(e.to_string()))?;

        if !deleted {
            return Err(DomainError::user_not_found(id));
        }

        info!("Successfully deleted user");
        Ok(())
    }

    // --- validation helpers ---

    /// Validate a create/replace payload and drop its password.
    fn validate_new_user(&self, new_user: NewUser) -> Result<UserDraft, DomainError> {
        let NewUser {
            username,
            email,
            full_name,
            password,
        } = new_user;

        if username.trim().is_empty() {
            return Err(DomainError::empty_username());
        }
        self.validate_email(&email)?;
        self.validate_password(&password)?;

        Ok(UserDraft {
            username,
            email,
            full_name,
        })
    }

    fn validate_user_patch(&self, patch: &UserPatch) -> Result<(), DomainError> {
        if let Some(ref email) = patch.email {
            self.validate_email(email)?;
        }
        if let Some(ref password) = patch.password {
            self.validate_password(password)?;
        }
        Ok(())
    }

    fn validate_email(&self, email: &str) -> Result<(), DomainError> {
        if !email.validate_email() {
            return Err(DomainError::invalid_email(email));
        }
        Ok(())
    }

    fn validate_password(&self, password: &str) -> Result<(), DomainError> {
        let len = password.chars().count();
        if len < self.config.min_password_length {
            return Err(DomainError::password_too_short(
                len,
                self.config.min_password_length,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::storage::InMemoryUsersRepository;

    fn service() -> Service {
        Service::new(
            Arc::new(InMemoryUsersRepository::new()),
            ServiceConfig::default(),
        )
    }

    fn new_user(username: &str, email: &str, password: &str) -> NewUser {
        NewUser {
            username: username.into(),
            email: email.into(),
            full_name: None,
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids() {
        let svc = service();
        let a = svc
            .create_user(new_user("johndoe", "john@example.com", "secret123"))
            .await
            .unwrap();
        assert_eq!(
            a,
            User {
                id: 1,
                username: "johndoe".into(),
                email: "john@example.com".into(),
                full_name: None,
            }
        );
        let b = svc
            .create_user(new_user("jane", "jane@example.com", "secret123"))
            .await
            .unwrap();
        assert!(b.id > a.id);
    }

    #[tokio::test]
    async fn validation_rules() {
        let svc = service();
        assert_eq!(
            svc.create_user(new_user("johndoe", "john@example.com", "ab"))
                .await
                .unwrap_err(),
            DomainError::password_too_short(2, 6)
        );
        assert_eq!(
            svc.create_user(new_user("johndoe", "not-an-email", "secret123"))
                .await
                .unwrap_err(),
            DomainError::invalid_email("not-an-email")
        );
        assert_eq!(
            svc.create_user(new_user("   ", "john@example.com", "secret123"))
                .await
                .unwrap_err(),
            DomainError::empty_username()
        );
        // Exactly the minimum is fine, counted in characters.
        assert!(svc
            .create_user(new_user("ok", "ok@example.com", "ééééèè"))
            .await
            .is_ok());
        assert_eq!(svc.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn min_password_length_is_configurable() {
        let svc = Service::new(
            Arc::new(InMemoryUsersRepository::new()),
            ServiceConfig {
                min_password_length: 10,
            },
        );
        let err = svc
            .create_user(new_user("johndoe", "john@example.com", "secret123"))
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::password_too_short(9, 10));
    }

    #[tokio::test]
    async fn replace_validates_before_lookup() {
        let svc = service();
        let err = svc
            .replace_user(99, new_user("x", "bad", "secret123"))
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let err = svc
            .replace_user(99, new_user("x", "x@example.com", "secret123"))
            .await
            .unwrap_err();
        assert_eq!(err, DomainError::user_not_found(99));
    }

    #[tokio::test]
    async fn replace_overwrites_all_fields() {
        let svc = service();
        let mut original = new_user("johndoe", "john@example.com", "secret123");
        original.full_name = Some("John".into());
        let created = svc.create_user(original).await.unwrap();

        let replaced = svc
            .replace_user(
                created.id,
                new_user("jdoe", "jdoe@example.com", "another1"),
            )
            .await
            .unwrap();
        assert_eq!(replaced.id, created.id);
        assert_eq!(replaced.username, "jdoe");
        assert_eq!(replaced.full_name, None);
        assert_eq!(svc.get_user(created.id).await.unwrap(), replaced);
    }

    #[tokio::test]
    async fn patch_rejects_invalid_present_fields_without_mutation() {
        let svc = service();
        let created = svc
            .create_user(new_user("johndoe", "john@example.com", "secret123"))
            .await
            .unwrap();

        let patch = UserPatch {
            email: Some("nope".into()),
            full_name: Some(Some("Changed".into())),
            password: None,
        };
        assert!(svc
            .update_user(created.id, patch)
            .await
            .unwrap_err()
            .is_validation());

        let patch = UserPatch {
            password: Some("123".into()),
            ..Default::default()
        };
        assert!(svc
            .update_user(created.id, patch)
            .await
            .unwrap_err()
            .is_validation());

        assert_eq!(svc.get_user(created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn patch_email_only_keeps_other_fields() {
        let svc = service();
        let mut nu = new_user("johndoe", "john@example.com", "secret123");
        nu.full_name = Some("John Doe".into());
        let created = svc.create_user(nu).await.unwrap();

        let updated = svc
            .update_user(
                created.id,
                UserPatch {
                    email: Some("new@example.com".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.email, "new@example.com");
        assert_eq!(updated.username, created.username);
        assert_eq!(updated.full_name, created.full_name);
    }

    #[tokio::test]
    async fn empty_patch_on_missing_user_is_not_found() {
        let svc = service();
        assert_eq!(
            svc.update_user(5, UserPatch::default()).await.unwrap_err(),
            DomainError::user_not_found(5)
        );
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let svc = service();
        let created = svc
            .create_user(new_user("johndoe", "john@example.com", "secret123"))
            .await
            .unwrap();
        svc.delete_user(created.id).await.unwrap();
        assert_eq!(
            svc.get_user(created.id).await.unwrap_err(),
            DomainError::user_not_found(created.id)
        );
        assert_eq!(
            svc.delete_user(created.id).await.unwrap_err(),
            DomainError::user_not_found(created.id)
        );
    }
}
