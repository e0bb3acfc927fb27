use thiserror::Error;

/// Domain-specific errors using thiserror
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("User not found: {id}")]
    UserNotFound { id: u64 },

    #[error("Invalid email format: '{email}'")]
    InvalidEmail { email: String },

    #[error("Username cannot be empty")]
    EmptyUsername,

    #[error("Password too short: {len} characters (min: {min})")]
    PasswordTooShort { len: usize, min: usize },

    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl DomainError {
    pub fn user_not_found(id: u64) -> Self {
        Self::UserNotFound { id }
    }

    pub fn invalid_email(email: impl Into<String>) -> Self {
        Self::InvalidEmail {
            email: email.into(),
        }
    }

    pub fn empty_username() -> Self {
        Self::EmptyUsername
    }

    pub fn password_too_short(len: usize, min: usize) -> Self {
        Self::PasswordTooShort { len, min }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// True for errors caused by the caller's payload.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidEmail { .. } | Self::EmptyUsername | Self::PasswordTooShort { .. }
        )
    }
}
