/// Pure user model for inter-module communication (no serde/schemars)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
}

/// Data for creating a user or replacing one wholesale.
///
/// The password is validated and then dropped; it never reaches storage.
#[derive(Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub password: String,
}

impl std::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .finish_non_exhaustive()
    }
}

/// Partial update data for a user.
///
/// `None` means "leave untouched". `full_name: Some(None)` clears the name.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct UserPatch {
    pub email: Option<String>,
    pub full_name: Option<Option<String>>,
    pub password: Option<String>,
}

impl std::fmt::Debug for UserPatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserPatch")
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.full_name.is_none() && self.password.is_none()
    }

    /// Overwrite exactly the fields present in the patch.
    pub fn apply_to(self, user: &mut User) {
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(full_name) = self.full_name {
            user.full_name = full_name;
        }
    }
}
