use serde::{Deserialize, Serialize};

use crate::domain::service::ServiceConfig;

/// Configuration for the users module (`modules.users` in the app config)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UsersConfig {
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,
}

impl Default for UsersConfig {
    fn default() -> Self {
        Self {
            min_password_length: default_min_password_length(),
        }
    }
}

fn default_min_password_length() -> usize {
    6
}

impl From<&UsersConfig> for ServiceConfig {
    fn from(cfg: &UsersConfig) -> Self {
        Self {
            min_password_length: cfg.min_password_length,
        }
    }
}
