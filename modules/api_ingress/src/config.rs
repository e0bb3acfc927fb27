use serde::{Deserialize, Serialize};

/// API ingress configuration (`modules.api_ingress` in the app config)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApiIngressConfig {
    #[serde(default = "default_true")]
    pub enable_docs: bool,
    #[serde(default)]
    pub cors_enabled: bool,
    /// Requests with a larger declared body are rejected with 413.
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

impl Default for ApiIngressConfig {
    fn default() -> Self {
        Self {
            enable_docs: true,
            cors_enabled: false,
            body_limit_bytes: default_body_limit(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_body_limit() -> usize {
    1024 * 1024
}
