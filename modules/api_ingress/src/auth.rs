//! HTTP Basic authentication against a single configured credential pair.

use std::sync::Arc;

use api_errors::{catalog, ProblemContext};
use axum::{
    body::Body,
    extract::State,
    http::{
        header::{AUTHORIZATION, WWW_AUTHENTICATE},
        HeaderMap, HeaderValue, Request,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use runtime::AuthConfig;
use thiserror::Error;
use tracing::{debug, warn};

/// Why a request was not authenticated. Every variant maps to 401.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingHeader,

    #[error("Authorization scheme must be Basic")]
    UnsupportedScheme,

    #[error("Malformed Basic credentials")]
    MalformedCredentials,

    #[error("Invalid username or password")]
    InvalidCredentials,
}

/// Identity attached to authenticated requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub String);

#[derive(Clone)]
pub struct BasicAuthenticator {
    username: String,
    password: String,
    realm: Option<String>,
}

impl std::fmt::Debug for BasicAuthenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuthenticator")
            .field("username", &self.username)
            .field("realm", &self.realm)
            .finish_non_exhaustive()
    }
}

impl BasicAuthenticator {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        realm: Option<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            realm,
        }
    }

    /// Fails when either half of the credential pair is empty.
    pub fn from_config(cfg: &AuthConfig) -> anyhow::Result<Self> {
        cfg.ensure_configured()?;
        Ok(Self::new(
            cfg.username.clone(),
            cfg.password.clone(),
            cfg.realm.clone(),
        ))
    }

    /// Both fields are always compared; the outcome is decided afterwards.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<String, AuthError> {
        let user_ok = constant_time_eq(username.as_bytes(), self.username.as_bytes());
        let pass_ok = constant_time_eq(password.as_bytes(), self.password.as_bytes());
        if user_ok & pass_ok {
            Ok(username.to_owned())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    pub fn authenticate_headers(&self, headers: &HeaderMap) -> Result<String, AuthError> {
        let (username, password) = parse_basic_header(headers)?;
        self.authenticate(&username, &password)
    }

    /// Value for the `WWW-Authenticate` response header.
    pub fn challenge(&self) -> HeaderValue {
        self.realm
            .as_deref()
            .filter(|r| !r.is_empty())
            .and_then(|r| HeaderValue::from_str(&format!("Basic realm=\"{r}\"")).ok())
            .unwrap_or_else(|| HeaderValue::from_static("Basic"))
    }
}

/// Extract `(username, password)` from `Authorization: Basic <base64>`.
pub fn parse_basic_header(headers: &HeaderMap) -> Result<(String, String), AuthError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?
        .to_str()
        .map_err(|_| AuthError::MalformedCredentials)?;

    let (scheme, payload) = value.split_once(' ').unwrap_or((value, ""));
    if !scheme.eq_ignore_ascii_case("basic") {
        return Err(AuthError::UnsupportedScheme);
    }

    let decoded = STANDARD
        .decode(payload.trim())
        .map_err(|_| AuthError::MalformedCredentials)?;
    let decoded = String::from_utf8(decoded).map_err(|_| AuthError::MalformedCredentials)?;

    // The password may itself contain ':'.
    let (username, password) = decoded
        .split_once(':')
        .ok_or(AuthError::MalformedCredentials)?;
    Ok((username.to_owned(), password.to_owned()))
}

/// Timing does not depend on the position of the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let len = a.len().max(b.len());
    let mut diff = a.len() ^ b.len();
    for i in 0..len {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        diff |= usize::from(x ^ y);
    }
    std::hint::black_box(diff) == 0
}

/// Route layer guarding every protected route.
///
/// Use with `axum::middleware::from_fn_with_state`.
pub async fn require_basic_auth(
    State(auth): State<Arc<BasicAuthenticator>>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    match auth.authenticate_headers(req.headers()) {
        Ok(username) => {
            tracing::Span::current().record("user", tracing::field::display(&username));
            debug!(user = %username, "Request authenticated");
            req.extensions_mut().insert(AuthenticatedUser(username));
            next.run(req).await
        }
        Err(err) => {
            let ctx = ProblemContext::from_request(&req);
            if err == AuthError::InvalidCredentials {
                warn!(path = %ctx.instance, "Rejected request with invalid credentials");
            } else {
                debug!(path = %ctx.instance, reason = %err, "Rejected unauthenticated request");
            }
            catalog::UNAUTHORIZED
                .respond(err.to_string(), &ctx)
                .with_header(WWW_AUTHENTICATE, auth.challenge())
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic(raw: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Basic {}", STANDARD.encode(raw))).unwrap(),
        );
        headers
    }

    fn authenticator() -> BasicAuthenticator {
        BasicAuthenticator::new("admin", "s3cret:pw", None)
    }

    #[test]
    fn accepts_matching_credentials() {
        let auth = authenticator();
        assert_eq!(auth.authenticate("admin", "s3cret:pw"), Ok("admin".into()));
        assert_eq!(
            auth.authenticate_headers(&basic("admin:s3cret:pw")),
            Ok("admin".into())
        );
    }

    #[test]
    fn rejects_any_mismatch() {
        let auth = authenticator();
        for (u, p) in [
            ("admin", "wrong"),
            ("root", "s3cret:pw"),
            ("", ""),
            ("admin", "s3cret:pw "),
            ("admi", "s3cret:pw"),
        ] {
            assert_eq!(
                auth.authenticate(u, p),
                Err(AuthError::InvalidCredentials),
                "{u}:{p}"
            );
        }
    }

    #[test]
    fn header_parsing_failures() {
        assert_eq!(
            parse_basic_header(&HeaderMap::new()),
            Err(AuthError::MissingHeader)
        );

        let mut bearer = HeaderMap::new();
        bearer.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert_eq!(parse_basic_header(&bearer), Err(AuthError::UnsupportedScheme));

        let mut junk = HeaderMap::new();
        junk.insert(AUTHORIZATION, HeaderValue::from_static("Basic !!notbase64!!"));
        assert_eq!(
            parse_basic_header(&junk),
            Err(AuthError::MalformedCredentials)
        );

        assert_eq!(
            parse_basic_header(&basic("no-colon")),
            Err(AuthError::MalformedCredentials)
        );

        let mut not_utf8 = HeaderMap::new();
        not_utf8.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Basic {}", STANDARD.encode([0xff, 0xfe, b':']))).unwrap(),
        );
        assert_eq!(
            parse_basic_header(&not_utf8),
            Err(AuthError::MalformedCredentials)
        );
    }

    #[test]
    fn scheme_is_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("basic {}", STANDARD.encode("a:b"))).unwrap(),
        );
        assert_eq!(
            parse_basic_header(&headers),
            Ok(("a".to_string(), "b".to_string()))
        );
    }

    #[test]
    fn challenge_includes_realm_when_configured() {
        assert_eq!(authenticator().challenge(), "Basic");
        let with_realm = BasicAuthenticator::new("a", "b", Some("users".into()));
        assert_eq!(with_realm.challenge(), "Basic realm=\"users\"");
    }

    #[test]
    fn constant_time_eq_handles_lengths() {
        assert!(constant_time_eq(b"", b""));
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        // Length difference of 256 must not wrap to equal.
        assert!(!constant_time_eq(&[0u8; 256], b""));
    }

    #[test]
    fn from_config_requires_credentials() {
        let mut cfg = AuthConfig::default();
        assert!(BasicAuthenticator::from_config(&cfg).is_err());
        cfg.username = "admin".into();
        assert!(BasicAuthenticator::from_config(&cfg).is_err());
        cfg.password = "pw".into();
        assert!(BasicAuthenticator::from_config(&cfg).is_ok());
    }

    #[test]
    fn debug_hides_password() {
        let rendered = format!("{:?}", authenticator());
        assert!(!rendered.contains("s3cret"));
    }
}
