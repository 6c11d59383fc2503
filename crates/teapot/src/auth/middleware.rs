//! Basic auth middleware.

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use base64::{Engine, engine::general_purpose::STANDARD};
use log::debug;
use std::sync::Arc;

use super::{AuthConfig, AuthError};

/// Decode `Basic <base64>` into a username and password.
fn basic_credentials(header_value: &str) -> Result<(String, String), AuthError> {
    let (scheme, encoded) = header_value
        .trim()
        .split_once(' ')
        .ok_or(AuthError::InvalidAuthHeader)?;

    if !scheme.eq_ignore_ascii_case("basic") {
        return Err(AuthError::InvalidAuthHeader);
    }

    let decoded = STANDARD
        .decode(encoded.trim())
        .map_err(|_| AuthError::InvalidAuthHeader)?;
    let decoded = String::from_utf8(decoded).map_err(|_| AuthError::InvalidAuthHeader)?;
    let (user, pass) = decoded
        .split_once(':')
        .ok_or(AuthError::InvalidAuthHeader)?;

    Ok((user.to_string(), pass.to_string()))
}

/// Compare without short-circuiting on the first differing byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    let len_diff = a.len() ^ b.len();
    let byte_diff = a
        .iter()
        .zip(b.iter())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y));
    len_diff == 0 && byte_diff == 0
}

/// Authentication state shared across requests.
#[derive(Clone, Default)]
pub struct AuthState {
    config: Arc<AuthConfig>,
}

impl AuthState {
    pub fn new(config: AuthConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.is_enabled()
    }

    /// Check an `Authorization` header value against the configured credentials.
    pub fn verify(&self, header_value: Option<&str>) -> Result<(), AuthError> {
        let Some((expected_user, expected_pass)) = self.config.credentials() else {
            return Ok(());
        };

        let header_value = header_value.ok_or(AuthError::MissingAuthHeader)?;
        let (user, pass) = basic_credentials(header_value)?;

        let user_ok = constant_time_eq(user.as_bytes(), expected_user.as_bytes());
        let pass_ok = constant_time_eq(pass.as_bytes(), expected_pass.as_bytes());
        if user_ok & pass_ok {
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}

/// Reject requests without valid basic auth credentials.
pub async fn basic_auth_middleware(
    State(auth): State<AuthState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    if let Err(e) = auth.verify(header) {
        debug!("Rejected {} {}: {}", req.method(), req.uri().path(), e);
        return Err(e);
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled() -> AuthState {
        AuthState::new(AuthConfig {
            username: Some("admin".to_string()),
            password: Some("hunter2".to_string()),
        })
    }

    fn basic(user: &str, pass: &str) -> String {
        format!("Basic {}", STANDARD.encode(format!("{user}:{pass}")))
    }

    #[test]
    fn test_disabled_allows_everything() {
        assert!(AuthState::default().verify(None).is_ok());
    }

    #[test]
    fn test_valid_credentials() {
        assert!(enabled().verify(Some(&basic("admin", "hunter2"))).is_ok());
    }

    #[test]
    fn test_rejections() {
        let auth = enabled();
        assert!(matches!(
            auth.verify(None),
            Err(AuthError::MissingAuthHeader)
        ));
        assert!(matches!(
            auth.verify(Some("Bearer abc")),
            Err(AuthError::InvalidAuthHeader)
        ));
        assert!(matches!(
            auth.verify(Some("Basic not-base64!")),
            Err(AuthError::InvalidAuthHeader)
        ));
        assert!(matches!(
            auth.verify(Some(&basic("admin", "hunter3"))),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.verify(Some(&basic("admin", "hunter22"))),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_password_may_contain_colon() {
        let auth = AuthState::new(AuthConfig {
            username: Some("admin".to_string()),
            password: Some("a:b".to_string()),
        });
        assert!(auth.verify(Some(&basic("admin", "a:b"))).is_ok());
    }
}
