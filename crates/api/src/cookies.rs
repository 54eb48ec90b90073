//! Session cookie handling (`jwtToken`).

use axum::http::{HeaderMap, header};
use chrono::Duration;

use crate::config::Environment;

pub const SESSION_COOKIE: &str = "jwtToken";

/// Attributes applied to the session cookie.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CookiePolicy {
    secure: bool,
    max_age_secs: i64,
}

impl CookiePolicy {
    pub fn new(environment: Environment, ttl: Duration) -> Self {
        Self {
            secure: environment.is_production(),
            max_age_secs: ttl.num_seconds(),
        }
    }

    /// `Set-Cookie` value carrying a freshly issued credential.
    pub fn session(&self, token: &str) -> String {
        self.render(token, self.max_age_secs)
    }

    /// `Set-Cookie` value that removes the credential from the browser.
    pub fn cleared(&self) -> String {
        self.render("", 0)
    }

    fn render(&self, value: &str, max_age: i64) -> String {
        let same_site = if self.secure {
            "Secure; SameSite=Strict"
        } else {
            "SameSite=Lax"
        };
        format!("{SESSION_COOKIE}={value}; HttpOnly; Path=/; Max-Age={max_age}; {same_site}")
    }
}

/// Read one cookie from every `Cookie` header on the request.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| value.trim())
}
