//! Inbound request metadata consumed by the session lifecycle.

use std::collections::HashMap;

use super::SessionId;

/// Read-only view of the request a session is started for.
///
/// The HTTP layer fills this in; the session only looks up its own cookie
/// and never mutates the context.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Cookies sent by the client.
    cookies: HashMap<String, String>,
    /// Remote address of the client.
    client_addr: Option<String>,
    /// Client user agent.
    user_agent: Option<String>,
}

impl RequestContext {
    /// Create an empty context (no cookies, unknown client).
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from a raw `Cookie` header value.
    ///
    /// Pairs are separated by `;`; malformed pairs and empty names are
    /// skipped. The first occurrence of a name wins.
    pub fn from_cookie_header(header: &str) -> Self {
        Self {
            cookies: parse_cookie_header(header),
            ..Default::default()
        }
    }

    /// Add a cookie.
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// Set the client address.
    pub fn with_client_addr(mut self, addr: impl Into<String>) -> Self {
        self.client_addr = Some(addr.into());
        self
    }

    /// Set the client user agent.
    pub fn with_user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Get a cookie value.
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(|s| s.as_str())
    }

    /// Get the client address.
    pub fn client_addr(&self) -> Option<&str> {
        self.client_addr.as_deref()
    }

    /// Get the client user agent.
    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    /// The session id presented under the cookie `name`, if well-formed.
    pub fn session_id(&self, name: &str) -> Option<SessionId> {
        self.cookie(name).and_then(|value| value.parse().ok())
    }
}

fn parse_cookie_header(header: &str) -> HashMap<String, String> {
    let mut cookies = HashMap::new();

    for pair in header.split(';') {
        if let Some((name, value)) = pair.split_once('=') {
            let name = name.trim();
            if !name.is_empty() {
                let value = value.trim().trim_matches('"');
                cookies
                    .entry(name.to_string())
                    .or_insert_with(|| value.to_string());
            }
        }
    }

    cookies
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_new() {
        let ctx = RequestContext::new();
        assert!(ctx.cookie("anything").is_none());
        assert!(ctx.client_addr().is_none());
        assert!(ctx.user_agent().is_none());
    }

    #[test]
    fn test_parse_cookie_header() {
        let ctx = RequestContext::from_cookie_header("a=1; session_keeper=abc123 ; b=\"two\"");

        assert_eq!(ctx.cookie("a"), Some("1"));
        assert_eq!(ctx.cookie("session_keeper"), Some("abc123"));
        assert_eq!(ctx.cookie("b"), Some("two"));
    }

    #[test]
    fn test_parse_cookie_header_malformed() {
        let ctx = RequestContext::from_cookie_header("novalue; =orphan; ok=yes; ok=no");

        assert!(ctx.cookie("novalue").is_none());
        assert!(ctx.cookie("").is_none());
        assert_eq!(ctx.cookie("ok"), Some("yes"));
    }

    #[test]
    fn test_session_id_lookup() {
        let ctx = RequestContext::new()
            .with_cookie("good", "0123abcd")
            .with_cookie("bad", "../../etc");

        assert_eq!(ctx.session_id("good").unwrap().as_str(), "0123abcd");
        assert!(ctx.session_id("bad").is_none());
        assert!(ctx.session_id("missing").is_none());
    }

    #[test]
    fn test_builder_metadata() {
        let ctx = RequestContext::new()
            .with_client_addr("10.0.0.1")
            .with_user_agent("curl/8.0");

        assert_eq!(ctx.client_addr(), Some("10.0.0.1"));
        assert_eq!(ctx.user_agent(), Some("curl/8.0"));
    }
}
