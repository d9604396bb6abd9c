use std::fmt;

/// Identity of the signed-in user, fixed for the lifetime of the process.
#[derive(Clone)]
pub struct Session {
    base_url: String,
    token: String,
}

impl Session {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Session {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Session {
            base_url,
            token: token.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let session = Session::new("http://localhost:8080/api/", "abc");
        assert_eq!(session.base_url(), "http://localhost:8080/api");
        assert_eq!(session.token(), "abc");
    }

    #[test]
    fn test_debug_hides_token() {
        let session = Session::new("http://localhost:8080/api", "secret-token");
        let rendered = format!("{:?}", session);
        assert!(!rendered.contains("secret-token"));
        assert!(rendered.contains("localhost"));
    }
}
