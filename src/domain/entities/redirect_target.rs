//! Canonical request URL used as the lookup key.

use std::fmt;

/// URL scheme of the inbound connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The `{scheme, host, path}` triple of an inbound request.
///
/// Rendered with [`RedirectTarget::key`] as `scheme://host/path`, which is the key
/// stored in the remote store. Query strings and fragments are not part of the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTarget {
    pub scheme: Scheme,
    /// Lowercased host, including the port when the client sent one.
    pub host: String,
    /// Percent-decoded request path; always starts with `/`.
    pub path: String,
}

impl RedirectTarget {
    pub fn new(scheme: Scheme, host: impl Into<String>, path: impl Into<String>) -> Self {
        let path = path.into();
        let path = if path.starts_with('/') {
            path
        } else {
            format!("/{}", path)
        };

        Self {
            scheme,
            host: host.into().to_ascii_lowercase(),
            path,
        }
    }

    /// Returns the canonical lookup key.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RedirectTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}{}", self.scheme, self.host, self.path)
    }
}
