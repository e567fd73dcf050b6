//! Lookup key derivation from inbound HTTP requests.

use crate::domain::entities::{RedirectTarget, Scheme};
use axum::http::uri::Authority;
use axum::http::{HeaderMap, Uri, header};
use percent_encoding::percent_decode_str;

/// Reasons a request cannot be turned into a lookup key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyDerivationError {
    #[error("missing Host header")]
    MissingHost,
    #[error("invalid Host header: {0}")]
    InvalidHost(String),
    #[error("path is not valid UTF-8 once decoded: {0}")]
    InvalidPath(String),
    #[error("not an absolute http(s) URL: {0}")]
    MalformedKey(String),
}

/// Derives the canonical `scheme://host/path` target of a request.
///
/// - **Scheme**: taken from an absolute-form request URI; otherwise `https` when
///   `trust_forwarded_proto` is set and `X-Forwarded-Proto` says so; otherwise `http`.
///   The service does not terminate TLS itself, so a TLS-terminating proxy must
///   report the scheme.
/// - **Host**: the `Host` header if present, else the URI authority (absolute-form
///   requests, HTTP/2 `:authority`). The port is kept, the host is lowercased.
/// - **Path**: the percent-decoded request path (`/a%20b` becomes `/a b`). The
///   query string is ignored.
///
/// # Errors
///
/// Returns [`KeyDerivationError`] if no host is available, it is not a valid
/// `host[:port]` authority (non-ASCII bytes, userinfo, path characters), or the
/// decoded path is not UTF-8.
///
/// # Examples
///
/// ```ignore
/// let mut headers = HeaderMap::new();
/// headers.insert(header::HOST, "localhost:8080".parse().unwrap());
/// let uri: Uri = "/yahoo?ref=1".parse().unwrap();
///
/// let target = derive_redirect_target(&uri, &headers, false).unwrap();
/// assert_eq!(target.key(), "http://localhost:8080/yahoo");
/// ```
pub fn derive_redirect_target(
    uri: &Uri,
    headers: &HeaderMap,
    trust_forwarded_proto: bool,
) -> Result<RedirectTarget, KeyDerivationError> {
    let scheme = detect_scheme(uri, headers, trust_forwarded_proto);
    let host = extract_host(uri, headers)?;

    let path = decode_path(uri.path())?;

    Ok(RedirectTarget::new(scheme, host, path))
}

/// Returns the form of `raw` that [`derive_redirect_target`] would produce for a
/// request to that URL: lowercase scheme and host, decoded path, no query.
///
/// A stored key is only reachable if it equals its canonical form.
///
/// # Errors
///
/// Returns [`KeyDerivationError`] if `raw` is not `http(s)://host[:port]/path`.
pub fn canonical_key(raw: &str) -> Result<String, KeyDerivationError> {
    let malformed = || KeyDerivationError::MalformedKey(raw.to_string());

    let (scheme, rest) = raw.split_once("://").ok_or_else(malformed)?;
    let scheme = if scheme.eq_ignore_ascii_case("https") {
        Scheme::Https
    } else if scheme.eq_ignore_ascii_case("http") {
        Scheme::Http
    } else {
        return Err(malformed());
    };

    let (authority, path) = match rest.find('/') {
        Some(i) => rest.split_at(i),
        None => (rest, "/"),
    };
    let path = path.split(['?', '#']).next().unwrap_or_default();

    let host = validate_authority(authority)?;
    let path = decode_path(path)?;

    Ok(RedirectTarget::new(scheme, host, path).key())
}

fn decode_path(raw: &str) -> Result<String, KeyDerivationError> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|path| path.into_owned())
        .map_err(|_| KeyDerivationError::InvalidPath(raw.to_string()))
}

fn detect_scheme(uri: &Uri, headers: &HeaderMap, trust_forwarded_proto: bool) -> Scheme {
    if let Some(scheme) = uri.scheme_str() {
        return if scheme.eq_ignore_ascii_case("https") {
            Scheme::Https
        } else {
            Scheme::Http
        };
    }

    if trust_forwarded_proto {
        let forwarded = headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            // Proxy chains append values; the first one is the client-facing hop.
            .and_then(|v| v.split(',').next())
            .map(str::trim);

        if forwarded.is_some_and(|proto| proto.eq_ignore_ascii_case("https")) {
            return Scheme::Https;
        }
    }

    Scheme::Http
}

fn extract_host(uri: &Uri, headers: &HeaderMap) -> Result<String, KeyDerivationError> {
    if let Some(host) = headers.get(header::HOST) {
        let host = host
            .to_str()
            .map_err(|_| KeyDerivationError::InvalidHost("non-ASCII bytes".to_string()))?;
        return validate_authority(host);
    }

    match uri.authority() {
        Some(authority) => validate_authority(authority.as_str()),
        None => Err(KeyDerivationError::MissingHost),
    }
}

fn validate_authority(raw: &str) -> Result<String, KeyDerivationError> {
    if raw.is_empty() {
        return Err(KeyDerivationError::MissingHost);
    }
    if raw.contains('@') {
        return Err(KeyDerivationError::InvalidHost(
            "userinfo is not allowed".to_string(),
        ));
    }

    let authority: Authority = raw
        .parse()
        .map_err(|_| KeyDerivationError::InvalidHost(raw.to_string()))?;

    if authority.host().is_empty() {
        return Err(KeyDerivationError::InvalidHost(raw.to_string()));
    }

    Ok(authority.as_str().to_string())
}
