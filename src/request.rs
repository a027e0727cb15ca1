//! Incoming HTTP request type.

use std::borrow::Cow;
use std::collections::HashMap;

use bytes::Bytes;
use http::HeaderMap;

use crate::method::Method;

/// An incoming HTTP request with its body fully buffered.
pub struct Request {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Option<String>,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
    pub(crate) params: HashMap<String, String>,
}

impl Request {
    pub(crate) fn new(
        method: Method,
        parts: http::request::Parts,
        body: Bytes,
        params: HashMap<String, String>,
    ) -> Self {
        Self {
            method,
            path: parts.uri.path().to_owned(),
            query: parts.uri.query().map(str::to_owned),
            headers: parts.headers,
            body,
            params,
        }
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup. Non-UTF-8 values are treated as absent.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/users/{id}`, `req.param("id")` on `/users/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Returns the first value bound to `key` in the query string, decoded.
    ///
    /// `?skip=10&limit=5` gives `query("skip") == Some("10")`. A bare key
    /// (`?verbose`) yields an empty value.
    pub fn query(&self, key: &str) -> Option<Cow<'_, str>> {
        let query = self.query.as_deref()?;
        query
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
            .find(|(k, _)| decode(k) == key)
            .map(|(_, v)| decode(v))
    }
}

/// `application/x-www-form-urlencoded` decoding: `+` is a space, `%XX` a byte.
/// Malformed escapes are kept literally.
fn decode(raw: &str) -> Cow<'_, str> {
    if !raw.contains(['+', '%']) {
        return Cow::Borrowed(raw);
    }

    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'+' => out.push(b' '),
            b'%' => match (bytes.get(i + 1).copied().and_then(hex), bytes.get(i + 2).copied().and_then(hex)) {
                (Some(hi), Some(lo)) => {
                    out.push((hi << 4) | lo);
                    i += 2;
                }
                _ => out.push(b'%'),
            },
            b => out.push(b),
        }
        i += 1;
    }
    Cow::Owned(String::from_utf8_lossy(&out).into_owned())
}

fn hex(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(uri: &str) -> Request {
        let (parts, ()) = http::Request::builder().uri(uri).body(()).unwrap().into_parts();
        Request::new(Method::Get, parts, Bytes::new(), HashMap::new())
    }

    #[test]
    fn query_returns_first_match() {
        let req = request("/users?skip=1&limit=5&skip=9");
        assert_eq!(req.path(), "/users");
        assert_eq!(req.query("skip").as_deref(), Some("1"));
        assert_eq!(req.query("limit").as_deref(), Some("5"));
        assert_eq!(req.query("missing"), None);
    }

    #[test]
    fn query_decodes_escapes() {
        let req = request("/search?q=ada+lovelace%21&flag&bad=%zz");
        assert_eq!(req.query("q").as_deref(), Some("ada lovelace!"));
        assert_eq!(req.query("flag").as_deref(), Some(""));
        assert_eq!(req.query("bad").as_deref(), Some("%zz"));
    }

    #[test]
    fn no_query_string() {
        assert_eq!(request("/users").query("skip"), None);
    }

    #[test]
    fn header_lookup_ignores_case() {
        let (parts, ()) = http::Request::builder()
            .uri("/")
            .header("Content-Type", "application/json")
            .body(())
            .unwrap()
            .into_parts();
        let req = Request::new(Method::Post, parts, Bytes::new(), HashMap::new());
        assert_eq!(req.method(), Method::Post);
        assert_eq!(req.header("content-type"), Some("application/json"));
    }
}
