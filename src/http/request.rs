//! HTTP/1.1 request parsing using the [`httparse`] crate.

use std::borrow::Cow;
use std::collections::HashMap;

use bytes::Bytes;
use thiserror::Error;

use super::{Headers, Method};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Errors that can occur while parsing an HTTP/1.1 request.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("request is incomplete — more data needed")]
    Incomplete,

    #[error("HTTP parse error: {0}")]
    Parse(#[from] httparse::Error),

    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("Content-Length {length} does not fit in the address space")]
    ContentLengthOverflow { length: usize },
}

/// A fully parsed HTTP/1.1 request.
///
/// Created by [`Request::parse`] from a raw byte buffer. The body is stored
/// as a [`Bytes`] buffer, truncated to `Content-Length` when the header is present.
///
/// # Examples
///
/// ```
/// use waymark::http::request::Request;
///
/// let raw = b"GET /hello?name=world HTTP/1.1\r\nHost: localhost\r\n\r\n";
/// let (request, _offset) = Request::parse(raw).unwrap();
///
/// assert_eq!(request.method().as_str(), "GET");
/// assert_eq!(request.path(), "/hello");
/// assert_eq!(request.query_param("name"), Some("world"));
/// assert_eq!(request.headers().get("host"), Some("localhost"));
/// ```
#[derive(Debug)]
pub struct Request {
    method: Method,
    path: String,
    /// HTTP minor version: 0 for HTTP/1.0, 1 for HTTP/1.1.
    version: u8,
    headers: Headers,
    query: Option<String>,
    body: Bytes,
    query_params: HashMap<String, String>,
    form_params: HashMap<String, String>,
}

impl Request {
    /// Maximum number of headers we support per request.
    const MAX_HEADERS: usize = 64;

    /// Parse a raw HTTP/1.1 request from a byte slice.
    ///
    /// Returns the parsed `Request` and the byte offset at which the body begins
    /// in `buf` (i.e. immediately after the `\r\n\r\n` header terminator).
    ///
    /// # Errors
    ///
    /// - [`RequestError::Incomplete`] — more data is needed to complete the request headers.
    /// - [`RequestError::Parse`] — the data is malformed and cannot be parsed.
    /// - [`RequestError::MissingField`] — a required field (method, path, version) is absent.
    /// - [`RequestError::ContentLengthOverflow`] — `Content-Length` plus the header
    ///   length overflows `usize`.
    pub fn parse(buf: &[u8]) -> Result<(Self, usize), RequestError> {
        let mut headers = [httparse::EMPTY_HEADER; Self::MAX_HEADERS];
        let mut raw_req = httparse::Request::new(&mut headers);

        let body_offset = match raw_req.parse(buf)? {
            httparse::Status::Complete(offset) => offset,
            httparse::Status::Partial => return Err(RequestError::Incomplete),
        };

        let method: Method = raw_req
            .method
            .ok_or(RequestError::MissingField { field: "method" })?
            .parse()
            .unwrap_or_else(|never| match never {});

        let raw_path = raw_req
            .path
            .ok_or(RequestError::MissingField { field: "path" })?;

        let (path, query) = match raw_path.split_once('?') {
            Some((path, query)) => (path.to_owned(), Some(query.to_owned())),
            None => (raw_path.to_owned(), None),
        };

        let version = raw_req
            .version
            .ok_or(RequestError::MissingField { field: "version" })?;

        let mut header_map = Headers::with_capacity(raw_req.headers.len());
        for header in raw_req.headers.iter() {
            if let Ok(value) = std::str::from_utf8(header.value) {
                header_map.insert(header.name, value);
            }
        }

        let body_end = match header_map
            .get("content-length")
            .and_then(|len| len.trim().parse::<usize>().ok())
        {
            Some(length) => body_offset
                .checked_add(length)
                .ok_or(RequestError::ContentLengthOverflow { length })?
                .min(buf.len()),
            None => buf.len(),
        };
        let body = Bytes::copy_from_slice(&buf[body_offset..body_end]);

        let query_params = query.as_deref().map(parse_urlencoded).unwrap_or_default();
        let form_params = if is_form(&header_map) {
            std::str::from_utf8(&body)
                .map(parse_urlencoded)
                .unwrap_or_default()
        } else {
            HashMap::new()
        };

        Ok((
            Self {
                method,
                path,
                version,
                headers: header_map,
                query,
                body,
                query_params,
                form_params,
            },
            body_offset,
        ))
    }

    /// Returns the HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request path (without the query string).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the HTTP minor version number (0 = HTTP/1.0, 1 = HTTP/1.1).
    pub fn version(&self) -> u8 {
        self.version
    }

    /// Returns the request headers.
    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Returns the raw query string (without the leading `?`), if any.
    pub fn query_string(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Returns a parsed query parameter value by key.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query_params.get(key).map(String::as_str)
    }

    /// Returns a parsed `application/x-www-form-urlencoded` body parameter by key.
    pub fn form_param(&self, key: &str) -> Option<&str> {
        self.form_params.get(key).map(String::as_str)
    }

    /// Returns a request parameter, checking the query string before the form body.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query_param(key).or_else(|| self.form_param(key))
    }

    /// Returns the request body bytes.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Returns `true` if the connection should be kept alive after this request.
    ///
    /// A `close` token always wins. Otherwise HTTP/1.1 defaults to keep-alive
    /// and HTTP/1.0 needs an explicit `keep-alive` token.
    pub fn is_keep_alive(&self) -> bool {
        if self.headers.has_token("connection", "close") {
            return false;
        }
        self.version == 1 || self.headers.has_token("connection", "keep-alive")
    }

    /// Returns the value of the `Content-Length` header parsed as a `usize`, if present.
    pub fn content_length(&self) -> Option<usize> {
        self.headers.get("content-length")?.trim().parse().ok()
    }
}

fn is_form(headers: &Headers) -> bool {
    headers
        .media_type()
        .is_some_and(|mime| mime.eq_ignore_ascii_case(FORM_CONTENT_TYPE))
}

/// Parses `key=value&key2=value2` into a `HashMap`.
///
/// `+` decodes to a space, then percent-escapes are decoded. A pair that is
/// not valid UTF-8 after decoding keeps its raw text. The first occurrence of
/// a repeated key wins.
fn parse_urlencoded(input: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for pair in input.split('&').filter(|pair| !pair.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        params
            .entry(decode_component(key))
            .or_insert_with(|| decode_component(value));
    }
    params
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(Cow::Borrowed(_)) | Err(_) => spaced,
        Ok(Cow::Owned(decoded)) => decoded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_simple_get() {
        let raw = b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n";
        let (req, offset) = Request::parse(raw).unwrap();
        assert_eq!(req.method().as_str(), "GET");
        assert_eq!(req.path(), "/");
        assert_eq!(req.version(), 1);
        assert_eq!(req.headers().get("host"), Some("localhost"));
        assert_eq!(offset, raw.len()); // no body
    }

    #[test]
    fn parse_query_string() {
        let raw = b"GET /search?q=rust&page=2 HTTP/1.1\r\nHost: example.com\r\n\r\n";
        let (req, _) = Request::parse(raw).unwrap();
        assert_eq!(req.path(), "/search");
        assert_eq!(req.query_string(), Some("q=rust&page=2"));
        assert_eq!(req.query_param("q"), Some("rust"));
        assert_eq!(req.query_param("page"), Some("2"));
    }

    #[test]
    fn query_values_are_decoded() {
        let raw = b"GET /search?q=hello+world&tag=caf%C3%A9&flag HTTP/1.1\r\n\r\n";
        let (req, _) = Request::parse(raw).unwrap();
        assert_eq!(req.query_param("q"), Some("hello world"));
        assert_eq!(req.query_param("tag"), Some("café"));
        assert_eq!(req.query_param("flag"), Some(""));
    }

    #[test]
    fn first_repeated_query_key_wins() {
        let raw = b"GET /x?a=1&a=2 HTTP/1.1\r\n\r\n";
        let (req, _) = Request::parse(raw).unwrap();
        assert_eq!(req.query_param("a"), Some("1"));
    }

    #[test]
    fn form_body_parameters() {
        let raw = b"POST /login HTTP/1.1\r\nContent-Type: application/x-www-form-urlencoded; charset=utf-8\r\nContent-Length: 19\r\n\r\nuser=bob&pass=s%26p";
        let (req, _) = Request::parse(raw).unwrap();
        assert_eq!(req.form_param("user"), Some("bob"));
        assert_eq!(req.form_param("pass"), Some("s&p"));
        assert_eq!(req.param("user"), Some("bob"));
    }

    #[test]
    fn query_wins_over_form() {
        let raw = b"POST /login?user=alice HTTP/1.1\r\nContent-Type: application/x-www-form-urlencoded\r\nContent-Length: 8\r\n\r\nuser=bob";
        let (req, _) = Request::parse(raw).unwrap();
        assert_eq!(req.param("user"), Some("alice"));
        assert_eq!(req.form_param("user"), Some("bob"));
    }

    #[test]
    fn non_form_body_has_no_form_params() {
        let raw = b"POST /x HTTP/1.1\r\nContent-Type: text/plain\r\nContent-Length: 3\r\n\r\na=b";
        let (req, _) = Request::parse(raw).unwrap();
        assert_eq!(req.form_param("a"), None);
    }

    #[test]
    fn body_truncated_to_content_length() {
        let raw = b"POST / HTTP/1.1\r\nContent-Length: 5\r\n\r\nhelloGET / HTTP/1.1\r\n\r\n";
        let (req, _) = Request::parse(raw).unwrap();
        assert_eq!(&req.body()[..], b"hello");
    }

    #[test]
    fn custom_method_is_preserved() {
        let raw = b"PURGE /cache HTTP/1.1\r\n\r\n";
        let (req, _) = Request::parse(raw).unwrap();
        assert_eq!(req.method(), &Method::Custom("PURGE".to_owned()));
    }

    #[test]
    fn incomplete_request() {
        let raw = b"GET / HTTP/1.1\r\nHost:";
        assert!(matches!(Request::parse(raw), Err(RequestError::Incomplete)));
    }

    #[test]
    fn keep_alive_http11_default() {
        let raw = b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n";
        let (req, _) = Request::parse(raw).unwrap();
        assert!(req.is_keep_alive());
    }

    #[test]
    fn connection_close() {
        let raw = b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n";
        let (req, _) = Request::parse(raw).unwrap();
        assert!(!req.is_keep_alive());
    }

    #[test]
    fn http10_needs_explicit_keep_alive() {
        let (plain, _) = Request::parse(b"GET / HTTP/1.0\r\n\r\n").unwrap();
        assert!(!plain.is_keep_alive());
        let (asked, _) = Request::parse(b"GET / HTTP/1.0\r\nConnection: Keep-Alive\r\n\r\n").unwrap();
        assert!(asked.is_keep_alive());
    }

    #[test]
    fn overflowing_content_length_is_an_error() {
        let raw = b"POST /a HTTP/1.1\r\nHost: x\r\nContent-Length: 18446744073709551615\r\n\r\nhi";
        let err = Request::parse(raw).unwrap_err();
        assert!(matches!(
            err,
            RequestError::ContentLengthOverflow { length } if length == usize::MAX
        ));
    }

    #[test]
    fn content_length_past_buffer_keeps_what_arrived() {
        let raw = b"POST /a HTTP/1.1\r\nContent-Length: 10\r\n\r\nhi";
        let (req, _) = Request::parse(raw).unwrap();
        assert_eq!(req.body().as_ref(), b"hi");
    }

    #[test]
    fn content_length() {
        let raw = b"POST / HTTP/1.1\r\nHost: localhost\r\nContent-Length: 5\r\n\r\nhello";
        let (req, body_offset) = Request::parse(raw).unwrap();
        assert_eq!(req.content_length(), Some(5));
        assert_eq!(&raw[body_offset..], b"hello");
    }
}
