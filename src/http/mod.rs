//! HTTP/1.1 protocol types used by the transport adapter.
//!
//! This module provides the core HTTP primitives:
//! [`Method`], [`StatusCode`], [`Headers`], [`Request`], and [`Response`].
//! The router itself only needs [`Method`] and a path; the rest exists so
//! [`Server`](crate::server::Server) can feed real connections into it.

use std::fmt;

pub mod headers;
pub mod request;
pub mod response;

pub use headers::Headers;
pub use request::Request;
pub use response::Response;

// Declares `StatusCode` with each code and reason phrase written once.
macro_rules! status_codes {
    ($($variant:ident = $code:literal => $reason:literal,)+) => {
        /// An HTTP response status code.
        ///
        /// ```
        /// use waymark::http::StatusCode;
        ///
        /// assert_eq!(StatusCode::Ok.as_u16(), 200);
        /// assert_eq!(StatusCode::Ok.canonical_reason(), "OK");
        /// assert!(StatusCode::Found.is_redirection());
        /// assert!(StatusCode::NotFound.is_error());
        /// ```
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u16)]
        pub enum StatusCode {
            $($variant = $code,)+
        }

        impl StatusCode {
            /// Reason phrase written on the status line.
            pub fn canonical_reason(self) -> &'static str {
                match self {
                    $(Self::$variant => $reason,)+
                }
            }
        }
    };
}

status_codes! {
    Continue = 100 => "Continue",
    SwitchingProtocols = 101 => "Switching Protocols",
    Ok = 200 => "OK",
    Created = 201 => "Created",
    Accepted = 202 => "Accepted",
    NoContent = 204 => "No Content",
    PartialContent = 206 => "Partial Content",
    MovedPermanently = 301 => "Moved Permanently",
    Found = 302 => "Found",
    SeeOther = 303 => "See Other",
    NotModified = 304 => "Not Modified",
    TemporaryRedirect = 307 => "Temporary Redirect",
    PermanentRedirect = 308 => "Permanent Redirect",
    BadRequest = 400 => "Bad Request",
    Unauthorized = 401 => "Unauthorized",
    Forbidden = 403 => "Forbidden",
    NotFound = 404 => "Not Found",
    MethodNotAllowed = 405 => "Method Not Allowed",
    Conflict = 409 => "Conflict",
    Gone = 410 => "Gone",
    LengthRequired = 411 => "Length Required",
    PayloadTooLarge = 413 => "Payload Too Large",
    UriTooLong = 414 => "URI Too Long",
    UnsupportedMediaType = 415 => "Unsupported Media Type",
    UnprocessableEntity = 422 => "Unprocessable Entity",
    TooManyRequests = 429 => "Too Many Requests",
    InternalServerError = 500 => "Internal Server Error",
    NotImplemented = 501 => "Not Implemented",
    BadGateway = 502 => "Bad Gateway",
    ServiceUnavailable = 503 => "Service Unavailable",
    GatewayTimeout = 504 => "Gateway Timeout",
    HttpVersionNotSupported = 505 => "HTTP Version Not Supported",
}

impl StatusCode {
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// 3xx, the only statuses a redirect effect may carry.
    pub fn is_redirection(self) -> bool {
        (300..400).contains(&self.as_u16())
    }

    /// 4xx or 5xx.
    pub fn is_error(self) -> bool {
        self.as_u16() >= 400
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.canonical_reason())
    }
}

/// An HTTP request method, one half of every route key.
///
/// Parsing is case-sensitive and never fails: anything outside the standard
/// set becomes [`Method::Custom`], so extension methods such as `PURGE` can be
/// routed like any other.
///
/// ```
/// use waymark::http::Method;
///
/// let method: Method = "GET".parse().unwrap();
/// assert_eq!(method, Method::Get);
/// assert_eq!("PURGE".parse::<Method>().unwrap().as_str(), "PURGE");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Patch,
    Connect,
    Trace,
    Custom(String),
}

impl Method {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
            Self::Patch => "PATCH",
            Self::Connect => "CONNECT",
            Self::Trace => "TRACE",
            Self::Custom(s) => s.as_str(),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Method {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "GET" => Self::Get,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "DELETE" => Self::Delete,
            "HEAD" => Self::Head,
            "OPTIONS" => Self::Options,
            "PATCH" => Self::Patch,
            "CONNECT" => Self::Connect,
            "TRACE" => Self::Trace,
            other => Self::Custom(other.to_owned()),
        })
    }
}
