//! The HTTP/1.1 types the server speaks: [`Method`], [`StatusCode`],
//! [`Headers`], [`Request`] and [`Response`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod headers;
pub mod request;
pub mod response;

pub use headers::Headers;
pub use request::Request;
pub use response::Response;

/// Status codes this API answers with.
///
/// Codes serialize by variant name so a cached response can go through an
/// external store and come back unchanged.
///
/// ```
/// use quiz_server::http::StatusCode;
///
/// assert_eq!(StatusCode::Created.as_u16(), 201);
/// assert_eq!(StatusCode::NotFound.to_string(), "404 Not Found");
/// assert!(StatusCode::Ok.is_success());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum StatusCode {
    Ok = 200,
    Created = 201,
    NoContent = 204,
    BadRequest = 400,
    NotFound = 404,
    MethodNotAllowed = 405,
    PayloadTooLarge = 413,
    UnprocessableEntity = 422,
    InternalServerError = 500,
    ServiceUnavailable = 503,
}

impl StatusCode {
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// `true` for `2xx`, the only responses the view cache stores.
    pub fn is_success(self) -> bool {
        (200..300).contains(&self.as_u16())
    }

    pub fn canonical_reason(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Created => "Created",
            Self::NoContent => "No Content",
            Self::BadRequest => "Bad Request",
            Self::NotFound => "Not Found",
            Self::MethodNotAllowed => "Method Not Allowed",
            Self::PayloadTooLarge => "Payload Too Large",
            Self::UnprocessableEntity => "Unprocessable Entity",
            Self::InternalServerError => "Internal Server Error",
            Self::ServiceUnavailable => "Service Unavailable",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.canonical_reason())
    }
}

/// A request method. Only `GET` and `POST` are routed; anything else is kept
/// verbatim so it can be logged and answered with `405`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Other(String),
}

impl Method {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "GET" => Self::Get,
            "POST" => Self::Post,
            other => Self::Other(other.to_owned()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range() {
        assert!(StatusCode::Ok.is_success());
        assert!(StatusCode::Created.is_success());
        assert!(!StatusCode::NotFound.is_success());
        assert!(!StatusCode::InternalServerError.is_success());
    }

    #[test]
    fn status_serializes_by_name() {
        let json = serde_json::to_string(&StatusCode::NotFound).unwrap();
        assert_eq!(json, "\"NotFound\"");
        let back: StatusCode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, StatusCode::NotFound);
    }

    #[test]
    fn methods_parse_case_sensitively() {
        assert_eq!("GET".parse::<Method>().unwrap(), Method::Get);
        assert_eq!("POST".parse::<Method>().unwrap(), Method::Post);
        let purge: Method = "PURGE".parse().unwrap();
        assert_eq!(purge, Method::Other("PURGE".into()));
        assert_eq!(purge.to_string(), "PURGE");
        assert_eq!("get".parse::<Method>().unwrap().as_str(), "get");
    }
}
