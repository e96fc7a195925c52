//! Request parsing on top of [`httparse`].

use std::collections::HashMap;

use bytes::Bytes;
use thiserror::Error;
use url::form_urlencoded;

use super::{Headers, Method};

#[derive(Debug, Error)]
pub enum RequestError {
    /// The head is not fully buffered yet; read more and retry.
    #[error("request head is incomplete")]
    Incomplete,

    #[error("malformed request: {0}")]
    Parse(#[from] httparse::Error),

    #[error("request line has no {0}")]
    MissingField(&'static str),
}

/// One parsed request: request line, headers, decoded query and body.
///
/// ```
/// use quiz_server::http::Request;
///
/// let raw = b"GET /quiz?num_questions=3 HTTP/1.1\r\nHost: localhost\r\n\r\n";
/// let (request, body_offset) = Request::parse(raw).unwrap();
///
/// assert_eq!(request.method().as_str(), "GET");
/// assert_eq!(request.path(), "/quiz");
/// assert_eq!(request.query_param("num_questions"), Some("3"));
/// assert_eq!(body_offset, raw.len());
/// ```
#[derive(Debug)]
pub struct Request {
    method: Method,
    path: String,
    query: Option<String>,
    params: HashMap<String, String>,
    minor_version: u8,
    headers: Headers,
    body: Bytes,
}

impl Request {
    const MAX_HEADERS: usize = 64;

    /// Parses the request at the start of `buf` and returns it with the offset
    /// where its body starts.
    ///
    /// The body is cut at `Content-Length` (or at the end of `buf` if fewer
    /// bytes have arrived); whatever follows belongs to the next request.
    pub fn parse(buf: &[u8]) -> Result<(Self, usize), RequestError> {
        let mut slots = [httparse::EMPTY_HEADER; Self::MAX_HEADERS];
        let mut head = httparse::Request::new(&mut slots);
        let httparse::Status::Complete(body_offset) = head.parse(buf)? else {
            return Err(RequestError::Incomplete);
        };

        let method: Method = match head.method.ok_or(RequestError::MissingField("method"))?.parse() {
            Ok(method) => method,
            Err(never) => match never {},
        };
        let target = head.path.ok_or(RequestError::MissingField("path"))?;
        let minor_version = head.version.ok_or(RequestError::MissingField("version"))?;

        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path.to_owned(), Some(query.to_owned())),
            None => (target.to_owned(), None),
        };
        let params = query.as_deref().map(decode_query).unwrap_or_default();

        let headers: Headers = head
            .headers
            .iter()
            .filter_map(|h| Some((h.name, std::str::from_utf8(h.value).ok()?)))
            .collect();

        let available = &buf[body_offset..];
        let body_len = content_length(&headers).map_or(available.len(), |n| n.min(available.len()));

        Ok((
            Self {
                method,
                path,
                query,
                params,
                minor_version,
                headers,
                body: Bytes::copy_from_slice(&available[..body_len]),
            },
            body_offset,
        ))
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The target path without its query string.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// `0` for HTTP/1.0, `1` for HTTP/1.1.
    pub fn version(&self) -> u8 {
        self.minor_version
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    /// The raw query string, still encoded, without the `?`.
    pub fn query_string(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// A decoded query parameter. The last occurrence of a repeated name wins.
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Whether the connection stays open after this request: HTTP/1.1 unless
    /// `Connection: close`, HTTP/1.0 only with `Connection: keep-alive`.
    pub fn is_keep_alive(&self) -> bool {
        match self.headers.get("connection") {
            Some(value) => value.eq_ignore_ascii_case("keep-alive"),
            None => self.minor_version == 1,
        }
    }

    pub fn content_length(&self) -> Option<usize> {
        content_length(&self.headers)
    }
}

fn content_length(headers: &Headers) -> Option<usize> {
    headers.get("content-length")?.trim().parse().ok()
}

fn decode_query(query: &str) -> HashMap<String, String> {
    form_urlencoded::parse(query.as_bytes()).into_owned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_request_line_and_headers() {
        let raw = b"GET / HTTP/1.1\r\nHost: localhost\r\n\r\n";
        let (req, offset) = Request::parse(raw).unwrap();
        assert_eq!(req.method(), &Method::Get);
        assert_eq!(req.path(), "/");
        assert_eq!(req.version(), 1);
        assert_eq!(req.headers().get("host"), Some("localhost"));
        assert_eq!(req.query_string(), None);
        assert_eq!(offset, raw.len());
    }

    #[test]
    fn query_parameters_are_decoded() {
        let raw = b"GET /quiz?num_questions=3&topic=en+gb&flag&&n=%35 HTTP/1.1\r\n\r\n";
        let (req, _) = Request::parse(raw).unwrap();
        assert_eq!(req.path(), "/quiz");
        assert_eq!(req.query_string(), Some("num_questions=3&topic=en+gb&flag&&n=%35"));
        assert_eq!(req.query_param("num_questions"), Some("3"));
        assert_eq!(req.query_param("topic"), Some("en gb"));
        assert_eq!(req.query_param("flag"), Some(""));
        assert_eq!(req.query_param("n"), Some("5"));
        assert_eq!(req.query_param("missing"), None);
    }

    #[test]
    fn query_is_percent_decoded() {
        let raw = b"GET /quiz?num_questions=%35&topic=caf%C3%A9%20au+lait HTTP/1.1\r\n\r\n";
        let (req, _) = Request::parse(raw).unwrap();
        assert_eq!(req.query_param("num_questions"), Some("5"));
        assert_eq!(req.query_param("topic"), Some("café au lait"));
    }

    #[test]
    fn partial_head_is_incomplete() {
        let raw = b"POST /verify HTTP/1.1\r\nHost:";
        assert!(matches!(Request::parse(raw), Err(RequestError::Incomplete)));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(matches!(
            Request::parse(b"NOT A REQUEST\r\n\r\n"),
            Err(RequestError::Parse(_))
        ));
    }

    #[test]
    fn keep_alive_rules() {
        let (req, _) = Request::parse(b"GET / HTTP/1.1\r\n\r\n").unwrap();
        assert!(req.is_keep_alive());
        let (req, _) = Request::parse(b"GET / HTTP/1.1\r\nConnection: close\r\n\r\n").unwrap();
        assert!(!req.is_keep_alive());
        let (req, _) = Request::parse(b"GET / HTTP/1.0\r\n\r\n").unwrap();
        assert!(!req.is_keep_alive());
        let (req, _) = Request::parse(b"GET / HTTP/1.0\r\nConnection: Keep-Alive\r\n\r\n").unwrap();
        assert!(req.is_keep_alive());
    }

    #[test]
    fn content_length_bounds_body() {
        let raw = b"POST /verify HTTP/1.1\r\nContent-Length: 2\r\n\r\n{}GET / HTTP/1.1\r\n\r\n";
        let (req, body_offset) = Request::parse(raw).unwrap();
        assert_eq!(req.content_length(), Some(2));
        assert_eq!(&req.body()[..], b"{}");
        assert_eq!(&raw[body_offset + 2..body_offset + 5], b"GET");
    }
}
