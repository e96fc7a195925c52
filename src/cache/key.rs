//! Cache key derivation.
//!
//! A key is `"view/"` followed by the request path. Routes that declare key
//! parameters append them as a canonical query string: declared names only,
//! sorted by name, defaults filled in, integers normalized, values
//! percent-encoded. Two requests that
//! differ only in parameter order, in undeclared parameters, or in spelling out
//! a default therefore share a key.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;
use url::form_urlencoded;

use crate::Request;

/// Prefix of every key written by the view cache.
pub const KEY_PREFIX: &str = "view/";

/// A normalized request descriptor used as the store key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CacheKey {
    fn from(raw: &str) -> Self {
        Self(raw.to_owned())
    }
}

/// Raised when a declared key parameter has a value the route cannot accept.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("query parameter `{name}` must be an integer, got `{value}`")]
    NotAnInteger { name: String, value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParamKind {
    Text,
    Integer,
}

#[derive(Debug, Clone)]
struct KeyParam {
    name: String,
    kind: ParamKind,
    default: Option<String>,
}

/// How one cached route turns a request into a [`CacheKey`].
///
/// ```
/// use quiz_server::cache::KeyRule;
/// use quiz_server::Request;
///
/// let rule = KeyRule::path_only().integer("num_questions", 5);
///
/// let (req, _) = Request::parse(b"GET /quiz HTTP/1.1\r\n\r\n").unwrap();
/// assert_eq!(rule.derive(&req).unwrap().as_str(), "view//quiz?num_questions=5");
///
/// let (req, _) = Request::parse(b"GET /quiz?num_questions=03 HTTP/1.1\r\n\r\n").unwrap();
/// assert_eq!(rule.derive(&req).unwrap().as_str(), "view//quiz?num_questions=3");
/// ```
#[derive(Debug, Clone, Default)]
pub struct KeyRule {
    params: Vec<KeyParam>,
}

impl KeyRule {
    /// A rule that keys on the request path alone.
    pub fn path_only() -> Self {
        Self::default()
    }

    /// Declares an integer query parameter with a default used when it is absent.
    #[must_use]
    pub fn integer(mut self, name: impl Into<String>, default: i64) -> Self {
        self.params.push(KeyParam {
            name: name.into(),
            kind: ParamKind::Integer,
            default: Some(default.to_string()),
        });
        self
    }

    /// Declares a free-form query parameter. Without a default an absent
    /// parameter is simply left out of the key.
    #[must_use]
    pub fn text(mut self, name: impl Into<String>, default: Option<&str>) -> Self {
        self.params.push(KeyParam {
            name: name.into(),
            kind: ParamKind::Text,
            default: default.map(str::to_owned),
        });
        self
    }

    /// Derives the key for `request`. Pure: no store access, no side effects.
    pub fn derive(&self, request: &Request) -> Result<CacheKey, KeyError> {
        let mut values = BTreeMap::new();

        for param in &self.params {
            let raw = request
                .query_param(&param.name)
                .map(str::to_owned)
                .or_else(|| param.default.clone());
            let Some(raw) = raw else { continue };

            let value = match param.kind {
                ParamKind::Text => raw,
                ParamKind::Integer => raw
                    .trim()
                    .parse::<i64>()
                    .map_err(|_| KeyError::NotAnInteger {
                        name: param.name.clone(),
                        value: raw.clone(),
                    })?
                    .to_string(),
            };
            values.insert(param.name.as_str(), value);
        }

        let path = request.path();
        let path = if path != "/" {
            path.trim_end_matches('/')
        } else {
            path
        };

        let mut key = format!("{KEY_PREFIX}{path}");
        if !values.is_empty() {
            let mut query = form_urlencoded::Serializer::new(String::new());
            for (name, value) in &values {
                query.append_pair(name, value);
            }
            key.push('?');
            key.push_str(&query.finish());
        }

        Ok(CacheKey(key))
    }
}
