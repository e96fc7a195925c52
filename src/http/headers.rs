//! Header fields: ordered, repeatable, matched without regard to case.

/// Header fields in arrival order.
///
/// A name may appear more than once. Lookups ignore ASCII case, so
/// `x-now-cache` finds `X-Now-Cache`.
///
/// ```
/// use quiz_server::http::Headers;
///
/// let mut headers = Headers::new();
/// headers.insert("Content-Type", "application/json");
/// headers.insert("Vary", "Accept");
/// headers.insert("Vary", "Origin");
///
/// assert_eq!(headers.get("content-type"), Some("application/json"));
/// assert_eq!(headers.get_all("VARY").collect::<Vec<_>>(), ["Accept", "Origin"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Headers {
    fields: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field, keeping any earlier fields of the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.push((name.into(), value.into()));
    }

    /// Replaces every field named `name` with one carrying `value`.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.fields.retain(|(k, _)| !k.eq_ignore_ascii_case(&name));
        self.fields.push((name, value.into()));
    }

    /// First value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).next()
    }

    pub fn get_all<'a, 'n>(&'a self, name: &'n str) -> impl Iterator<Item = &'a str> + use<'a, 'n> {
        self.fields
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of fields, counting repeats.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K, V> FromIterator<(K, V)> for Headers
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case() {
        let mut h = Headers::new();
        h.insert("Content-Length", "18");
        assert_eq!(h.get("content-length"), Some("18"));
        assert_eq!(h.get("CONTENT-LENGTH"), Some("18"));
        assert!(h.contains("Content-length"));
        assert!(!h.contains("x-now-cache"));
    }

    #[test]
    fn repeated_fields_are_kept_in_order() {
        let mut h = Headers::new();
        h.insert("Vary", "Accept");
        h.insert("vary", "Origin");
        assert_eq!(h.get("Vary"), Some("Accept"));
        assert_eq!(h.get_all("vary").collect::<Vec<_>>(), ["Accept", "Origin"]);
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn set_replaces_all_values() {
        let mut h = Headers::new();
        h.insert("x-now-cache", "Miss");
        h.insert("Content-Type", "application/json");
        h.insert("X-Now-Cache", "Miss");
        h.set("x-now-cache", "Hit");
        assert_eq!(h.get_all("x-now-cache").collect::<Vec<_>>(), ["Hit"]);
        assert_eq!(h.len(), 2);
    }

    #[test]
    fn collect_from_owned_pairs() {
        let pairs = vec![("Content-Type".to_owned(), "text/html".to_owned())];
        let h: Headers = pairs.into_iter().collect();
        assert_eq!(h.get("content-type"), Some("text/html"));
        assert!(!h.is_empty());
    }
}
