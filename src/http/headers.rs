//! Header fields of requests and responses.
//!
//! Names compare case-insensitively; entries keep their arrival order and a
//! name may repeat (RFC 9110 §5.3).

/// An ordered, case-insensitive, multi-value header list.
///
/// # Examples
///
/// ```
/// use waymark::http::Headers;
///
/// let mut headers = Headers::new();
/// headers.insert("Content-Type", "application/x-www-form-urlencoded; charset=utf-8");
/// headers.insert("Accept", "text/html");
/// headers.insert("Accept", "application/json");
///
/// assert_eq!(headers.media_type(), Some("application/x-www-form-urlencoded"));
/// let accepted: Vec<_> = headers.get_all("accept").collect();
/// assert_eq!(accepted, ["text/html", "application/json"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Headers {
    entries: Vec<(String, String)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Append an entry, keeping any earlier values for `name`.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// Replace every value for `name` with a single `value`.
    ///
    /// The new entry takes the position of the first removed one, or goes last
    /// if `name` was absent.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.position(&name) {
            Some(first) => {
                self.entries[first] = (name.clone(), value);
                let mut index = 0;
                self.entries.retain(|(k, _)| {
                    let keep = index <= first || !k.eq_ignore_ascii_case(&name);
                    index += 1;
                    keep
                });
            }
            None => self.entries.push((name, value)),
        }
    }

    /// The first value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.position(name).map(|i| self.entries[i].1.as_str())
    }

    /// Every value for `name`, in arrival order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Drop every entry for `name`. Returns `true` if anything was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.entries.len() < before
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// `Content-Type` without its parameters, e.g. `text/html` for
    /// `text/html; charset=utf-8`.
    pub fn media_type(&self) -> Option<&str> {
        let raw = self.get("content-type")?;
        let media = raw.split(';').next().unwrap_or(raw).trim();
        (!media.is_empty()).then_some(media)
    }

    /// Whether any value of the comma-separated header `name` lists `token`
    /// (ASCII case-insensitive), as in `Connection: keep-alive, Upgrade`.
    pub fn has_token(&self, name: &str, token: &str) -> bool {
        self.get_all(name)
            .flat_map(|value| value.split(','))
            .any(|item| item.trim().eq_ignore_ascii_case(token))
    }

    /// Number of entries, counting repeated names separately.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case() {
        let mut h = Headers::new();
        h.insert("Location", "/next");
        assert_eq!(h.get("location"), Some("/next"));
        assert_eq!(h.get("LOCATION"), Some("/next"));
        assert!(h.contains("lOcAtIoN"));
        assert!(!h.contains("x-missing"));
    }

    #[test]
    fn repeated_names_keep_order() {
        let mut h = Headers::new();
        h.insert("Set-Cookie", "a=1");
        h.insert("X-Other", "x");
        h.insert("set-cookie", "b=2");
        let cookies: Vec<_> = h.get_all("SET-COOKIE").collect();
        assert_eq!(cookies, ["a=1", "b=2"]);
        assert_eq!(h.len(), 3);
    }

    #[test]
    fn set_collapses_to_one_value_in_place() {
        let mut h = Headers::new();
        h.insert("Connection", "keep-alive");
        h.insert("Content-Type", "text/plain");
        h.insert("connection", "upgrade");
        h.set("Connection", "close");

        let entries: Vec<_> = h.iter().collect();
        assert_eq!(
            entries,
            [("Connection", "close"), ("Content-Type", "text/plain")]
        );
    }

    #[test]
    fn set_appends_when_absent() {
        let mut h = Headers::new();
        h.insert("Host", "localhost");
        h.set("Location", "/x");
        assert_eq!(h.iter().last(), Some(("Location", "/x")));
    }

    #[test]
    fn remove_reports_whether_anything_went() {
        let mut h = Headers::new();
        h.insert("X-Foo", "bar");
        h.insert("x-foo", "baz");
        assert!(h.remove("X-FOO"));
        assert!(h.is_empty());
        assert!(!h.remove("x-foo"));
    }

    #[test]
    fn media_type_strips_parameters() {
        let mut h = Headers::new();
        assert_eq!(h.media_type(), None);
        h.insert("Content-Type", " application/json ; charset=utf-8");
        assert_eq!(h.media_type(), Some("application/json"));
    }

    #[test]
    fn token_lists_are_split_and_trimmed() {
        let mut h = Headers::new();
        h.insert("Connection", "Keep-Alive, Upgrade");
        assert!(h.has_token("connection", "keep-alive"));
        assert!(h.has_token("connection", "upgrade"));
        assert!(!h.has_token("connection", "close"));
        assert!(!h.has_token("x-missing", "close"));
    }
}
