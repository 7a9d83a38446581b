use reqwest::header::HeaderMap;

/// Ordered header multimap.
///
/// Names keep the exact casing they were given with and are compared
/// case-sensitively, values for the same name are grouped under one entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Vec<(String, Vec<String>)>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a value, keeping any existing values for the same name
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();

        match self.entries.iter_mut().find(|(existing, _)| *existing == name) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((name, vec![value])),
        }
    }

    /// Set a value, replacing any existing values for the same name
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.remove(&name);
        self.entries.push((name, vec![value.into()]));
    }

    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        let index = self.entries.iter().position(|(existing, _)| existing == name)?;
        Some(self.entries.remove(index).1)
    }

    /// First value for `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.get_all(name).first().map(String::as_str)
    }

    pub fn get_all(&self, name: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, values)| values.as_slice())
            .unwrap_or_default()
    }

    /// Iterate over names and their values in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.append(name, value);
        }

        headers
    }
}

impl From<&HeaderMap> for Headers {
    fn from(map: &HeaderMap) -> Self {
        map.iter()
            .map(|(name, value)| {
                (
                    name.as_str(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};

    use super::Headers;

    #[test]
    fn values_group_under_exact_name() {
        let mut headers = Headers::new();
        headers.append("Accept", "text/html");
        headers.append("accept", "application/json");
        headers.append("Accept", "*/*");

        assert_eq!(headers.len(), 2);
        assert_eq!(headers.get_all("Accept"), ["text/html", "*/*"]);
        assert_eq!(headers.get("accept"), Some("application/json"));
        assert!(headers.get_all("ACCEPT").is_empty());
    }

    #[test]
    fn insert_replaces_existing_values() {
        let mut headers: Headers = [("X-Trace-Id", "a"), ("X-Trace-Id", "b")]
            .into_iter()
            .collect();
        headers.insert("X-Trace-Id", "c");

        assert_eq!(headers.get_all("X-Trace-Id"), ["c"]);
        assert_eq!(headers.remove("X-Trace-Id"), Some(vec!["c".to_string()]));
        assert!(headers.is_empty());
    }

    #[test]
    fn converts_from_header_map() {
        let mut map = HeaderMap::new();
        map.append(ACCEPT, HeaderValue::from_static("text/html"));
        map.append(ACCEPT, HeaderValue::from_static("*/*"));

        let headers = Headers::from(&map);
        assert_eq!(headers.get_all("accept"), ["text/html", "*/*"]);
    }
}
