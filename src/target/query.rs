use serde::Serialize;
use std::collections::BTreeMap;
use url::form_urlencoded;

/// Query parameters of a target, keyed by lowercased name.
///
/// Repeated keys keep the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct QueryMap(BTreeMap<String, String>);

impl QueryMap {
    pub fn parse(query: &str) -> Self {
        let mut map = BTreeMap::new();

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let key = key.trim().to_lowercase();
            if key.is_empty() {
                continue;
            }
            map.insert(key, value.trim().to_string());
        }

        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(&key.to_lowercase()).map(String::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(&key.to_lowercase())
    }

    pub fn insert(&mut self, key: impl AsRef<str>, value: impl Into<String>) {
        self.0.insert(key.as_ref().to_lowercase(), value.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Encode back to `key=value&...` with keys in sorted order
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.0.iter())
            .finish()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for QueryMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::default();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_lowercased_last_wins() {
        let query = QueryMap::parse("Format=HTML&format=markdown&Priority=1");
        assert_eq!(query.len(), 2);
        assert_eq!(query.get("format"), Some("markdown"));
        assert_eq!(query.get("PRIORITY"), Some("1"));
    }

    #[test]
    fn test_values_decoded_and_trimmed() {
        let query = QueryMap::parse("to=a%40b.com&msg=hello+world&pad=%20x%20&=orphan");
        assert_eq!(query.get("to"), Some("a@b.com"));
        assert_eq!(query.get("msg"), Some("hello world"));
        assert_eq!(query.get("pad"), Some("x"));
        assert_eq!(query.len(), 3);
    }

    #[test]
    fn test_to_query_string_sorted() {
        let query = QueryMap::parse("z=1&a=two words&m=%26");
        assert_eq!(query.to_query_string(), "a=two+words&m=%26&z=1");
        assert_eq!(QueryMap::parse(&query.to_query_string()), query);
    }
}
