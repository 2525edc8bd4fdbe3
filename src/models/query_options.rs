use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use url::form_urlencoded;

/// An option bag serialized into a request's query string.
///
/// Keys are kept sorted so that the same options always produce the same query string.
///
/// # Value encoding
///
/// * strings are passed through
/// * booleans become `true` / `false`
/// * numbers are written as-is
/// * arrays repeat the key once per element
/// * objects (such as `filters`) are JSON-encoded into a single value
/// * nulls are omitted
///
/// # Examples
///
/// ```
/// use docker_modem::models::QueryOptions;
/// use serde_json::json;
///
/// let options = QueryOptions::new()
///     .set("all", true)
///     .set("filters", json!({"status": ["running"]}));
///
/// assert_eq!(
///     options.to_query_string().as_deref(),
///     Some("all=true&filters=%7B%22status%22%3A%5B%22running%22%5D%7D")
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryOptions(BTreeMap<String, Value>);

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an option, replacing any previous value for the key.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Interprets an option as a boolean flag. `true`, `"true"`, `"1"` and non-zero
    /// numbers are set; anything else, including a missing key, is unset.
    pub fn flag(&self, key: &str) -> bool {
        match self.0.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s == "true" || s == "1",
            Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
            _ => false,
        }
    }

    /// Removes and returns a flag; see [`QueryOptions::flag`].
    pub fn take_flag(&mut self, key: &str) -> bool {
        let set = self.flag(key);
        self.0.remove(key);
        set
    }

    /// Merges `other` into `self`; keys in `other` win.
    pub fn extend(&mut self, other: QueryOptions) {
        self.0.extend(other.0);
    }

    /// Serializes the options, returning `None` when nothing would be written.
    pub fn to_query_string(&self) -> Option<String> {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        let mut written = false;

        for (key, value) in &self.0 {
            match value {
                Value::Null => {}
                Value::Array(items) => {
                    for item in items.iter().filter(|item| !item.is_null()) {
                        serializer.append_pair(key, &scalar(item));
                        written = true;
                    }
                }
                other => {
                    serializer.append_pair(key, &scalar(other));
                    written = true;
                }
            }
        }

        written.then(|| serializer.finish())
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for QueryOptions {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        QueryOptions(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<serde_json::Map<String, Value>> for QueryOptions {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maplit::btreemap;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_empty_options_have_no_query() {
        assert_eq!(QueryOptions::new().to_query_string(), None);
        assert_eq!(
            QueryOptions::new().set("gone", Value::Null).to_query_string(),
            None
        );
    }

    #[test]
    fn test_keys_are_sorted() {
        let options = QueryOptions::new()
            .set("stdout", true)
            .set("follow", false)
            .set("tail", "100")
            .set("since", 10);

        assert_eq!(
            options.to_query_string().as_deref(),
            Some("follow=false&since=10&stdout=true&tail=100")
        );
    }

    #[test]
    fn test_insertion_order_does_not_matter() {
        let a = QueryOptions::new().set("b", 1).set("a", 2);
        let b = QueryOptions::new().set("a", 2).set("b", 1);
        assert_eq!(a.to_query_string(), b.to_query_string());
    }

    #[test]
    fn test_arrays_repeat_the_key() {
        let options = QueryOptions::new().set("names", json!(["ubuntu", "alpine:3"]));
        assert_eq!(
            options.to_query_string().as_deref(),
            Some("names=ubuntu&names=alpine%3A3")
        );
    }

    #[test]
    fn test_objects_are_json_encoded() {
        let options = QueryOptions::new().set("filters", json!({"label": ["a=b"]}));
        let query = options.to_query_string().unwrap();
        let decoded: BTreeMap<String, String> =
            form_urlencoded::parse(query.as_bytes()).into_owned().collect();

        assert_eq!(
            decoded,
            btreemap! { "filters".to_string() => r#"{"label":["a=b"]}"#.to_string() }
        );
    }

    #[test]
    fn test_flag() {
        let options = QueryOptions::new()
            .set("a", true)
            .set("b", "1")
            .set("c", "true")
            .set("d", 0)
            .set("e", "false")
            .set("f", 2);

        assert!(options.flag("a"));
        assert!(options.flag("b"));
        assert!(options.flag("c"));
        assert!(!options.flag("d"));
        assert!(!options.flag("e"));
        assert!(options.flag("f"));
        assert!(!options.flag("missing"));
    }

    #[test]
    fn test_take_flag_removes_the_key() {
        let mut options = QueryOptions::new().set("stream", true).set("path", "/log");
        assert!(options.take_flag("stream"));
        assert_eq!(options.get("stream"), None);
        assert_eq!(options.to_query_string().as_deref(), Some("path=%2Flog"));
    }

    #[test]
    fn test_from_json_map() {
        let Value::Object(map) = json!({"all": true, "size": false}) else {
            panic!("expected object");
        };
        let options = QueryOptions::from(map);
        assert_eq!(
            options.to_query_string().as_deref(),
            Some("all=true&size=false")
        );
    }
}
