use serde_json::Value;
use url::form_urlencoded;

/// Ordered query-string parameters.
///
/// Pairs keep their insertion order; a repeated key is sent once per insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    pairs: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Params::insert`]
    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl ToString) {
        self.pairs.push((key.into(), value.to_string()));
    }

    pub fn extend(&mut self, other: &Params) {
        self.pairs.extend(other.pairs.iter().cloned());
    }

    /// First value stored under `key`
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Form-urlencoded `k=v&k2=v2`, without a leading `?`
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.iter())
            .finish()
    }

    /// Flattens a JSON object into parameters.
    ///
    /// Arrays are joined with `,`, strings are taken verbatim and nulls are
    /// skipped. Anything that is not an object gives empty params.
    pub fn from_json(value: &Value) -> Self {
        let mut params = Params::new();
        let Some(object) = value.as_object() else {
            return params;
        };

        for (key, value) in object {
            match value {
                Value::Null => {}
                Value::String(s) => params.insert(key.as_str(), s),
                Value::Array(items) => {
                    let joined = items
                        .iter()
                        .map(scalar_text)
                        .collect::<Vec<_>>()
                        .join(",");
                    params.insert(key.as_str(), joined);
                }
                other => params.insert(key.as_str(), other),
            }
        }
        params
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl<K, V> FromIterator<(K, V)> for Params
where
    K: Into<String>,
    V: ToString,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (key, value) in iter {
            params.insert(key, value);
        }
        params
    }
}

/// Appends `params` to `path` as a query string, if there are any
pub fn qurl(path: &str, params: &Params) -> String {
    if params.is_empty() {
        path.to_string()
    } else {
        format!("{}?{}", path, params.to_query_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_string_keeps_insertion_order() {
        let params = Params::new().with("size", 12).with("from", 0).with("q", "a");
        assert_eq!(params.to_query_string(), "size=12&from=0&q=a");
    }

    #[test]
    fn test_query_string_escapes_values() {
        let params = Params::new().with("q", "message:hello world&more");
        assert_eq!(params.to_query_string(), "q=message%3Ahello+world%26more");
    }

    #[test]
    fn test_qurl() {
        assert_eq!(qurl("987/_update", &Params::new()), "987/_update");
        assert_eq!(
            qurl("987/_update", &Params::new().with("routing", "u1")),
            "987/_update?routing=u1"
        );
    }

    #[test]
    fn test_get_and_extend() {
        let mut params = Params::new().with("fields", "a,b");
        params.extend(&Params::new().with("routing", "r"));
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("routing"), Some("r"));
        assert_eq!(params.get("missing"), None);
    }

    #[test]
    fn test_from_iterator() {
        let params: Params = vec![("analyzer", "snowball"), ("pretty", "true")]
            .into_iter()
            .collect();
        assert_eq!(params.to_query_string(), "analyzer=snowball&pretty=true");
    }

    #[test]
    fn test_from_json() {
        let params = Params::from_json(&json!({
            "analyzer": "snowball",
            "fields": ["message", "user"],
            "size": 5,
            "routing": null
        }));
        assert_eq!(params.get("analyzer"), Some("snowball"));
        assert_eq!(params.get("fields"), Some("message,user"));
        assert_eq!(params.get("size"), Some("5"));
        assert_eq!(params.get("routing"), None);

        assert!(Params::from_json(&json!([1, 2])).is_empty());
    }
}
