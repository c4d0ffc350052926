use serde_json::{Map, Value};

/// Untyped view over a JSON object with case-insensitive key lookup.
///
/// Manifest authors are inconsistent with casing (`modID`, `ModId`, `modid`),
/// so every accessor tries an exact match first and then falls back to an
/// ASCII case-insensitive scan.
pub struct JsonDoc<'a> {
    map: &'a Map<String, Value>,
}

impl<'a> JsonDoc<'a> {
    pub fn new(map: &'a Map<String, Value>) -> Self {
        Self { map }
    }

    pub fn from_value(value: &'a Value) -> Option<Self> {
        value.as_object().map(Self::new)
    }

    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).or_else(|| {
            self.map
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v)
        })
    }

    /// First key among `keys` that is present.
    pub fn get_any(&self, keys: &[&str]) -> Option<&'a Value> {
        keys.iter().find_map(|k| self.get(k))
    }

    /// String value; numbers are stringified, blank strings count as absent.
    pub fn get_str(&self, keys: &[&str]) -> Option<String> {
        let s = match self.get_any(keys)? {
            Value::String(s) => s.trim().to_string(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        (!s.is_empty()).then_some(s)
    }

    /// Array of strings, or a single string treated as a one-element list.
    pub fn get_string_list(&self, keys: &[&str]) -> Vec<String> {
        match self.get_any(keys) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
            _ => Vec::new(),
        }
    }

    pub fn get_bool(&self, keys: &[&str]) -> Option<bool> {
        match self.get_any(keys)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn get_object(&self, keys: &[&str]) -> Option<&'a Map<String, Value>> {
        self.get_any(keys)?.as_object()
    }
}
