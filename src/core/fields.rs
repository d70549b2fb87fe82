use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// String-keyed field map of a record as the store returns it.
///
/// Store columns are loosely typed (numbers arrive as strings or numbers,
/// link columns as arrays or objects), so all reads go through typed
/// accessors instead of matching on `Value` at call sites.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fields(Map<String, Value>);

impl Fields {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builder-style insert
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.get(key).is_some_and(|v| !v.is_null())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Field as text; missing, null and composite values read as empty
    pub fn get_string(&self, key: &str) -> String {
        match self.0.get(key) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        }
    }

    /// Trimmed text or `None` when blank
    pub fn get_non_empty(&self, key: &str) -> Option<String> {
        let value = self.get_string(key);
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    /// Field as integer; numeric strings are accepted, anything else is `None`
    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.0.get(key) {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Id of the first record a link column points at.
    ///
    /// Link columns come back as a scalar id, an object with an id, or a
    /// list of either.
    pub fn get_link_id(&self, key: &str) -> Option<String> {
        fn id_of(value: &Value) -> Option<String> {
            match value {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                Value::Object(obj) => ["Id", "id", "ncRecordId"]
                    .iter()
                    .find_map(|k| obj.get(*k))
                    .and_then(id_of),
                Value::Array(items) => items.iter().find_map(id_of),
                _ => None,
            }
        }

        self.0.get(key).and_then(id_of)
    }

    /// Drop null values the store sends for empty columns
    pub fn without_nulls(self) -> Self {
        Self(self.0.into_iter().filter(|(_, v)| !v.is_null()).collect())
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Fields {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// A record read from the store: its fields plus the normalized record id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub fields: Fields,
}

impl Record {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}
