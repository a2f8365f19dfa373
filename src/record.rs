use serde::Serialize;
use serde_json::{Map, Value};

/// Field names that carry pipeline-internal state between enrichment steps.
///
/// They are consumed (and removed) by their owning step; the sink adapter
/// additionally strips anything `_`-prefixed so internal state can never
/// leak into rendered output.
pub(crate) const ARGS_FIELD: &str = "_args";
pub(crate) const STACK_FLAG_FIELD: &str = "_capture_stack";

/// One structured log event: an ordered mapping from field name to value.
///
/// The map preserves insertion order for rendering (`serde_json` with the
/// `preserve_order` feature), while lookup stays by name. By the time a
/// record reaches a sink it always carries `event` and `log_level`; the
/// enrichment chain adds `logger`, `timestamp` and the optional
/// `stack`/`exception` fields on top of whatever the caller supplied.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct LogRecord {
    fields: Map<String, Value>,
}

impl LogRecord {
    /// Create a raw record containing only the `event` message.
    pub fn new(event: impl Into<String>) -> Self {
        let mut fields = Map::new();
        fields.insert("event".to_string(), Value::String(event.into()));
        LogRecord { fields }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Iterate fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// The `event` message, if it is still a string.
    pub fn event(&self) -> Option<&str> {
        self.fields.get("event").and_then(Value::as_str)
    }

    pub(crate) fn set_event(&mut self, event: String) {
        self.fields.insert("event".to_string(), Value::String(event));
    }

    /// Copy of the record with all `_`-prefixed internal fields removed.
    pub(crate) fn without_internal_fields(&self) -> LogRecord {
        let fields = self
            .fields
            .iter()
            .filter(|(k, _)| !k.starts_with('_'))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        LogRecord { fields }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fields_render_in_insertion_order() {
        let mut record = LogRecord::new("hello");
        record.insert("zebra", json!(1));
        record.insert("apple", json!(2));
        let keys: Vec<&str> = record.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["event", "zebra", "apple"]);
    }

    #[test]
    fn serializes_flat_json_object() {
        let mut record = LogRecord::new("hi");
        record.insert("request_id", json!("req-1"));
        let line = serde_json::to_string(&record).unwrap();
        assert_eq!(line, r#"{"event":"hi","request_id":"req-1"}"#);
    }

    #[test]
    fn internal_fields_are_stripped() {
        let mut record = LogRecord::new("hi");
        record.insert(ARGS_FIELD, json!(["a"]));
        record.insert("kept", json!(true));
        let clean = record.without_internal_fields();
        assert!(clean.get(ARGS_FIELD).is_none());
        assert!(clean.get("kept").is_some());
    }
}
