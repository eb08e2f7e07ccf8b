//! Normalized cache and cache identity
//!
//! Entities are stored once under their cache key and referenced from
//! query results with `{"__ref": key}`, so a `Project` fetched by two
//! queries (or by the server pass and then the browser) is one entry that
//! gets updated in place.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Cache key of the root query object
pub const ROOT_QUERY: &str = "ROOT_QUERY";

const TYPENAME: &str = "__typename";
const REF: &str = "__ref";

/// Kinds of entity with a dedicated cache identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind<'a> {
    /// Keyed by project directory
    Project,
    /// Singleton
    UserSettings,
    /// Keyed by typename and `id`/`_id`
    Other(&'a str),
}

impl<'a> EntityKind<'a> {
    /// Kind of a result object, `None` without a `__typename`
    pub fn of(object: &'a Map<String, Value>) -> Option<Self> {
        match object.get(TYPENAME)?.as_str()? {
            "Project" => Some(Self::Project),
            "UserSettings" => Some(Self::UserSettings),
            other => Some(Self::Other(other)),
        }
    }
}

fn scalar_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Cache key for a result object
///
/// ```
/// use ota_publisher::graphql::data_id_from_object;
/// use serde_json::json;
///
/// let project = json!({"__typename": "Project", "projectDir": "/a/b"});
/// assert_eq!(data_id_from_object(&project).as_deref(), Some("Project:/a/b"));
///
/// let settings = json!({"__typename": "UserSettings", "sendTo": "dev@example.com"});
/// assert_eq!(data_id_from_object(&settings).as_deref(), Some("UserSettings"));
///
/// let widget = json!({"__typename": "Widget", "id": "7"});
/// assert_eq!(data_id_from_object(&widget).as_deref(), Some("Widget:7"));
/// ```
pub fn data_id_from_object(object: &Value) -> Option<String> {
    let object = object.as_object()?;

    match EntityKind::of(object)? {
        EntityKind::Project => object
            .get("projectDir")
            .and_then(scalar_id)
            .map(|dir| format!("Project:{}", dir)),
        EntityKind::UserSettings => Some("UserSettings".to_string()),
        EntityKind::Other(typename) => object
            .get("id")
            .or_else(|| object.get("_id"))
            .and_then(scalar_id)
            .map(|id| format!("{}:{}", typename, id)),
    }
}

/// Signature of a cache identity function
pub type DataIdFn = fn(&Value) -> Option<String>;

/// Flat store of normalized entities
#[derive(Debug, Clone)]
pub struct NormalizedCache {
    entries: BTreeMap<String, Map<String, Value>>,
    data_id: DataIdFn,
}

impl Default for NormalizedCache {
    fn default() -> Self {
        Self::new(data_id_from_object)
    }
}

impl NormalizedCache {
    pub fn new(data_id: DataIdFn) -> Self {
        Self {
            entries: BTreeMap::new(),
            data_id,
        }
    }

    /// Replace the contents with a snapshot produced by [`extract`](Self::extract)
    ///
    /// Returns `None` when the snapshot is not an object of objects.
    pub fn restore(mut self, state: Value) -> Option<Self> {
        let Value::Object(state) = state else {
            return None;
        };

        let mut entries = BTreeMap::new();
        for (key, entity) in state {
            let Value::Object(entity) = entity else {
                return None;
            };
            entries.insert(key, entity);
        }

        self.entries = entries;
        Some(self)
    }

    /// Snapshot of the cache, suitable for [`restore`](Self::restore)
    pub fn extract(&self) -> Value {
        Value::Object(
            self.entries
                .iter()
                .map(|(key, entity)| (key.clone(), Value::Object(entity.clone())))
                .collect(),
        )
    }

    /// Cache identity of `object` under this cache's rule
    pub fn identify(&self, object: &Value) -> Option<String> {
        (self.data_id)(object)
    }

    pub fn read(&self, key: &str) -> Option<&Map<String, Value>> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the `data` of a query result into the cache
    pub fn write_result(&mut self, data: &Value) {
        let Value::Object(fields) = data else {
            return;
        };

        let normalized: Map<String, Value> = fields
            .iter()
            .map(|(name, value)| (name.clone(), self.normalize(value)))
            .collect();
        self.merge(ROOT_QUERY, normalized);
    }

    fn normalize(&mut self, value: &Value) -> Value {
        match value {
            Value::Array(items) => Value::Array(items.iter().map(|v| self.normalize(v)).collect()),
            Value::Object(fields) => {
                let normalized: Map<String, Value> = fields
                    .iter()
                    .map(|(name, value)| (name.clone(), self.normalize(value)))
                    .collect();

                match self.identify(value) {
                    Some(key) => {
                        self.merge(&key, normalized);
                        let mut reference = Map::new();
                        reference.insert(REF.to_string(), Value::String(key));
                        Value::Object(reference)
                    }
                    None => Value::Object(normalized),
                }
            }
            scalar => scalar.clone(),
        }
    }

    fn merge(&mut self, key: &str, fields: Map<String, Value>) {
        self.entries
            .entry(key.to_string())
            .or_default()
            .extend(fields);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_project_key() {
        let project = json!({"__typename": "Project", "projectDir": "/a/b", "id": "ignored"});
        assert_eq!(data_id_from_object(&project).as_deref(), Some("Project:/a/b"));
    }

    #[test]
    fn test_user_settings_is_singleton() {
        let a = json!({"__typename": "UserSettings", "sendTo": "a@example.com"});
        let b = json!({"__typename": "UserSettings", "id": "42"});
        assert_eq!(data_id_from_object(&a).as_deref(), Some("UserSettings"));
        assert_eq!(data_id_from_object(&b).as_deref(), Some("UserSettings"));
    }

    #[test]
    fn test_default_key_is_not_special() {
        let widget = json!({"__typename": "Widget", "id": "7"});
        let key = data_id_from_object(&widget).unwrap();

        assert_eq!(key, "Widget:7");
        assert!(!key.starts_with("Project:"));
        assert_ne!(key, "UserSettings");
    }

    #[test]
    fn test_default_key_falls_back_to_underscore_id() {
        let widget = json!({"__typename": "Widget", "_id": 12});
        assert_eq!(data_id_from_object(&widget).as_deref(), Some("Widget:12"));
    }

    #[test]
    fn test_no_identity() {
        assert_eq!(data_id_from_object(&json!({"id": "1"})), None);
        assert_eq!(data_id_from_object(&json!({"__typename": "Widget"})), None);
        assert_eq!(data_id_from_object(&json!({"__typename": "Project"})), None);
        assert_eq!(data_id_from_object(&json!("Project")), None);
    }

    #[test]
    fn test_key_is_stable_across_calls() {
        let project = json!({"__typename": "Project", "projectDir": "/a/b"});
        let first = data_id_from_object(&project);
        for _ in 0..3 {
            assert_eq!(data_id_from_object(&project), first);
        }
    }

    #[test]
    fn test_entity_kind_of() {
        let object = json!({"__typename": "Widget"});
        assert_eq!(
            EntityKind::of(object.as_object().unwrap()),
            Some(EntityKind::Other("Widget"))
        );
    }

    #[test]
    fn test_write_result_normalizes_entities() {
        let mut cache = NormalizedCache::default();

        cache.write_result(&json!({
            "currentProject": {
                "__typename": "Project",
                "projectDir": "/a/b",
                "manifestUrl": "exp://localhost:19000",
                "messages": [{"__typename": "Message", "id": "m1", "msg": "hi"}]
            }
        }));

        let root = cache.read(ROOT_QUERY).unwrap();
        assert_eq!(root["currentProject"], json!({"__ref": "Project:/a/b"}));

        let project = cache.read("Project:/a/b").unwrap();
        assert_eq!(project["messages"], json!([{"__ref": "Message:m1"}]));
        assert_eq!(cache.read("Message:m1").unwrap()["msg"], "hi");
    }

    #[test]
    fn test_same_entity_updated_in_place() {
        let mut cache = NormalizedCache::default();

        cache.write_result(&json!({
            "currentProject": {"__typename": "Project", "projectDir": "/a/b", "status": "starting"}
        }));
        cache.write_result(&json!({
            "projects": [{"__typename": "Project", "projectDir": "/a/b", "status": "running", "name": "app"}]
        }));

        // ROOT_QUERY + one project
        assert_eq!(cache.len(), 2);
        let project = cache.read("Project:/a/b").unwrap();
        assert_eq!(project["status"], "running");
        assert_eq!(project["name"], "app");
    }

    #[test]
    fn test_objects_without_identity_stay_inline() {
        let mut cache = NormalizedCache::default();

        cache.write_result(&json!({"config": {"hostType": "lan"}}));

        assert_eq!(cache.read(ROOT_QUERY).unwrap()["config"], json!({"hostType": "lan"}));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_extract_then_restore() {
        let mut cache = NormalizedCache::default();
        cache.write_result(&json!({
            "userSettings": {"__typename": "UserSettings", "sendTo": "dev@example.com"}
        }));

        let restored = NormalizedCache::default().restore(cache.extract()).unwrap();

        assert_eq!(restored.extract(), cache.extract());
        assert_eq!(restored.read("UserSettings").unwrap()["sendTo"], "dev@example.com");
    }

    #[test]
    fn test_restore_rejects_malformed_state() {
        assert!(NormalizedCache::default().restore(json!([1, 2])).is_none());
        assert!(NormalizedCache::default().restore(json!({"ROOT_QUERY": 5})).is_none());
    }
}
