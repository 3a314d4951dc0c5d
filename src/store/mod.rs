//! Storage seams - document store and key-value store
//!
//! The tracker never talks to a concrete backend. `Database` (SQLite) and
//! `MemoryStore` both implement these traits and are passed in by the caller.

use std::cell::RefCell;
use std::collections::HashMap;

use anyhow::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

/// Stored document: id plus JSON body
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub body: Value,
}

impl Document {
    /// Deserialize the body, with `id` injected as a field
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        let mut body = self.body.clone();
        if let Value::Object(map) = &mut body {
            map.insert("id".to_string(), Value::String(self.id.clone()));
        }
        Ok(serde_json::from_value(body)?)
    }

    fn matches(&self, filters: &[Filter]) -> bool {
        filters
            .iter()
            .all(|f| self.body.get(&f.field) == Some(&f.value))
    }
}

/// Equality filter on a top-level field
#[derive(Debug, Clone)]
pub struct Filter {
    pub field: String,
    pub value: Value,
}

impl Filter {
    pub fn equals(field: &str, value: impl Into<Value>) -> Self {
        Self {
            field: field.to_string(),
            value: value.into(),
        }
    }
}

/// Documents grouped by collection name
pub trait DocumentStore {
    /// Store a new document and return its generated id
    fn insert(&self, collection: &str, body: Value) -> Result<String>;

    /// Documents matching every filter, in insertion order
    fn find(&self, collection: &str, filters: &[Filter]) -> Result<Vec<Document>>;

    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Returns false if nothing was deleted
    fn delete(&self, collection: &str, id: &str) -> Result<bool>;
}

/// String keys to string values
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

impl<T: DocumentStore + ?Sized> DocumentStore for &T {
    fn insert(&self, collection: &str, body: Value) -> Result<String> {
        (**self).insert(collection, body)
    }

    fn find(&self, collection: &str, filters: &[Filter]) -> Result<Vec<Document>> {
        (**self).find(collection, filters)
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        (**self).get(collection, id)
    }

    fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        (**self).delete(collection, id)
    }
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

/// Serialize a record for insertion, dropping its `id` field
pub fn to_body<T: Serialize>(record: &T) -> Result<Value> {
    let mut body = serde_json::to_value(record)?;
    if let Value::Object(map) = &mut body {
        map.remove("id");
    }
    Ok(body)
}

/// Decode documents, skipping those that no longer fit `T`
pub fn decode_all<T: DeserializeOwned>(collection: &str, docs: Vec<Document>) -> Vec<T> {
    docs.into_iter()
        .filter_map(|doc| match doc.decode() {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping unreadable {} document {}: {}", collection, doc.id, e);
                None
            }
        })
        .collect()
}

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// In-memory backend for tests and `--memory` runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RefCell<HashMap<String, Vec<Document>>>,
    values: RefCell<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentStore for MemoryStore {
    fn insert(&self, collection: &str, body: Value) -> Result<String> {
        let id = new_id();
        self.collections
            .borrow_mut()
            .entry(collection.to_string())
            .or_default()
            .push(Document { id: id.clone(), body });
        Ok(id)
    }

    fn find(&self, collection: &str, filters: &[Filter]) -> Result<Vec<Document>> {
        let collections = self.collections.borrow();
        let docs = collections
            .get(collection)
            .map(|docs| docs.iter().filter(|d| d.matches(filters)).cloned().collect())
            .unwrap_or_default();
        Ok(docs)
    }

    fn get(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let collections = self.collections.borrow();
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id).cloned()))
    }

    fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        let mut collections = self.collections.borrow_mut();
        let Some(docs) = collections.get_mut(collection) else {
            return Ok(false);
        };
        let before = docs.len();
        docs.retain(|d| d.id != id);
        Ok(docs.len() != before)
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.values.borrow_mut().remove(key);
        Ok(())
    }
}

/// Shared checks run against every backend
#[cfg(test)]
pub(crate) mod conformance {
    use super::*;
    use serde_json::json;

    pub fn document_filters<S: DocumentStore>(store: &S) {
        let a = store.insert("sessions", json!({"user_id": "u1", "machine_id": 3})).unwrap();
        let b = store.insert("sessions", json!({"user_id": "u1", "machine_id": 4})).unwrap();
        store.insert("sessions", json!({"user_id": "u2", "machine_id": 3})).unwrap();
        store.insert("profiles", json!({"user_id": "u1"})).unwrap();

        let all = store.find("sessions", &[]).unwrap();
        assert_eq!(all.len(), 3);

        let mine = store.find("sessions", &[Filter::equals("user_id", "u1")]).unwrap();
        let ids: Vec<_> = mine.iter().map(|d| d.id.clone()).collect();
        assert_eq!(ids, vec![a.clone(), b]);

        let both = store
            .find("sessions", &[Filter::equals("user_id", "u1"), Filter::equals("machine_id", 3)])
            .unwrap();
        assert_eq!(both.len(), 1);
        assert_eq!(both[0].id, a);

        // number and string are different JSON values
        assert!(store.find("sessions", &[Filter::equals("machine_id", "3")]).unwrap().is_empty());
        assert!(store.find("missing", &[]).unwrap().is_empty());
    }

    pub fn document_get_delete<S: DocumentStore>(store: &S) {
        let id = store.insert("profiles", json!({"name": "Ann"})).unwrap();
        let doc = store.get("profiles", &id).unwrap().unwrap();
        assert_eq!(doc.body["name"], "Ann");
        assert!(store.get("sessions", &id).unwrap().is_none());

        assert!(store.delete("profiles", &id).unwrap());
        assert!(!store.delete("profiles", &id).unwrap());
        assert!(store.get("profiles", &id).unwrap().is_none());
    }

    pub fn key_values<S: KeyValueStore>(store: &S) {
        assert_eq!(store.get("current_user").unwrap(), None);
        store.set("current_user", "u1").unwrap();
        store.set("current_user", "u2").unwrap();
        assert_eq!(store.get("current_user").unwrap().as_deref(), Some("u2"));
        store.remove("current_user").unwrap();
        store.remove("current_user").unwrap();
        assert_eq!(store.get("current_user").unwrap(), None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn test_memory_document_filters() {
        conformance::document_filters(&MemoryStore::new());
    }

    #[test]
    fn test_memory_get_delete() {
        conformance::document_get_delete(&MemoryStore::new());
    }

    #[test]
    fn test_memory_key_values() {
        conformance::key_values(&MemoryStore::new());
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Note {
        id: String,
        text: String,
    }

    #[test]
    fn test_body_roundtrip_moves_id() {
        let note = Note { id: "ignored".into(), text: "hi".into() };
        let body = to_body(&note).unwrap();
        assert_eq!(body, json!({"text": "hi"}));

        let doc = Document { id: "n1".into(), body };
        let decoded: Note = doc.decode().unwrap();
        assert_eq!(decoded, Note { id: "n1".into(), text: "hi".into() });
    }

    #[test]
    fn test_decode_all_skips_bad_documents() {
        let docs = vec![
            Document { id: "a".into(), body: json!({"text": "ok"}) },
            Document { id: "b".into(), body: json!({"text": 5}) },
        ];
        let notes: Vec<Note> = decode_all("notes", docs);
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].id, "a");
    }
}
