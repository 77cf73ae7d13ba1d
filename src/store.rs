// 🗃️ Entity Store - the content store users and companies are written to
// Two backings: SQLite (db::SqliteStore) and in-memory (MemoryStore, used by tests)

use crate::error::{MigrationError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, RwLock};

// ============================================================================
// ENTITY KIND & ID
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    User,
    Company,
}

impl EntityKind {
    /// Storage code (the `entity_type` column)
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Company => "company",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "user" => Some(EntityKind::User),
            "company" => Some(EntityKind::Company),
            _ => None,
        }
    }
}

/// Store-assigned identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub i64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A persisted entity as the store sees it: a typed, titled bag of fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEntity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub title: String,
    /// Published flag; everything this system creates is published
    pub status: bool,
    pub fields: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// STORE TRAIT
// ============================================================================

/// Key-value-like entity store
///
/// There is no uniqueness constraint on (kind, title). Callers that want one
/// (the company resolver) look up before they create, without a lock.
pub trait EntityStore {
    /// First entity of `kind` whose title equals `title` exactly
    fn find_by_type_and_title(&self, kind: EntityKind, title: &str) -> Result<Option<EntityId>>;

    /// Persist a new published entity and return its id
    fn create(&self, kind: EntityKind, title: &str, fields: serde_json::Value) -> Result<EntityId>;

    fn load(&self, id: EntityId) -> Result<Option<StoredEntity>>;

    /// Published entities of `kind` in creation order
    fn load_by_type(&self, kind: EntityKind) -> Result<Vec<StoredEntity>>;

    fn count(&self, kind: EntityKind) -> Result<usize> {
        Ok(self.load_by_type(kind)?.len())
    }
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

/// Append-only in-memory store
///
/// Clones share the same entities, so a clone can be handed to a migration
/// while the original is inspected afterwards.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entities: Arc<RwLock<Vec<StoredEntity>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entities.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: T) -> MigrationError {
    MigrationError::Persistence("memory store lock poisoned".to_string())
}

impl EntityStore for MemoryStore {
    fn find_by_type_and_title(&self, kind: EntityKind, title: &str) -> Result<Option<EntityId>> {
        let entities = self.entities.read().map_err(poisoned)?;
        Ok(entities
            .iter()
            .find(|e| e.kind == kind && e.title == title)
            .map(|e| e.id))
    }

    fn create(&self, kind: EntityKind, title: &str, fields: serde_json::Value) -> Result<EntityId> {
        let mut entities = self.entities.write().map_err(poisoned)?;
        let id = EntityId(entities.len() as i64 + 1);
        entities.push(StoredEntity {
            id,
            kind,
            title: title.to_string(),
            status: true,
            fields,
            created_at: Utc::now(),
        });
        Ok(id)
    }

    fn load(&self, id: EntityId) -> Result<Option<StoredEntity>> {
        let entities = self.entities.read().map_err(poisoned)?;
        Ok(entities.iter().find(|e| e.id == id).cloned())
    }

    fn load_by_type(&self, kind: EntityKind) -> Result<Vec<StoredEntity>> {
        let entities = self.entities.read().map_err(poisoned)?;
        Ok(entities
            .iter()
            .filter(|e| e.kind == kind && e.status)
            .cloned()
            .collect())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_codes_round_trip() {
        for kind in [EntityKind::User, EntityKind::Company] {
            assert_eq!(EntityKind::from_code(kind.as_str()), Some(kind));
        }
        assert_eq!(EntityKind::from_code("article"), None);
    }

    #[test]
    fn test_memory_store_find_is_exact_and_typed() {
        let store = MemoryStore::new();
        let acme = store
            .create(EntityKind::Company, "Acme", json!({"jargon": "x"}))
            .unwrap();
        store.create(EntityKind::User, "Acme", json!({})).unwrap();

        assert_eq!(
            store.find_by_type_and_title(EntityKind::Company, "Acme").unwrap(),
            Some(acme)
        );
        assert_eq!(
            store.find_by_type_and_title(EntityKind::Company, "acme").unwrap(),
            None
        );
        assert_eq!(store.count(EntityKind::Company).unwrap(), 1);
        assert_eq!(store.count(EntityKind::User).unwrap(), 1);
    }

    #[test]
    fn test_memory_store_clones_share_entities() {
        let store = MemoryStore::new();
        let handle = store.clone();
        let id = handle.create(EntityKind::User, "bret", json!({"name": "Leanne"})).unwrap();

        let loaded = store.load(id).unwrap().unwrap();
        assert_eq!(loaded.title, "bret");
        assert!(loaded.status);
        assert_eq!(loaded.fields["name"], "Leanne");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_memory_store_allows_duplicate_titles() {
        let store = MemoryStore::new();
        let a = store.create(EntityKind::User, "bret", json!({})).unwrap();
        let b = store.create(EntityKind::User, "bret", json!({})).unwrap();
        assert_ne!(a, b);

        let users = store.load_by_type(EntityKind::User).unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].id, a);
        assert_eq!(users[1].id, b);
    }
}
