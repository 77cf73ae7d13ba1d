use crate::error::{MigrationError, Result as StoreResult};
use crate::store::{EntityId, EntityKind, EntityStore, StoredEntity};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, warn};

/// Actor recorded on audit events written by this crate
pub const AUDIT_ACTOR: &str = "user_migration";

/// Event for audit trail ("every change is an event")
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Event {
    pub event_id: String,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub data: serde_json::Value,
    pub actor: String,
}

impl Event {
    pub fn new(
        event_type: &str,
        entity_type: &str,
        entity_id: &str,
        data: serde_json::Value,
        actor: &str,
    ) -> Self {
        Self {
            event_id: uuid::Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            event_type: event_type.to_string(),
            entity_type: entity_type.to_string(),
            entity_id: entity_id.to_string(),
            data,
            actor: actor.to_string(),
        }
    }
}

/// Open (or create) the database file and make sure the schema exists
pub fn open_database(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .with_context(|| format!("Failed to open database at {}", path.display()))?;
    setup_database(&conn)?;
    Ok(conn)
}

pub fn setup_database(conn: &Connection) -> Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;

    // ==========================================================================
    // Entities Table (users and companies share one typed table)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS entities (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            entity_type TEXT NOT NULL,
            title TEXT NOT NULL,
            status INTEGER NOT NULL DEFAULT 1,
            fields TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Events Table (audit trail / event sourcing)
    // ==========================================================================
    conn.execute(
        "CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id TEXT UNIQUE NOT NULL,
            timestamp TEXT NOT NULL,
            event_type TEXT NOT NULL,
            entity_type TEXT NOT NULL,
            entity_id TEXT NOT NULL,
            data TEXT NOT NULL,
            actor TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    // Not UNIQUE: company dedup is lookup-before-create only
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_entities_type_title ON entities(entity_type, title)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_entity ON events(entity_type, entity_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_events_timestamp ON events(timestamp)",
        [],
    )?;

    Ok(())
}

/// Insert event into audit trail
pub fn insert_event(conn: &Connection, event: &Event) -> Result<()> {
    let data_json = serde_json::to_string(&event.data)?;

    conn.execute(
        "INSERT INTO events (
            event_id, timestamp, event_type, entity_type, entity_id, data, actor
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            event.event_id,
            event.timestamp.to_rfc3339(),
            event.event_type,
            event.entity_type,
            event.entity_id,
            data_json,
            event.actor,
        ],
    )?;

    Ok(())
}

/// Get events for a specific entity
pub fn get_events_for_entity(
    conn: &Connection,
    entity_type: &str,
    entity_id: &str,
) -> Result<Vec<Event>> {
    let mut stmt = conn.prepare(
        "SELECT event_id, timestamp, event_type, entity_type, entity_id, data, actor
         FROM events
         WHERE entity_type = ?1 AND entity_id = ?2
         ORDER BY timestamp DESC",
    )?;

    let events = stmt
        .query_map(params![entity_type, entity_id], |row| {
            let data_json: String = row.get(5)?;

            Ok(Event {
                event_id: row.get(0)?,
                timestamp: parse_timestamp(row, 1)?,
                event_type: row.get(2)?,
                entity_type: row.get(3)?,
                entity_id: row.get(4)?,
                data: serde_json::from_str(&data_json).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e))
                })?,
                actor: row.get(6)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(events)
}

/// Published entities of one kind
pub fn count_entities(conn: &Connection, kind: EntityKind) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM entities WHERE entity_type = ?1 AND status = 1",
        params![kind.as_str()],
        |row| row.get(0),
    )?;

    Ok(count)
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn entity_from_row(row: &Row<'_>) -> rusqlite::Result<StoredEntity> {
    let type_code: String = row.get(1)?;
    let kind = EntityKind::from_code(&type_code).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            Type::Text,
            format!("unknown entity type: {}", type_code).into(),
        )
    })?;
    let fields_json: String = row.get(4)?;

    Ok(StoredEntity {
        id: EntityId(row.get(0)?),
        kind,
        title: row.get(2)?,
        status: row.get(3)?,
        fields: serde_json::from_str(&fields_json)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?,
        created_at: parse_timestamp(row, 5)?,
    })
}

// ============================================================================
// SQLITE ENTITY STORE
// ============================================================================

/// `EntityStore` over a borrowed SQLite connection
///
/// Each create is its own implicit transaction; a failing migration keeps
/// whatever was written before the failure.
pub struct SqliteStore<'a> {
    conn: &'a Connection,
}

impl<'a> SqliteStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        SqliteStore { conn }
    }
}

impl EntityStore for SqliteStore<'_> {
    fn find_by_type_and_title(
        &self,
        kind: EntityKind,
        title: &str,
    ) -> StoreResult<Option<EntityId>> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM entities
                 WHERE entity_type = ?1 AND title = ?2
                 ORDER BY id ASC
                 LIMIT 1",
                params![kind.as_str(), title],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;

        Ok(id.map(EntityId))
    }

    fn create(
        &self,
        kind: EntityKind,
        title: &str,
        fields: serde_json::Value,
    ) -> StoreResult<EntityId> {
        let fields_json = serde_json::to_string(&fields)?;

        self.conn.execute(
            "INSERT INTO entities (entity_type, title, status, fields, created_at)
             VALUES (?1, ?2, 1, ?3, ?4)",
            params![kind.as_str(), title, fields_json, Utc::now().to_rfc3339()],
        )?;
        let id = EntityId(self.conn.last_insert_rowid());
        debug!(entity_type = kind.as_str(), entity_id = id.0, title, "entity created");

        // Log event to audit trail
        let event = Event::new(
            "entity_created",
            kind.as_str(),
            &id.to_string(),
            serde_json::json!({ "title": title }),
            AUDIT_ACTOR,
        );
        if let Err(e) = insert_event(self.conn, &event) {
            warn!(entity_id = id.0, error = %e, "failed to write audit event");
        }

        Ok(id)
    }

    fn load(&self, id: EntityId) -> StoreResult<Option<StoredEntity>> {
        let entity = self
            .conn
            .query_row(
                "SELECT id, entity_type, title, status, fields, created_at
                 FROM entities
                 WHERE id = ?1",
                params![id.0],
                entity_from_row,
            )
            .optional()?;

        Ok(entity)
    }

    fn load_by_type(&self, kind: EntityKind) -> StoreResult<Vec<StoredEntity>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, entity_type, title, status, fields, created_at
             FROM entities
             WHERE entity_type = ?1 AND status = 1
             ORDER BY id ASC",
        )?;

        let entities = stmt
            .query_map(params![kind.as_str()], entity_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(MigrationError::from)?;

        Ok(entities)
    }

    fn count(&self, kind: EntityKind) -> StoreResult<usize> {
        let count = count_entities(self.conn, kind)
            .map_err(|e| MigrationError::Persistence(e.to_string()))?;
        Ok(count as usize)
    }
}
