// User Migration - Core Library
// Exposes all modules for use in CLI, web server, and tests

pub mod batch;
pub mod config;
pub mod db;
pub mod entities;
pub mod error;
pub mod messenger;
pub mod migrate;
pub mod parser;
pub mod phone;
pub mod source;
pub mod store;
pub mod view;

#[cfg(feature = "server")]
pub mod web;

// Re-export commonly used types
pub use batch::{BatchJob, BatchState, ChunkOutput, UserIngestor, CHUNK_SIZE};
pub use config::ServerConfig;
pub use db::{
    count_entities, get_events_for_entity, insert_event, open_database, setup_database, Event,
    SqliteStore,
};
pub use entities::{CompanyEntity, CompanyResolver, UserEntity};
pub use error::MigrationError;
pub use messenger::{ConsoleMessenger, Message, MessageLevel, MessageLog, Messenger};
pub use migrate::{
    fetch_payload, finished_message, summary_message, MigrationReport, Migrator, RECEIVED_MESSAGE,
};
pub use parser::{
    parse_users, parse_users_bytes, AddressRecord, CompanyRecord, GeoRecord, RecordId, UserRecord,
};
pub use phone::{normalize_phone, Phone};
pub use source::{Source, SourceFetcher};
pub use store::{EntityId, EntityKind, EntityStore, MemoryStore, StoredEntity};
pub use view::{load_user_rows, render_company, render_listing, render_user, UserRow};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
