// 🚚 Migration Orchestrator
// JSON payload → records → BatchJob stepped to completion → summary message

use crate::batch::{BatchJob, BatchState, UserIngestor};
use crate::error::Result;
use crate::messenger::Messenger;
use crate::parser::{parse_users, parse_users_bytes, UserRecord};
use crate::source::{Source, SourceFetcher};
use crate::store::EntityStore;
use serde::Serialize;
use tracing::{error, info, warn};

/// Shown when a job aborts; details go to the log
pub const FAILURE_MESSAGE: &str = "Something went wrong.";

/// Plural-aware completion summary
///
/// 1 → "One user processed.", anything else → "<count> users processed."
pub fn summary_message(count: usize) -> String {
    if count == 1 {
        "One user processed.".to_string()
    } else {
        format!("{} users processed.", count)
    }
}

pub fn finished_message(success: bool, results: &[String]) -> String {
    if success {
        summary_message(results.len())
    } else {
        FAILURE_MESSAGE.to_string()
    }
}

/// Status line announcing a successful remote fetch
pub const RECEIVED_MESSAGE: &str = "Received 200 response from endpoint.";

/// Fetch the payload for `source`, announcing each step through `messenger`
///
/// A fetch failure is reported as a warning and yields None. Nothing is
/// written to a store here, so callers open or lock theirs afterwards.
pub async fn fetch_payload<M: Messenger>(
    fetcher: &SourceFetcher,
    source: &Source,
    messenger: &M,
) -> Option<Vec<u8>> {
    messenger.add_status(format!("Migrating data from {}", source.describe()));

    match fetcher.fetch(source).await {
        Ok(payload) => {
            if matches!(source, Source::Remote(_)) {
                messenger.add_status(RECEIVED_MESSAGE);
            }
            Some(payload)
        }
        Err(e) => {
            warn!(source = %source.describe(), error = %e, "fetch failed");
            messenger.add_warning(e.to_string());
            None
        }
    }
}

/// Outcome of one migration run
#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub success: bool,
    pub message: String,
    pub results: Vec<String>,
    pub state: BatchState,
    pub chunks: usize,
}

pub struct Migrator<'a, S: EntityStore + ?Sized, M: Messenger> {
    store: &'a S,
    messenger: &'a M,
}

impl<'a, S: EntityStore + ?Sized, M: Messenger> Migrator<'a, S, M> {
    pub fn new(store: &'a S, messenger: &'a M) -> Self {
        Migrator { store, messenger }
    }

    /// Parse the payload text into records
    pub fn process_json(&self, json: &str) -> Result<Vec<UserRecord>> {
        parse_users(json)
    }

    /// Run a job over `records`, one chunk after another, until it completes or fails
    pub fn start_migration(&self, records: Vec<UserRecord>) -> MigrationReport {
        info!(records = records.len(), "migration started");

        let ingestor = UserIngestor::new(self.store);
        let mut job = BatchJob::new(records);

        let success = loop {
            match job.step(&ingestor) {
                Ok(finished) => {
                    self.messenger.progress(&job.state());
                    if finished.is_none() {
                        break true;
                    }
                }
                Err(e) => {
                    error!(error = %e, offset = job.state().offset, "migration aborted");
                    break false;
                }
            }
        };

        let state = job.state();
        let chunks = job.chunks_run();
        let results = job.into_results();
        let message = finished_message(success, &results);

        if success {
            info!(created = state.created, chunks, "migration finished");
            self.messenger.add_status(message.clone());
        } else {
            self.messenger.add_error(message.clone());
        }

        MigrationReport {
            success,
            message,
            results,
            state,
            chunks,
        }
    }

    /// Fetched bytes → migration
    ///
    /// An empty payload or one that does not parse produces a warning and no
    /// migration (None); no entities are created in either case.
    pub fn migrate_payload(&self, payload: &[u8]) -> Option<MigrationReport> {
        if payload.iter().all(|b| b.is_ascii_whitespace()) {
            warn!("empty payload, nothing to migrate");
            self.messenger.add_warning("No data received, nothing to migrate.");
            return None;
        }

        match parse_users_bytes(payload) {
            Ok(records) => Some(self.start_migration(records)),
            Err(e) => {
                warn!(error = %e, "payload rejected");
                self.messenger.add_warning(e.to_string());
                None
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
