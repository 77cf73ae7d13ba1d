// 📦 Batch Ingestion - chunked user import
//
// A migration is a BatchJob over the full record list. Each step processes
// one chunk of CHUNK_SIZE records and hands the updated BatchState back, so
// whoever drives the job (a loop, a queue) decides when the next chunk runs.
// Nothing is caught per record: the first failing write aborts the chunk,
// and records written before it stay written.

use crate::entities::{CompanyResolver, UserEntity};
use crate::error::Result;
use crate::parser::UserRecord;
use crate::phone::normalize_phone;
use crate::store::{EntityKind, EntityStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Records processed per chunk
pub const CHUNK_SIZE: usize = 10;

// ============================================================================
// BATCH STATE
// ============================================================================

/// Progress carried between chunk invocations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchState {
    /// Next unread index
    pub offset: usize,
    /// Records processed so far
    pub progress: usize,
    /// User entities created so far
    pub created: usize,
    /// Total record count, fixed when the job starts
    pub max: usize,
}

impl BatchState {
    pub fn new(max: usize) -> Self {
        BatchState {
            offset: 0,
            progress: 0,
            created: 0,
            max,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.progress == self.max
    }

    /// None once every record is processed, otherwise progress / max in [0, 1)
    pub fn finished(&self) -> Option<f64> {
        if self.is_complete() {
            None
        } else {
            Some(self.progress as f64 / self.max as f64)
        }
    }

    /// Whole-number percentage for progress lines
    pub fn percent(&self) -> u8 {
        if self.is_complete() {
            100
        } else {
            (self.progress * 100 / self.max) as u8
        }
    }
}

/// Result of one chunk: the advanced state plus one line per processed record
#[derive(Debug, Clone)]
pub struct ChunkOutput {
    pub state: BatchState,
    pub results: Vec<String>,
}

// ============================================================================
// USER INGESTOR
// ============================================================================

pub struct UserIngestor<'s, S: EntityStore + ?Sized> {
    store: &'s S,
    companies: CompanyResolver<'s, S>,
}

impl<'s, S: EntityStore + ?Sized> UserIngestor<'s, S> {
    pub fn new(store: &'s S) -> Self {
        UserIngestor {
            store,
            companies: CompanyResolver::new(store),
        }
    }

    /// Process `records[state.offset .. state.offset + CHUNK_SIZE]`
    pub fn process_chunk(&self, state: BatchState, records: &[UserRecord]) -> Result<ChunkOutput> {
        let mut next = state;
        let mut results = Vec::new();

        let start = state.offset.min(records.len());
        let end = (state.offset + CHUNK_SIZE).min(records.len());

        for record in &records[start..end] {
            // Handle the company first
            let company = self.companies.resolve(&record.company)?;
            let phone = normalize_phone(&record.phone);

            let user = UserEntity::from_record(record, company, phone);
            let id = self
                .store
                .create(EntityKind::User, &user.title, user.fields()?)?;
            debug!(username = %user.title, entity_id = id.0, "user created");

            next.created += 1;
            next.progress += 1;
            results.push(format!("Created user: {}", record.name));
        }

        next.offset += CHUNK_SIZE;

        Ok(ChunkOutput {
            state: next,
            results,
        })
    }
}

// ============================================================================
// BATCH JOB
// ============================================================================

/// A migration job: the full record list plus its running state and results
pub struct BatchJob {
    records: Vec<UserRecord>,
    state: BatchState,
    results: Vec<String>,
    chunks_run: usize,
}

impl BatchJob {
    pub fn new(records: Vec<UserRecord>) -> Self {
        let state = BatchState::new(records.len());
        BatchJob {
            records,
            state,
            results: Vec::new(),
            chunks_run: 0,
        }
    }

    pub fn state(&self) -> BatchState {
        self.state
    }

    pub fn results(&self) -> &[String] {
        &self.results
    }

    pub fn into_results(self) -> Vec<String> {
        self.results
    }

    pub fn chunks_run(&self) -> usize {
        self.chunks_run
    }

    pub fn is_complete(&self) -> bool {
        self.state.is_complete()
    }

    /// Run one chunk and return the new `finished()` value
    ///
    /// On error the job keeps the state and results of the chunks that
    /// completed before the failing one.
    pub fn step<S: EntityStore + ?Sized>(
        &mut self,
        ingestor: &UserIngestor<'_, S>,
    ) -> Result<Option<f64>> {
        let output = ingestor.process_chunk(self.state, &self.records)?;

        self.state = output.state;
        self.results.extend(output.results);
        self.chunks_run += 1;

        info!(
            offset = self.state.offset,
            progress = self.state.progress,
            max = self.state.max,
            "chunk processed"
        );

        Ok(self.state.finished())
    }
}

// ============================================================================
// TESTS
// ============================================================================
