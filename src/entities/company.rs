// 🏢 Company Entity - deduplicated by exact name
//
// "Romaguera-Crona" seen on ten user records → one company entity, ten references.
// Dedup is lookup-before-create against the store. Two concurrent runs that
// both miss the lookup will each create the company; nothing detects that.

use crate::error::Result;
use crate::parser::CompanyRecord;
use crate::store::{EntityId, EntityKind, EntityStore, StoredEntity};
use serde::{Deserialize, Serialize};
use tracing::debug;

// ============================================================================
// COMPANY ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyEntity {
    /// Company name, stored as the entity title
    #[serde(skip)]
    pub title: String,

    pub catchphrase: String,

    /// The feed's "bs" tagline
    pub jargon: String,
}

impl CompanyEntity {
    pub fn from_record(record: &CompanyRecord) -> Self {
        CompanyEntity {
            title: record.name.clone(),
            catchphrase: record.catch_phrase.clone(),
            jargon: record.bs.clone(),
        }
    }

    /// Rebuild from a stored entity; the title comes from the entity itself
    pub fn from_stored(entity: &StoredEntity) -> Result<Self> {
        let mut company: CompanyEntity = serde_json::from_value(entity.fields.clone())?;
        company.title = entity.title.clone();
        Ok(company)
    }

    pub fn fields(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

// ============================================================================
// COMPANY RESOLVER
// ============================================================================

/// Lookup-or-create for companies
pub struct CompanyResolver<'s, S: EntityStore + ?Sized> {
    store: &'s S,
}

impl<'s, S: EntityStore + ?Sized> CompanyResolver<'s, S> {
    pub fn new(store: &'s S) -> Self {
        CompanyResolver { store }
    }

    /// Id of the company titled exactly `record.name`, creating it when missing
    pub fn resolve(&self, record: &CompanyRecord) -> Result<EntityId> {
        if let Some(id) = self
            .store
            .find_by_type_and_title(EntityKind::Company, &record.name)?
        {
            debug!(company = %record.name, entity_id = id.0, "company reused");
            return Ok(id);
        }

        let company = CompanyEntity::from_record(record);
        let id = self
            .store
            .create(EntityKind::Company, &company.title, company.fields()?)?;
        debug!(company = %record.name, entity_id = id.0, "company created");

        Ok(id)
    }

    /// Load a company by id (None when the id is not a company)
    pub fn load(&self, id: EntityId) -> Result<Option<CompanyEntity>> {
        match self.store.load(id)? {
            Some(entity) if entity.kind == EntityKind::Company => {
                Ok(Some(CompanyEntity::from_stored(&entity)?))
            }
            _ => Ok(None),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
