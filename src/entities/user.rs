// 👤 User Entity - one per input record, never deduplicated
// Re-running a migration creates a second copy of every user.

use crate::error::Result;
use crate::parser::UserRecord;
use crate::phone::Phone;
use crate::store::{EntityId, StoredEntity};
use serde::{Deserialize, Serialize};

/// Scheme put in front of every website, whether or not it already has one
pub const WEBSITE_SCHEME: &str = "https://";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserEntity {
    /// Username, stored as the entity title
    #[serde(skip)]
    pub title: String,

    /// Identifier from the source feed
    pub external_id: String,
    pub name: String,
    pub email: String,
    pub website: String,
    pub phone: String,
    pub phone_ext: String,
    pub street: String,
    pub suite: String,
    pub city: String,
    pub zip: String,
    pub latitude: String,
    pub longitude: String,

    /// Reference to the company entity
    pub company: EntityId,
}

impl UserEntity {
    pub fn from_record(record: &UserRecord, company: EntityId, phone: Phone) -> Self {
        UserEntity {
            title: record.username.clone(),
            external_id: record.id.to_string(),
            name: record.name.clone(),
            email: record.email.clone(),
            website: format!("{}{}", WEBSITE_SCHEME, record.website),
            phone: phone.number,
            phone_ext: phone.extension,
            street: record.address.street.clone(),
            suite: record.address.suite.clone(),
            city: record.address.city.clone(),
            zip: record.address.zipcode.clone(),
            latitude: record.address.geo.lat.clone(),
            longitude: record.address.geo.lng.clone(),
            company,
        }
    }

    pub fn from_stored(entity: &StoredEntity) -> Result<Self> {
        let mut user: UserEntity = serde_json::from_value(entity.fields.clone())?;
        user.title = entity.title.clone();
        Ok(user)
    }

    pub fn fields(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}
