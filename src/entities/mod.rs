// Entity Models
//
// Each entity has:
// - A store-assigned identity (EntityId) that never changes
// - A title the store can look it up by
// - Typed fields, stored as JSON next to the title

pub mod company;
pub mod user;

pub use company::{CompanyEntity, CompanyResolver};
pub use user::{UserEntity, WEBSITE_SCHEME};
