// 🏗️ Record Parser
// JSON payload → Vec<UserRecord> (the "users" schema: nested address, geo and company)

use crate::error::{MigrationError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// ============================================================================
// INPUT RECORDS (immutable, exactly as received)
// ============================================================================

/// Source identifier - the feed uses numbers, hand-written files sometimes use strings
///
/// Any JSON number is accepted (negative, beyond i64, fractional) and kept as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(serde_json::Number),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{}", n),
            RecordId::Text(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: RecordId,
    pub name: String,
    pub username: String,
    pub email: String,
    pub address: AddressRecord,
    pub phone: String,
    pub website: String,
    pub company: CompanyRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressRecord {
    pub street: String,
    pub suite: String,
    pub city: String,
    pub zipcode: String,
    pub geo: GeoRecord,
}

/// Coordinates are kept as text; the feed sends them as strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub lat: String,
    #[serde(deserialize_with = "string_or_number")]
    pub lng: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyRecord {
    pub name: String,
    #[serde(rename = "catchPhrase")]
    pub catch_phrase: String,
    pub bs: String,
}

fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Coordinate {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match Coordinate::deserialize(deserializer)? {
        Coordinate::Text(s) => s,
        Coordinate::Number(n) => n.to_string(),
    })
}

// ============================================================================
// PARSING
// ============================================================================

/// Parse a JSON array of user records
///
/// Malformed JSON, a non-array document or a record missing a field is a
/// `MigrationError::Parse`; nothing is partially returned.
pub fn parse_users(json: &str) -> Result<Vec<UserRecord>> {
    serde_json::from_str(json).map_err(MigrationError::Parse)
}

/// Same as `parse_users` for raw bytes (uploads and HTTP bodies)
pub fn parse_users_bytes(bytes: &[u8]) -> Result<Vec<UserRecord>> {
    serde_json::from_slice(bytes).map_err(MigrationError::Parse)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const USERS_FIXTURE: &str = include_str!("../tests/fixtures/users.json");

    /// Build a record in the feed's shape with a given company
    pub(crate) fn sample_record(id: i64, username: &str, company: &str) -> UserRecord {
        UserRecord {
            id: RecordId::Number(id.into()),
            name: format!("User {}", id),
            username: username.to_string(),
            email: format!("{}@example.com", username),
            address: AddressRecord {
                street: "Kulas Light".to_string(),
                suite: "Apt. 556".to_string(),
                city: "Gwenborough".to_string(),
                zipcode: "92998-3874".to_string(),
                geo: GeoRecord {
                    lat: "-37.3159".to_string(),
                    lng: "81.1496".to_string(),
                },
            },
            phone: "1-770-736-8031 x56442".to_string(),
            website: "hildegard.org".to_string(),
            company: CompanyRecord {
                name: company.to_string(),
                catch_phrase: "Multi-layered client-server neural-net".to_string(),
                bs: "harness real-time e-markets".to_string(),
            },
        }
    }

    #[test]
    fn test_parse_fixture() {
        let users = parse_users(USERS_FIXTURE).unwrap();
        assert_eq!(users.len(), 10);

        let first = &users[0];
        assert_eq!(first.id, RecordId::Number(1.into()));
        assert_eq!(first.username, "Bret");
        assert_eq!(first.address.zipcode, "92998-3874");
        assert_eq!(first.address.geo.lat, "-37.3159");
        assert_eq!(first.company.name, "Romaguera-Crona");
        assert_eq!(first.company.catch_phrase, "Multi-layered client-server neural-net");
    }

    #[test]
    fn test_string_ids_and_numeric_coordinates() {
        let json = r#"[{
            "id": "u-7",
            "name": "Ada",
            "username": "ada",
            "email": "ada@example.com",
            "address": {
                "street": "Main", "suite": "1", "city": "X", "zipcode": "0",
                "geo": { "lat": 12.5, "lng": -3 }
            },
            "phone": "555",
            "website": "ada.dev",
            "company": { "name": "Acme", "catchPhrase": "c", "bs": "b" }
        }]"#;

        let users = parse_users(json).unwrap();
        assert_eq!(users[0].id, RecordId::Text("u-7".to_string()));
        assert_eq!(users[0].id.to_string(), "u-7");
        assert_eq!(users[0].address.geo.lat, "12.5");
        assert_eq!(users[0].address.geo.lng, "-3");
    }

    #[test]
    fn test_ids_outside_i64_are_accepted() {
        let record = |id: &str| {
            format!(
                r#"[{{"id": {id}, "name": "Ada", "username": "ada", "email": "ada@example.com",
                    "address": {{"street": "Main", "suite": "1", "city": "X", "zipcode": "0",
                                 "geo": {{"lat": "1", "lng": "2"}}}},
                    "phone": "555", "website": "ada.dev",
                    "company": {{"name": "Acme", "catchPhrase": "c", "bs": "b"}}}}]"#
            )
        };

        let users = parse_users(&record("1.0")).unwrap();
        assert_eq!(users[0].id.to_string(), "1.0");

        let users = parse_users(&record("18446744073709551615")).unwrap();
        assert_eq!(users[0].id.to_string(), "18446744073709551615");

        let users = parse_users(&record("-4")).unwrap();
        assert_eq!(users[0].id.to_string(), "-4");
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let result = parse_users("[{\"id\": 1,");
        assert!(matches!(result, Err(MigrationError::Parse(_))));

        let result = parse_users_bytes(b"not json at all");
        assert!(matches!(result, Err(MigrationError::Parse(_))));
    }

    #[test]
    fn test_non_array_document_is_parse_error() {
        let result = parse_users(r#"{"users": []}"#);
        assert!(matches!(result, Err(MigrationError::Parse(_))));
    }

    #[test]
    fn test_empty_array() {
        assert!(parse_users("[]").unwrap().is_empty());
    }
}
