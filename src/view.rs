// 👀 Display View - migrated users paired with their company
// Shared by the `list` command, the TUI and the web page.

use crate::entities::{CompanyEntity, UserEntity};
use crate::error::Result;
use crate::store::{EntityKind, EntityStore};
use serde::Serialize;
use tracing::warn;

/// Text shown instead of the listing when nothing has been migrated yet
pub const EMPTY_TEXT: &str = "Please run the migration first.";

#[derive(Debug, Clone, Serialize)]
pub struct UserRow {
    pub user: UserEntity,
    pub company: CompanyEntity,
}

/// All published users, in creation order, with their resolved company
///
/// A user whose company reference does not resolve is skipped.
pub fn load_user_rows<S: EntityStore + ?Sized>(store: &S) -> Result<Vec<UserRow>> {
    let mut rows = Vec::new();

    for entity in store.load_by_type(EntityKind::User)? {
        let user = UserEntity::from_stored(&entity)?;

        let company = match store.load(user.company)? {
            Some(stored) if stored.kind == EntityKind::Company => {
                CompanyEntity::from_stored(&stored)?
            }
            _ => {
                warn!(
                    user = %user.title,
                    company_id = user.company.0,
                    "company reference does not resolve"
                );
                continue;
            }
        };

        rows.push(UserRow { user, company });
    }

    Ok(rows)
}

/// Labeled multi-line block for one user
pub fn render_user(user: &UserEntity) -> String {
    let lines = [
        format!("Username: {}", user.title),
        format!("ID: {}", user.external_id),
        format!("Name: {}", user.name),
        format!("Phone: {}{}", user.phone, user.phone_ext),
        format!("Email: {}", user.email),
        format!("Website: {}", user.website),
        format!("Address: {}", user.street),
        user.suite.clone(),
        user.city.clone(),
        user.zip.clone(),
        format!("Latitude: {}", user.latitude),
        format!("Longitude: {}", user.longitude),
    ];
    lines.join("\n\n")
}

/// Labeled multi-line block for one company
pub fn render_company(company: &CompanyEntity) -> String {
    let lines = [
        format!("Name: {}", company.title),
        format!("Catchphrase: {}", company.catchphrase),
        format!("BS: {}", company.jargon),
    ];
    lines.join("\n\n")
}

/// Plain-text listing used by `user-migration list`
pub fn render_listing(rows: &[UserRow]) -> String {
    if rows.is_empty() {
        return EMPTY_TEXT.to_string();
    }

    let separator = "─".repeat(40);
    rows.iter()
        .map(|row| {
            format!(
                "{}\n\n{}",
                render_user(&row.user),
                render_company(&row.company)
            )
        })
        .collect::<Vec<_>>()
        .join(&format!("\n{}\n", separator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messenger::MessageLog;
    use crate::migrate::Migrator;
    use crate::parser::tests::USERS_FIXTURE;
    use crate::store::{EntityId, MemoryStore};

    fn migrated_store() -> MemoryStore {
        let store = MemoryStore::new();
        let log = MessageLog::new();
        Migrator::new(&store, &log)
            .migrate_payload(USERS_FIXTURE.as_bytes())
            .unwrap();
        store
    }

    #[test]
    fn test_rows_pair_users_with_companies() {
        let store = migrated_store();
        let rows = load_user_rows(&store).unwrap();

        assert_eq!(rows.len(), 10);
        assert_eq!(rows[0].user.title, "Bret");
        assert_eq!(rows[0].company.title, "Romaguera-Crona");
        assert_eq!(rows[9].company.title, "Hoeger LLC");
    }

    #[test]
    fn test_render_user_block() {
        let store = migrated_store();
        let rows = load_user_rows(&store).unwrap();
        let block = render_user(&rows[0].user);

        assert!(block.starts_with("Username: Bret\n\nID: 1\n\nName: Leanne Graham"));
        assert!(block.contains("Phone: 1-770-736-8031x56442"));
        assert!(block.contains("Website: https://hildegard.org"));
        assert!(block.contains("Address: Kulas Light\n\nApt. 556\n\nGwenborough\n\n92998-3874"));
        assert!(block.ends_with("Longitude: 81.1496"));
    }

    #[test]
    fn test_render_company_block() {
        let store = migrated_store();
        let rows = load_user_rows(&store).unwrap();

        assert_eq!(
            render_company(&rows[1].company),
            "Name: Deckow-Crist\n\nCatchphrase: Proactive didactic contingency\n\nBS: synergize scalable supply-chains"
        );
    }

    #[test]
    fn test_empty_listing() {
        let store = MemoryStore::new();
        let rows = load_user_rows(&store).unwrap();
        assert_eq!(render_listing(&rows), EMPTY_TEXT);
    }

    #[test]
    fn test_dangling_company_reference_is_skipped() {
        let store = migrated_store();
        let mut fields = store.load(EntityId(2)).unwrap().unwrap().fields;
        fields["company"] = serde_json::json!(9999);
        store.create(EntityKind::User, "ghost", fields).unwrap();

        assert_eq!(load_user_rows(&store).unwrap().len(), 10);
    }
}
