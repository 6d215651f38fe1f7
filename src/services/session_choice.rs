//! Picking the session an interactive command works on

use crate::models::SessionRecord;
use crate::session::SessionStore;
use anyhow::Result;
use std::path::PathBuf;
use tracing::info;

/// How the user asked to start an interactive stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionChoice {
    /// Resume the latest unfinished session if there is one
    Auto,
    /// Always start over
    Fresh,
    /// Resume the latest unfinished session; start over if there is none
    Latest,
    /// Resume a specific session by full or short id
    Id(String),
    /// Resume from a session file at an arbitrary path
    File(PathBuf),
}

/// Returns the record to resume, or `None` to start a fresh session
pub fn select_session<R: SessionRecord>(
    store: &SessionStore,
    choice: &SessionChoice,
) -> Result<Option<R>> {
    let record = match choice {
        SessionChoice::Fresh => None,
        SessionChoice::Auto | SessionChoice::Latest => store.latest_incomplete::<R>()?,
        SessionChoice::Id(id) => Some(store.load::<R>(id)?),
        SessionChoice::File(path) => Some(store.load_file::<R>(path)?),
    };

    match &record {
        Some(record) => info!(
            kind = %R::KIND,
            session_id = record.session_id(),
            processed = record.processed_count(),
            total = record.items().len(),
            "Found session to resume"
        ),
        None if *choice == SessionChoice::Latest => {
            info!(kind = %R::KIND, "No unfinished session, starting a new one")
        }
        None => {}
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::session::fixtures::work_item;
    use crate::models::AuditSession;
    use crate::persist::write_json_atomic;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    fn paused() -> AuditSession {
        AuditSession::new(vec![work_item("a.py", "f")], BTreeMap::new(), serde_json::json!({}))
    }

    #[test]
    fn test_choices() {
        let temp = TempDir::new().unwrap();
        let store = SessionStore::new(temp.path().join("sessions"));

        assert!(select_session::<AuditSession>(&store, &SessionChoice::Auto)
            .unwrap()
            .is_none());

        let session = paused();
        store.save(&session).unwrap();

        assert!(select_session::<AuditSession>(&store, &SessionChoice::Fresh)
            .unwrap()
            .is_none());
        let latest: AuditSession = select_session(&store, &SessionChoice::Latest)
            .unwrap()
            .unwrap();
        assert_eq!(latest, session);
        let by_id: AuditSession =
            select_session(&store, &SessionChoice::Id(session.header.session_id.clone()))
                .unwrap()
                .unwrap();
        assert_eq!(by_id, session);
    }

    #[test]
    fn test_resume_from_file() {
        let temp = TempDir::new().unwrap();
        let store = SessionStore::new(temp.path().join("sessions"));
        let session = paused();
        let path = temp.path().join("exported.json");
        write_json_atomic(&path, &session).unwrap();

        let loaded: AuditSession = select_session(&store, &SessionChoice::File(path))
            .unwrap()
            .unwrap();
        assert_eq!(loaded, session);
    }
}
