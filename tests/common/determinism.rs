//! Fixed ids and time for reproducible fixtures

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use subchat::clock::ManualClock;
use subchat::data::{Session, SessionId, SessionMode, Workspace, WorkspaceId};
use uuid::Uuid;

/// Hands out sequential UUIDs
///
/// ```ignore
/// let ids = DeterministicIds::default();
/// let ws = ids.workspace();
/// let chat = ids.session();
/// ```
#[derive(Default)]
pub struct DeterministicIds {
    issued: AtomicU64,
}

impl DeterministicIds {
    pub fn next(&self) -> Uuid {
        Uuid::from_u128(u128::from(self.issued.fetch_add(1, Ordering::Relaxed) + 1))
    }

    pub fn workspace(&self) -> WorkspaceId {
        WorkspaceId(self.next())
    }

    pub fn session(&self) -> SessionId {
        SessionId(self.next())
    }

    pub fn issued(&self) -> u64 {
        self.issued.load(Ordering::Relaxed)
    }
}

/// 2025-01-01 00:00:00 UTC
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

/// A manual clock whose wall time starts at [`test_now`]
pub fn test_clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(test_now()))
}

/// A workspace last touched `age_s` seconds before [`test_now`]
pub fn workspace(ids: &DeterministicIds, name: &str, age_s: i64) -> Workspace {
    let mut workspace = Workspace::new(Uuid::nil(), name, "main", false, test_now());
    workspace.id = ids.workspace();
    workspace.updated_at = test_now() - chrono::Duration::seconds(age_s);
    workspace
}

pub fn session(ids: &DeterministicIds, workspace_id: WorkspaceId, name: &str, age_s: i64) -> Session {
    let mut session = Session::new(workspace_id, SessionMode::Agent, test_now()).with_name(name);
    session.id = ids.session();
    session.updated_at = test_now() - chrono::Duration::seconds(age_s);
    session
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use subchat::clock::Clock;

    #[test]
    fn test_ids_are_sequential_and_shared_across_kinds() {
        let ids = DeterministicIds::default();
        assert_eq!(ids.workspace().0, Uuid::from_u128(1));
        assert_eq!(ids.session().0, Uuid::from_u128(2));
        assert_eq!(ids.issued(), 2);
    }

    #[test]
    fn test_now_is_new_year_2025() {
        assert_eq!(test_now().to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_clock_moves_only_when_advanced() {
        let clock = test_clock();
        let start = clock.now();
        assert_eq!(clock.now(), start);

        clock.advance(Duration::from_millis(20));
        assert_eq!(clock.now() - start, Duration::from_millis(20));
        assert_eq!(clock.wall(), test_now() + chrono::Duration::milliseconds(20));
    }

    #[test]
    fn test_session_helper_orders_by_age() {
        let ids = DeterministicIds::default();
        let ws = workspace(&ids, "alpha", 0);
        let newer = session(&ids, ws.id, "newer", 1);
        let older = session(&ids, ws.id, "older", 5);
        assert!(newer.updated_at > older.updated_at);
        assert_eq!(newer.workspace_id, ws.id);
    }
}
