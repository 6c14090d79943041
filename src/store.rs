//! Local schedule collection with explicit per-entry state.
//!
//! Entries move `absent -> pending-create -> present` and
//! `present -> pending-delete -> absent`. A schedule being created has no
//! identity until the server answers, so that leg is tracked by its
//! `CreateTicket` rather than by `EntryState`. Every pending transition is
//! settled by the matching `settle_*` call with the remote outcome; a failed
//! outcome returns to the state before, so nothing is left pending and a
//! failed operation never leaves a partial mutation behind.

use crate::domain::Schedule;
use crate::error::{Result, ShiftsyncError};

/// Client-visible state of one schedule identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    Absent,
    Present,
    PendingDelete,
}

/// Handle for an in-flight create; the schedule has no identity until the
/// server answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTicket {
    id: u64,
    pub facility_id: String,
}

#[derive(Debug, Clone)]
struct Entry {
    schedule: Schedule,
    pending_delete: bool,
}

#[derive(Debug, Default)]
pub struct ScheduleStore {
    entries: Vec<Entry>,
    pending_creates: Vec<CreateTicket>,
    next_ticket: u64,
}

impl ScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules in display order, including ones awaiting delete confirmation.
    pub fn list(&self) -> Vec<&Schedule> {
        self.entries.iter().map(|e| &e.schedule).collect()
    }

    /// Owned copy of the collection, for handing to other components.
    pub fn snapshot(&self) -> Vec<Schedule> {
        self.entries.iter().map(|e| e.schedule.clone()).collect()
    }

    pub fn get(&self, schedule_id: &str) -> Option<&Schedule> {
        self.position(schedule_id).map(|i| &self.entries[i].schedule)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn state_of(&self, schedule_id: &str) -> EntryState {
        match self.position(schedule_id) {
            Some(i) if self.entries[i].pending_delete => EntryState::PendingDelete,
            Some(_) => EntryState::Present,
            None => EntryState::Absent,
        }
    }

    pub fn pending_creates(&self) -> &[CreateTicket] {
        &self.pending_creates
    }

    fn position(&self, schedule_id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.schedule.id == schedule_id)
    }

    /// Replace the collection with a fresh listing. Duplicate identities keep
    /// their first occurrence. Pending deletes on surviving ids stay pending.
    pub fn replace_all(&mut self, schedules: Vec<Schedule>) {
        let mut entries: Vec<Entry> = Vec::with_capacity(schedules.len());
        for schedule in schedules {
            if entries.iter().any(|e| e.schedule.id == schedule.id) {
                tracing::warn!(schedule_id = %schedule.id, "Duplicate schedule in listing, keeping first");
                continue;
            }
            let pending_delete = self
                .position(&schedule.id)
                .map(|i| self.entries[i].pending_delete)
                .unwrap_or(false);
            entries.push(Entry {
                schedule,
                pending_delete,
            });
        }
        self.entries = entries;
    }

    /// `absent -> pending-create`
    pub fn begin_create(&mut self, facility_id: &str) -> CreateTicket {
        self.next_ticket += 1;
        let ticket = CreateTicket {
            id: self.next_ticket,
            facility_id: facility_id.to_string(),
        };
        self.pending_creates.push(ticket.clone());
        ticket
    }

    /// `pending-create -> present` on success, back to `absent` on failure.
    /// An identity already in the collection is replaced in place.
    pub fn settle_create(&mut self, ticket: &CreateTicket, outcome: Result<Schedule>) -> Result<Schedule> {
        let before = self.pending_creates.len();
        self.pending_creates.retain(|t| t.id != ticket.id);
        if self.pending_creates.len() == before {
            return Err(ShiftsyncError::InvalidState(format!(
                "create ticket {} is not pending",
                ticket.id
            )));
        }

        let schedule = outcome?;
        match self.position(&schedule.id) {
            Some(i) => {
                tracing::warn!(schedule_id = %schedule.id, "Created schedule already present, replacing");
                self.entries[i] = Entry {
                    schedule: schedule.clone(),
                    pending_delete: false,
                };
            }
            None => self.entries.push(Entry {
                schedule: schedule.clone(),
                pending_delete: false,
            }),
        }
        Ok(schedule)
    }

    /// `present -> pending-delete`
    pub fn begin_delete(&mut self, schedule_id: &str) -> Result<()> {
        let i = self
            .position(schedule_id)
            .ok_or_else(|| ShiftsyncError::NotFound(format!("schedule {}", schedule_id)))?;
        if self.entries[i].pending_delete {
            return Err(ShiftsyncError::InvalidState(format!(
                "schedule {} already has a delete in flight",
                schedule_id
            )));
        }
        self.entries[i].pending_delete = true;
        Ok(())
    }

    /// `pending-delete -> absent` on success, back to `present` on failure.
    pub fn settle_delete(&mut self, schedule_id: &str, outcome: Result<()>) -> Result<()> {
        let i = match self.position(schedule_id) {
            Some(i) if self.entries[i].pending_delete => i,
            _ => {
                return Err(ShiftsyncError::InvalidState(format!(
                    "schedule {} has no delete in flight",
                    schedule_id
                )));
            }
        };

        match outcome {
            Ok(()) => {
                self.entries.remove(i);
                Ok(())
            }
            Err(e) => {
                self.entries[i].pending_delete = false;
                Err(e)
            }
        }
    }

    /// Swap in a server-returned aggregate for an existing identity.
    pub fn apply_update(&mut self, schedule: Schedule) -> Result<()> {
        let i = self
            .position(&schedule.id)
            .ok_or_else(|| ShiftsyncError::NotFound(format!("schedule {}", schedule.id)))?;
        self.entries[i].schedule = schedule;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn schedule(id: &str) -> Schedule {
        Schedule {
            id: id.to_string(),
            date_generated: Utc::now(),
            facility: "f1".to_string(),
            shifts: vec![],
        }
    }

    fn ids(store: &ScheduleStore) -> Vec<String> {
        store.list().iter().map(|s| s.id.clone()).collect()
    }

    fn store_with(ids: &[&str]) -> ScheduleStore {
        let mut store = ScheduleStore::new();
        store.replace_all(ids.iter().map(|id| schedule(id)).collect());
        store
    }

    #[test]
    fn test_replace_all_drops_duplicate_identities() {
        let store = store_with(&["s1", "s2", "s1", "s3"]);
        assert_eq!(ids(&store), vec!["s1", "s2", "s3"]);
    }

    #[test]
    fn test_create_success_appends() {
        let mut store = store_with(&["s1"]);
        let ticket = store.begin_create("f1");
        assert_eq!(store.pending_creates().len(), 1);

        let created = store.settle_create(&ticket, Ok(schedule("s2"))).unwrap();
        assert_eq!(created.id, "s2");
        assert_eq!(ids(&store), vec!["s1", "s2"]);
        assert_eq!(store.state_of("s2"), EntryState::Present);
        assert!(store.pending_creates().is_empty());
    }

    #[test]
    fn test_create_failure_leaves_collection_unchanged() {
        let mut store = store_with(&["s1", "s2"]);
        let before = store.snapshot();

        let ticket = store.begin_create("f1");
        let result = store.settle_create(
            &ticket,
            Err(ShiftsyncError::Api {
                status: 500,
                message: "generator crashed".to_string(),
            }),
        );

        assert!(result.is_err());
        assert_eq!(store.snapshot(), before);
        assert!(store.pending_creates().is_empty());
    }

    #[test]
    fn test_create_with_existing_identity_replaces() {
        let mut store = store_with(&["s1", "s2"]);
        let mut updated = schedule("s1");
        updated.facility = "f9".to_string();

        let ticket = store.begin_create("f9");
        store.settle_create(&ticket, Ok(updated)).unwrap();

        assert_eq!(ids(&store), vec!["s1", "s2"]);
        assert_eq!(store.get("s1").unwrap().facility, "f9");
    }

    #[test]
    fn test_settle_unknown_ticket() {
        let mut store = ScheduleStore::new();
        let ticket = store.begin_create("f1");
        store.settle_create(&ticket, Ok(schedule("s1"))).unwrap();
        let again = store.settle_create(&ticket, Ok(schedule("s2")));
        assert!(matches!(again, Err(ShiftsyncError::InvalidState(_))));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_delete_success_preserves_order_of_others() {
        let mut store = store_with(&["s1", "s2", "s3", "s4"]);
        store.begin_delete("s2").unwrap();
        assert_eq!(store.state_of("s2"), EntryState::PendingDelete);

        store.settle_delete("s2", Ok(())).unwrap();
        assert_eq!(ids(&store), vec!["s1", "s3", "s4"]);
        assert_eq!(store.state_of("s2"), EntryState::Absent);
    }

    #[test]
    fn test_delete_failure_reverts_to_present() {
        let mut store = store_with(&["s1", "s2"]);
        let before = store.snapshot();

        store.begin_delete("s1").unwrap();
        let result = store.settle_delete("s1", Err(ShiftsyncError::Network("refused".to_string())));

        assert!(matches!(result, Err(ShiftsyncError::Network(_))));
        assert_eq!(store.state_of("s1"), EntryState::Present);
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_double_delete_rejected() {
        let mut store = store_with(&["s1"]);
        store.begin_delete("s1").unwrap();
        assert!(matches!(store.begin_delete("s1"), Err(ShiftsyncError::InvalidState(_))));
    }

    #[test]
    fn test_delete_unknown_schedule() {
        let mut store = store_with(&["s1"]);
        assert!(store.begin_delete("nope").unwrap_err().is_not_found());
        assert!(matches!(
            store.settle_delete("s1", Ok(())),
            Err(ShiftsyncError::InvalidState(_))
        ));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_apply_update_replaces_in_place() {
        let mut store = store_with(&["s1", "s2"]);
        let mut updated = schedule("s2");
        updated.facility = "f2".to_string();
        store.apply_update(updated).unwrap();
        assert_eq!(store.get("s2").unwrap().facility, "f2");
        assert!(store.apply_update(schedule("zz")).is_err());
    }
}
