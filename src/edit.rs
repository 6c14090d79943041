//! Shift edit session
//!
//! At most one schedule is edited at a time. Its shifts are copied into a
//! buffer keyed by shift id; edits touch only the buffer, and `commit` sends
//! the whole list in one request. A failed commit keeps the session and its
//! buffer so the user can retry or cancel.

use crate::api::ScheduleApi;
use crate::domain::{Schedule, Shift, ShiftField};
use crate::error::{Result, ShiftsyncError};
use crate::session::Session;

#[derive(Debug, Clone)]
pub struct EditSession {
    schedule_id: String,
    original: Vec<Shift>,
    buffer: Vec<Shift>,
}

impl EditSession {
    fn new(schedule: &Schedule) -> Self {
        Self {
            schedule_id: schedule.id.clone(),
            original: schedule.shifts.clone(),
            buffer: schedule.shifts.clone(),
        }
    }

    pub fn schedule_id(&self) -> &str {
        &self.schedule_id
    }

    /// Buffered shifts in the order they will be committed
    pub fn shifts(&self) -> &[Shift] {
        &self.buffer
    }

    pub fn is_dirty(&self) -> bool {
        self.buffer != self.original
    }
}

#[derive(Debug, Default)]
pub struct ShiftEditor {
    active: Option<EditSession>,
}

impl ShiftEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&EditSession> {
        self.active.as_ref()
    }

    pub fn is_editing(&self, schedule_id: &str) -> bool {
        self.active
            .as_ref()
            .map(|s| s.schedule_id == schedule_id)
            .unwrap_or(false)
    }

    /// Start editing `schedule`, discarding any session already open.
    pub fn begin(&mut self, schedule: &Schedule) {
        if let Some(previous) = self.active.take() {
            if previous.is_dirty() {
                tracing::info!(
                    schedule_id = %previous.schedule_id,
                    "Discarding unsaved edits for new edit session"
                );
            }
        }
        self.active = Some(EditSession::new(schedule));
    }

    pub fn cancel(&mut self) -> Option<EditSession> {
        self.active.take()
    }

    fn session_mut(&mut self) -> Result<&mut EditSession> {
        self.active
            .as_mut()
            .ok_or_else(|| ShiftsyncError::InvalidState("no schedule is being edited".to_string()))
    }

    /// Set `start` or `end` of one buffered shift, found by identity.
    pub fn set_field(&mut self, shift_id: &str, field: ShiftField, value: &str) -> Result<()> {
        let value = field.normalize(value)?;
        let session = self.session_mut()?;
        let shift = session
            .buffer
            .iter_mut()
            .find(|s| s.id == shift_id)
            .ok_or_else(|| {
                ShiftsyncError::NotFound(format!("shift {} in schedule {}", shift_id, session.schedule_id))
            })?;
        shift.set(field, value);
        Ok(())
    }

    /// Positional form of `set_field`; the index is resolved to a shift id
    /// against the buffer as it is now.
    pub fn set_field_at(&mut self, index: usize, field: ShiftField, value: &str) -> Result<()> {
        let shift_id = {
            let session = self.session_mut()?;
            session
                .buffer
                .get(index)
                .map(|s| s.id.clone())
                .ok_or_else(|| {
                    ShiftsyncError::InvalidInput(format!(
                        "shift index {} out of range ({} shifts)",
                        index,
                        session.buffer.len()
                    ))
                })?
        };
        self.set_field(&shift_id, field, value)
    }

    /// Send the buffered shifts. On success the session closes and the server
    /// aggregate is returned; on failure the session stays open untouched.
    pub async fn commit(&mut self, api: &dyn ScheduleApi, session: &Session) -> Result<Schedule> {
        let token = session.token()?;
        let edit = self
            .active
            .as_ref()
            .ok_or_else(|| ShiftsyncError::InvalidState("no schedule is being edited".to_string()))?;

        match api.update_schedule(token, &edit.schedule_id, &edit.buffer).await {
            Ok(updated) => {
                tracing::info!(schedule_id = %edit.schedule_id, shifts = edit.buffer.len(), "Committed shift edits");
                self.active = None;
                Ok(updated)
            }
            Err(e) => {
                tracing::warn!(schedule_id = %edit.schedule_id, error = %e, "Commit failed, keeping edit buffer");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockApi;
    use chrono::Utc;

    fn shift(id: &str, start: &str, end: &str) -> Shift {
        Shift {
            id: id.to_string(),
            start: start.to_string(),
            end: end.to_string(),
            days: vec!["Mon".to_string(), "Wed".to_string()],
            employee_id: "e1".to_string(),
        }
    }

    fn schedule(id: &str) -> Schedule {
        Schedule {
            id: id.to_string(),
            date_generated: Utc::now(),
            facility: "f1".to_string(),
            shifts: vec![shift("sh1", "09:00", "17:00"), shift("sh2", "17:00", "23:00")],
        }
    }

    #[test]
    fn test_begin_replaces_active_session() {
        let mut editor = ShiftEditor::new();
        editor.begin(&schedule("s1"));
        editor.set_field("sh1", ShiftField::Start, "08:00").unwrap();
        editor.begin(&schedule("s2"));

        assert!(editor.is_editing("s2"));
        assert!(!editor.is_editing("s1"));
        assert!(!editor.active().unwrap().is_dirty());
    }

    #[test]
    fn test_set_field_touches_only_one_shift() {
        let mut editor = ShiftEditor::new();
        editor.begin(&schedule("s1"));
        editor.set_field("sh2", ShiftField::End, "22:30").unwrap();

        let shifts = editor.active().unwrap().shifts();
        assert_eq!(shifts[0], shift("sh1", "09:00", "17:00"));
        assert_eq!(shifts[1].end, "22:30");
        assert_eq!(shifts[1].start, "17:00");
        assert_eq!(shifts[1].days, vec!["Mon", "Wed"]);
        assert!(editor.active().unwrap().is_dirty());
    }

    #[test]
    fn test_set_field_at_resolves_position() {
        let mut editor = ShiftEditor::new();
        editor.begin(&schedule("s1"));
        editor.set_field_at(0, ShiftField::Start, "7:30").unwrap();
        assert_eq!(editor.active().unwrap().shifts()[0].start, "07:30");

        let err = editor.set_field_at(5, ShiftField::Start, "07:30").unwrap_err();
        assert!(matches!(err, ShiftsyncError::InvalidInput(_)));
    }

    #[test]
    fn test_set_field_rejects_bad_time_and_unknown_shift() {
        let mut editor = ShiftEditor::new();
        editor.begin(&schedule("s1"));
        assert!(editor.set_field("sh1", ShiftField::End, "5pm").is_err());
        assert!(editor.set_field("sh9", ShiftField::End, "17:00").unwrap_err().is_not_found());
        assert!(!editor.active().unwrap().is_dirty());
    }

    #[test]
    fn test_set_field_without_session() {
        let mut editor = ShiftEditor::new();
        let err = editor.set_field("sh1", ShiftField::Start, "08:00").unwrap_err();
        assert!(matches!(err, ShiftsyncError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_commit_success_closes_session() {
        let api = MockApi::new().with_schedules(vec![schedule("s1")]);
        let session = Session::with_token("tok");
        let mut editor = ShiftEditor::new();
        editor.begin(&schedule("s1"));
        editor.set_field("sh1", ShiftField::End, "18:00").unwrap();

        let updated = editor.commit(&api, &session).await.unwrap();

        assert_eq!(updated.shifts[0].end, "18:00");
        assert!(editor.active().is_none());
        assert_eq!(api.calls().update_schedule, 1);
    }

    #[tokio::test]
    async fn test_commit_failure_keeps_buffer() {
        let api = MockApi::new().with_schedules(vec![schedule("s1")]);
        api.set_fail_update(true);
        let session = Session::with_token("tok");
        let mut editor = ShiftEditor::new();
        editor.begin(&schedule("s1"));
        editor.set_field("sh1", ShiftField::End, "18:00").unwrap();

        assert!(editor.commit(&api, &session).await.is_err());

        let active = editor.active().unwrap();
        assert_eq!(active.schedule_id(), "s1");
        assert_eq!(active.shifts()[0].end, "18:00");

        api.set_fail_update(false);
        editor.commit(&api, &session).await.unwrap();
        assert_eq!(api.schedules()[0].shifts[0].end, "18:00");
    }

    #[tokio::test]
    async fn test_commit_without_session_makes_no_request() {
        let api = MockApi::new().with_schedules(vec![schedule("s1")]);
        let mut editor = ShiftEditor::new();
        editor.begin(&schedule("s1"));

        let err = editor.commit(&api, &Session::Anonymous).await.unwrap_err();
        assert!(matches!(err, ShiftsyncError::NoSession));
        assert_eq!(api.calls().total(), 0);
        assert!(editor.active().is_some());
    }
}
