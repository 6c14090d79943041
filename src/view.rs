//! Schedules view session
//!
//! Owns everything the schedules screen mutates: the schedule collection, the
//! employee name cache, the shift edit session and the pending confirmation.
//! All mutation goes through `&mut self`, so one operation settles before the
//! next begins. Dropping the view (or an operation's future) abandons any
//! in-flight requests; their results are never applied.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::api::ScheduleApi;
use crate::domain::{Employee, Facility, Notification, Schedule, ShiftField};
use crate::edit::ShiftEditor;
use crate::error::{Result, ShiftsyncError};
use crate::names::{DEFAULT_MAX_CONCURRENT_LOOKUPS, NameCache, ResolveReport};
use crate::notify::{DEFAULT_MAX_CONCURRENT_SENDS, DispatchReport, NotificationDispatcher};
use crate::session::Session;
use crate::store::{EntryState, ScheduleStore};

#[derive(Debug, Clone)]
pub struct ViewConfig {
    pub max_concurrent_lookups: usize,
    pub max_concurrent_sends: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            max_concurrent_lookups: DEFAULT_MAX_CONCURRENT_LOOKUPS,
            max_concurrent_sends: DEFAULT_MAX_CONCURRENT_SENDS,
        }
    }
}

/// Action waiting for the user to confirm
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingAction {
    DeleteSchedule { schedule_id: String },
    NotifySchedule { schedule_id: String },
}

impl PendingAction {
    /// Question shown to the user
    pub fn prompt(&self) -> &'static str {
        match self {
            PendingAction::DeleteSchedule { .. } => "Are you sure you want to delete schedule?",
            PendingAction::NotifySchedule { .. } => "Send notifs to employees?",
        }
    }

    pub fn schedule_id(&self) -> &str {
        match self {
            PendingAction::DeleteSchedule { schedule_id } | PendingAction::NotifySchedule { schedule_id } => {
                schedule_id
            }
        }
    }
}

/// What a confirmed action did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmed {
    Deleted { schedule_id: String },
    Notified(DispatchReport),
}

/// One rendered shift row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShiftLine {
    pub shift_id: String,
    pub employee_id: String,
    pub employee_name: String,
    pub start: String,
    pub end: String,
    pub days: String,
}

/// One rendered schedule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleCard {
    pub schedule_id: String,
    pub date_generated: DateTime<Utc>,
    pub state: EntryState,
    /// Rows show buffered values when true
    pub editing: bool,
    pub shifts: Vec<ShiftLine>,
}

/// A sent notification with the recipient's display name
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationLine {
    pub notification: Notification,
    pub employee_name: String,
}

pub struct SchedulesView {
    api: Arc<dyn ScheduleApi>,
    session: Session,
    store: ScheduleStore,
    names: NameCache,
    editor: ShiftEditor,
    dispatcher: NotificationDispatcher,
    pending: Option<PendingAction>,
    loaded: bool,
    resolved: bool,
}

impl SchedulesView {
    pub fn new(api: Arc<dyn ScheduleApi>, session: Session, config: ViewConfig) -> Self {
        Self {
            api,
            session,
            store: ScheduleStore::new(),
            names: NameCache::new(config.max_concurrent_lookups),
            editor: ShiftEditor::new(),
            dispatcher: NotificationDispatcher::new(config.max_concurrent_sends),
            pending: None,
            loaded: false,
            resolved: false,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn store(&self) -> &ScheduleStore {
        &self.store
    }

    pub fn names(&self) -> &NameCache {
        &self.names
    }

    pub fn editor(&self) -> &ShiftEditor {
        &self.editor
    }

    pub fn pending(&self) -> Option<&PendingAction> {
        self.pending.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Current schedules in display order
    pub fn list(&self) -> Vec<&Schedule> {
        self.store.list()
    }

    /// Fetch the listing once, without resolving any names. Enough for
    /// operations that never display an employee.
    pub async fn load_listing(&mut self) -> Result<()> {
        if self.loaded {
            return Ok(());
        }

        let token = self.session.token()?;
        let schedules = self.api.list_schedules(token).await?;
        tracing::info!(count = schedules.len(), "Loaded schedules");
        self.store.replace_all(schedules);
        self.loaded = true;
        Ok(())
    }

    /// First load for this activation: fetch schedules if needed and resolve
    /// every employee they reference. Later calls are no-ops.
    pub async fn activate(&mut self) -> Result<Option<ResolveReport>> {
        if self.resolved {
            return Ok(None);
        }

        self.load_listing().await?;
        let snapshot = self.store.snapshot();
        let report = self.names.resolve(self.api.as_ref(), &self.session, &snapshot).await?;
        self.resolved = true;
        Ok(Some(report))
    }

    /// Re-fetch the listing, resolving only employees not seen before.
    pub async fn reload(&mut self) -> Result<ResolveReport> {
        let token = self.session.token()?;
        let schedules = self.api.list_schedules(token).await?;
        self.store.replace_all(schedules);
        self.loaded = true;

        let snapshot = self.store.snapshot();
        let report = self.names.extend(self.api.as_ref(), &self.session, &snapshot).await?;
        self.resolved = true;
        Ok(report)
    }

    /// Generate a schedule for `facility_id` and append it. Names for new
    /// employees are resolved afterwards; on failure nothing changes locally.
    pub async fn create(&mut self, facility_id: &str) -> Result<Schedule> {
        let token = self.session.token()?;

        let ticket = self.store.begin_create(facility_id);
        let outcome = self.api.generate_schedule(token, facility_id).await;
        let schedule = self.store.settle_create(&ticket, outcome).inspect_err(|e| {
            tracing::warn!(facility_id = %facility_id, error = %e, "Error creating schedule");
        })?;

        self.names
            .extend(self.api.as_ref(), &self.session, std::slice::from_ref(&schedule))
            .await?;
        Ok(schedule)
    }

    /// Generate a schedule for the session's active facility.
    pub async fn generate(&mut self) -> Result<Schedule> {
        let facility = self.facility().await?;
        self.create(&facility.id).await
    }

    fn require_present(&self, schedule_id: &str) -> Result<()> {
        match self.store.state_of(schedule_id) {
            EntryState::Absent => Err(ShiftsyncError::NotFound(format!("schedule {}", schedule_id))),
            _ => Ok(()),
        }
    }

    /// Open the delete confirmation. Nothing is sent until `confirm`.
    pub fn request_delete(&mut self, schedule_id: &str) -> Result<()> {
        self.require_present(schedule_id)?;
        self.pending = Some(PendingAction::DeleteSchedule {
            schedule_id: schedule_id.to_string(),
        });
        Ok(())
    }

    /// Open the notify confirmation. Nothing is sent until `confirm`.
    pub fn request_notify(&mut self, schedule_id: &str) -> Result<()> {
        self.require_present(schedule_id)?;
        self.pending = Some(PendingAction::NotifySchedule {
            schedule_id: schedule_id.to_string(),
        });
        Ok(())
    }

    /// Dismiss the confirmation without doing anything
    pub fn cancel_pending(&mut self) -> Option<PendingAction> {
        self.pending.take()
    }

    /// Run the confirmed action.
    ///
    /// A failed delete keeps the confirmation open for another try. A notify
    /// batch clears it once every send has settled, whatever their outcome.
    pub async fn confirm(&mut self) -> Result<Confirmed> {
        let action = self
            .pending
            .take()
            .ok_or_else(|| ShiftsyncError::InvalidState("nothing to confirm".to_string()))?;

        let result = match &action {
            PendingAction::DeleteSchedule { schedule_id } => self.delete_confirmed(schedule_id).await,
            PendingAction::NotifySchedule { schedule_id } => self.notify_confirmed(schedule_id).await,
        };

        if result.is_err() {
            self.pending = Some(action);
        }
        result
    }

    async fn delete_confirmed(&mut self, schedule_id: &str) -> Result<Confirmed> {
        let token = self.session.token()?;

        self.store.begin_delete(schedule_id)?;
        let outcome = self.api.delete_schedule(token, schedule_id).await;
        self.store.settle_delete(schedule_id, outcome).inspect_err(|e| {
            tracing::warn!(schedule_id = %schedule_id, error = %e, "Error deleting schedule");
        })?;

        if self.editor.is_editing(schedule_id) {
            self.editor.cancel();
        }
        tracing::info!(schedule_id = %schedule_id, "Deleted schedule");
        Ok(Confirmed::Deleted {
            schedule_id: schedule_id.to_string(),
        })
    }

    async fn notify_confirmed(&mut self, schedule_id: &str) -> Result<Confirmed> {
        let schedule = self
            .store
            .get(schedule_id)
            .cloned()
            .ok_or_else(|| ShiftsyncError::NotFound(format!("schedule {}", schedule_id)))?;

        let report = self
            .dispatcher
            .dispatch(self.api.as_ref(), &self.session, &schedule, &self.names)
            .await?;
        Ok(Confirmed::Notified(report))
    }

    /// Start editing one schedule's shifts
    pub fn begin_edit(&mut self, schedule_id: &str) -> Result<()> {
        let schedule = self
            .store
            .get(schedule_id)
            .ok_or_else(|| ShiftsyncError::NotFound(format!("schedule {}", schedule_id)))?;
        self.editor.begin(schedule);
        Ok(())
    }

    pub fn set_shift_field(&mut self, shift_id: &str, field: ShiftField, value: &str) -> Result<()> {
        self.editor.set_field(shift_id, field, value)
    }

    pub fn set_shift_field_at(&mut self, index: usize, field: ShiftField, value: &str) -> Result<()> {
        self.editor.set_field_at(index, field, value)
    }

    pub fn cancel_edit(&mut self) {
        self.editor.cancel();
    }

    /// Commit the edit buffer, then re-fetch the listing so server-derived
    /// fields are current. A failed re-fetch is logged; the committed
    /// aggregate has already replaced the local copy.
    pub async fn commit_edit(&mut self) -> Result<Schedule> {
        let updated = self.editor.commit(self.api.as_ref(), &self.session).await?;
        if let Err(e) = self.store.apply_update(updated.clone()) {
            tracing::warn!(schedule_id = %updated.id, error = %e, "Committed schedule missing locally");
        }

        if let Err(e) = self.reload().await {
            tracing::warn!(error = %e, "Re-fetch after commit failed");
        }
        Ok(updated)
    }

    /// Schedules with names substituted, ready to display.
    pub fn render(&self) -> Vec<ScheduleCard> {
        self.store
            .list()
            .into_iter()
            .map(|schedule| {
                let editing = self.editor.is_editing(&schedule.id);
                let shifts = match self.editor.active() {
                    Some(edit) if editing => edit.shifts(),
                    _ => schedule.shifts.as_slice(),
                };

                ScheduleCard {
                    schedule_id: schedule.id.clone(),
                    date_generated: schedule.date_generated,
                    state: self.store.state_of(&schedule.id),
                    editing,
                    shifts: shifts
                        .iter()
                        .map(|shift| ShiftLine {
                            shift_id: shift.id.clone(),
                            employee_id: shift.employee_id.clone(),
                            employee_name: self.names.display_name(&shift.employee_id).to_string(),
                            start: shift.start.clone(),
                            end: shift.end.clone(),
                            days: shift.days_label(),
                        })
                        .collect(),
                }
            })
            .collect()
    }

    pub async fn facility(&self) -> Result<Facility> {
        let token = self.session.token()?;
        self.api.get_facility(token).await
    }

    pub async fn employees(&self) -> Result<Vec<Employee>> {
        let token = self.session.token()?;
        self.api.list_employees(token).await
    }

    /// Sent notifications with recipient names; unknown recipients resolve
    /// through the name cache like shifts do.
    pub async fn notifications(&mut self) -> Result<Vec<NotificationLine>> {
        let token = self.session.token()?;
        let notifications = self.api.list_notifications(token).await?;

        let ids = notifications.iter().map(|n| n.employee_id.clone());
        self.names
            .extend_ids(self.api.as_ref(), &self.session, ids.collect::<Vec<_>>())
            .await?;

        Ok(notifications
            .into_iter()
            .map(|notification| NotificationLine {
                employee_name: self.names.display_name(&notification.employee_id).to_string(),
                notification,
            })
            .collect())
    }

    /// Free-text message to one employee
    pub async fn notify_employee(&self, employee_id: &str, message: &str) -> Result<Notification> {
        self.dispatcher
            .send_direct(self.api.as_ref(), &self.session, employee_id, message)
            .await
    }
}

impl std::fmt::Debug for SchedulesView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchedulesView")
            .field("session", &self.session)
            .field("schedules", &self.store.len())
            .field("names", &self.names.len())
            .field("pending", &self.pending)
            .field("loaded", &self.loaded)
            .field("resolved", &self.resolved)
            .finish()
    }
}
