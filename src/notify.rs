//! Per-shift notification fan-out
//!
//! One message per shift, each sent as its own request. A failed send is
//! logged and recorded in the report; it never stops the other sends or fails
//! the dispatch. There is no retry queue.

use futures::stream::{self, StreamExt};

use crate::api::ScheduleApi;
use crate::domain::facility::FACILITY_PLACEHOLDER;
use crate::domain::{NewNotification, Notification, Schedule, Shift, ShiftRef};
use crate::error::{Result, ShiftsyncError};
use crate::names::NameCache;
use crate::session::Session;

pub const DEFAULT_MAX_CONCURRENT_SENDS: usize = 4;

/// Text sent to the employee working `shift`
pub fn compose_message(employee_name: &str, facility_name: &str, shift: &Shift) -> String {
    format!(
        "Hi {}! Your shift details at {} are as follows:\nShift: {} - {}\nDays: {}",
        employee_name,
        facility_name,
        shift.start,
        shift.end,
        shift.days_label()
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedSend {
    pub shift: ShiftRef,
    pub error: String,
}

/// Which shifts were notified. Both lists follow the schedule's shift order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub schedule_id: String,
    pub sent: Vec<ShiftRef>,
    pub failed: Vec<FailedSend>,
}

impl DispatchReport {
    pub fn total(&self) -> usize {
        self.sent.len() + self.failed.len()
    }

    pub fn all_sent(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct NotificationDispatcher {
    max_concurrent_sends: usize,
}

impl Default for NotificationDispatcher {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENT_SENDS)
    }
}

impl NotificationDispatcher {
    pub fn new(max_concurrent_sends: usize) -> Self {
        Self {
            max_concurrent_sends: max_concurrent_sends.max(1),
        }
    }

    /// Notify every shift of `schedule`. Only a missing session fails the
    /// call; per-shift failures land in `DispatchReport::failed`.
    pub async fn dispatch(
        &self,
        api: &dyn ScheduleApi,
        session: &Session,
        schedule: &Schedule,
        names: &NameCache,
    ) -> Result<DispatchReport> {
        let token = session.token()?;

        // Once per dispatch, not per shift
        let facility_name = match api.get_facility(token).await {
            Ok(facility) => facility.display_name().to_string(),
            Err(e) => {
                tracing::warn!(error = %e, "Facility lookup failed, using placeholder name");
                FACILITY_PLACEHOLDER.to_string()
            }
        };

        let outgoing: Vec<(usize, ShiftRef, NewNotification)> = schedule
            .shifts
            .iter()
            .enumerate()
            .map(|(index, shift)| {
                let message = compose_message(names.display_name(&shift.employee_id), &facility_name, shift);
                (
                    index,
                    shift.to_ref(&schedule.id),
                    NewNotification::new(shift.employee_id.clone(), message),
                )
            })
            .collect();

        let mut outcomes: Vec<(usize, ShiftRef, Result<Notification>)> = stream::iter(outgoing)
            .map(move |(index, shift, notification)| async move {
                let outcome = api.send_notification(token, &notification).await;
                (index, shift, outcome)
            })
            .buffer_unordered(self.max_concurrent_sends)
            .collect()
            .await;
        outcomes.sort_by_key(|(index, _, _)| *index);

        let mut report = DispatchReport {
            schedule_id: schedule.id.clone(),
            ..Default::default()
        };
        for (_, shift, outcome) in outcomes {
            match outcome {
                Ok(notification) => {
                    tracing::debug!(
                        shift_id = %shift.shift_id,
                        notification_id = %notification.id,
                        "Notification sent"
                    );
                    report.sent.push(shift);
                }
                Err(e) => {
                    tracing::error!(shift_id = %shift.shift_id, error = %e, "Error sending notification for shift");
                    report.failed.push(FailedSend {
                        shift,
                        error: e.to_string(),
                    });
                }
            }
        }

        tracing::info!(
            schedule_id = %report.schedule_id,
            sent = report.sent.len(),
            failed = report.failed.len(),
            "Notification dispatch finished"
        );
        Ok(report)
    }

    /// Free-text message to a single employee. Failures propagate.
    pub async fn send_direct(
        &self,
        api: &dyn ScheduleApi,
        session: &Session,
        employee_id: &str,
        message: &str,
    ) -> Result<Notification> {
        let token = session.token()?;
        if message.trim().is_empty() {
            return Err(ShiftsyncError::InvalidInput("message must not be empty".to_string()));
        }
        api.send_notification(token, &NewNotification::new(employee_id, message))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockApi;
    use crate::domain::Facility;
    use crate::names::DELETED_EMPLOYEE;
    use chrono::Utc;

    fn shift(id: &str, employee_id: &str) -> Shift {
        Shift {
            id: id.to_string(),
            start: "09:00".to_string(),
            end: "17:00".to_string(),
            days: vec!["Mon".to_string(), "Wed".to_string()],
            employee_id: employee_id.to_string(),
        }
    }

    fn schedule(shifts: Vec<Shift>) -> Schedule {
        Schedule {
            id: "s1".to_string(),
            date_generated: Utc::now(),
            facility: "f1".to_string(),
            shifts,
        }
    }

    fn facility() -> Facility {
        serde_json::from_value(serde_json::json!({ "_id": "f1", "facilityName": "Downtown Clinic" })).unwrap()
    }

    #[test]
    fn test_compose_message() {
        let message = compose_message("Ada", "Downtown Clinic", &shift("sh1", "e1"));
        assert_eq!(
            message,
            "Hi Ada! Your shift details at Downtown Clinic are as follows:\nShift: 09:00 - 17:00\nDays: Mon, Wed"
        );
    }

    #[tokio::test]
    async fn test_partial_failure_does_not_abort() {
        let api = MockApi::new()
            .with_facility(facility())
            .failing_notifications_for("e2")
            .failing_notifications_for("e4");
        let schedule = schedule(vec![
            shift("sh1", "e1"),
            shift("sh2", "e2"),
            shift("sh3", "e3"),
            shift("sh4", "e4"),
            shift("sh5", "e5"),
        ]);

        let report = NotificationDispatcher::default()
            .dispatch(&api, &Session::with_token("tok"), &schedule, &NameCache::default())
            .await
            .unwrap();

        assert_eq!(report.total(), 5);
        assert_eq!(report.sent.len(), 3);
        assert_eq!(api.notifications().len(), 3);
        let failed: Vec<&str> = report.failed.iter().map(|f| f.shift.shift_id.as_str()).collect();
        assert_eq!(failed, vec!["sh2", "sh4"]);
        let sent: Vec<&str> = report.sent.iter().map(|s| s.shift_id.as_str()).collect();
        assert_eq!(sent, vec!["sh1", "sh3", "sh5"]);
    }

    #[tokio::test]
    async fn test_facility_fetched_once() {
        let api = MockApi::new().with_facility(facility());
        let schedule = schedule(vec![shift("sh1", "e1"), shift("sh2", "e1"), shift("sh3", "e2")]);

        NotificationDispatcher::new(1)
            .dispatch(&api, &Session::with_token("tok"), &schedule, &NameCache::default())
            .await
            .unwrap();

        let calls = api.calls();
        assert_eq!(calls.get_facility, 1);
        assert_eq!(calls.send_notification, 3);
    }

    #[tokio::test]
    async fn test_facility_failure_uses_placeholder() {
        let api = MockApi::new();
        api.set_fail_facility(true);
        let report = NotificationDispatcher::default()
            .dispatch(
                &api,
                &Session::with_token("tok"),
                &schedule(vec![shift("sh1", "e1")]),
                &NameCache::default(),
            )
            .await
            .unwrap();

        assert!(report.all_sent());
        assert!(api.notifications()[0].message.contains(FACILITY_PLACEHOLDER));
    }

    #[tokio::test]
    async fn test_deleted_employee_still_notified() {
        let api = MockApi::new().with_facility(facility());
        let schedule = schedule(vec![shift("sh1", "e1")]);
        let session = Session::with_token("tok");

        let mut names = NameCache::default();
        names.resolve(&api, &session, std::slice::from_ref(&schedule)).await.unwrap();
        assert_eq!(names.display_name("e1"), DELETED_EMPLOYEE);

        let report = NotificationDispatcher::default()
            .dispatch(&api, &session, &schedule, &names)
            .await
            .unwrap();

        assert!(report.all_sent());
        let sent = api.notifications();
        assert_eq!(sent[0].employee_id, "e1");
        assert!(sent[0].message.starts_with("Hi Deleted Employee!"));
    }

    #[tokio::test]
    async fn test_no_session_sends_nothing() {
        let api = MockApi::new().with_facility(facility());
        let err = NotificationDispatcher::default()
            .dispatch(
                &api,
                &Session::Anonymous,
                &schedule(vec![shift("sh1", "e1")]),
                &NameCache::default(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ShiftsyncError::NoSession));
        assert_eq!(api.calls().total(), 0);
    }

    #[tokio::test]
    async fn test_send_direct() {
        let api = MockApi::new();
        let session = Session::with_token("tok");
        let dispatcher = NotificationDispatcher::default();

        let sent = dispatcher.send_direct(&api, &session, "e1", "hello!").await.unwrap();
        assert_eq!(sent.message, "hello!");

        let err = dispatcher.send_direct(&api, &session, "e1", "   ").await.unwrap_err();
        assert!(matches!(err, ShiftsyncError::InvalidInput(_)));
        assert_eq!(api.calls().send_notification, 1);
    }
}
