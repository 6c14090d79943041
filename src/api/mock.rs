//! In-memory backend for tests and offline demos
//!
//! Behaves like a faithful echo server: generated and patched schedules are
//! stored and served back by later calls. Individual endpoints or ids can be
//! told to fail, and every call is counted.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::api::client::ScheduleApi;
use crate::domain::{Employee, Facility, NewNotification, Notification, Schedule, Shift};
use crate::error::{Result, ShiftsyncError};
use crate::session::BearerToken;

/// Per-endpoint call counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockCalls {
    pub list_schedules: usize,
    pub generate_schedule: usize,
    pub update_schedule: usize,
    pub delete_schedule: usize,
    /// Lookups per employee id
    pub get_employee: HashMap<String, usize>,
    pub list_employees: usize,
    pub get_facility: usize,
    pub send_notification: usize,
    pub list_notifications: usize,
}

impl MockCalls {
    pub fn lookups(&self) -> usize {
        self.get_employee.values().sum()
    }

    pub fn lookups_for(&self, employee_id: &str) -> usize {
        self.get_employee.get(employee_id).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.list_schedules
            + self.generate_schedule
            + self.update_schedule
            + self.delete_schedule
            + self.lookups()
            + self.list_employees
            + self.get_facility
            + self.send_notification
            + self.list_notifications
    }
}

#[derive(Debug, Default)]
struct MockState {
    schedules: Vec<Schedule>,
    employees: HashMap<String, Employee>,
    facility: Option<Facility>,
    notifications: Vec<Notification>,
    queued_generated: VecDeque<Schedule>,

    failing_lookups: HashSet<String>,
    failing_notifications: HashSet<String>,
    lookup_delays: HashMap<String, Duration>,
    fail_list: bool,
    fail_generate: bool,
    fail_update: bool,
    fail_delete: bool,
    fail_facility: bool,

    calls: MockCalls,
    next_id: u64,
}

impl MockState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}{}", prefix, self.next_id)
    }
}

fn injected(what: &str) -> ShiftsyncError {
    ShiftsyncError::Api {
        status: 500,
        message: format!("injected failure: {}", what),
    }
}

/// Mock `ScheduleApi` for testing
#[derive(Debug, Default)]
pub struct MockApi {
    state: Mutex<MockState>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state(self, f: impl FnOnce(&mut MockState)) -> Self {
        f(&mut self.state.lock().unwrap());
        self
    }

    pub fn with_schedules(self, schedules: Vec<Schedule>) -> Self {
        self.with_state(|s| s.schedules = schedules)
    }

    pub fn with_employee(self, id: &str, name: &str) -> Self {
        self.with_state(|s| {
            s.employees.insert(id.to_string(), Employee::new(id, name));
        })
    }

    pub fn with_facility(self, facility: Facility) -> Self {
        self.with_state(|s| s.facility = Some(facility))
    }

    /// Queue the aggregate returned by the next `generate_schedule`
    pub fn with_generated(self, schedule: Schedule) -> Self {
        self.with_state(|s| s.queued_generated.push_back(schedule))
    }

    /// Lookups for this id fail with a 500 rather than a 404
    pub fn failing_lookup(self, employee_id: &str) -> Self {
        self.with_state(|s| {
            s.failing_lookups.insert(employee_id.to_string());
        })
    }

    /// Delay the lookup for one id, to force out-of-order completion
    pub fn with_lookup_delay(self, employee_id: &str, delay: Duration) -> Self {
        self.with_state(|s| {
            s.lookup_delays.insert(employee_id.to_string(), delay);
        })
    }

    /// Notifications addressed to this employee fail
    pub fn failing_notifications_for(self, employee_id: &str) -> Self {
        self.with_state(|s| {
            s.failing_notifications.insert(employee_id.to_string());
        })
    }

    pub fn set_fail_list(&self, fail: bool) {
        self.state.lock().unwrap().fail_list = fail;
    }

    pub fn set_fail_generate(&self, fail: bool) {
        self.state.lock().unwrap().fail_generate = fail;
    }

    pub fn set_fail_update(&self, fail: bool) {
        self.state.lock().unwrap().fail_update = fail;
    }

    pub fn set_fail_delete(&self, fail: bool) {
        self.state.lock().unwrap().fail_delete = fail;
    }

    pub fn set_fail_facility(&self, fail: bool) {
        self.state.lock().unwrap().fail_facility = fail;
    }

    /// Rename an employee behind the client's back
    pub fn rename_employee(&self, id: &str, name: &str) {
        self.state
            .lock()
            .unwrap()
            .employees
            .insert(id.to_string(), Employee::new(id, name));
    }

    pub fn calls(&self) -> MockCalls {
        self.state.lock().unwrap().calls.clone()
    }

    /// Notifications the backend has persisted
    pub fn notifications(&self) -> Vec<Notification> {
        self.state.lock().unwrap().notifications.clone()
    }

    /// Schedules the backend currently holds
    pub fn schedules(&self) -> Vec<Schedule> {
        self.state.lock().unwrap().schedules.clone()
    }
}

#[async_trait]
impl ScheduleApi for MockApi {
    async fn list_schedules(&self, _token: &BearerToken) -> Result<Vec<Schedule>> {
        let mut state = self.state.lock().unwrap();
        state.calls.list_schedules += 1;
        if state.fail_list {
            return Err(injected("list schedules"));
        }
        Ok(state.schedules.clone())
    }

    async fn generate_schedule(&self, _token: &BearerToken, facility_id: &str) -> Result<Schedule> {
        let mut state = self.state.lock().unwrap();
        state.calls.generate_schedule += 1;
        if state.fail_generate {
            return Err(injected("generate schedule"));
        }

        let schedule = match state.queued_generated.pop_front() {
            Some(schedule) => schedule,
            None => Schedule {
                id: state.next_id("gen-"),
                date_generated: Utc::now(),
                facility: facility_id.to_string(),
                shifts: Vec::new(),
            },
        };
        state.schedules.push(schedule.clone());
        Ok(schedule)
    }

    async fn update_schedule(&self, _token: &BearerToken, schedule_id: &str, shifts: &[Shift]) -> Result<Schedule> {
        let mut state = self.state.lock().unwrap();
        state.calls.update_schedule += 1;
        if state.fail_update {
            return Err(injected("update schedule"));
        }

        let schedule = state
            .schedules
            .iter_mut()
            .find(|s| s.id == schedule_id)
            .ok_or_else(|| ShiftsyncError::NotFound(format!("schedule {}", schedule_id)))?;
        schedule.shifts = shifts.to_vec();
        Ok(schedule.clone())
    }

    async fn delete_schedule(&self, _token: &BearerToken, schedule_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.delete_schedule += 1;
        if state.fail_delete {
            return Err(injected("delete schedule"));
        }

        let before = state.schedules.len();
        state.schedules.retain(|s| s.id != schedule_id);
        if state.schedules.len() == before {
            return Err(ShiftsyncError::NotFound(format!("schedule {}", schedule_id)));
        }
        Ok(())
    }

    async fn get_employee(&self, _token: &BearerToken, employee_id: &str) -> Result<Employee> {
        let delay = {
            let mut state = self.state.lock().unwrap();
            *state
                .calls
                .get_employee
                .entry(employee_id.to_string())
                .or_insert(0) += 1;
            state.lookup_delays.get(employee_id).copied()
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.state.lock().unwrap();
        if state.failing_lookups.contains(employee_id) {
            return Err(injected("employee lookup"));
        }
        state
            .employees
            .get(employee_id)
            .cloned()
            .ok_or_else(|| ShiftsyncError::NotFound(format!("employee {}", employee_id)))
    }

    async fn list_employees(&self, _token: &BearerToken) -> Result<Vec<Employee>> {
        let mut state = self.state.lock().unwrap();
        state.calls.list_employees += 1;
        let mut employees: Vec<Employee> = state.employees.values().cloned().collect();
        employees.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(employees)
    }

    async fn get_facility(&self, _token: &BearerToken) -> Result<Facility> {
        let mut state = self.state.lock().unwrap();
        state.calls.get_facility += 1;
        if state.fail_facility {
            return Err(injected("facility"));
        }
        state
            .facility
            .clone()
            .ok_or_else(|| ShiftsyncError::NotFound("facility".to_string()))
    }

    async fn send_notification(&self, _token: &BearerToken, notification: &NewNotification) -> Result<Notification> {
        let mut state = self.state.lock().unwrap();
        state.calls.send_notification += 1;
        if state.failing_notifications.contains(&notification.employee_id) {
            return Err(injected("send notification"));
        }

        let created = Notification {
            id: state.next_id("n"),
            employee_id: notification.employee_id.clone(),
            message: notification.message.clone(),
            created_at: Some(Utc::now()),
        };
        state.notifications.push(created.clone());
        Ok(created)
    }

    async fn list_notifications(&self, _token: &BearerToken) -> Result<Vec<Notification>> {
        let mut state = self.state.lock().unwrap();
        state.calls.list_notifications += 1;
        Ok(state.notifications.clone())
    }
}
