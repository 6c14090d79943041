//! Backend contract consumed by the sync engine

use async_trait::async_trait;

use crate::domain::{Employee, Facility, NewNotification, Notification, Schedule, Shift};
use crate::error::Result;
use crate::session::BearerToken;

/// Every call takes the bearer token explicitly; callers obtain it from the
/// session first, so a missing credential never reaches an implementation.
#[async_trait]
pub trait ScheduleApi: Send + Sync {
    /// `GET /schedules`
    async fn list_schedules(&self, token: &BearerToken) -> Result<Vec<Schedule>>;

    /// `POST /schedules` with `{facility}`; the server decides the shifts
    async fn generate_schedule(&self, token: &BearerToken, facility_id: &str) -> Result<Schedule>;

    /// `PATCH /schedules/{id}` with the whole shift list
    async fn update_schedule(&self, token: &BearerToken, schedule_id: &str, shifts: &[Shift]) -> Result<Schedule>;

    /// `DELETE /schedules/{id}`
    async fn delete_schedule(&self, token: &BearerToken, schedule_id: &str) -> Result<()>;

    /// `GET /employees/{id}`; a deleted employee surfaces as `NotFound`
    async fn get_employee(&self, token: &BearerToken, employee_id: &str) -> Result<Employee>;

    /// `GET /employees`
    async fn list_employees(&self, token: &BearerToken) -> Result<Vec<Employee>>;

    /// `GET /facilities` - the session's active facility
    async fn get_facility(&self, token: &BearerToken) -> Result<Facility>;

    /// `POST /notifications`
    async fn send_notification(&self, token: &BearerToken, notification: &NewNotification) -> Result<Notification>;

    /// `GET /notifications`
    async fn list_notifications(&self, token: &BearerToken) -> Result<Vec<Notification>>;
}
