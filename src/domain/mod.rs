//! Domain types for shiftsync
//!
//! Mirrors the JSON aggregates served by the scheduling backend:
//! - Facility: the site schedules are generated for
//! - Employee: people shifts are assigned to
//! - Schedule / Shift: one generated schedule and its nested shifts
//! - Notification: a message sent to an employee
//!
//! Identities travel as `_id` and every other field is camelCase on the wire.

pub mod employee;
pub mod facility;
pub mod notification;
pub mod schedule;

pub use employee::{Employee, EmployeeEnvelope};
pub use facility::{Facility, OperatingHours};
pub use notification::{NewNotification, Notification};
pub use schedule::{Schedule, Shift, ShiftField, ShiftRef};
