//! Shiftsync - client-side sync engine for a workforce scheduling backend
//!
//! Keeps a local view of generated schedules in step with the backend,
//! resolves employee names for display, edits shift times in place, and fans
//! shift notifications out to employees.

pub mod api;
pub mod domain;
pub mod edit;
pub mod error;
pub mod names;
pub mod notify;
pub mod session;
pub mod store;
pub mod view;

pub use error::{Result, ShiftsyncError};
