//! Remote API layer - the scheduling backend behind an async trait
//!
//! This module provides:
//! - ScheduleApi trait describing every endpoint the engine consumes
//! - HttpApi implementation over reqwest
//! - MockApi in-memory backend with call accounting and failure injection

pub mod client;
pub mod http;
pub mod mock;

pub use client::ScheduleApi;
pub use http::{HttpApi, HttpApiConfig};
pub use mock::{MockApi, MockCalls};
