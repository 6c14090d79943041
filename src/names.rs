//! Employee name cache
//!
//! Shifts reference employees by id. Before a schedule set is rendered the
//! distinct ids are collected and each is looked up once; lookups are
//! independent and a failed one (deleted employee, server error) records the
//! `Deleted Employee` sentinel instead of failing the pass. Entries are never
//! invalidated for the lifetime of the cache, so a rename after resolution is
//! not picked up.

use std::collections::{BTreeSet, HashMap};

use futures::stream::{self, StreamExt};

use crate::api::ScheduleApi;
use crate::domain::Schedule;
use crate::error::Result;
use crate::session::{BearerToken, Session};

/// Shown for an employee whose lookup failed
pub const DELETED_EMPLOYEE: &str = "Deleted Employee";

/// Shown for an id whose lookup has not completed yet
pub const UNRESOLVED_NAME: &str = "Unknown";

pub const DEFAULT_MAX_CONCURRENT_LOOKUPS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedName {
    Known(String),
    Deleted,
}

impl ResolvedName {
    pub fn as_str(&self) -> &str {
        match self {
            ResolvedName::Known(name) => name,
            ResolvedName::Deleted => DELETED_EMPLOYEE,
        }
    }
}

/// Outcome of one population pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveReport {
    /// Distinct ids looked up (one lookup each)
    pub requested: usize,
    /// Lookups that returned a name
    pub resolved: usize,
    /// Ids recorded as deleted, sorted
    pub deleted: Vec<String>,
}

#[derive(Debug)]
pub struct NameCache {
    names: HashMap<String, ResolvedName>,
    max_concurrent_lookups: usize,
}

impl Default for NameCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENT_LOOKUPS)
    }
}

impl NameCache {
    pub fn new(max_concurrent_lookups: usize) -> Self {
        Self {
            names: HashMap::new(),
            max_concurrent_lookups: max_concurrent_lookups.max(1),
        }
    }

    /// Name to render for an id. Never fails: unresolved ids get a placeholder.
    pub fn display_name(&self, employee_id: &str) -> &str {
        self.names
            .get(employee_id)
            .map(ResolvedName::as_str)
            .unwrap_or(UNRESOLVED_NAME)
    }

    pub fn get(&self, employee_id: &str) -> Option<&ResolvedName> {
        self.names.get(employee_id)
    }

    pub fn contains(&self, employee_id: &str) -> bool {
        self.names.contains_key(employee_id)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Every distinct employee id referenced by any shift.
    pub fn distinct_employee_ids<'a>(schedules: impl IntoIterator<Item = &'a Schedule>) -> BTreeSet<String> {
        schedules
            .into_iter()
            .flat_map(|schedule| schedule.shifts.iter())
            .map(|shift| shift.employee_id.clone())
            .collect()
    }

    /// Full population pass: one lookup per distinct id in `schedules`,
    /// including ids already cached.
    pub async fn resolve(
        &mut self,
        api: &dyn ScheduleApi,
        session: &Session,
        schedules: &[Schedule],
    ) -> Result<ResolveReport> {
        let token = session.token()?;
        let ids = Self::distinct_employee_ids(schedules);
        Ok(self.resolve_ids(api, token, ids).await)
    }

    /// Lazy extension: look up only ids that have no entry yet.
    pub async fn extend(
        &mut self,
        api: &dyn ScheduleApi,
        session: &Session,
        schedules: &[Schedule],
    ) -> Result<ResolveReport> {
        self.extend_ids(api, session, Self::distinct_employee_ids(schedules))
            .await
    }

    /// Lazy extension for ids that do not come from shifts (notification feed).
    pub async fn extend_ids(
        &mut self,
        api: &dyn ScheduleApi,
        session: &Session,
        ids: impl IntoIterator<Item = String>,
    ) -> Result<ResolveReport> {
        let token = session.token()?;
        let ids: BTreeSet<String> = ids
            .into_iter()
            .filter(|id| !self.contains(id))
            .collect();
        Ok(self.resolve_ids(api, token, ids).await)
    }

    /// Look up each id once. Results land in the map as they complete, in
    /// whatever order the backend answers.
    async fn resolve_ids(&mut self, api: &dyn ScheduleApi, token: &BearerToken, ids: BTreeSet<String>) -> ResolveReport {
        let mut report = ResolveReport {
            requested: ids.len(),
            ..Default::default()
        };

        if ids.is_empty() {
            return report;
        }

        let mut lookups = stream::iter(ids)
            .map(move |id| async move {
                let outcome = api.get_employee(token, &id).await;
                (id, outcome)
            })
            .buffer_unordered(self.max_concurrent_lookups);

        while let Some((id, outcome)) = lookups.next().await {
            let entry = match outcome {
                Ok(employee) => {
                    report.resolved += 1;
                    ResolvedName::Known(employee.name)
                }
                Err(e) => {
                    if e.is_not_found() {
                        tracing::debug!(employee_id = %id, "Employee not found, marking deleted");
                    } else {
                        tracing::warn!(employee_id = %id, error = %e, "Employee lookup failed, marking deleted");
                    }
                    report.deleted.push(id.clone());
                    ResolvedName::Deleted
                }
            };
            self.names.insert(id, entry);
        }

        report.deleted.sort();
        tracing::debug!(
            requested = report.requested,
            resolved = report.resolved,
            deleted = report.deleted.len(),
            "Name resolution pass finished"
        );
        report
    }
}
