//! Schedule aggregate and its nested shifts

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ShiftsyncError};

/// One generated schedule: a facility reference plus shifts in display order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    #[serde(rename = "_id")]
    pub id: String,

    pub date_generated: DateTime<Utc>,

    /// Facility identity (a reference, not the aggregate)
    #[serde(default)]
    pub facility: String,

    #[serde(default)]
    pub shifts: Vec<Shift>,
}

/// A recurring interval assigned to one employee, referenced by id only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shift {
    #[serde(rename = "_id")]
    pub id: String,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub days: Vec<String>,
    pub employee_id: String,
}

/// Editable shift fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftField {
    Start,
    End,
}

/// Points at one shift of one schedule without owning it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ShiftRef {
    pub schedule_id: String,
    pub shift_id: String,
    pub employee_id: String,
}

impl Shift {
    pub fn days_label(&self) -> String {
        self.days.join(", ")
    }

    pub fn set(&mut self, field: ShiftField, value: impl Into<String>) {
        match field {
            ShiftField::Start => self.start = value.into(),
            ShiftField::End => self.end = value.into(),
        }
    }

    pub fn to_ref(&self, schedule_id: &str) -> ShiftRef {
        ShiftRef {
            schedule_id: schedule_id.to_string(),
            shift_id: self.id.clone(),
            employee_id: self.employee_id.clone(),
        }
    }
}

impl ShiftField {
    /// Validate and normalise a wall-clock value to `HH:MM`.
    pub fn normalize(&self, value: &str) -> Result<String> {
        let value = value.trim();
        NaiveTime::parse_from_str(value, "%H:%M")
            .map(|t| t.format("%H:%M").to_string())
            .map_err(|_| ShiftsyncError::InvalidInput(format!("{} must be HH:MM, got {:?}", self, value)))
    }
}

impl fmt::Display for ShiftField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShiftField::Start => write!(f, "start"),
            ShiftField::End => write!(f, "end"),
        }
    }
}

impl FromStr for ShiftField {
    type Err = ShiftsyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "start" => Ok(ShiftField::Start),
            "end" => Ok(ShiftField::End),
            other => Err(ShiftsyncError::InvalidInput(format!("unknown shift field: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Schedule {
        serde_json::from_value(json!({
            "_id": "s1",
            "dateGenerated": "2024-03-01T12:00:00.000Z",
            "facility": "f1",
            "shifts": [
                { "_id": "sh1", "employeeId": "e1", "start": "09:00", "end": "17:00", "days": ["Mon", "Wed"] },
                { "_id": "sh2", "employeeId": "e2", "start": "17:00", "end": "23:00", "days": ["Tue"] },
                { "_id": "sh3", "employeeId": "e1", "start": "06:00", "end": "09:00", "days": [] }
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_deserialize_schedule() {
        let schedule = sample();
        assert_eq!(schedule.id, "s1");
        assert_eq!(schedule.facility, "f1");
        assert_eq!(schedule.shifts.len(), 3);
        assert_eq!(schedule.shifts[0].days_label(), "Mon, Wed");
    }

    #[test]
    fn test_serialize_uses_wire_names() {
        let value = serde_json::to_value(&sample().shifts[0]).unwrap();
        assert_eq!(value["_id"], "sh1");
        assert_eq!(value["employeeId"], "e1");
    }

    #[test]
    fn test_field_normalize() {
        assert_eq!(ShiftField::Start.normalize(" 9:05 ").unwrap(), "09:05");
        assert_eq!(ShiftField::End.normalize("23:59").unwrap(), "23:59");
        assert!(ShiftField::End.normalize("24:30").is_err());
        assert!(ShiftField::Start.normalize("noon").is_err());
    }

    #[test]
    fn test_field_from_str() {
        assert_eq!("START".parse::<ShiftField>().unwrap(), ShiftField::Start);
        assert_eq!("end".parse::<ShiftField>().unwrap(), ShiftField::End);
        assert!("days".parse::<ShiftField>().is_err());
    }

    #[test]
    fn test_shift_set_touches_one_field() {
        let mut shift = sample().shifts[0].clone();
        shift.set(ShiftField::End, "18:00");
        assert_eq!(shift.end, "18:00");
        assert_eq!(shift.start, "09:00");
    }
}
