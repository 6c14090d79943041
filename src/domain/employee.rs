//! Employee records as served by the backend

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub skill_level: Option<String>,
}

/// `GET /employees/{id}` wraps the record: `{"employee": {...}}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeEnvelope {
    pub employee: Employee,
}

impl Employee {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: None,
            phone_number: None,
            skill_level: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_deserialization() {
        let envelope: EmployeeEnvelope = serde_json::from_value(json!({
            "employee": {
                "_id": "e1",
                "name": "Ada",
                "email": "ada@example.com",
                "phoneNumber": "555-0100",
                "skillLevel": "3"
            }
        }))
        .unwrap();

        assert_eq!(envelope.employee.name, "Ada");
        assert_eq!(envelope.employee.phone_number.as_deref(), Some("555-0100"));
    }
}
