//! Facility aggregate

use serde::{Deserialize, Deserializer, Serialize, de};

/// The site schedules are generated for. One facility is active per session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Facility {
    #[serde(rename = "_id")]
    pub id: String,

    #[serde(default)]
    pub facility_name: String,

    #[serde(default)]
    pub facility_type: String,

    #[serde(default)]
    pub operating_hours: Option<OperatingHours>,

    #[serde(default, deserialize_with = "de_count")]
    pub number_employees: Option<u32>,

    #[serde(default, deserialize_with = "de_count")]
    pub number_shifts: Option<u32>,

    #[serde(default, deserialize_with = "de_count")]
    pub number_days: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingHours {
    pub start: String,
    pub end: String,
}

impl Facility {
    /// Name used in notification text; blank names fall back to the placeholder.
    pub fn display_name(&self) -> &str {
        let name = self.facility_name.trim();
        if name.is_empty() { FACILITY_PLACEHOLDER } else { name }
    }
}

/// Used when the facility could not be fetched or has no name.
pub const FACILITY_PLACEHOLDER: &str = "your facility";

/// Counts are stored as numbers by the backend but the facility form submits
/// them as strings, so both shapes show up in responses.
fn de_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Count {
        Number(u32),
        Text(String),
    }

    match Option::<Count>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Count::Number(n)) => Ok(Some(n)),
        Some(Count::Text(s)) if s.trim().is_empty() => Ok(None),
        Some(Count::Text(s)) => s
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid count: {:?}", s))),
    }
}
