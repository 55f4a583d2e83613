use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use shared_database::TableRow;

/// One row of the patient roster. Only `Name` is required in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "DOB", default, deserialize_with = "roster_date::deserialize")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(rename = "Email", default)]
    pub email: Option<String>,
    #[serde(rename = "Phone", default)]
    pub phone: Option<String>,
}

impl PatientRecord {
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.trim().to_lowercase() == name.trim().to_lowercase()
    }
}

impl TableRow for PatientRecord {
    const HEADERS: &'static [&'static str] = &["Name", "DOB", "Email", "Phone"];
}

/// Roster dates are hand-edited. Anything unreadable becomes `None` instead of failing the load.
mod roster_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer};
    use tracing::warn;

    const INPUT_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d.%m.%Y", "%Y/%m/%d"];

    fn parse(value: &str) -> Option<NaiveDate> {
        INPUT_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        let Some(value) = raw.as_deref().map(str::trim).filter(|v| !v.is_empty()) else {
            return Ok(None);
        };

        let date = parse(value);
        if date.is_none() {
            warn!("Ignoring unreadable roster DOB: {}", value);
        }
        Ok(date)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PatientType {
    New,
    Returning,
}

impl fmt::Display for PatientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatientType::New => write!(f, "New"),
            PatientType::Returning => write!(f, "Returning"),
        }
    }
}

/// Visit length. Returning patients get a short slot, new patients a long one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum AppointmentDuration {
    ThirtyMinutes,
    SixtyMinutes,
}

impl AppointmentDuration {
    pub fn minutes(self) -> u32 {
        match self {
            AppointmentDuration::ThirtyMinutes => 30,
            AppointmentDuration::SixtyMinutes => 60,
        }
    }
}

impl TryFrom<u32> for AppointmentDuration {
    type Error = String;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        match minutes {
            30 => Ok(AppointmentDuration::ThirtyMinutes),
            60 => Ok(AppointmentDuration::SixtyMinutes),
            other => Err(format!("unsupported appointment duration: {} minutes", other)),
        }
    }
}

impl From<AppointmentDuration> for u32 {
    fn from(duration: AppointmentDuration) -> Self {
        duration.minutes()
    }
}

impl fmt::Display for AppointmentDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} min", self.minutes())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub patient_type: PatientType,
    pub duration: AppointmentDuration,
}

impl Classification {
    pub fn for_match(found: bool) -> Self {
        if found {
            Self {
                patient_type: PatientType::Returning,
                duration: AppointmentDuration::ThirtyMinutes,
            }
        } else {
            Self {
                patient_type: PatientType::New,
                duration: AppointmentDuration::SixtyMinutes,
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientLookupQuery {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientLookupResponse {
    pub found: bool,
    pub patient: Option<PatientRecord>,
    pub classification: Classification,
}

#[derive(Debug, thiserror::Error)]
pub enum PatientError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Patient roster unavailable: {0}")]
    RosterUnavailable(#[from] shared_database::StoreError),
}
