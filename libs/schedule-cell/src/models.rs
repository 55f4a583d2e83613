use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use shared_database::{StoreError, TableRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotStatus {
    Available,
    Booked,
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotStatus::Available => write!(f, "Available"),
            SlotStatus::Booked => write!(f, "Booked"),
        }
    }
}

/// One bookable row of the doctor schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSlot {
    #[serde(rename = "Doctor")]
    pub doctor: String,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Time", with = "slot_time")]
    pub time: NaiveTime,
    #[serde(rename = "Status")]
    pub status: SlotStatus,
}

impl TableRow for ScheduleSlot {
    const HEADERS: &'static [&'static str] = &["Doctor", "Date", "Time", "Status"];
}

impl ScheduleSlot {
    pub fn key(&self) -> SlotKey {
        SlotKey {
            doctor: self.doctor.clone(),
            date: self.date,
            time: self.time,
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == SlotStatus::Available
    }

    pub fn matches(&self, key: &SlotKey) -> bool {
        self.doctor == key.doctor && self.date == key.date && self.time == key.time
    }

    /// Available -> Booked. There is no way back.
    pub fn book(&mut self) -> Result<(), ScheduleError> {
        match self.status {
            SlotStatus::Available => {
                self.status = SlotStatus::Booked;
                Ok(())
            }
            SlotStatus::Booked => Err(ScheduleError::AlreadyBooked(self.key())),
        }
    }
}

/// Identity of a slot. Unique across the schedule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotKey {
    pub doctor: String,
    pub date: NaiveDate,
    #[serde(with = "slot_time")]
    pub time: NaiveTime,
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} on {} at {}",
            self.doctor,
            self.date.format("%Y-%m-%d"),
            slot_time::format(&self.time)
        )
    }
}

/// Available slots of one doctor on one day, in time order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySlots {
    pub date: NaiveDate,
    pub slots: Vec<ScheduleSlot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorQuery {
    pub doctor: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailableSlotsQuery {
    pub doctor: String,
    pub date: Option<NaiveDate>,
}

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("No available slots for {doctor}{}", on_date(.date))]
    NoAvailability {
        doctor: String,
        date: Option<NaiveDate>,
    },

    #[error("Slot not found: {0}")]
    SlotNotFound(SlotKey),

    #[error("Slot already booked: {0}")]
    AlreadyBooked(SlotKey),

    #[error("Doctor not on the schedule: {0}")]
    UnknownDoctor(String),

    #[error("Schedule store error: {0}")]
    Store(#[from] StoreError),
}

fn on_date(date: &Option<NaiveDate>) -> String {
    date.map(|d| format!(" on {}", d)).unwrap_or_default()
}

/// Slot times are written `HH:MM`; `HH:MM:SS` and `HH:MM AM` are accepted on input.
pub mod slot_time {
    use chrono::{NaiveTime, Timelike};
    use serde::{Deserialize, Deserializer, Serializer};

    const INPUT_FORMATS: &[&str] = &["%H:%M", "%H:%M:%S", "%I:%M %p"];

    pub fn format(time: &NaiveTime) -> String {
        if time.second() == 0 {
            time.format("%H:%M").to_string()
        } else {
            time.format("%H:%M:%S").to_string()
        }
    }

    pub fn parse(value: &str) -> Option<NaiveTime> {
        let value = value.trim();
        INPUT_FORMATS
            .iter()
            .find_map(|fmt| NaiveTime::parse_from_str(value, fmt).ok())
    }

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(time))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid slot time: {}", raw)))
    }
}
