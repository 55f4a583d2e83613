// libs/appointment-cell/src/models.rs
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use patient_cell::models::{AppointmentDuration, Classification, PatientType};
use schedule_cell::models::{slot_time, SlotKey};
use shared_database::TableRow;

// ==============================================================================
// FORM INPUT
// ==============================================================================

/// Raw booking form as submitted by the operator. Nothing here is trusted until
/// the draft is classified.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientForm {
    pub name: String,
    pub dob_day: Option<u32>,
    pub dob_month: Option<u32>,
    pub dob_year: Option<i32>,
    pub doctor: String,
    pub location: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub insurance_carrier: Option<String>,
    #[serde(default)]
    pub member_id: Option<String>,
    #[serde(default)]
    pub group_number: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InsuranceCarrier {
    Aetna,
    BlueCross,
    Cigna,
    UnitedHealthcare,
    Medicare,
}

impl InsuranceCarrier {
    pub const ALL: [InsuranceCarrier; 5] = [
        InsuranceCarrier::Aetna,
        InsuranceCarrier::BlueCross,
        InsuranceCarrier::Cigna,
        InsuranceCarrier::UnitedHealthcare,
        InsuranceCarrier::Medicare,
    ];
}

impl fmt::Display for InsuranceCarrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsuranceCarrier::Aetna => write!(f, "Aetna"),
            InsuranceCarrier::BlueCross => write!(f, "BlueCross"),
            InsuranceCarrier::Cigna => write!(f, "Cigna"),
            InsuranceCarrier::UnitedHealthcare => write!(f, "UnitedHealthcare"),
            InsuranceCarrier::Medicare => write!(f, "Medicare"),
        }
    }
}

impl FromStr for InsuranceCarrier {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        InsuranceCarrier::ALL
            .into_iter()
            .find(|carrier| carrier.to_string().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| format!("Unknown insurance carrier: {}", value.trim()))
    }
}

/// Patient details after validation. Optional contact fields are `None` rather than blank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientDetails {
    pub name: String,
    pub date_of_birth: NaiveDate,
    pub doctor: String,
    pub location: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub insurance_carrier: Option<InsuranceCarrier>,
    pub member_id: Option<String>,
    pub group_number: Option<String>,
}

// ==============================================================================
// SESSION DRAFT STATE MACHINE
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingState {
    Collecting,
    Classified,
    SlotChosen,
    Confirmed,
}

impl fmt::Display for BookingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookingState::Collecting => write!(f, "collecting"),
            BookingState::Classified => write!(f, "classified"),
            BookingState::SlotChosen => write!(f, "slot_chosen"),
            BookingState::Confirmed => write!(f, "confirmed"),
        }
    }
}

/// Stage of a draft together with the data that stage has earned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DraftStage {
    Collecting,
    Classified {
        patient: PatientDetails,
        classification: Classification,
    },
    SlotChosen {
        patient: PatientDetails,
        classification: Classification,
        slot: SlotKey,
    },
    Confirmed {
        booking: BookingRecord,
    },
}

impl DraftStage {
    pub fn state(&self) -> BookingState {
        match self {
            DraftStage::Collecting => BookingState::Collecting,
            DraftStage::Classified { .. } => BookingState::Classified,
            DraftStage::SlotChosen { .. } => BookingState::SlotChosen,
            DraftStage::Confirmed { .. } => BookingState::Confirmed,
        }
    }
}

/// Per-interaction booking state. Owned by the caller and handed to every engine call;
/// the server keeps no copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionDraft {
    pub draft_id: Uuid,
    pub form: PatientForm,
    #[serde(flatten)]
    pub stage: DraftStage,
}

impl SessionDraft {
    pub fn new(form: PatientForm) -> Self {
        Self {
            draft_id: Uuid::new_v4(),
            form,
            stage: DraftStage::Collecting,
        }
    }

    pub fn state(&self) -> BookingState {
        self.stage.state()
    }

    pub fn chosen_slot(&self) -> Option<&SlotKey> {
        match &self.stage {
            DraftStage::SlotChosen { slot, .. } => Some(slot),
            _ => None,
        }
    }
}

// ==============================================================================
// LEDGER
// ==============================================================================

/// One confirmed booking. Never mutated once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRecord {
    #[serde(rename = "Patient Name")]
    pub patient_name: String,
    #[serde(rename = "DOB")]
    pub date_of_birth: NaiveDate,
    #[serde(rename = "Patient Type")]
    pub patient_type: PatientType,
    #[serde(rename = "Doctor")]
    pub doctor: String,
    #[serde(rename = "Location")]
    pub location: String,
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Time", with = "slot_time")]
    pub time: NaiveTime,
    #[serde(rename = "Duration (min)")]
    pub duration: AppointmentDuration,
    #[serde(rename = "Email", default)]
    pub email: Option<String>,
    #[serde(rename = "Phone", default)]
    pub phone: Option<String>,
    #[serde(rename = "Insurance Carrier", default)]
    pub insurance_carrier: Option<InsuranceCarrier>,
    #[serde(rename = "Member ID", default)]
    pub member_id: Option<String>,
    #[serde(rename = "Group Number", default)]
    pub group_number: Option<String>,
}

impl TableRow for BookingRecord {
    const HEADERS: &'static [&'static str] = &[
        "Patient Name",
        "DOB",
        "Patient Type",
        "Doctor",
        "Location",
        "Date",
        "Time",
        "Duration (min)",
        "Email",
        "Phone",
        "Insurance Carrier",
        "Member ID",
        "Group Number",
    ];
}

impl BookingRecord {
    pub fn new(patient: &PatientDetails, classification: Classification, slot: &SlotKey) -> Self {
        Self {
            patient_name: patient.name.clone(),
            date_of_birth: patient.date_of_birth,
            patient_type: classification.patient_type,
            doctor: slot.doctor.clone(),
            location: patient.location.clone(),
            date: slot.date,
            time: slot.time,
            duration: classification.duration,
            email: patient.email.clone(),
            phone: patient.phone.clone(),
            insurance_carrier: patient.insurance_carrier,
            member_id: patient.member_id.clone(),
            group_number: patient.group_number.clone(),
        }
    }

    pub fn slot_key(&self) -> SlotKey {
        SlotKey {
            doctor: self.doctor.clone(),
            date: self.date,
            time: self.time,
        }
    }
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectSlotRequest {
    pub draft: SessionDraft,
    pub date: NaiveDate,
    #[serde(with = "slot_time")]
    pub time: NaiveTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerQuery {
    pub from: Option<NaiveDate>,
}

/// Disagreements between schedule and ledger that need a human to reconcile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub is_consistent: bool,
    pub booked_without_record: Vec<SlotKey>,
    pub records_without_booking: Vec<BookingRecord>,
    pub duplicate_records: Vec<SlotKey>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppointmentError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Cannot {action} a draft in state {from}")]
    InvalidTransition {
        from: BookingState,
        action: &'static str,
    },

    #[error("No availability: {0}")]
    NoAvailability(String),

    #[error("Slot not found: {0}")]
    SlotNotFound(SlotKey),

    #[error("Booking conflict: {0}")]
    Conflict(String),

    #[error("Persistence error: {0}")]
    Persistence(String),
}
