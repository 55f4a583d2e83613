// libs/appointment-cell/src/services/booking.rs
use chrono::{NaiveDate, NaiveTime, Utc};
use tracing::{debug, error, info, instrument, warn};

use patient_cell::{Classification, PatientError, PatientLookupService};
use schedule_cell::{ScheduleError, ScheduleService, ScheduleSlot, SlotKey};
use shared_config::AppConfig;

use crate::models::{
    AppointmentError, BookingRecord, DraftStage, PatientDetails, PatientForm, SessionDraft,
};
use crate::services::ledger::LedgerService;
use crate::services::lifecycle::{validate_transition, DraftAction};
use crate::services::validation::validate_form;

impl From<PatientError> for AppointmentError {
    fn from(err: PatientError) -> Self {
        match err {
            PatientError::ValidationError(msg) => AppointmentError::ValidationError(msg),
            PatientError::RosterUnavailable(e) => AppointmentError::Persistence(e.to_string()),
        }
    }
}

impl From<ScheduleError> for AppointmentError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::NoAvailability { .. } => AppointmentError::NoAvailability(err.to_string()),
            ScheduleError::SlotNotFound(key) => AppointmentError::SlotNotFound(key),
            ScheduleError::AlreadyBooked(key) => {
                AppointmentError::Conflict(format!("{} was booked by someone else", key))
            }
            ScheduleError::UnknownDoctor(_) => AppointmentError::ValidationError(err.to_string()),
            ScheduleError::Store(e) => e.into(),
        }
    }
}

/// Drives a [`SessionDraft`] from form to confirmed booking. Holds no draft state itself;
/// every step re-reads the files it needs.
pub struct BookingEngine {
    patients: PatientLookupService,
    schedule: ScheduleService,
    ledger: LedgerService,
}

impl BookingEngine {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            patients: PatientLookupService::new(config),
            schedule: ScheduleService::new(config),
            ledger: LedgerService::new(config),
        }
    }

    pub fn with_services(
        patients: PatientLookupService,
        schedule: ScheduleService,
        ledger: LedgerService,
    ) -> Self {
        Self {
            patients,
            schedule,
            ledger,
        }
    }

    pub fn start(&self, form: PatientForm) -> SessionDraft {
        let draft = SessionDraft::new(form);
        debug!("Started draft {}", draft.draft_id);
        draft
    }

    /// Collecting -> Classified. On failure the draft is left as it was.
    #[instrument(skip(self, draft), fields(draft_id = %draft.draft_id))]
    pub fn classify(&self, draft: &mut SessionDraft) -> Result<Classification, AppointmentError> {
        self.classify_on(draft, Utc::now().date_naive())
    }

    pub fn classify_on(
        &self,
        draft: &mut SessionDraft,
        today: NaiveDate,
    ) -> Result<Classification, AppointmentError> {
        validate_transition(draft.state(), DraftAction::Classify)?;

        let patient = validate_form(&draft.form, today).map_err(|e| {
            warn!("Draft {} failed validation: {}", draft.draft_id, e);
            e
        })?;

        if !self.schedule.has_doctor(&patient.doctor)? {
            return Err(ScheduleError::UnknownDoctor(patient.doctor).into());
        }

        let classification = self.patients.classify(&patient.name)?;
        info!(
            "Draft {} classified as {} ({})",
            draft.draft_id, classification.patient_type, classification.duration
        );

        draft.stage = DraftStage::Classified {
            patient,
            classification,
        };
        Ok(classification)
    }

    /// Classified/SlotChosen -> SlotChosen, provided the slot is Available right now.
    #[instrument(skip(self, draft), fields(draft_id = %draft.draft_id))]
    pub fn select_slot(
        &self,
        draft: &mut SessionDraft,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<ScheduleSlot, AppointmentError> {
        validate_transition(draft.state(), DraftAction::SelectSlot)?;

        let (patient, classification) =
            self.verified_stage(draft, DraftAction::SelectSlot, Utc::now().date_naive())?;

        let key = SlotKey {
            doctor: patient.doctor.clone(),
            date,
            time,
        };
        let slot = self.schedule.find_slot(&key)?;
        if !slot.is_available() {
            debug!("Draft {} picked booked slot {}", draft.draft_id, key);
            return Err(AppointmentError::NoAvailability(format!("{} is already booked", key)));
        }

        draft.stage = DraftStage::SlotChosen {
            patient,
            classification,
            slot: key,
        };
        Ok(slot)
    }

    /// SlotChosen -> Confirmed. The schedule is written first and the ledger second;
    /// success is reported only once both are durable.
    #[instrument(skip(self, draft), fields(draft_id = %draft.draft_id))]
    pub async fn confirm(&self, draft: &mut SessionDraft) -> Result<BookingRecord, AppointmentError> {
        validate_transition(draft.state(), DraftAction::Confirm)?;

        let Some(slot) = draft.chosen_slot().cloned() else {
            return Err(AppointmentError::InvalidTransition {
                from: draft.state(),
                action: DraftAction::Confirm.name(),
            });
        };
        let (patient, classification) =
            self.verified_stage(draft, DraftAction::Confirm, Utc::now().date_naive())?;
        if slot.doctor != patient.doctor {
            warn!(
                "Draft {} has slot {} for a different doctor than {}",
                draft.draft_id, slot, patient.doctor
            );
            return Err(AppointmentError::ValidationError(format!(
                "Chosen slot is not with {}; select a slot again",
                patient.doctor
            )));
        }

        let store = self.schedule.store();
        let lock = store.write_lock();
        let _guard = lock.lock().await;

        self.schedule.book_slot(&slot).map_err(|e| {
            warn!("Could not book {} for draft {}: {}", slot, draft.draft_id, e);
            AppointmentError::from(e)
        })?;

        let record = BookingRecord::new(&patient, classification, &slot);
        if let Err(e) = self.ledger.append(&record).await {
            error!(
                "{} is Booked in the schedule but the ledger write failed; reconcile manually: {}",
                slot, e
            );
            return Err(AppointmentError::Persistence(format!(
                "{} was booked but the ledger could not be updated: {}",
                slot, e
            )));
        }

        info!(
            "Draft {} confirmed: {} with {}",
            draft.draft_id, record.patient_name, slot
        );
        draft.stage = DraftStage::Confirmed {
            booking: record.clone(),
        };
        Ok(record)
    }

    /// Patient and classification carried by a Classified or SlotChosen draft, checked against
    /// a fresh validation of its form and a fresh roster lookup. Drafts come back from the
    /// caller, so nothing in the stage is taken on trust.
    fn verified_stage(
        &self,
        draft: &SessionDraft,
        action: DraftAction,
        today: NaiveDate,
    ) -> Result<(PatientDetails, Classification), AppointmentError> {
        let (claimed_patient, claimed_classification) = match &draft.stage {
            DraftStage::Classified {
                patient,
                classification,
            }
            | DraftStage::SlotChosen {
                patient,
                classification,
                ..
            } => (patient, *classification),
            _ => {
                return Err(AppointmentError::InvalidTransition {
                    from: draft.state(),
                    action: action.name(),
                })
            }
        };

        let patient = validate_form(&draft.form, today)?;
        let classification = self.patients.classify(&patient.name)?;
        if &patient != claimed_patient || classification != claimed_classification {
            warn!("Draft {} does not match its own form or the roster", draft.draft_id);
            return Err(AppointmentError::ValidationError(
                "Draft does not match its form; classify it again".to_string(),
            ));
        }

        Ok((patient, classification))
    }
}
