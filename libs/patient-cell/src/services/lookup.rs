use std::sync::Arc;

use tracing::{debug, info, instrument};

use shared_config::AppConfig;
use shared_database::{CsvTable, TableStore};

use crate::models::{Classification, PatientError, PatientLookupResponse, PatientRecord};

/// First roster entry whose name equals `name`, ignoring case and surrounding whitespace.
pub fn find_patient<'a>(roster: &'a [PatientRecord], name: &str) -> Option<&'a PatientRecord> {
    roster.iter().find(|patient| patient.matches_name(name))
}

pub struct PatientLookupService {
    roster: Arc<dyn TableStore<PatientRecord>>,
}

impl PatientLookupService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            roster: Arc::new(CsvTable::<PatientRecord>::new(config.patients_file.clone())),
        }
    }

    pub fn with_store(roster: Arc<dyn TableStore<PatientRecord>>) -> Self {
        Self { roster }
    }

    #[instrument(skip(self))]
    pub fn find_by_name(&self, name: &str) -> Result<Option<PatientRecord>, PatientError> {
        if name.trim().is_empty() {
            return Err(PatientError::ValidationError("Patient name is required".to_string()));
        }

        // Re-read on every lookup; the roster is edited outside this service.
        let roster = self.roster.load()?.rows;
        debug!("Searching {} roster entries", roster.len());

        Ok(find_patient(&roster, name).cloned())
    }

    /// Lookup plus the patient type and visit length it implies.
    pub fn lookup(&self, name: &str) -> Result<PatientLookupResponse, PatientError> {
        let patient = self.find_by_name(name)?;
        let classification = Classification::for_match(patient.is_some());

        info!(
            "Patient '{}' classified as {} ({})",
            name.trim(),
            classification.patient_type,
            classification.duration
        );

        Ok(PatientLookupResponse {
            found: patient.is_some(),
            patient,
            classification,
        })
    }

    pub fn classify(&self, name: &str) -> Result<Classification, PatientError> {
        Ok(self.lookup(name)?.classification)
    }
}
