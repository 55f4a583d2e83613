use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, instrument};

use shared_config::AppConfig;
use shared_database::{decode_rows, CsvTable, StoreError, TableStore};

use crate::models::{AppointmentError, BookingRecord};

impl From<StoreError> for AppointmentError {
    fn from(err: StoreError) -> Self {
        if err.is_version_mismatch() {
            AppointmentError::Conflict(err.to_string())
        } else {
            AppointmentError::Persistence(err.to_string())
        }
    }
}

/// Append-only record of confirmed bookings.
#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn TableStore<BookingRecord>>,
}

impl LedgerService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: Arc::new(CsvTable::<BookingRecord>::new(config.appointments_file.clone())),
        }
    }

    pub fn with_store(store: Arc<dyn TableStore<BookingRecord>>) -> Self {
        Self { store }
    }

    /// Add `record` after every existing one.
    #[instrument(skip(self, record), fields(patient = %record.patient_name))]
    pub async fn append(&self, record: &BookingRecord) -> Result<(), AppointmentError> {
        let lock = self.store.write_lock();
        let _guard = lock.lock().await;

        self.store.append(record)?;
        info!("Ledger now holds booking for {} with {}", record.patient_name, record.slot_key());
        Ok(())
    }

    /// Ledger in file order, optionally only appointments on or after `from`.
    pub fn list(&self, from: Option<NaiveDate>) -> Result<Vec<BookingRecord>, AppointmentError> {
        let records: Vec<BookingRecord> = self
            .store
            .load()?
            .rows
            .into_iter()
            .filter(|record| from.map_or(true, |from| record.date >= from))
            .collect();

        debug!("Listing {} ledger records", records.len());
        Ok(records)
    }

    pub fn export_csv(&self) -> Result<Vec<u8>, AppointmentError> {
        Ok(self.store.export()?)
    }

    /// Parse bytes produced by [`LedgerService::export_csv`].
    pub fn import_csv(&self, bytes: &[u8]) -> Result<Vec<BookingRecord>, AppointmentError> {
        Ok(decode_rows(self.store.location(), bytes)?)
    }
}
