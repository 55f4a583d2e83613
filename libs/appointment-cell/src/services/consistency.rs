// libs/appointment-cell/src/services/consistency.rs
use std::collections::{HashMap, HashSet};

use tracing::{instrument, warn};

use schedule_cell::{ScheduleService, ScheduleSlot, SlotKey};
use shared_config::AppConfig;

use crate::models::{AppointmentError, BookingRecord, ConsistencyReport};
use crate::services::ledger::LedgerService;

/// Compare a schedule against a ledger. Every Booked slot should have exactly one
/// record and every record should point at a Booked slot.
pub fn reconcile(slots: &[ScheduleSlot], records: &[BookingRecord]) -> ConsistencyReport {
    let booked: HashSet<SlotKey> = slots
        .iter()
        .filter(|slot| !slot.is_available())
        .map(ScheduleSlot::key)
        .collect();

    let mut record_counts: HashMap<SlotKey, usize> = HashMap::new();
    for record in records {
        *record_counts.entry(record.slot_key()).or_default() += 1;
    }

    let booked_without_record: Vec<SlotKey> = slots
        .iter()
        .map(ScheduleSlot::key)
        .filter(|key| booked.contains(key) && !record_counts.contains_key(key))
        .collect();

    let records_without_booking: Vec<BookingRecord> = records
        .iter()
        .filter(|record| !booked.contains(&record.slot_key()))
        .cloned()
        .collect();

    let mut duplicate_records = Vec::new();
    for record in records {
        let key = record.slot_key();
        if record_counts.get(&key).copied().unwrap_or(0) > 1 && !duplicate_records.contains(&key) {
            duplicate_records.push(key);
        }
    }

    ConsistencyReport {
        is_consistent: booked_without_record.is_empty()
            && records_without_booking.is_empty()
            && duplicate_records.is_empty(),
        booked_without_record,
        records_without_booking,
        duplicate_records,
    }
}

pub struct ConsistencyService {
    schedule: ScheduleService,
    ledger: LedgerService,
}

impl ConsistencyService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            schedule: ScheduleService::new(config),
            ledger: LedgerService::new(config),
        }
    }

    pub fn with_services(schedule: ScheduleService, ledger: LedgerService) -> Self {
        Self { schedule, ledger }
    }

    #[instrument(skip(self))]
    pub fn check(&self) -> Result<ConsistencyReport, AppointmentError> {
        let slots = self.schedule.load()?.rows;
        let records = self.ledger.list(None)?;
        let report = reconcile(&slots, &records);

        if !report.is_consistent {
            warn!(
                "Schedule and ledger disagree: {} booked slot(s) without record, {} record(s) without booking, {} duplicate(s)",
                report.booked_without_record.len(),
                report.records_without_booking.len(),
                report.duplicate_records.len()
            );
        }

        Ok(report)
    }
}
