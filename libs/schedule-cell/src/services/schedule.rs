use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use shared_config::AppConfig;
use shared_database::{CsvTable, Snapshot, StoreError, TableStore};

use crate::models::{ScheduleError, ScheduleSlot, SlotKey};

/// Access to the schedule file. Every call reads the file again; nothing is cached
/// between interactions.
#[derive(Clone)]
pub struct ScheduleService {
    store: Arc<dyn TableStore<ScheduleSlot>>,
}

impl ScheduleService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            store: Arc::new(CsvTable::<ScheduleSlot>::new(config.schedule_file.clone())),
        }
    }

    pub fn with_store(store: Arc<dyn TableStore<ScheduleSlot>>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> Arc<dyn TableStore<ScheduleSlot>> {
        Arc::clone(&self.store)
    }

    /// Full schedule ordered by date then time; ties keep file order.
    #[instrument(skip(self))]
    pub fn load(&self) -> Result<Snapshot<ScheduleSlot>, ScheduleError> {
        let mut snapshot = self.store.load()?;
        ensure_unique(self.store.location(), &snapshot.rows)?;
        snapshot.rows.sort_by_key(|slot| (slot.date, slot.time));

        debug!("Loaded {} schedule slots", snapshot.rows.len());
        Ok(snapshot)
    }

    /// Distinct doctors in the order they first appear in the file.
    pub fn doctors(&self) -> Result<Vec<String>, ScheduleError> {
        let rows = self.store.load()?.rows;
        let mut seen = HashSet::new();

        Ok(rows
            .into_iter()
            .filter(|slot| seen.insert(slot.doctor.clone()))
            .map(|slot| slot.doctor)
            .collect())
    }

    pub fn has_doctor(&self, doctor: &str) -> Result<bool, ScheduleError> {
        Ok(self.store.load()?.rows.iter().any(|slot| slot.doctor == doctor))
    }

    pub fn find_slot(&self, key: &SlotKey) -> Result<ScheduleSlot, ScheduleError> {
        self.load()?
            .rows
            .into_iter()
            .find(|slot| slot.matches(key))
            .ok_or_else(|| ScheduleError::SlotNotFound(key.clone()))
    }

    /// Write the whole schedule back, failing if the file moved on since `expected_version`.
    #[instrument(skip(self, rows))]
    pub fn commit(
        &self,
        expected_version: Option<&str>,
        rows: &[ScheduleSlot],
    ) -> Result<String, ScheduleError> {
        self.store.replace(expected_version, rows).map_err(|e| {
            if e.is_version_mismatch() {
                warn!("Schedule changed underneath a pending write: {}", e);
            }
            ScheduleError::Store(e)
        })
    }

    /// Re-read the file, flip `key` to Booked and write it back in file order.
    /// Callers serialize through the store's write lock.
    #[instrument(skip(self))]
    pub fn book_slot(&self, key: &SlotKey) -> Result<ScheduleSlot, ScheduleError> {
        let snapshot = self.store.load()?;
        ensure_unique(self.store.location(), &snapshot.rows)?;

        let mut rows = snapshot.rows;
        let slot = rows
            .iter_mut()
            .find(|slot| slot.matches(key))
            .ok_or_else(|| ScheduleError::SlotNotFound(key.clone()))?;
        slot.book()?;
        let booked = slot.clone();

        self.commit(snapshot.version.as_deref(), &rows)?;
        info!("Booked {}", key);
        Ok(booked)
    }
}

fn ensure_unique(path: &std::path::Path, rows: &[ScheduleSlot]) -> Result<(), StoreError> {
    let mut keys = HashSet::with_capacity(rows.len());
    for slot in rows {
        let key = slot.key();
        if !keys.insert(key.clone()) {
            return Err(StoreError::DuplicateKey {
                path: path.to_path_buf(),
                key: key.to_string(),
            });
        }
    }
    Ok(())
}
