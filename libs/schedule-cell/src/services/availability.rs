use chrono::NaiveDate;
use tracing::{debug, instrument};

use shared_config::AppConfig;

use crate::models::{DaySlots, ScheduleError, ScheduleSlot};
use crate::services::schedule::ScheduleService;

/// Available slots for `doctor` (optionally on `date`), grouped by day. `rows` must already
/// be in date/time order.
pub fn group_available(rows: &[ScheduleSlot], doctor: &str, date: Option<NaiveDate>) -> Vec<DaySlots> {
    let mut days: Vec<DaySlots> = Vec::new();

    for slot in rows
        .iter()
        .filter(|slot| slot.doctor == doctor && slot.is_available())
        .filter(|slot| date.map_or(true, |d| slot.date == d))
    {
        match days.last_mut() {
            Some(day) if day.date == slot.date => day.slots.push(slot.clone()),
            _ => days.push(DaySlots {
                date: slot.date,
                slots: vec![slot.clone()],
            }),
        }
    }

    days
}

pub struct AvailabilityService {
    schedule: ScheduleService,
}

impl AvailabilityService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            schedule: ScheduleService::new(config),
        }
    }

    #[instrument(skip(self))]
    pub fn available_slots(
        &self,
        doctor: &str,
        date: Option<NaiveDate>,
    ) -> Result<Vec<DaySlots>, ScheduleError> {
        let doctor = doctor.trim();
        let snapshot = self.schedule.load()?;
        let days = group_available(&snapshot.rows, doctor, date);

        if days.is_empty() {
            return Err(ScheduleError::NoAvailability {
                doctor: doctor.to_string(),
                date,
            });
        }

        debug!("{} has availability on {} day(s)", doctor, days.len());
        Ok(days)
    }

    pub fn available_dates(&self, doctor: &str) -> Result<Vec<NaiveDate>, ScheduleError> {
        Ok(self
            .available_slots(doctor, None)?
            .into_iter()
            .map(|day| day.date)
            .collect())
    }

    pub fn doctors(&self) -> Result<Vec<String>, ScheduleError> {
        self.schedule.doctors()
    }
}
