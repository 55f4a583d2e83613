use std::sync::Arc;

use axum::{
    extract::{Extension, Query, State},
    Json,
};
use serde_json::{json, Value};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{AvailableSlotsQuery, DoctorQuery, ScheduleError};
use crate::services::AvailabilityService;

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::NoAvailability { .. } | ScheduleError::SlotNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            ScheduleError::UnknownDoctor(_) => AppError::ValidationError(err.to_string()),
            ScheduleError::AlreadyBooked(_) => AppError::Conflict(err.to_string()),
            ScheduleError::Store(e) if e.is_version_mismatch() => AppError::Conflict(e.to_string()),
            ScheduleError::Store(e) => AppError::Persistence(e.to_string()),
        }
    }
}

#[axum::debug_handler]
pub async fn list_doctors(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    debug!("Operator {} listing doctors", user.id);

    let doctors = AvailabilityService::new(&config).doctors()?;

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}

#[axum::debug_handler]
pub async fn get_available_dates(
    State(config): State<Arc<AppConfig>>,
    Extension(_user): Extension<User>,
    Query(query): Query<DoctorQuery>,
) -> Result<Json<Value>, AppError> {
    let dates = AvailabilityService::new(&config).available_dates(&query.doctor)?;

    Ok(Json(json!({
        "doctor": query.doctor,
        "dates": dates
    })))
}

#[axum::debug_handler]
pub async fn get_available_slots(
    State(config): State<Arc<AppConfig>>,
    Extension(_user): Extension<User>,
    Query(query): Query<AvailableSlotsQuery>,
) -> Result<Json<Value>, AppError> {
    let days = AvailabilityService::new(&config).available_slots(&query.doctor, query.date)?;
    let total: usize = days.iter().map(|day| day.slots.len()).sum();

    Ok(Json(json!({
        "doctor": query.doctor,
        "days": days,
        "total": total
    })))
}
