// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Extension, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use tracing::{debug, info};

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{
    AppointmentError, ConsistencyReport, LedgerQuery, PatientForm, SelectSlotRequest, SessionDraft,
};
use crate::services::{BookingEngine, ConsistencyService, LedgerService};

pub const EXPORT_FILE_NAME: &str = "upcoming_appointments.csv";

impl From<AppointmentError> for AppError {
    fn from(err: AppointmentError) -> Self {
        match err {
            AppointmentError::ValidationError(msg) => AppError::ValidationError(msg),
            AppointmentError::InvalidTransition { .. } => AppError::BadRequest(err.to_string()),
            AppointmentError::NoAvailability(_) | AppointmentError::SlotNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            AppointmentError::Conflict(msg) => AppError::Conflict(msg),
            AppointmentError::Persistence(msg) => AppError::Persistence(msg),
        }
    }
}

// ==============================================================================
// DRAFT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn start_draft(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(form): Json<PatientForm>,
) -> Result<(StatusCode, Json<SessionDraft>), AppError> {
    let draft = BookingEngine::new(&config).start(form);
    debug!("Operator {} opened draft {}", user.id, draft.draft_id);

    Ok((StatusCode::CREATED, Json(draft)))
}

#[axum::debug_handler]
pub async fn classify_draft(
    State(config): State<Arc<AppConfig>>,
    Extension(_user): Extension<User>,
    Json(mut draft): Json<SessionDraft>,
) -> Result<Json<SessionDraft>, AppError> {
    BookingEngine::new(&config).classify(&mut draft)?;
    Ok(Json(draft))
}

#[axum::debug_handler]
pub async fn select_slot(
    State(config): State<Arc<AppConfig>>,
    Extension(_user): Extension<User>,
    Json(request): Json<SelectSlotRequest>,
) -> Result<Json<SessionDraft>, AppError> {
    let mut draft = request.draft;
    BookingEngine::new(&config).select_slot(&mut draft, request.date, request.time)?;
    Ok(Json(draft))
}

#[axum::debug_handler]
pub async fn confirm_draft(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Json(mut draft): Json<SessionDraft>,
) -> Result<Json<SessionDraft>, AppError> {
    BookingEngine::new(&config).confirm(&mut draft).await?;
    info!("Operator {} confirmed draft {}", user.id, draft.draft_id);
    Ok(Json(draft))
}

// ==============================================================================
// LEDGER HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_appointments(
    State(config): State<Arc<AppConfig>>,
    Extension(_user): Extension<User>,
    Query(query): Query<LedgerQuery>,
) -> Result<Json<Value>, AppError> {
    let appointments = LedgerService::new(&config).list(query.from)?;

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn export_appointments(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
) -> Result<impl IntoResponse, AppError> {
    let body = LedgerService::new(&config).export_csv()?;
    debug!("Operator {} exported {} bytes of ledger", user.id, body.len());

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", EXPORT_FILE_NAME),
            ),
        ],
        body,
    ))
}

#[axum::debug_handler]
pub async fn check_consistency(
    State(config): State<Arc<AppConfig>>,
    Extension(_user): Extension<User>,
) -> Result<Json<ConsistencyReport>, AppError> {
    let report = ConsistencyService::new(&config).check()?;
    Ok(Json(report))
}
