use std::sync::Arc;

use axum::{
    extract::{Extension, Query, State},
    Json,
};
use tracing::debug;

use shared_config::AppConfig;
use shared_models::auth::User;
use shared_models::error::AppError;

use crate::models::{PatientError, PatientLookupQuery, PatientLookupResponse};
use crate::services::PatientLookupService;

impl From<PatientError> for AppError {
    fn from(err: PatientError) -> Self {
        match err {
            PatientError::ValidationError(msg) => AppError::ValidationError(msg),
            PatientError::RosterUnavailable(e) => AppError::Persistence(e.to_string()),
        }
    }
}

#[axum::debug_handler]
pub async fn lookup_patient(
    State(config): State<Arc<AppConfig>>,
    Extension(user): Extension<User>,
    Query(query): Query<PatientLookupQuery>,
) -> Result<Json<PatientLookupResponse>, AppError> {
    debug!("Operator {} looking up patient status", user.id);

    let service = PatientLookupService::new(&config);
    let response = service.lookup(&query.name)?;

    Ok(Json(response))
}
