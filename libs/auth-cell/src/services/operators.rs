use std::sync::Arc;

use tracing::{info, instrument, warn};

use shared_config::AppConfig;
use shared_database::{CsvTable, TableStore};
use shared_models::auth::{LoginResponse, OPERATOR_ROLE};
use shared_utils::jwt::issue_token;

use crate::models::{AuthError, Operator};
use crate::services::password::verify_password;

pub struct OperatorService {
    operators: Arc<dyn TableStore<Operator>>,
    jwt_secret: String,
    token_ttl_hours: i64,
}

impl OperatorService {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            operators: Arc::new(CsvTable::<Operator>::new(config.operators_file.clone())),
            jwt_secret: config.jwt_secret.clone(),
            token_ttl_hours: config.token_ttl_hours,
        }
    }

    /// Operator whose password matches. Unknown names and wrong passwords are indistinguishable.
    #[instrument(skip(self, password))]
    pub fn authenticate(&self, username: &str, password: &str) -> Result<Operator, AuthError> {
        let username = username.trim();
        let operator = self
            .operators
            .load()?
            .rows
            .into_iter()
            .find(|operator| operator.username == username);

        let Some(operator) = operator else {
            warn!("Login attempt for unknown operator");
            return Err(AuthError::InvalidCredentials);
        };

        let matches = verify_password(password, &operator.password_hash)
            .map_err(|e| AuthError::BadHash(e.to_string()))?;
        if !matches {
            warn!("Wrong password for operator {}", operator.username);
            return Err(AuthError::InvalidCredentials);
        }

        Ok(operator)
    }

    pub fn login(&self, username: &str, password: &str) -> Result<LoginResponse, AuthError> {
        let operator = self.authenticate(username, password)?;

        let (access_token, expires_at) = issue_token(
            &operator.username,
            OPERATOR_ROLE,
            &self.jwt_secret,
            self.token_ttl_hours,
        )
        .map_err(AuthError::Token)?;

        info!("Operator {} logged in", operator.username);
        Ok(LoginResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_at,
        })
    }
}
