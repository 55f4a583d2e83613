use std::env;
use std::path::PathBuf;
use tracing::warn;

pub const DEFAULT_PATIENTS_FILE: &str = "patient_database.csv";
pub const DEFAULT_SCHEDULE_FILE: &str = "doctor_schedule.csv";
pub const DEFAULT_APPOINTMENTS_FILE: &str = "all_appointments.csv";
pub const DEFAULT_OPERATORS_FILE: &str = "operators.csv";
pub const DEFAULT_TOKEN_TTL_HOURS: i64 = 8;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub patients_file: PathBuf,
    pub schedule_file: PathBuf,
    pub appointments_file: PathBuf,
    pub operators_file: PathBuf,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub bind_addr: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            patients_file: env::var("CARE_PRO_PATIENTS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    warn!("CARE_PRO_PATIENTS_FILE not set, using {}", DEFAULT_PATIENTS_FILE);
                    PathBuf::from(DEFAULT_PATIENTS_FILE)
                }),
            schedule_file: env::var("CARE_PRO_SCHEDULE_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    warn!("CARE_PRO_SCHEDULE_FILE not set, using {}", DEFAULT_SCHEDULE_FILE);
                    PathBuf::from(DEFAULT_SCHEDULE_FILE)
                }),
            appointments_file: env::var("CARE_PRO_APPOINTMENTS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    warn!("CARE_PRO_APPOINTMENTS_FILE not set, using {}", DEFAULT_APPOINTMENTS_FILE);
                    PathBuf::from(DEFAULT_APPOINTMENTS_FILE)
                }),
            operators_file: env::var("CARE_PRO_OPERATORS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    warn!("CARE_PRO_OPERATORS_FILE not set, using {}", DEFAULT_OPERATORS_FILE);
                    PathBuf::from(DEFAULT_OPERATORS_FILE)
                }),
            jwt_secret: env::var("CARE_PRO_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("CARE_PRO_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            token_ttl_hours: env::var("CARE_PRO_TOKEN_TTL_HOURS")
                .ok()
                .and_then(|value| match value.parse::<i64>() {
                    Ok(hours) if hours > 0 => Some(hours),
                    _ => {
                        warn!("CARE_PRO_TOKEN_TTL_HOURS is not a positive integer: {}", value);
                        None
                    }
                })
                .unwrap_or(DEFAULT_TOKEN_TTL_HOURS),
            bind_addr: env::var("CARE_PRO_BIND_ADDR")
                .unwrap_or_else(|_| {
                    warn!("CARE_PRO_BIND_ADDR not set, using {}", DEFAULT_BIND_ADDR);
                    DEFAULT_BIND_ADDR.to_string()
                }),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - tokens cannot be issued without CARE_PRO_JWT_SECRET");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.jwt_secret.is_empty()
    }

    /// Same files, rooted under `dir`. Used by fixtures and the `CARE_PRO_DATA_DIR` override.
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        self.patients_file = dir.join(DEFAULT_PATIENTS_FILE);
        self.schedule_file = dir.join(DEFAULT_SCHEDULE_FILE);
        self.appointments_file = dir.join(DEFAULT_APPOINTMENTS_FILE);
        self.operators_file = dir.join(DEFAULT_OPERATORS_FILE);
        self
    }
}
