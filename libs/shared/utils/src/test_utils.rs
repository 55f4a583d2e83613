use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha256;
use tempfile::TempDir;

use shared_config::{AppConfig, DEFAULT_TOKEN_TTL_HOURS};
use shared_models::auth::{User, OPERATOR_ROLE};

pub const PATIENTS_CSV: &str = "\
Name,DOB,Email,Phone
Jane Doe,1985-04-12,jane@example.com,555-0101
John Roe,1990-01-01,,
";

/// Deliberately not in date/time order; Dr. Smith 11:00 is already booked.
pub const SCHEDULE_CSV: &str = "\
Doctor,Date,Time,Status
Dr. Smith,2024-05-01,10:00,Available
Dr. Smith,2024-05-01,09:00,Available
Dr. Smith,2024-05-01,11:00,Booked
Dr. Jones,2024-05-01,10:00,Available
Dr. Smith,2024-05-02,10:00,Available
Dr. Jones,2024-05-03,14:00,Booked
";

pub struct TestConfig {
    pub jwt_secret: String,
    pub data_dir: PathBuf,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "test-secret-key-for-jwt-validation-must-be-long-enough".to_string(),
            data_dir: std::env::temp_dir().join("care-pro-test-data"),
        }
    }
}

impl TestConfig {
    pub fn to_app_config(&self) -> AppConfig {
        AppConfig {
            patients_file: PathBuf::new(),
            schedule_file: PathBuf::new(),
            appointments_file: PathBuf::new(),
            operators_file: PathBuf::new(),
            jwt_secret: self.jwt_secret.clone(),
            token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
            bind_addr: "127.0.0.1:0".to_string(),
        }
        .with_data_dir(&self.data_dir)
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: String,
    pub role: String,
}

impl Default for TestUser {
    fn default() -> Self {
        Self::operator("user1")
    }
}

impl TestUser {
    pub fn new(id: &str, role: &str) -> Self {
        Self {
            id: id.to_string(),
            role: role.to_string(),
        }
    }

    pub fn operator(id: &str) -> Self {
        Self::new(id, OPERATOR_ROLE)
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id.clone(),
            role: Some(self.role.clone()),
            created_at: Some(Utc::now()),
        }
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    pub fn create_test_token(user: &TestUser, secret: &str, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "role": user.role,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());

        let signing_input = format!("{}.{}", header_encoded, payload_encoded);

        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(signing_input.as_bytes());
        let signature = mac.finalize().into_bytes();
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode(signature);

        format!("{}.{}", signing_input, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser, secret: &str) -> String {
        Self::create_test_token(user, secret, Some(-1))
    }

    pub fn create_invalid_signature_token(user: &TestUser) -> String {
        Self::create_test_token(user, "wrong-secret", Some(24))
    }
}

/// A throwaway data directory seeded with the roster and schedule fixtures above.
pub struct TestClinic {
    dir: TempDir,
    pub config: AppConfig,
}

impl TestClinic {
    pub fn new() -> Self {
        Self::with_files(PATIENTS_CSV, SCHEDULE_CSV)
    }

    pub fn with_files(patients_csv: &str, schedule_csv: &str) -> Self {
        let dir = tempfile::tempdir().expect("create temp data dir");
        let test_config = TestConfig {
            data_dir: dir.path().to_path_buf(),
            ..TestConfig::default()
        };
        let config = test_config.to_app_config();

        fs::write(&config.patients_file, patients_csv).expect("write patients fixture");
        fs::write(&config.schedule_file, schedule_csv).expect("write schedule fixture");

        Self { dir, config }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.config.clone())
    }

    /// Operators as `(username, argon2 PHC hash)` pairs. Hashes contain commas, so they are quoted.
    pub fn write_operators(&self, operators: &[(&str, &str)]) {
        let mut body = String::from("Username,Password Hash\n");
        for (username, hash) in operators {
            body.push_str(&format!("{},\"{}\"\n", username, hash));
        }
        fs::write(&self.config.operators_file, body).expect("write operators fixture");
    }

    pub fn read_schedule(&self) -> String {
        fs::read_to_string(&self.config.schedule_file).expect("read schedule")
    }

    pub fn read_appointments(&self) -> Option<String> {
        fs::read_to_string(&self.config.appointments_file).ok()
    }

    pub fn token(&self, user: &TestUser) -> String {
        JwtTestUtils::create_test_token(user, &self.config.jwt_secret, Some(1))
    }
}

impl Default for TestClinic {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_creation() {
        let config = TestConfig::default();
        let app_config = config.to_app_config();

        assert!(app_config.is_configured());
        assert!(app_config.schedule_file.ends_with("doctor_schedule.csv"));
        assert!(app_config.appointments_file.starts_with(&config.data_dir));
    }

    #[test]
    fn test_user_creation() {
        let user = TestUser::operator("admin");
        let user_model = user.to_user();

        assert_eq!(user_model.id, "admin");
        assert_eq!(user_model.role.as_deref(), Some(OPERATOR_ROLE));
    }

    #[test]
    fn test_jwt_token_creation() {
        let user = TestUser::default();
        let token = JwtTestUtils::create_test_token(&user, "test-secret", Some(1));

        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn test_clinic_seeds_fixture_files() {
        let clinic = TestClinic::new();

        assert!(clinic.read_schedule().starts_with("Doctor,Date,Time,Status"));
        assert!(clinic.read_appointments().is_none());
        assert!(clinic.config.patients_file.starts_with(clinic.path()));
    }
}
