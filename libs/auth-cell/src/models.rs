use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use shared_models::auth::{AuthTokens, User};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRegistration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub specialty: String,
    pub license_number: String,
    pub years_experience: Option<u32>,
    pub practice_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientRegistration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub insurance_provider: Option<String>,
}

/// `data` of a successful login or registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthPayload {
    pub user: User,
    #[serde(flatten)]
    pub tokens: AuthTokens,
}
