use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{Duration, NaiveDate, Utc};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::auth::{AuthTokens, Session, User, UserRole};

pub struct TestConfig {
    pub api_base_url: String,
    pub fallback_error_message: String,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:54321".to_string(),
            fallback_error_message: shared_config::DEFAULT_FALLBACK_ERROR.to_string(),
        }
    }
}

impl TestConfig {
    pub fn with_base_url(api_base_url: &str) -> Self {
        Self {
            api_base_url: api_base_url.to_string(),
            ..Self::default()
        }
    }

    pub fn to_app_config(&self) -> AppConfig {
        let mut config = AppConfig::for_base_url(self.api_base_url.clone());
        config.request_timeout_secs = 5;
        config.fallback_error_message = self.fallback_error_message.clone();
        config
    }

    pub fn to_arc(&self) -> Arc<AppConfig> {
        Arc::new(self.to_app_config())
    }
}

pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
}

impl Default for TestUser {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            role: UserRole::Patient,
        }
    }
}

impl TestUser {
    pub fn new(email: &str, role: UserRole) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.to_string(),
            role,
        }
    }

    pub fn provider(email: &str) -> Self {
        Self::new(email, UserRole::Provider)
    }

    pub fn patient(email: &str) -> Self {
        Self::new(email, UserRole::Patient)
    }

    pub fn to_user(&self) -> User {
        User {
            id: self.id,
            email: self.email.clone(),
            first_name: Some("Test".to_string()),
            last_name: Some("User".to_string()),
            role: self.role,
            created_at: Some(Utc::now()),
        }
    }

    pub fn to_session(&self) -> Session {
        Session::new(
            self.to_user(),
            AuthTokens {
                access_token: JwtTestUtils::create_test_token(self, Some(24)),
                refresh_token: Some(format!("refresh-{}", self.id)),
            },
        )
    }
}

pub struct JwtTestUtils;

impl JwtTestUtils {
    /// Builds a JWT-shaped token. The signature segment is filler; the client
    /// never verifies it.
    pub fn create_test_token(user: &TestUser, exp_hours: Option<i64>) -> String {
        let now = Utc::now();
        let exp = now + Duration::hours(exp_hours.unwrap_or(24));

        let header = json!({
            "alg": "HS256",
            "typ": "JWT"
        });

        let payload = json!({
            "sub": user.id,
            "email": user.email,
            "role": user.role,
            "iat": now.timestamp(),
            "exp": exp.timestamp()
        });

        let header_encoded = general_purpose::URL_SAFE_NO_PAD.encode(header.to_string());
        let payload_encoded = general_purpose::URL_SAFE_NO_PAD.encode(payload.to_string());
        let signature_encoded = general_purpose::URL_SAFE_NO_PAD.encode("test-signature");

        format!("{}.{}.{}", header_encoded, payload_encoded, signature_encoded)
    }

    pub fn create_expired_token(user: &TestUser) -> String {
        Self::create_test_token(user, Some(-1))
    }

    pub fn create_malformed_token() -> String {
        "invalid.token.format".to_string()
    }
}

pub struct MockPortalResponses;

impl MockPortalResponses {
    pub fn slot(id: Uuid, date: NaiveDate, start: &str, end: &str, status: &str) -> Value {
        json!({
            "id": id,
            "date": date.format("%Y-%m-%d").to_string(),
            "start_time": start,
            "end_time": end,
            "duration": 30,
            "appointment_type": "consultation",
            "status": status,
            "location": {
                "type": "clinic",
                "address": "12 Harbour Street",
                "room": "3B"
            },
            "pricing": {
                "base_fee": 120.0,
                "currency": "USD",
                "insurance_accepted": true
            },
            "is_recurring": false,
            "recurrence_pattern": null,
            "recurrence_end_date": null,
            "notes": null,
            "max_appointments_per_slot": 1
        })
    }

    pub fn availability_response(days: Vec<(NaiveDate, Vec<Value>)>, summary: Value) -> Value {
        let availability: Vec<Value> = days
            .into_iter()
            .map(|(date, slots)| {
                json!({
                    "date": date.format("%Y-%m-%d").to_string(),
                    "slots": slots
                })
            })
            .collect();

        json!({
            "success": true,
            "data": {
                "availability": availability,
                "availability_summary": summary
            }
        })
    }

    pub fn summary(total: u32, available: u32, booked: u32, cancelled: u32) -> Value {
        json!({
            "total_slots": total,
            "available_slots": available,
            "booked_slots": booked,
            "cancelled_slots": cancelled
        })
    }

    pub fn auth_response(user: &TestUser, access_token: &str, refresh_token: Option<&str>) -> Value {
        json!({
            "success": true,
            "data": {
                "user": {
                    "id": user.id,
                    "email": user.email,
                    "first_name": "Test",
                    "last_name": "User",
                    "role": user.role
                },
                "access_token": access_token,
                "refresh_token": refresh_token
            }
        })
    }

    pub fn ok_response(message: &str) -> Value {
        json!({
            "success": true,
            "message": message
        })
    }

    pub fn error_response(message: &str) -> Value {
        json!({
            "success": false,
            "message": message
        })
    }
}
