use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const ALLOWED_GENDERS: &[&str] = &["male", "female", "other"];

#[derive(Debug, sqlx::FromRow, Serialize)]
pub struct ProfileResponse {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub height_cm: Option<f32>,
    pub weight_kg: Option<f32>,
    pub email_notifications: bool,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub height_cm: Option<f32>,
    pub weight_kg: Option<f32>,
    pub email_notifications: Option<bool>,
}

impl UpdateProfileRequest {
    /// Returns the first validation error, if any.
    pub fn validate(&self, today: NaiveDate) -> Result<(), String> {
        if let Some(height) = self.height_cm {
            if !(50.0..=260.0).contains(&height) {
                return Err("Height must be between 50 and 260 cm".to_string());
            }
        }
        if let Some(weight) = self.weight_kg {
            if !(20.0..=400.0).contains(&weight) {
                return Err("Weight must be between 20 and 400 kg".to_string());
            }
        }
        if let Some(dob) = self.date_of_birth {
            if dob > today {
                return Err("Date of birth cannot be in the future".to_string());
            }
        }
        if let Some(gender) = &self.gender {
            if !ALLOWED_GENDERS.contains(&gender.as_str()) {
                return Err("Gender must be one of: male, female, other".to_string());
            }
        }
        Ok(())
    }
}
