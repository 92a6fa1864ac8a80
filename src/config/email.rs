use serde::Deserialize;
use secrecy::SecretString;

/// SMTP relay used for notification emails.
#[derive(Debug, Deserialize, Clone)]
pub struct EmailSettings {
    pub enabled: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    #[serde(default)]
    pub username: String,
    pub password: SecretString,
    pub from_address: String,
    #[serde(default)]
    pub starttls: bool,
}

impl EmailSettings {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            smtp_host: "localhost".to_string(),
            smtp_port: 1025,
            username: String::new(),
            password: SecretString::new(String::new().into_boxed_str()),
            from_address: "Pulsewise <no-reply@pulsewise.local>".to_string(),
            starttls: false,
        }
    }

    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty()
    }
}
