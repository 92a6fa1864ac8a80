use serde::Deserialize;
use secrecy::SecretString;

#[derive(Deserialize, Debug, Clone)]
pub struct AdviceSettings {
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    pub api_key: SecretString,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    20
}

impl AdviceSettings {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            base_url: String::new(),
            model: String::new(),
            api_key: SecretString::new(String::new().into_boxed_str()),
            timeout_secs: default_timeout_secs(),
        }
    }
}
