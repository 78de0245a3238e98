use serde::{Deserialize, Serialize};

const SETTINGS_KEY: &str = "settings";

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api";
pub const DEFAULT_IMAGE_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_AVATAR: &str = "/default-avatar.png";
pub const DEFAULT_MONTHLY_FEE: i64 = 4000;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub api_base_url: String,
    pub image_base_url: String,
    pub currency_symbol: String,
    pub default_monthly_fee: i64,
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            api_base_url: option_env!("ACADEMY_API_BASE_URL")
                .unwrap_or(DEFAULT_API_BASE_URL)
                .to_string(),
            image_base_url: option_env!("ACADEMY_IMAGE_BASE_URL")
                .unwrap_or(DEFAULT_IMAGE_BASE_URL)
                .to_string(),
            currency_symbol: "Rs".to_string(),
            default_monthly_fee: DEFAULT_MONTHLY_FEE,
        }
    }
}

impl AppSettings {
    /// Trims the URLs and replaces blank or non-positive values with defaults.
    pub fn normalized(mut self) -> Self {
        let defaults = AppSettings::default();
        self.api_base_url = self.api_base_url.trim().trim_end_matches('/').to_string();
        self.image_base_url = self.image_base_url.trim().trim_end_matches('/').to_string();
        if self.api_base_url.is_empty() {
            self.api_base_url = defaults.api_base_url;
        }
        if self.image_base_url.is_empty() {
            self.image_base_url = defaults.image_base_url;
        }
        if self.currency_symbol.trim().is_empty() {
            self.currency_symbol = defaults.currency_symbol;
        }
        if self.default_monthly_fee <= 0 {
            self.default_monthly_fee = defaults.default_monthly_fee;
        }
        self
    }
}

pub fn load_settings() -> AppSettings {
    if let Some(window) = web_sys::window() {
        if let Ok(Some(storage)) = window.local_storage() {
            if let Ok(Some(raw)) = storage.get_item(SETTINGS_KEY) {
                match serde_json::from_str::<AppSettings>(&raw) {
                    Ok(settings) => return settings.normalized(),
                    Err(e) => log::warn!("Ignoring stored settings: {}", e),
                }
            }
        }
    }
    AppSettings::default()
}

pub fn save_settings(settings: &AppSettings) {
    if let Some(window) = web_sys::window() {
        if let Ok(Some(storage)) = window.local_storage() {
            if let Ok(raw) = serde_json::to_string(settings) {
                if storage.set_item(SETTINGS_KEY, &raw).is_err() {
                    log::warn!("Could not persist settings");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_stored_settings_fill_in_defaults() {
        let parsed: AppSettings = serde_json::from_str(r#"{"currency_symbol":"LKR"}"#).unwrap();
        assert_eq!(parsed.currency_symbol, "LKR");
        assert_eq!(parsed.default_monthly_fee, DEFAULT_MONTHLY_FEE);
    }

    #[test]
    fn normalized_strips_trailing_slash_and_blank_values() {
        let settings = AppSettings {
            api_base_url: " https://school.example/api/ ".to_string(),
            image_base_url: "".to_string(),
            currency_symbol: " ".to_string(),
            default_monthly_fee: 0,
        }
        .normalized();
        assert_eq!(settings.api_base_url, "https://school.example/api");
        assert_eq!(settings.image_base_url, AppSettings::default().image_base_url);
        assert_eq!(settings.currency_symbol, "Rs");
        assert_eq!(settings.default_monthly_fee, 4000);
    }
}
