use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::import::{DEFAULT_BATCH_SIZE, DEFAULT_MAX_ERRORS};
use crate::domain::model::SERIAL_WIDTH;
use crate::utils::error::{RegistryError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_range, validate_url, Validate,
};

/// Settings file for the registry tooling. Every section and field is
/// optional; built-in defaults match the legacy deployment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub registry: RegistrySettings,
    #[serde(default)]
    pub import: ImportSettings,
    pub sms: Option<SmsSettings>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistrySettings {
    pub serial_width: Option<usize>,
}

impl RegistrySettings {
    pub fn width(&self) -> usize {
        self.serial_width.unwrap_or(SERIAL_WIDTH)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportSettings {
    pub batch_size: Option<usize>,
    pub max_errors: Option<usize>,
}

impl ImportSettings {
    pub fn batch_size(&self) -> usize {
        self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE)
    }

    pub fn max_errors(&self) -> usize {
        self.max_errors.unwrap_or(DEFAULT_MAX_ERRORS)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsSettings {
    pub endpoint: String,
    pub api_key: String,
}

impl Settings {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(RegistryError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed = substitute_env_vars(content);
        toml::from_str(&processed).map_err(|e| RegistryError::ConfigError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }
}

/// Replaces `${VAR_NAME}` markers with the named environment variable;
/// unset variables are left as-is so validation can point at them.
fn substitute_env_vars(content: &str) -> String {
    use regex::Regex;
    let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

    re.replace_all(content, |caps: &regex::Captures| {
        let var_name = &caps[1];
        std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
    })
    .to_string()
}

impl Validate for Settings {
    fn validate(&self) -> Result<()> {
        // The numeric part of a canonical serial must fit a u128, which caps
        // the width at 38 digits.
        validate_range("registry.serial_width", self.registry.width(), 1, 38)?;
        validate_positive_number("import.batch_size", self.import.batch_size(), 1)?;
        validate_positive_number("import.max_errors", self.import.max_errors(), 1)?;

        if let Some(sms) = &self.sms {
            validate_url("sms.endpoint", &sms.endpoint)?;
            validate_non_empty_string("sms.api_key", &sms.api_key)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_without_a_file() {
        let settings = Settings::default();
        assert_eq!(settings.registry.width(), SERIAL_WIDTH);
        assert_eq!(settings.import.batch_size(), DEFAULT_BATCH_SIZE);
        assert_eq!(settings.import.max_errors(), DEFAULT_MAX_ERRORS);
        assert!(settings.sms.is_none());
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_parse_full_settings() {
        let toml_content = r#"
[registry]
serial_width = 30

[import]
batch_size = 500
max_errors = 50

[sms]
endpoint = "https://api.kavenegar.com"
api_key = "secret"
"#;
        let settings = Settings::from_toml_str(toml_content).unwrap();
        assert_eq!(settings.registry.width(), 30);
        assert_eq!(settings.import.batch_size(), 500);
        assert_eq!(settings.import.max_errors(), 50);
        assert_eq!(settings.sms.as_ref().unwrap().api_key, "secret");
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings.registry.width(), SERIAL_WIDTH);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("TEST_SMS_API_KEY", "from-env");

        let toml_content = r#"
[sms]
endpoint = "https://api.kavenegar.com"
api_key = "${TEST_SMS_API_KEY}"
"#;
        let settings = Settings::from_toml_str(toml_content).unwrap();
        assert_eq!(settings.sms.unwrap().api_key, "from-env");

        std::env::remove_var("TEST_SMS_API_KEY");
    }

    #[test]
    fn test_invalid_width_fails_validation() {
        let settings = Settings::from_toml_str("[registry]\nserial_width = 120\n").unwrap();
        assert!(settings.validate().is_err());

        let settings = Settings::from_toml_str("[registry]\nserial_width = 0\n").unwrap();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_bad_sms_endpoint_fails_validation() {
        let toml_content = r#"
[sms]
endpoint = "not-a-url"
api_key = "secret"
"#;
        let settings = Settings::from_toml_str(toml_content).unwrap();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_settings_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[import]\nbatch_size = 250\n").unwrap();

        let settings = Settings::from_file(file.path()).unwrap();
        assert_eq!(settings.import.batch_size(), 250);
    }
}
