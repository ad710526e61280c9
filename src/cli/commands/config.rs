//! Config command implementation.

use crate::cli::ConfigAction;
use crate::config::Settings;
use anyhow::Result;

/// Run the config command.
pub fn run_config(action: &ConfigAction, settings: Settings) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let mut redacted = settings;
            if redacted.database.password.is_some() {
                redacted.database.password = Some("********".to_string());
            }
            if redacted.openai.api_key.is_some() {
                redacted.openai.api_key = Some("********".to_string());
            }

            let toml_str = toml::to_string_pretty(&redacted)
                .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;
            println!("{}", toml_str);
        }

        ConfigAction::Path => {
            let config_path = Settings::default_config_path();
            println!("{}", config_path.display());
        }
    }

    Ok(())
}
