use crate::error::{BillingError, Result};
use crate::simulate::SimulatorSettings;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub billing: BillingSettings,
    #[serde(default)]
    pub simulator: SimulatorSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BillingSettings {
    #[serde(default = "default_currency_symbol")]
    pub currency_symbol: String,
}

fn default_currency_symbol() -> String {
    "€".to_string()
}

impl Default for BillingSettings {
    fn default() -> Self {
        Self {
            currency_symbol: default_currency_symbol(),
        }
    }
}

/// Get the data directory path (platform config dir, or ~/.printbill/)
pub fn data_dir() -> Result<PathBuf> {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "printbill") {
        return Ok(proj_dirs.config_dir().to_path_buf());
    }

    let home = std::env::var_os("HOME").map(PathBuf::from).ok_or_else(|| {
        BillingError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine home directory",
        ))
    })?;

    Ok(home.join(".printbill"))
}

/// Load config.toml from the data directory
pub fn load_config(data_dir: &Path) -> Result<Config> {
    let path = data_dir.join(CONFIG_FILE);
    if !path.exists() {
        return Err(BillingError::ConfigFileNotFound(path));
    }
    let content = fs::read_to_string(&path)?;
    let config: Config =
        toml::from_str(&content).map_err(|e| BillingError::ConfigParse { path, source: e })?;
    config.simulator.validate()?;
    Ok(config)
}

/// Template content for config.toml
pub const CONFIG_TEMPLATE: &str = r#"[billing]
currency_symbol = "€"

[simulator]
# A billing period above the high threshold is paid less often and later,
# one below the low threshold more often and sooner.
high_debt_threshold = 50.0
low_debt_threshold = 10.0

# Chance that a period gets paid at all, and days before payments start.
[simulator.profiles.individual]
probability = 0.9
delay_days = 10.0

[simulator.profiles.team]
probability = 0.7
delay_days = 20.0

[simulator.profiles.unit]
probability = 0.6
delay_days = 25.0

[simulator.profiles.sector]
probability = 0.5
delay_days = 30.0
"#;
