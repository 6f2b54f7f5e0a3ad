use std::path::PathBuf;
use std::time::Duration;

use rocket::figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};

pub const ENV_PREFIX: &str = "APAR_";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub database_url: String,
    /// Directory holding the scanned APAR documents.
    pub pdf_directory: PathBuf,
    /// Employee directory lookup endpoint, called as `GET <url>?emp_id=<id>`.
    pub employee_api_url: Option<String>,
    /// Appraisal history endpoint, called as `GET <url>?emp_id=<id>`.
    pub apar_api_url: Option<String>,
    pub api_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://apar.db?mode=rwc".to_string(),
            pdf_directory: PathBuf::from("./pdfs"),
            employee_api_url: None,
            apar_api_url: None,
            api_timeout_secs: 10,
        }
    }
}

impl AppConfig {
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default())).merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn load() -> Result<Self, rocket::figment::Error> {
        Self::figment().extract()
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }
}
