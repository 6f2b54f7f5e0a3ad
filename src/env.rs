use std::path::Path;

use tracing::{info, warn};

const COMMON_ENV: &str = "config/common.env";
const SECRETS_ENV: &str = ".secrets.env";

fn env_files(profile: &str) -> Vec<&'static str> {
    if profile == "production" {
        vec![COMMON_ENV, "config/prod.env", SECRETS_ENV]
    } else {
        vec![COMMON_ENV, "config/dev.env", SECRETS_ENV]
    }
}

/// Loads the layered env files for the active `ROCKET_PROFILE`. Later files win.
pub fn load_environment() -> Result<(), dotenvy::Error> {
    let profile = dotenvy::var("ROCKET_PROFILE").unwrap_or_else(|_| "development".to_string());

    for env_file in env_files(&profile) {
        load_env_file(env_file)?;
    }

    Ok(())
}

fn load_env_file(path: &str) -> Result<(), dotenvy::Error> {
    if !Path::new(path).exists() {
        warn!("Environment file {} not found, skipping", path);
        return Ok(());
    }

    dotenvy::from_filename_override(path)?;
    info!("Loaded environment from: {}", path);
    Ok(())
}
