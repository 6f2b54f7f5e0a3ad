#[macro_use]
extern crate rocket;

mod auth;
mod catalog;
mod config;
mod db;
mod directory;
mod env;
mod error;
mod listing;
mod models;
mod routes;
mod telemetry;
#[cfg(test)]
mod test;
mod validation;

use auth::{
    home, login, logout, not_found, process_login, process_logout, process_register, register,
    unauthorized,
};
use catalog::sync_directory;
use config::AppConfig;
use directory::HttpDirectory;
use error::AppError;
use rocket::{Build, Rocket};
use rocket_dyn_templates::Template;
use routes::{
    Directory, dashboard, detail, download_pdf, employee, health, index, save_apars,
    save_employee, sync_catalog, view_pdf,
};
use telemetry::{TelemetryFairing, init_tracing};
use thiserror::Error;

use sqlx::{Pool, Sqlite, sqlite::SqlitePoolOptions};
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0}")]
    Figment(rocket::figment::Error),
    #[error("{0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Application error: {0}")]
    App(#[from] AppError),
    #[error("Launch error: {0}")]
    Launch(#[from] rocket::Error),
}

impl From<rocket::figment::Error> for Error {
    fn from(value: rocket::figment::Error) -> Self {
        Error::Figment(value)
    }
}

#[rocket::main]
async fn main() -> Result<(), Error> {
    if let Err(e) = env::load_environment() {
        eprintln!("Failed to load environment files: {}", e);
    }
    init_tracing();

    let config = AppConfig::load()?;

    let pool = SqlitePoolOptions::new()
        .connect(&config.database_url)
        .await?;

    info!("Running database migrations...");
    if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
        error!("Failed to run migrations: {}", e);
        return Err(AppError::from(e).into());
    }
    info!("Migrations completed successfully");

    let report = sync_directory(&pool, &config.pdf_directory).await?;
    info!("{}", report.summary());

    let directory: Directory = Box::new(HttpDirectory::new(&config)?);

    let _rocket = init_rocket(pool, config, directory).await.launch().await?;
    Ok(())
}

pub async fn init_rocket(pool: Pool<Sqlite>, config: AppConfig, directory: Directory) -> Rocket<Build> {
    info!("Starting APAR records service");

    rocket::build()
        .manage(pool)
        .manage(config)
        .manage(directory)
        .mount(
            "/",
            routes![
                home,
                login,
                process_login,
                register,
                process_register,
                logout,
                process_logout,
                dashboard,
                employee,
                save_employee,
                save_apars,
                index,
                view_pdf,
                download_pdf,
                detail,
                sync_catalog,
                health,
            ],
        )
        .register("/", catchers![unauthorized, not_found])
        .attach(Template::fairing())
        .attach(TelemetryFairing)
}
