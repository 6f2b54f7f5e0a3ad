use chrono::NaiveDate;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::config::AppConfig;
use crate::error::AppError;
use crate::models::NewApar;

const APAR_DATE_FORMAT: &str = "%Y-%m-%d";

/// Employee master fields as returned by the directory lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DirectoryEmployee {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub designation: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<String>,
    #[serde(default)]
    pub date_of_joining: Option<String>,
    #[serde(default)]
    pub mobile_number: Option<String>,
    #[serde(default)]
    pub father_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmployeeResponse {
    #[serde(rename = "Data", default)]
    data: Vec<DirectoryEmployee>,
}

#[derive(Debug, Deserialize)]
struct AparResponse {
    #[serde(default)]
    success: Value,
    #[serde(default)]
    data: Vec<AparRecord>,
}

#[derive(Debug, Deserialize)]
struct AparRecord {
    employee: Option<String>,
    reporting_officer: Option<String>,
    reviewing_officer: Option<String>,
    status: Option<String>,
    grade: Option<String>,
    grade_label: Option<String>,
    date_from: Option<String>,
    date_to: Option<String>,
}

/// The two HR services the application reads from.
#[rocket::async_trait]
pub trait EmployeeDirectory: Send + Sync {
    /// Master data for one employee; `Ok(None)` when the service does not know the id.
    async fn lookup_employee(&self, emp_id: &str) -> Result<Option<DirectoryEmployee>, AppError>;

    /// Appraisal cycles on record; `Ok(None)` when the service does not know the id.
    async fn lookup_apars(&self, emp_id: &str) -> Result<Option<Vec<NewApar>>, AppError>;
}

pub fn parse_employee_response(body: &str) -> Result<Option<DirectoryEmployee>, AppError> {
    let response: EmployeeResponse = serde_json::from_str(body)
        .map_err(|e| AppError::ExternalService(format!("Invalid employee response: {}", e)))?;

    Ok(response.data.into_iter().next())
}

fn parse_date(field: &str, value: Option<&str>) -> Result<NaiveDate, AppError> {
    let value = value.ok_or_else(|| {
        AppError::ExternalService(format!("APAR record is missing {}", field))
    })?;

    NaiveDate::parse_from_str(value.trim(), APAR_DATE_FORMAT).map_err(|e| {
        AppError::ExternalService(format!("Invalid {} '{}' in APAR record: {}", field, value, e))
    })
}

fn is_success(flag: &Value) -> bool {
    match flag {
        Value::String(s) => s == "1",
        Value::Number(n) => n.as_i64() == Some(1),
        Value::Bool(b) => *b,
        _ => false,
    }
}

pub fn parse_apar_response(emp_id: &str, body: &str) -> Result<Option<Vec<NewApar>>, AppError> {
    let response: AparResponse = serde_json::from_str(body)
        .map_err(|e| AppError::ExternalService(format!("Invalid APAR response: {}", e)))?;

    if !is_success(&response.success) {
        return Ok(None);
    }

    let apars = response
        .data
        .into_iter()
        .map(|record| {
            Ok(NewApar {
                cdac_emp_id: emp_id.to_string(),
                name: record.employee.unwrap_or_default(),
                apar_status: record.status,
                date_from: parse_date("date_from", record.date_from.as_deref())?,
                date_to: parse_date("date_to", record.date_to.as_deref())?,
                grade: record.grade,
                grade_label: record.grade_label,
                reporting_officer: record.reporting_officer,
                reviewing_officer: record.reviewing_officer,
            })
        })
        .collect::<Result<Vec<_>, AppError>>()?;

    Ok(Some(apars))
}

/// `EmployeeDirectory` backed by the HR HTTP endpoints.
pub struct HttpDirectory {
    client: Client,
    employee_api_url: Option<String>,
    apar_api_url: Option<String>,
}

impl HttpDirectory {
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(config.api_timeout())
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            employee_api_url: config.employee_api_url.clone(),
            apar_api_url: config.apar_api_url.clone(),
        })
    }

    async fn fetch(&self, url: Option<&str>, emp_id: &str) -> Result<String, AppError> {
        let url = url.ok_or_else(|| {
            AppError::ExternalService("External service not configured".to_string())
        })?;

        let resp = self
            .client
            .get(url)
            .query(&[("emp_id", emp_id)])
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            warn!(%status, "Lookup returned an error status");
            return Err(AppError::ExternalService(format!(
                "Lookup failed ({status})"
            )));
        }

        Ok(resp.text().await?)
    }
}

#[rocket::async_trait]
impl EmployeeDirectory for HttpDirectory {
    #[instrument(skip(self))]
    async fn lookup_employee(&self, emp_id: &str) -> Result<Option<DirectoryEmployee>, AppError> {
        info!("Looking up employee in directory");
        let body = self.fetch(self.employee_api_url.as_deref(), emp_id).await?;
        parse_employee_response(&body)
    }

    #[instrument(skip(self))]
    async fn lookup_apars(&self, emp_id: &str) -> Result<Option<Vec<NewApar>>, AppError> {
        info!("Looking up APAR history");
        let body = self.fetch(self.apar_api_url.as_deref(), emp_id).await?;
        parse_apar_response(emp_id, &body)
    }
}
