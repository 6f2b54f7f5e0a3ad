use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Employee {
    pub cdac_emp_id: String,
    pub name: String,
    pub dept: String,
    pub designation: String,
    pub dob: String,
    pub doj: String,
    pub mobile_no: String,
    pub father_name: String,
    pub dossier_no: String,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbEmployee {
    pub cdac_emp_id: Option<String>,
    pub name: Option<String>,
    pub dept: Option<String>,
    pub designation: Option<String>,
    pub dob: Option<String>,
    pub doj: Option<String>,
    pub mobile_no: Option<String>,
    pub father_name: Option<String>,
    pub dossier_no: Option<String>,
}

impl From<DbEmployee> for Employee {
    fn from(employee: DbEmployee) -> Self {
        Self {
            cdac_emp_id: employee.cdac_emp_id.unwrap_or_default(),
            name: employee.name.unwrap_or_default(),
            dept: employee.dept.unwrap_or_default(),
            designation: employee.designation.unwrap_or_default(),
            dob: employee.dob.unwrap_or_default(),
            doj: employee.doj.unwrap_or_default(),
            mobile_no: employee.mobile_no.unwrap_or_default(),
            father_name: employee.father_name.unwrap_or_default(),
            dossier_no: employee.dossier_no.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewEmployee {
    pub cdac_emp_id: String,
    pub name: String,
    pub dept: String,
    pub designation: String,
    pub dob: String,
    pub doj: String,
    pub mobile_no: String,
    pub father_name: Option<String>,
    pub dossier_no: String,
}

#[derive(Debug, Serialize, Clone)]
pub struct PreviousApar {
    pub id: i64,
    pub cdac_emp_id: String,
    pub name: String,
    pub apar_status: String,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub grade: String,
    pub grade_label: String,
    pub reporting_officer: String,
    pub reviewing_officer: String,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbPreviousApar {
    pub id: Option<i64>,
    pub cdac_emp_id: Option<String>,
    pub name: Option<String>,
    pub apar_status: Option<String>,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub grade: Option<String>,
    pub grade_label: Option<String>,
    pub reporting_officer: Option<String>,
    pub reviewing_officer: Option<String>,
}

impl From<DbPreviousApar> for PreviousApar {
    fn from(db: DbPreviousApar) -> Self {
        Self {
            id: db.id.unwrap_or_default(),
            cdac_emp_id: db.cdac_emp_id.unwrap_or_default(),
            name: db.name.unwrap_or_default(),
            apar_status: db.apar_status.unwrap_or_default(),
            date_from: db.date_from,
            date_to: db.date_to,
            grade: db.grade.unwrap_or_default(),
            grade_label: db.grade_label.unwrap_or_default(),
            reporting_officer: db.reporting_officer.unwrap_or_default(),
            reviewing_officer: db.reviewing_officer.unwrap_or_default(),
        }
    }
}

/// One appraisal cycle as reported by the APAR service, before it is stored.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct NewApar {
    pub cdac_emp_id: String,
    pub name: String,
    pub apar_status: Option<String>,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub grade: Option<String>,
    pub grade_label: Option<String>,
    pub reporting_officer: Option<String>,
    pub reviewing_officer: Option<String>,
}

#[derive(Debug, Serialize, Clone)]
pub struct PdfMetadata {
    pub id: i64,
    pub dossier_number: String,
    pub apar_employee_name: String,
    pub employee_id: String,
    pub name: String,
    pub current_designation: String,
    pub filename: String,
}

#[derive(sqlx::FromRow, Clone)]
pub struct DbPdfMetadata {
    pub id: Option<i64>,
    pub dossier_number: Option<String>,
    pub apar_employee_name: Option<String>,
    pub employee_id: Option<String>,
    pub name: Option<String>,
    pub current_designation: Option<String>,
    pub filename: Option<String>,
}

impl From<DbPdfMetadata> for PdfMetadata {
    fn from(db: DbPdfMetadata) -> Self {
        Self {
            id: db.id.unwrap_or_default(),
            dossier_number: db.dossier_number.unwrap_or_default(),
            apar_employee_name: db.apar_employee_name.unwrap_or_default(),
            employee_id: db.employee_id.unwrap_or_default(),
            name: db.name.unwrap_or_default(),
            current_designation: db.current_designation.unwrap_or_default(),
            filename: db.filename.unwrap_or_default(),
        }
    }
}

/// What a single catalog upsert did to the row keyed by its filename.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    Unchanged,
}
