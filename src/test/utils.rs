#[cfg(test)]
pub mod test_db {
    use crate::catalog::parse_filename;
    use crate::db::{create_employee, create_user, save_previous_apars, upsert_pdf_metadata};
    use crate::error::AppError;
    use crate::models::{NewApar, NewEmployee};
    use chrono::NaiveDate;
    use sqlx::{Pool, Sqlite, sqlite::SqlitePoolOptions};
    use std::collections::HashMap;
    use std::sync::Once;
    use tracing::log::LevelFilter;

    static INIT: Once = Once::new();
    pub static STANDARD_PASSWORD: &str = "password123";

    pub fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, "%Y-%m-%d").expect("valid test date")
    }

    pub fn employee(cdac_emp_id: &str, name: &str, dept: &str, dossier_no: &str) -> NewEmployee {
        NewEmployee {
            cdac_emp_id: cdac_emp_id.to_string(),
            name: name.to_string(),
            dept: dept.to_string(),
            designation: "Project Engineer".to_string(),
            dob: "1990-01-01".to_string(),
            doj: "2015-06-01".to_string(),
            mobile_no: "9800000000".to_string(),
            father_name: None,
            dossier_no: dossier_no.to_string(),
        }
    }

    pub fn apar(cdac_emp_id: &str, date_from: &str, date_to: &str) -> NewApar {
        NewApar {
            cdac_emp_id: cdac_emp_id.to_string(),
            name: "Test Employee".to_string(),
            apar_status: Some("Completed".to_string()),
            date_from: date(date_from),
            date_to: date(date_to),
            grade: Some("9".to_string()),
            grade_label: Some("Outstanding".to_string()),
            reporting_officer: Some("R. Iyer".to_string()),
            reviewing_officer: Some("S. Nair".to_string()),
        }
    }

    pub struct TestPdf {
        pub filename: String,
        pub employee_id: Option<String>,
        pub name: Option<String>,
        pub current_designation: Option<String>,
    }

    #[derive(Default)]
    pub struct TestDbBuilder {
        users: Vec<(String, String)>,
        employees: Vec<NewEmployee>,
        apars: Vec<NewApar>,
        pdfs: Vec<TestPdf>,
    }

    impl TestDbBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn user(self, username: &str) -> Self {
            self.user_with_password(username, STANDARD_PASSWORD)
        }

        pub fn user_with_password(mut self, username: &str, password: &str) -> Self {
            self.users
                .push((username.to_string(), password.to_string()));
            self
        }

        pub fn employee(mut self, employee: NewEmployee) -> Self {
            self.employees.push(employee);
            self
        }

        pub fn apar(mut self, apar: NewApar) -> Self {
            self.apars.push(apar);
            self
        }

        /// Catalog row derived from the filename only, as a directory scan would create it.
        pub fn pdf(mut self, filename: &str) -> Self {
            self.pdfs.push(TestPdf {
                filename: filename.to_string(),
                employee_id: None,
                name: None,
                current_designation: None,
            });
            self
        }

        /// Catalog row with the employee columns filled in by hand.
        pub fn pdf_for(
            mut self,
            filename: &str,
            employee_id: &str,
            name: &str,
            current_designation: &str,
        ) -> Self {
            self.pdfs.push(TestPdf {
                filename: filename.to_string(),
                employee_id: Some(employee_id.to_string()),
                name: Some(name.to_string()),
                current_designation: Some(current_designation.to_string()),
            });
            self
        }

        pub async fn build(self) -> Result<TestDb, AppError> {
            INIT.call_once(|| {
                let _ = env_logger::builder()
                    .filter_level(LevelFilter::Debug)
                    .is_test(true)
                    .try_init();
            });

            // A single connection keeps the in-memory database alive and unshared.
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect("sqlite::memory:")
                .await?;

            sqlx::migrate!("./migrations").run(&pool).await?;

            let mut user_id_map = HashMap::new();
            for (username, password) in &self.users {
                let user_id = create_user(&pool, username, password).await?;
                user_id_map.insert(username.clone(), user_id);
            }

            for employee in &self.employees {
                create_employee(&pool, employee).await?;
            }

            let mut by_employee: HashMap<&str, Vec<NewApar>> = HashMap::new();
            for apar in &self.apars {
                by_employee
                    .entry(apar.cdac_emp_id.as_str())
                    .or_default()
                    .push(apar.clone());
            }
            for (emp_id, apars) in by_employee {
                save_previous_apars(&pool, emp_id, &apars).await?;
            }

            let mut conn = pool.acquire().await?;
            for pdf in &self.pdfs {
                let parsed = parse_filename(&pdf.filename);
                upsert_pdf_metadata(
                    &mut conn,
                    &pdf.filename,
                    &parsed.dossier_number,
                    &parsed.apar_employee_name,
                )
                .await?;

                sqlx::query(
                    "UPDATE pdf_metadata SET employee_id = ?, name = ?, current_designation = ?
                     WHERE filename = ?",
                )
                .bind(&pdf.employee_id)
                .bind(&pdf.name)
                .bind(&pdf.current_designation)
                .bind(&pdf.filename)
                .execute(&mut *conn)
                .await?;
            }
            drop(conn);

            Ok(TestDb { pool, user_id_map })
        }
    }

    pub struct TestDb {
        pub pool: Pool<Sqlite>,
        pub user_id_map: HashMap<String, i64>,
    }

    impl TestDb {
        pub fn user_id(&self, username: &str) -> Option<i64> {
            self.user_id_map.get(username).copied()
        }

        pub async fn apar_count(&self, cdac_emp_id: &str) -> i64 {
            sqlx::query_scalar("SELECT COUNT(*) FROM previous_apars WHERE cdac_emp_id = ?")
                .bind(cdac_emp_id)
                .fetch_one(&self.pool)
                .await
                .expect("Failed to count APARs")
        }

        pub async fn pdf_count(&self) -> i64 {
            sqlx::query_scalar("SELECT COUNT(*) FROM pdf_metadata")
                .fetch_one(&self.pool)
                .await
                .expect("Failed to count PDFs")
        }
    }
}

#[cfg(test)]
pub mod test_utils {
    use std::collections::HashMap;
    use std::path::Path;

    use rocket::http::{ContentType, Status};
    use rocket::local::asynchronous::Client;

    use super::test_db::{TestDb, TestDbBuilder, apar, employee};
    use crate::config::AppConfig;
    use crate::directory::{DirectoryEmployee, EmployeeDirectory};
    use crate::error::AppError;
    use crate::init_rocket;
    use crate::models::NewApar;

    /// In-process stand-in for the HR services.
    #[derive(Default, Clone)]
    pub struct StubDirectory {
        employees: HashMap<String, DirectoryEmployee>,
        apars: HashMap<String, Vec<NewApar>>,
        unavailable: bool,
    }

    impl StubDirectory {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn employee(mut self, emp_id: &str, employee: DirectoryEmployee) -> Self {
            self.employees.insert(emp_id.to_string(), employee);
            self
        }

        pub fn apars(mut self, emp_id: &str, apars: Vec<NewApar>) -> Self {
            self.apars.insert(emp_id.to_string(), apars);
            self
        }

        pub fn unavailable() -> Self {
            Self {
                unavailable: true,
                ..Self::default()
            }
        }
    }

    #[rocket::async_trait]
    impl EmployeeDirectory for StubDirectory {
        async fn lookup_employee(&self, emp_id: &str) -> Result<Option<DirectoryEmployee>, AppError> {
            if self.unavailable {
                return Err(AppError::ExternalService("Lookup failed (503)".to_string()));
            }
            Ok(self.employees.get(emp_id).cloned())
        }

        async fn lookup_apars(&self, emp_id: &str) -> Result<Option<Vec<NewApar>>, AppError> {
            if self.unavailable {
                return Err(AppError::ExternalService("Lookup failed (503)".to_string()));
            }
            Ok(self.apars.get(emp_id).cloned())
        }
    }

    pub async fn create_standard_test_db() -> TestDb {
        TestDbBuilder::new()
            .user("hr_admin")
            .employee(employee("E1001", "Asha Rao", "HPC", "6471A"))
            .employee(employee("E1002", "Ravi Kumar", "Cyber Security", "6398"))
            .apar(apar("E1001", "2022-04-01", "2023-03-31"))
            .pdf("6471-A-Asha_Rao.pdf")
            .pdf("6398-Ravi_Kumar.pdf")
            .build()
            .await
            .expect("Failed to build test database")
    }

    pub async fn setup_test_client(
        test_db: TestDb,
        directory: StubDirectory,
        pdf_directory: &Path,
    ) -> (Client, TestDb) {
        let config = AppConfig {
            database_url: "sqlite::memory:".to_string(),
            pdf_directory: pdf_directory.to_path_buf(),
            ..AppConfig::default()
        };

        let rocket = init_rocket(test_db.pool.clone(), config, Box::new(directory)).await;
        let client = Client::tracked(rocket)
            .await
            .expect("valid rocket instance");

        (client, test_db)
    }

    pub async fn login(client: &Client, username: &str, password: &str) -> Status {
        let response = client
            .post("/login")
            .header(ContentType::Form)
            .body(format!("username={}&password={}", username, password))
            .dispatch()
            .await;

        response.status()
    }
}
