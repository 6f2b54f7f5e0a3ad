use crate::{
    auth::{DbUser, User},
    error::AppError,
    listing::{EmployeeListing, PAGE_SIZE, Page, PdfListing, like_pattern},
    models::{
        DbEmployee, DbPdfMetadata, DbPreviousApar, Employee, NewApar, NewEmployee, PdfMetadata,
        PreviousApar, UpsertOutcome,
    },
};
use sqlx::{Pool, QueryBuilder, Sqlite, SqliteConnection};
use tracing::{info, instrument};

#[cfg(not(test))]
const HASH_COST: u32 = bcrypt::DEFAULT_COST;
#[cfg(test)]
const HASH_COST: u32 = 4;

const EMPLOYEE_COLUMNS: &str = "cdac_emp_id, name, dept, designation, dob, doj, mobile_no, father_name, dossier_no";
const APAR_COLUMNS: &str = "id, cdac_emp_id, name, apar_status, date_from, date_to, grade, grade_label, reporting_officer, reviewing_officer";
const PDF_COLUMNS: &str =
    "id, dossier_number, apar_employee_name, employee_id, name, current_designation, filename";

#[instrument]
pub async fn get_user(pool: &Pool<Sqlite>, id: i64) -> Result<User, AppError> {
    info!("Fetching user by ID");
    let row = sqlx::query_as::<_, DbUser>("SELECT id, username FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(user) => Ok(User::from(user)),
        _ => Err(AppError::NotFound(format!(
            "User with id {} not found in database",
            id
        ))),
    }
}

#[instrument]
pub async fn find_user_by_username(
    pool: &Pool<Sqlite>,
    username: &str,
) -> Result<Option<User>, AppError> {
    info!("Finding user by username");
    let row = sqlx::query_as::<_, DbUser>("SELECT id, username FROM users WHERE username = ?")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(User::from))
}

#[instrument(skip_all, fields(username))]
pub async fn authenticate_user(
    pool: &Pool<Sqlite>,
    username: &str,
    password: &str,
) -> Result<Option<User>, AppError> {
    info!("Authenticating user");
    let row: Option<(i64, String, String)> =
        sqlx::query_as("SELECT id, username, password FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(pool)
            .await?;

    match row {
        Some((id, username, hash)) => match bcrypt::verify(password, &hash) {
            Ok(true) => Ok(Some(User { id, username })),
            _ => Ok(None),
        },
        _ => Ok(None),
    }
}

#[instrument(skip_all, fields(username))]
pub async fn create_user(
    pool: &Pool<Sqlite>,
    username: &str,
    password: &str,
) -> Result<i64, AppError> {
    info!("Creating new user");

    let existing_user = find_user_by_username(pool, username).await?;
    if existing_user.is_some() {
        return Err(AppError::Conflict(
            "username already exist. Please change username".to_string(),
        ));
    }

    let hashed_password = bcrypt::hash(password, HASH_COST)?;

    let res = sqlx::query("INSERT INTO users (username, password) VALUES (?, ?)")
        .bind(username)
        .bind(hashed_password)
        .execute(pool)
        .await?;

    Ok(res.last_insert_rowid())
}

#[instrument]
pub async fn get_employee(
    pool: &Pool<Sqlite>,
    cdac_emp_id: &str,
) -> Result<Option<Employee>, AppError> {
    info!("Fetching employee");
    let row = sqlx::query_as::<_, DbEmployee>(&format!(
        "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE cdac_emp_id = ?"
    ))
    .bind(cdac_emp_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Employee::from))
}

/// Inserts a new employee. An existing primary key is a conflict; nothing is written.
#[instrument(skip(pool, employee), fields(cdac_emp_id = %employee.cdac_emp_id))]
pub async fn create_employee(pool: &Pool<Sqlite>, employee: &NewEmployee) -> Result<(), AppError> {
    info!("Creating employee");
    let mut tx = pool.begin().await?;

    let existing: Option<(String,)> =
        sqlx::query_as("SELECT cdac_emp_id FROM employees WHERE cdac_emp_id = ?")
            .bind(&employee.cdac_emp_id)
            .fetch_optional(&mut *tx)
            .await?;

    if existing.is_some() {
        tx.rollback().await?;
        return Err(AppError::Conflict(
            "Employee already in database!".to_string(),
        ));
    }

    sqlx::query(&format!(
        "INSERT INTO employees ({EMPLOYEE_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
    ))
    .bind(&employee.cdac_emp_id)
    .bind(&employee.name)
    .bind(&employee.dept)
    .bind(&employee.designation)
    .bind(&employee.dob)
    .bind(&employee.doj)
    .bind(&employee.mobile_no)
    .bind(&employee.father_name)
    .bind(&employee.dossier_no)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

fn push_employee_filter(builder: &mut QueryBuilder<'_, Sqlite>, search: &str) {
    if search.trim().is_empty() {
        return;
    }

    let pattern = like_pattern(search);
    builder.push(" WHERE ");
    let mut clauses = builder.separated(" OR ");
    for column in ["cdac_emp_id", "name", "dept", "dossier_no"] {
        clauses
            .push(format!("LOWER({column}) LIKE "))
            .push_bind_unseparated(pattern.clone())
            .push_unseparated(" ESCAPE '\\'");
    }
}

#[instrument]
pub async fn search_employees(
    pool: &Pool<Sqlite>,
    listing: &EmployeeListing,
) -> Result<Page<Employee>, AppError> {
    info!("Searching employees");

    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM employees");
    push_employee_filter(&mut count, &listing.search);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let Some(offset) = Page::<Employee>::offset(listing.page, PAGE_SIZE) else {
        return Ok(Page::new(Vec::new(), listing.page, PAGE_SIZE, total));
    };

    let mut select = QueryBuilder::<Sqlite>::new(format!("SELECT {EMPLOYEE_COLUMNS} FROM employees"));
    push_employee_filter(&mut select, &listing.search);
    select
        .push(format!(
            " ORDER BY {} {}, cdac_emp_id ASC LIMIT ",
            listing.sort.column(),
            listing.order.as_sql()
        ))
        .push_bind(PAGE_SIZE)
        .push(" OFFSET ")
        .push_bind(offset);

    let rows = select.build_query_as::<DbEmployee>().fetch_all(pool).await?;
    let employees = rows.into_iter().map(Employee::from).collect();

    Ok(Page::new(employees, listing.page, PAGE_SIZE, total))
}

/// Stores the given appraisal cycles, skipping any whose (employee, date range) is
/// already recorded. Returns the number of rows inserted.
#[instrument(skip(pool, apars), fields(count = apars.len()))]
pub async fn save_previous_apars(
    pool: &Pool<Sqlite>,
    cdac_emp_id: &str,
    apars: &[NewApar],
) -> Result<usize, AppError> {
    info!("Saving previous APARs");
    let mut tx = pool.begin().await?;
    let mut inserted = 0;

    for apar in apars {
        let existing: Option<(i64,)> = sqlx::query_as(
            "SELECT id FROM previous_apars
             WHERE cdac_emp_id = ? AND date_from = ? AND date_to = ?",
        )
        .bind(cdac_emp_id)
        .bind(apar.date_from)
        .bind(apar.date_to)
        .fetch_optional(&mut *tx)
        .await?;

        if existing.is_some() {
            continue;
        }

        sqlx::query(
            "INSERT INTO previous_apars
             (cdac_emp_id, name, apar_status, date_from, date_to, grade, grade_label,
              reporting_officer, reviewing_officer)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(cdac_emp_id)
        .bind(&apar.name)
        .bind(&apar.apar_status)
        .bind(apar.date_from)
        .bind(apar.date_to)
        .bind(&apar.grade)
        .bind(&apar.grade_label)
        .bind(&apar.reporting_officer)
        .bind(&apar.reviewing_officer)
        .execute(&mut *tx)
        .await?;

        inserted += 1;
    }

    tx.commit().await?;
    info!(inserted, "Previous APARs saved");
    Ok(inserted)
}

#[instrument]
pub async fn get_previous_apars(
    pool: &Pool<Sqlite>,
    cdac_emp_id: &str,
) -> Result<Vec<PreviousApar>, AppError> {
    info!("Getting previous APARs");
    let rows = sqlx::query_as::<_, DbPreviousApar>(&format!(
        "SELECT {APAR_COLUMNS} FROM previous_apars
         WHERE cdac_emp_id = ?
         ORDER BY date_from, id"
    ))
    .bind(cdac_emp_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(PreviousApar::from).collect())
}

/// Insert-or-update of the filename-derived columns of a catalog row.
#[instrument(skip(conn))]
pub async fn upsert_pdf_metadata(
    conn: &mut SqliteConnection,
    filename: &str,
    dossier_number: &str,
    apar_employee_name: &str,
) -> Result<UpsertOutcome, AppError> {
    let existing: Option<(i64, Option<String>, Option<String>)> = sqlx::query_as(
        "SELECT id, dossier_number, apar_employee_name FROM pdf_metadata WHERE filename = ?",
    )
    .bind(filename)
    .fetch_optional(&mut *conn)
    .await?;

    match existing {
        Some((_, dossier, name))
            if dossier.as_deref() == Some(dossier_number)
                && name.as_deref() == Some(apar_employee_name) =>
        {
            Ok(UpsertOutcome::Unchanged)
        }
        Some((id, _, _)) => {
            sqlx::query(
                "UPDATE pdf_metadata SET dossier_number = ?, apar_employee_name = ? WHERE id = ?",
            )
            .bind(dossier_number)
            .bind(apar_employee_name)
            .bind(id)
            .execute(&mut *conn)
            .await?;
            Ok(UpsertOutcome::Updated)
        }
        None => {
            sqlx::query(
                "INSERT INTO pdf_metadata (dossier_number, apar_employee_name, filename)
                 VALUES (?, ?, ?)",
            )
            .bind(dossier_number)
            .bind(apar_employee_name)
            .bind(filename)
            .execute(&mut *conn)
            .await?;
            Ok(UpsertOutcome::Inserted)
        }
    }
}

#[instrument(skip(pool))]
pub async fn get_pdf_filenames(pool: &Pool<Sqlite>) -> Result<Vec<String>, AppError> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT filename FROM pdf_metadata ORDER BY filename")
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(|(filename,)| filename).collect())
}

#[instrument]
pub async fn get_pdfs_by_dossier(
    pool: &Pool<Sqlite>,
    dossier_number: &str,
) -> Result<Vec<PdfMetadata>, AppError> {
    info!("Getting PDFs by dossier number");
    let rows = sqlx::query_as::<_, DbPdfMetadata>(&format!(
        "SELECT {PDF_COLUMNS} FROM pdf_metadata WHERE dossier_number = ? ORDER BY filename"
    ))
    .bind(dossier_number)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(PdfMetadata::from).collect())
}

fn push_pdf_filters<'a>(builder: &mut QueryBuilder<'a, Sqlite>, listing: &PdfListing) {
    let active = listing.filters.active();
    if active.is_empty() {
        return;
    }

    builder.push(" WHERE ");
    let mut clauses = builder.separated(" AND ");
    for (column, term) in active {
        clauses
            .push(format!("LOWER({column}) LIKE "))
            .push_bind_unseparated(like_pattern(term))
            .push_unseparated(" ESCAPE '\\'");
    }
}

#[instrument]
pub async fn search_pdf_metadata(
    pool: &Pool<Sqlite>,
    listing: &PdfListing,
) -> Result<Page<PdfMetadata>, AppError> {
    info!("Searching PDF catalog");

    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM pdf_metadata");
    push_pdf_filters(&mut count, listing);
    let total: i64 = count.build_query_scalar().fetch_one(pool).await?;

    let Some(offset) = Page::<PdfMetadata>::offset(listing.page, PAGE_SIZE) else {
        return Ok(Page::new(Vec::new(), listing.page, PAGE_SIZE, total));
    };

    let mut select = QueryBuilder::<Sqlite>::new(format!("SELECT {PDF_COLUMNS} FROM pdf_metadata"));
    push_pdf_filters(&mut select, listing);
    select
        .push(format!(
            " ORDER BY {} {}, id ASC LIMIT ",
            listing.sort.column(),
            listing.order.as_sql()
        ))
        .push_bind(PAGE_SIZE)
        .push(" OFFSET ")
        .push_bind(offset);

    let rows = select
        .build_query_as::<DbPdfMetadata>()
        .fetch_all(pool)
        .await?;
    let records = rows.into_iter().map(PdfMetadata::from).collect();

    Ok(Page::new(records, listing.page, PAGE_SIZE, total))
}
