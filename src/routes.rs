use rocket::State;
use rocket::form::Form;
use rocket::fs::NamedFile;
use rocket::http::{Header, Status};
use rocket::request::FlashMessage;
use rocket::response::{Flash, Redirect};
use rocket_dyn_templates::{Template, context};
use serde::Serialize;
use sqlx::{Pool, Sqlite};
use tracing::{error, info, warn};
use validator::Validate;

use crate::auth::User;
use crate::catalog::{resolve_pdf_path, sync_directory};
use crate::config::AppConfig;
use crate::db::{
    create_employee, get_employee, get_pdfs_by_dossier, get_previous_apars, save_previous_apars,
    search_employees, search_pdf_metadata,
};
use crate::directory::{DirectoryEmployee, EmployeeDirectory};
use crate::listing::{
    EmployeeListing, EmployeeSort, Page, PdfFilters, PdfListing, PdfSort, SortOrder,
};
use crate::models::{NewApar, NewEmployee};
use crate::validation::{FormErrors, Notice, ValidateFormExt};

pub type Directory = Box<dyn EmployeeDirectory>;

/// Rejects page numbers the paginator cannot serve: below 1, or past the end.
fn check_page<T>(page: &Page<T>) -> Result<(), Status> {
    if page.page < 1 || (page.page > 1 && page.items.is_empty()) {
        return Err(Status::NotFound);
    }
    Ok(())
}

#[derive(FromForm)]
pub struct DashboardParams {
    search: Option<String>,
    sort_by: Option<String>,
    order: Option<String>,
    page: Option<i64>,
}

#[get("/dashboard?<params..>")]
pub async fn dashboard(
    user: User,
    params: DashboardParams,
    flash: Option<FlashMessage<'_>>,
    db: &State<Pool<Sqlite>>,
) -> Result<Template, Status> {
    let listing = EmployeeListing {
        search: params.search.unwrap_or_default(),
        sort: EmployeeSort::parse(params.sort_by.as_deref()),
        order: SortOrder::parse(params.order.as_deref()),
        page: params.page.unwrap_or(1),
    };

    if listing.page < 1 {
        return Err(Status::NotFound);
    }

    let pagination = search_employees(db, &listing).await?;
    check_page(&pagination)?;

    Ok(Template::render(
        "dashboard",
        context! {
            title: "Dashboard",
            current_user: user,
            notice: Notice::from_flash(flash),
            search: listing.search,
            sort_by: listing.sort.column(),
            order: listing.order.as_str(),
            pagination: pagination,
        },
    ))
}

/// Values shown in the employee form. Directory lookups prefill everything but the dossier.
#[derive(Debug, Serialize, Default, Clone)]
pub struct EmployeeFormView {
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

impl EmployeeFormView {
    fn prefilled(emp_id: &str, employee: DirectoryEmployee) -> Self {
        Self {
            cdac_emp_id: emp_id.to_string(),
            name: employee.name.unwrap_or_default(),
            dept: employee.department.unwrap_or_default(),
            designation: employee.designation.unwrap_or_default(),
            dob: employee.date_of_birth.unwrap_or_default(),
            doj: employee.date_of_joining.unwrap_or_default(),
            mobile_no: employee.mobile_number.unwrap_or_default(),
            father_name: employee.father_name.unwrap_or_default(),
            dossier_no: String::new(),
        }
    }
}

fn employee_page(
    user: &User,
    form: EmployeeFormView,
    apar_list: Vec<NewApar>,
    show_employee: bool,
    notice: Option<Notice>,
    errors: FormErrors,
) -> Template {
    Template::render(
        "employee",
        context! {
            title: "Employee",
            current_user: user,
            form: form,
            apar_list: apar_list,
            show_employee: show_employee,
            notice: notice,
            errors: errors.errors,
        },
    )
}

#[get("/employee?<cdac_emp_id>&<action>")]
pub async fn employee(
    user: User,
    cdac_emp_id: Option<String>,
    action: Option<String>,
    flash: Option<FlashMessage<'_>>,
    directory: &State<Directory>,
) -> Template {
    let mut form = EmployeeFormView::default();
    let mut apar_list = Vec::new();
    let mut show_employee = false;
    let mut notice = Notice::from_flash(flash);

    let emp_id = cdac_emp_id.unwrap_or_default();
    let emp_id = emp_id.trim();

    if !emp_id.is_empty() {
        form.cdac_emp_id = emp_id.to_string();

        match action.as_deref() {
            Some("sahas") => match directory.lookup_employee(emp_id).await {
                Ok(Some(found)) => {
                    form = EmployeeFormView::prefilled(emp_id, found);
                    show_employee = true;
                }
                Ok(None) => {
                    notice = Some(Notice::danger(
                        "Employee data not found or invalid response from API",
                    ))
                }
                Err(e) => {
                    e.log_and_record("Employee directory lookup");
                    notice = Some(Notice::danger(
                        "Employee data not found or invalid response from API",
                    ));
                }
            },
            Some("apar") => match directory.lookup_apars(emp_id).await {
                Ok(Some(apars)) => apar_list = apars,
                Ok(None) => notice = Some(Notice::danger("Employee ID not found")),
                Err(e) => {
                    e.log_and_record("APAR lookup");
                    notice = Some(Notice::danger("Employee ID not found"));
                }
            },
            _ => {}
        }
    }

    employee_page(
        &user,
        form,
        apar_list,
        show_employee,
        notice,
        FormErrors::default(),
    )
}

#[derive(FromForm, Validate)]
pub struct EmployeeForm {
    #[validate(length(min = 4, max = 20, message = "Employee ID must be 4-20 characters"))]
    cdac_emp_id: String,
    name: Option<String>,
    dept: Option<String>,
    designation: Option<String>,
    dob: Option<String>,
    doj: Option<String>,
    mobile_no: Option<String>,
    father_name: Option<String>,
    #[validate(length(min = 1, max = 20, message = "Dossier must be 1-20 characters"))]
    dossier_no: String,
}

impl EmployeeForm {
    fn view(&self) -> EmployeeFormView {
        EmployeeFormView {
            cdac_emp_id: self.cdac_emp_id.clone(),
            name: self.name.clone().unwrap_or_default(),
            dept: self.dept.clone().unwrap_or_default(),
            designation: self.designation.clone().unwrap_or_default(),
            dob: self.dob.clone().unwrap_or_default(),
            doj: self.doj.clone().unwrap_or_default(),
            mobile_no: self.mobile_no.clone().unwrap_or_default(),
            father_name: self.father_name.clone().unwrap_or_default(),
            dossier_no: self.dossier_no.clone(),
        }
    }

    fn to_new_employee(&self) -> NewEmployee {
        NewEmployee {
            cdac_emp_id: self.cdac_emp_id.trim().to_string(),
            name: self.name.clone().unwrap_or_default(),
            dept: self.dept.clone().unwrap_or_default(),
            designation: self.designation.clone().unwrap_or_default(),
            dob: self.dob.clone().unwrap_or_default(),
            doj: self.doj.clone().unwrap_or_default(),
            mobile_no: self.mobile_no.clone().unwrap_or_default(),
            father_name: self.father_name.clone().filter(|f| !f.trim().is_empty()),
            dossier_no: self.dossier_no.trim().to_string(),
        }
    }
}

#[post("/employee", data = "<form>")]
pub async fn save_employee(
    user: User,
    form: Form<EmployeeForm>,
    db: &State<Pool<Sqlite>>,
) -> Result<Flash<Redirect>, Template> {
    if let Err(errors) = form.validate_form() {
        return Err(employee_page(&user, form.view(), vec![], true, None, errors));
    }

    match create_employee(db, &form.to_new_employee()).await {
        Ok(()) => {
            info!(cdac_emp_id = %form.cdac_emp_id, "Employee added");
            Ok(Flash::success(
                Redirect::to(uri!("/employee")),
                "Employee Added Successfully!",
            ))
        }
        Err(e) => {
            e.log_and_record("Save employee");
            Ok(Flash::error(
                Redirect::to(uri!("/employee")),
                e.user_message(),
            ))
        }
    }
}

#[derive(FromForm)]
pub struct SaveAparForm {
    cdac_emp_id: String,
}

#[post("/employee/apar", data = "<form>")]
pub async fn save_apars(
    _user: User,
    form: Form<SaveAparForm>,
    db: &State<Pool<Sqlite>>,
    directory: &State<Directory>,
) -> Flash<Redirect> {
    let emp_id = form.cdac_emp_id.trim();
    let back = Redirect::to(uri!(employee(
        cdac_emp_id = Some(emp_id),
        action = Some("apar")
    )));

    match get_employee(db, emp_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            warn!(cdac_emp_id = %emp_id, "APAR save for an employee that is not stored");
            return Flash::error(back, "Employee not found");
        }
        Err(e) => {
            e.log_and_record("Save APARs");
            return Flash::error(back, e.user_message());
        }
    }

    let apars = match directory.lookup_apars(emp_id).await {
        Ok(Some(apars)) => apars,
        Ok(None) => return Flash::error(back, "Employee ID not found"),
        Err(e) => {
            e.log_and_record("APAR lookup");
            return Flash::error(back, "Employee ID not found");
        }
    };

    match save_previous_apars(db, emp_id, &apars).await {
        Ok(inserted) => {
            info!(cdac_emp_id = %emp_id, inserted, "APAR records saved");
            Flash::success(
                Redirect::to(uri!("/dashboard")),
                "APAR records saved successfully!",
            )
        }
        Err(e) => {
            e.log_and_record("Save APARs");
            Flash::error(back, e.user_message())
        }
    }
}

#[derive(FromForm)]
pub struct CatalogParams {
    dossier: Option<String>,
    apar: Option<String>,
    emp_id: Option<String>,
    name: Option<String>,
    designation: Option<String>,
    filename: Option<String>,
    sort_by: Option<String>,
    sort_order: Option<String>,
    page: Option<i64>,
}

#[get("/index?<params..>")]
pub async fn index(
    user: User,
    params: CatalogParams,
    flash: Option<FlashMessage<'_>>,
    db: &State<Pool<Sqlite>>,
) -> Result<Template, Status> {
    let listing = PdfListing {
        filters: PdfFilters {
            dossier: params.dossier.unwrap_or_default(),
            apar: params.apar.unwrap_or_default(),
            emp_id: params.emp_id.unwrap_or_default(),
            name: params.name.unwrap_or_default(),
            designation: params.designation.unwrap_or_default(),
            filename: params.filename.unwrap_or_default(),
        },
        sort: PdfSort::parse(params.sort_by.as_deref()),
        order: SortOrder::parse(params.sort_order.as_deref()),
        page: params.page.unwrap_or(1),
    };

    if listing.page < 1 {
        return Err(Status::NotFound);
    }

    let pagination = search_pdf_metadata(db, &listing).await?;
    check_page(&pagination)?;

    let filters = &listing.filters;
    Ok(Template::render(
        "index",
        context! {
            title: "APAR Documents",
            current_user: user,
            notice: Notice::from_flash(flash),
            dossier: &filters.dossier,
            apar: &filters.apar,
            emp_id: &filters.emp_id,
            name: &filters.name,
            designation: &filters.designation,
            filename: &filters.filename,
            sort_by: listing.sort.column(),
            sort_order: listing.order.as_str(),
            pagination: pagination,
        },
    ))
}

#[get("/view/<filename>")]
pub async fn view_pdf(
    _user: User,
    filename: &str,
    config: &State<AppConfig>,
) -> Result<NamedFile, Status> {
    let path = resolve_pdf_path(&config.pdf_directory, filename).ok_or(Status::NotFound)?;
    NamedFile::open(path).await.map_err(|e| {
        error!("Failed to open {}: {:?}", filename, e);
        Status::NotFound
    })
}

#[derive(Responder)]
#[response(content_type = "pdf")]
pub struct PdfAttachment {
    file: NamedFile,
    disposition: Header<'static>,
}

#[get("/download/<filename>")]
pub async fn download_pdf(
    _user: User,
    filename: &str,
    config: &State<AppConfig>,
) -> Result<PdfAttachment, Status> {
    let path = resolve_pdf_path(&config.pdf_directory, filename).ok_or(Status::NotFound)?;
    let file = NamedFile::open(path).await.map_err(|e| {
        error!("Failed to open {}: {:?}", filename, e);
        Status::NotFound
    })?;

    Ok(PdfAttachment {
        file,
        disposition: Header::new(
            "Content-Disposition",
            format!("attachment; filename=\"{}\"", filename.replace('"', "")),
        ),
    })
}

#[get("/detail?<cdac_emp_id>")]
pub async fn detail(
    user: User,
    cdac_emp_id: Option<String>,
    db: &State<Pool<Sqlite>>,
) -> Result<Template, Flash<Redirect>> {
    let dashboard = || Redirect::to(uri!("/dashboard"));

    let emp_id = cdac_emp_id.unwrap_or_default();
    if emp_id.trim().is_empty() {
        return Err(Flash::error(dashboard(), "Employee ID is required"));
    }

    let lookup = async {
        let Some(emp) = get_employee(db, emp_id.trim()).await? else {
            return Ok(None);
        };
        let apars = get_previous_apars(db, &emp.cdac_emp_id).await?;
        let pdfs = get_pdfs_by_dossier(db, &emp.dossier_no).await?;
        Ok::<_, crate::error::AppError>(Some((emp, apars, pdfs)))
    };

    match lookup.await {
        Ok(Some((emp, apars, pdfs))) => Ok(Template::render(
            "view_emp",
            context! {
                title: "Employee Detail",
                current_user: user,
                emp: emp,
                apars: apars,
                pdfs: pdfs,
            },
        )),
        Ok(None) => Err(Flash::error(dashboard(), "Employee not found")),
        Err(e) => {
            e.log_and_record("Employee detail");
            Err(Flash::error(dashboard(), e.user_message()))
        }
    }
}

#[post("/sync")]
pub async fn sync_catalog(
    _user: User,
    db: &State<Pool<Sqlite>>,
    config: &State<AppConfig>,
) -> Flash<Redirect> {
    let index = Redirect::to(uri!("/index"));

    match sync_directory(db, &config.pdf_directory).await {
        Ok(report) => Flash::success(index, report.summary()),
        Err(e) => {
            e.log_and_record("Catalog sync");
            Flash::error(index, e.user_message())
        }
    }
}

#[get("/health")]
pub fn health() -> &'static str {
    "OK"
}
