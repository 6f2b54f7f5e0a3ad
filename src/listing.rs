use serde::Serialize;

pub const PAGE_SIZE: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    /// Anything other than `desc` sorts ascending.
    pub fn parse(s: Option<&str>) -> Self {
        match s {
            Some("desc") => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Sortable columns of the employee listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmployeeSort {
    CdacEmpId,
    #[default]
    Name,
    Dept,
    Designation,
    Dob,
    Doj,
    MobileNo,
    FatherName,
    DossierNo,
}

impl EmployeeSort {
    pub const ALL: [EmployeeSort; 9] = [
        EmployeeSort::CdacEmpId,
        EmployeeSort::Name,
        EmployeeSort::Dept,
        EmployeeSort::Designation,
        EmployeeSort::Dob,
        EmployeeSort::Doj,
        EmployeeSort::MobileNo,
        EmployeeSort::FatherName,
        EmployeeSort::DossierNo,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            EmployeeSort::CdacEmpId => "cdac_emp_id",
            EmployeeSort::Name => "name",
            EmployeeSort::Dept => "dept",
            EmployeeSort::Designation => "designation",
            EmployeeSort::Dob => "dob",
            EmployeeSort::Doj => "doj",
            EmployeeSort::MobileNo => "mobile_no",
            EmployeeSort::FatherName => "father_name",
            EmployeeSort::DossierNo => "dossier_no",
        }
    }

    /// Unknown column names fall back to the default sort.
    pub fn parse(s: Option<&str>) -> Self {
        s.and_then(|name| Self::ALL.into_iter().find(|c| c.column() == name))
            .unwrap_or_default()
    }
}

/// Sortable columns of the PDF catalog listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PdfSort {
    Id,
    #[default]
    DossierNumber,
    AparEmployeeName,
    EmployeeId,
    Name,
    CurrentDesignation,
    Filename,
}

impl PdfSort {
    pub const ALL: [PdfSort; 7] = [
        PdfSort::Id,
        PdfSort::DossierNumber,
        PdfSort::AparEmployeeName,
        PdfSort::EmployeeId,
        PdfSort::Name,
        PdfSort::CurrentDesignation,
        PdfSort::Filename,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            PdfSort::Id => "id",
            PdfSort::DossierNumber => "dossier_number",
            PdfSort::AparEmployeeName => "apar_employee_name",
            PdfSort::EmployeeId => "employee_id",
            PdfSort::Name => "name",
            PdfSort::CurrentDesignation => "current_designation",
            PdfSort::Filename => "filename",
        }
    }

    pub fn parse(s: Option<&str>) -> Self {
        s.and_then(|name| Self::ALL.into_iter().find(|c| c.column() == name))
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default)]
pub struct EmployeeListing {
    pub search: String,
    pub sort: EmployeeSort,
    pub order: SortOrder,
    pub page: i64,
}

#[derive(Debug, Clone, Default)]
pub struct PdfFilters {
    pub dossier: String,
    pub apar: String,
    pub emp_id: String,
    pub name: String,
    pub designation: String,
    pub filename: String,
}

impl PdfFilters {
    /// Non-empty filters paired with the column they apply to.
    pub fn active(&self) -> Vec<(&'static str, &str)> {
        [
            ("dossier_number", self.dossier.as_str()),
            ("apar_employee_name", self.apar.as_str()),
            ("employee_id", self.emp_id.as_str()),
            ("name", self.name.as_str()),
            ("current_designation", self.designation.as_str()),
            ("filename", self.filename.as_str()),
        ]
        .into_iter()
        .filter(|(_, term)| !term.trim().is_empty())
        .collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct PdfListing {
    pub filters: PdfFilters,
    pub sort: PdfSort,
    pub order: SortOrder,
    pub page: i64,
}

/// Lowercased `%term%` pattern for `LIKE ... ESCAPE '\'`.
pub fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    // SQLite's LOWER() only folds ASCII, so the term must be folded the same way.
    for ch in term.trim().to_ascii_lowercase().chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

#[derive(Debug, Serialize, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub pages: i64,
    pub has_prev: bool,
    pub has_next: bool,
    pub prev_num: Option<i64>,
    pub next_num: Option<i64>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: i64, per_page: i64, total: i64) -> Self {
        let pages = if total == 0 {
            0
        } else {
            (total + per_page - 1) / per_page
        };
        let has_prev = page > 1;
        let has_next = page < pages;

        Self {
            items,
            page,
            per_page,
            total,
            pages,
            has_prev,
            has_next,
            prev_num: has_prev.then_some(page - 1),
            next_num: has_next.then_some(page + 1),
        }
    }

    /// Row offset of `page`; `None` when it does not fit in an `i64`.
    pub fn offset(page: i64, per_page: i64) -> Option<i64> {
        page.checked_sub(1)?.checked_mul(per_page)
    }
}
