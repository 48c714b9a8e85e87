use crate::errors::ServerError;
use crate::store::LoanApplication;
use rust_xlsxwriter::{Format, Workbook, XlsxError};

const HEADERS: [&str; 11] = [
    "ID",
    "Applicant",
    "Email",
    "Loan Type",
    "Amount",
    "Term (months)",
    "Status",
    "Credit Score",
    "Documents",
    "Core Reference",
    "Submitted",
];

fn xlsx_err(what: &str) -> impl Fn(XlsxError) -> ServerError + '_ {
    move |e| ServerError::XlsxError(format!("Failed to write {what}: {e}"))
}

/// One row per application, in submission order.
pub fn build_applications_workbook(apps: &[LoanApplication]) -> Result<Vec<u8>, ServerError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let bold = Format::new().set_bold();

    for (col, header) in HEADERS.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col as u16, *header, &bold)
            .map_err(xlsx_err(header))?;
    }

    for (i, app) in apps.iter().enumerate() {
        let r = (i + 1) as u32;

        worksheet.write_string(r, 0, &app.id).map_err(xlsx_err("id"))?;
        worksheet
            .write_string(r, 1, &app.applicant_name)
            .map_err(xlsx_err("applicant"))?;
        worksheet.write_string(r, 2, &app.email).map_err(xlsx_err("email"))?;
        worksheet
            .write_string(r, 3, &app.loan_type)
            .map_err(xlsx_err("loan type"))?;
        worksheet
            .write_number(r, 4, app.amount as f64)
            .map_err(xlsx_err("amount"))?;
        if let Some(term) = app.term_months {
            worksheet
                .write_number(r, 5, term as f64)
                .map_err(xlsx_err("term"))?;
        }
        worksheet
            .write_string(r, 6, app.status.label())
            .map_err(xlsx_err("status"))?;
        if let Some(score) = app.credit_score {
            worksheet
                .write_number(r, 7, score as f64)
                .map_err(xlsx_err("credit score"))?;
        }
        worksheet
            .write_number(r, 8, app.documents.len() as f64)
            .map_err(xlsx_err("documents"))?;
        worksheet
            .write_string(r, 9, app.core_reference.as_deref().unwrap_or(""))
            .map_err(xlsx_err("core reference"))?;
        worksheet
            .write_string(r, 10, &app.submitted_at.format("%Y-%m-%d %H:%M").to_string())
            .map_err(xlsx_err("submitted"))?;
    }

    worksheet.autofit();

    workbook
        .save_to_buffer()
        .map_err(|e| ServerError::XlsxError(format!("Failed to save workbook: {e}")))
}
