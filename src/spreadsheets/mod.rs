pub mod applications_xlsx;

pub use applications_xlsx::build_applications_workbook;
