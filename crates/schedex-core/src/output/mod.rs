pub mod csv;
pub mod workbook;

pub const HEADERS_CSV: &str = "panel_headers.csv";
pub const CIRCUITS_CSV: &str = "panel_circuits.csv";
pub const COMBINED_CSV: &str = "panel_schedules_combined.csv";
pub const WORKBOOK: &str = "panel_schedules.xlsx";
