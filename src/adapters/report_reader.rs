//! Loads HHS breach reports from spreadsheet or CSV bytes held in `Storage`.

use crate::core::{BreachRecord, BreachReport, Storage};
use crate::domain::model::{
    COL_BREACH_TYPE, COL_ENTITY_NAME, COL_ENTITY_TYPE, COL_INDIVIDUALS_AFFECTED, COL_LOCATION,
    COL_SUBMISSION_DATE,
};
use crate::utils::error::{FigureError, Result};
use crate::utils::validation::validate_file_extension;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::io::Cursor;

const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];
const REPORT_EXTENSIONS: [&str; 6] = ["xlsx", "xlsm", "xlsb", "xls", "ods", "csv"];

const DATE_FORMATS: [&str; 2] = ["%m/%d/%Y", "%Y-%m-%d"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%m/%d/%Y %H:%M", "%Y-%m-%dT%H:%M:%S"];

static EMPTY_CELL: Cell = Cell::Empty;

#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty | Data::Error(_) => Cell::Empty,
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::Bool(b) => Cell::Text(b.to_string()),
            Data::String(s) => text_cell(s),
            Data::DateTimeIso(s) | Data::DurationIso(s) => text_cell(s),
            Data::DateTime(dt) => match dt.as_datetime() {
                Some(value) => Cell::Date(value.date()),
                None => Cell::Number(dt.as_f64()),
            },
        }
    }
}

fn text_cell(s: &str) -> Cell {
    if s.trim().is_empty() {
        Cell::Empty
    } else {
        Cell::Text(s.to_string())
    }
}

/// Header row plus data rows, before column lookup.
struct RawTable {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl BreachReport {
    /// Reads `path` through `storage`. Workbooks use worksheet `sheet`; CSV
    /// files ignore it. Every name in `required` must be a header.
    pub fn load<S: Storage + ?Sized>(
        storage: &S,
        path: &str,
        sheet: &str,
        required: &[&str],
    ) -> Result<Self> {
        validate_file_extension("input", path, &REPORT_EXTENSIONS)?;
        if !storage.exists(path) {
            return Err(FigureError::FileNotFound {
                path: storage.display_path(path),
            });
        }

        tracing::info!("Loading data from {}...", storage.display_path(path));
        let bytes = storage.read_file(path)?;
        let table = if is_workbook(path) {
            read_workbook(bytes, sheet, path)?
        } else {
            read_csv(&bytes)?
        };

        let report = table.into_report(path, required)?;
        tracing::debug!("{} records from {}", report.len(), path);
        Ok(report)
    }
}

fn is_workbook(path: &str) -> bool {
    std::path::Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| WORKBOOK_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn read_workbook(bytes: Vec<u8>, sheet: &str, path: &str) -> Result<RawTable> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;

    if !workbook.sheet_names().iter().any(|name| name == sheet) {
        return Err(FigureError::MissingSheet {
            sheet: sheet.to_string(),
            source_name: path.to_string(),
        });
    }

    let range = workbook.worksheet_range(sheet)?;
    let mut rows = range.rows();
    let columns = rows
        .next()
        .map(|header| header.iter().map(|c| c.to_string().trim().to_string()).collect())
        .unwrap_or_default();
    let rows = rows.map(|row| row.iter().map(Cell::from).collect()).collect();

    Ok(RawTable { columns, rows })
}

fn read_csv(bytes: &[u8]) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let columns = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(text_cell).collect());
    }

    Ok(RawTable { columns, rows })
}

impl RawTable {
    fn into_report(self, source: &str, required: &[&str]) -> Result<BreachReport> {
        for column in required {
            if !self.columns.iter().any(|c| c == column) {
                return Err(FigureError::MissingColumn {
                    column: column.to_string(),
                    source_name: source.to_string(),
                });
            }
        }

        let index = |name: &str| self.columns.iter().position(|c| c == name);
        let name_idx = index(COL_ENTITY_NAME);
        let type_idx = index(COL_ENTITY_TYPE);
        let affected_idx = index(COL_INDIVIDUALS_AFFECTED);
        let date_idx = index(COL_SUBMISSION_DATE);
        let breach_idx = index(COL_BREACH_TYPE);
        let location_idx = index(COL_LOCATION);

        let records = self
            .rows
            .iter()
            .filter(|row| row.iter().any(|c| *c != Cell::Empty))
            .map(|row| {
                let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i)).unwrap_or(&EMPTY_CELL);
                BreachRecord {
                    entity_name: cell_text(cell(name_idx)).unwrap_or_default(),
                    entity_type: cell_text(cell(type_idx)).unwrap_or_default(),
                    individuals_affected: cell_count(cell(affected_idx)),
                    submission_date: cell_date(cell(date_idx)),
                    breach_type: cell_text(cell(breach_idx)).unwrap_or_default(),
                    location: cell_text(cell(location_idx)),
                }
            })
            .collect();

        Ok(BreachReport {
            source: source.to_string(),
            columns: self.columns,
            records,
        })
    }
}

fn cell_text(cell: &Cell) -> Option<String> {
    match cell {
        Cell::Empty => None,
        Cell::Text(s) => Some(s.trim().to_string()),
        Cell::Number(n) if n.fract() == 0.0 => Some(format!("{}", *n as i64)),
        Cell::Number(n) => Some(n.to_string()),
        Cell::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
    }
}

/// Non-negative head count; blank or unparsable cells count as zero.
fn cell_count(cell: &Cell) -> u64 {
    let value = match cell {
        Cell::Number(n) => *n,
        Cell::Text(s) => s.trim().replace(',', "").parse::<f64>().unwrap_or(0.0),
        Cell::Empty | Cell::Date(_) => 0.0,
    };
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

fn cell_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Date(d) => Some(*d),
        Cell::Number(serial) => excel_serial_date(*serial),
        Cell::Text(s) => parse_text_date(s),
        Cell::Empty => None,
    }
}

/// Days since 1899-12-30, the 1900 date system with its leap-year quirk.
pub fn excel_serial_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_signed(Duration::days(serial.trunc() as i64))
}

pub fn parse_text_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::DEFAULT_SHEET;
    use crate::utils::test_support::MockStorage;

    const REPORT: &str = "\
Name of Covered Entity,State,Covered Entity Type,Individuals Affected,Breach Submission Date,Type of Breach,Location of Breached Information
General Hospital,CT,Healthcare Provider,\"1,200\",03/15/2023,Hacking/IT Incident,Network Server
Health Plan Inc,NY,Health Plan,500.0,2023-07-01,Unauthorized Access/Disclosure,Email
City Clinic,MA,Healthcare Provider,,not a date,Theft,
";

    #[test]
    fn test_load_csv_report() {
        let storage = MockStorage::new().with_file("data/report.csv", REPORT);
        let report = BreachReport::load(&storage, "data/report.csv", DEFAULT_SHEET, &[]).unwrap();

        assert_eq!(report.len(), 3);
        assert!(report.has_column("State"));

        let first = &report.records[0];
        assert_eq!(first.entity_name, "General Hospital");
        assert_eq!(first.individuals_affected, 1200);
        assert_eq!(first.submission_date, NaiveDate::from_ymd_opt(2023, 3, 15));
        assert_eq!(first.location.as_deref(), Some("Network Server"));

        assert_eq!(report.records[1].individuals_affected, 500);
        assert_eq!(report.records[2].individuals_affected, 0);
        assert_eq!(report.records[2].submission_date, None);
        assert_eq!(report.records[2].location, None);
    }

    #[test]
    fn test_missing_required_column() {
        let storage = MockStorage::new().with_file("r.csv", "Name of Covered Entity,State\nA,CT\n");
        let err = BreachReport::load(&storage, "r.csv", DEFAULT_SHEET, &[COL_SUBMISSION_DATE])
            .unwrap_err();
        assert!(matches!(
            err,
            FigureError::MissingColumn { ref column, .. } if column == COL_SUBMISSION_DATE
        ));
    }

    #[test]
    fn test_missing_file_and_bad_extension() {
        let storage = MockStorage::new().with_file("r.csv", REPORT);
        assert!(matches!(
            BreachReport::load(&storage, "other.xlsx", DEFAULT_SHEET, &[]),
            Err(FigureError::FileNotFound { .. })
        ));
        assert!(matches!(
            BreachReport::load(&storage, "r.txt", DEFAULT_SHEET, &[]),
            Err(FigureError::InvalidConfigValueError { .. })
        ));
    }

    #[test]
    fn test_text_dates() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 31);
        assert_eq!(parse_text_date("01/31/2024"), expected);
        assert_eq!(parse_text_date("2024-01-31"), expected);
        assert_eq!(parse_text_date("2024-01-31 08:15:00"), expected);
        assert_eq!(parse_text_date("01/31/2024 08:15"), expected);
        assert_eq!(parse_text_date("Jan 31st"), None);
    }

    #[test]
    fn test_excel_serial_dates() {
        assert_eq!(excel_serial_date(45000.0), NaiveDate::from_ymd_opt(2023, 3, 15));
        assert_eq!(excel_serial_date(45000.75), NaiveDate::from_ymd_opt(2023, 3, 15));
        assert_eq!(excel_serial_date(0.0), None);
    }

    #[test]
    fn test_counts() {
        assert_eq!(cell_count(&Cell::Text("3,400".to_string())), 3400);
        assert_eq!(cell_count(&Cell::Text("n/a".to_string())), 0);
        assert_eq!(cell_count(&Cell::Number(-4.0)), 0);
    }
}
