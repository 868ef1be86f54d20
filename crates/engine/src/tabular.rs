//! Tabular codecs: CSV and `.xlsx` writers for exports, `.xlsx` reader for
//! imports.

use std::{fmt, io::Cursor, str::FromStr};

use serde::Serialize;

use crate::{Course, EngineError, ResultEngine};

/// Name of the worksheet produced by course exports.
pub const COURSES_SHEET: &str = "Courses";

/// Output format for exports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    /// UTF-8 CSV with a header row.
    #[default]
    Csv,
    /// Office Open XML workbook (`.xlsx`) with a single sheet.
    Spreadsheet,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Spreadsheet => "xlsx",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" | "excel" | "spreadsheet" => Ok(Self::Spreadsheet),
            other => Err(EngineError::Validation(format!(
                "unsupported export format: {other}"
            ))),
        }
    }
}

/// One exported course line. Field order is the column order.
#[derive(Serialize)]
struct CourseRow<'a> {
    id: i32,
    name: &'a str,
    description: &'a str,
    price: String,
    created_at: String,
}

const COURSE_COLUMNS: [&str; 5] = ["id", "name", "description", "price", "created_at"];

impl<'a> From<&'a Course> for CourseRow<'a> {
    fn from(course: &'a Course) -> Self {
        Self {
            id: course.id,
            name: &course.name,
            description: &course.description,
            price: course.price.to_string(),
            created_at: course.created_at.to_rfc3339(),
        }
    }
}

pub(crate) fn courses_to_bytes(courses: &[Course], format: ExportFormat) -> ResultEngine<Vec<u8>> {
    match format {
        ExportFormat::Csv => courses_to_csv(courses),
        ExportFormat::Spreadsheet => courses_to_xlsx(courses),
    }
}

fn courses_to_csv(courses: &[Course]) -> ResultEngine<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    if courses.is_empty() {
        writer
            .write_record(COURSE_COLUMNS)
            .map_err(|e| EngineError::Export(e.to_string()))?;
    }
    for course in courses {
        writer
            .serialize(CourseRow::from(course))
            .map_err(|e| EngineError::Export(e.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|e| EngineError::Export(e.to_string()))
}

fn courses_to_xlsx(courses: &[Course]) -> ResultEngine<Vec<u8>> {
    let mut book = umya_spreadsheet::new_file_empty_worksheet();
    let sheet = book
        .new_sheet(COURSES_SHEET)
        .map_err(|e| EngineError::Export(e.to_string()))?;

    for (col, header) in (1u32..).zip(COURSE_COLUMNS) {
        sheet.get_cell_mut((col, 1)).set_value(header);
    }
    for (row, course) in (2u32..).zip(courses) {
        sheet.get_cell_mut((1, row)).set_value_number(course.id);
        sheet.get_cell_mut((2, row)).set_value(course.name.as_str());
        sheet.get_cell_mut((3, row)).set_value(course.description.as_str());
        sheet
            .get_cell_mut((4, row))
            .set_value_number(course.price.as_major_f64());
        sheet
            .get_cell_mut((5, row))
            .set_value(course.created_at.to_rfc3339());
    }

    let mut out = Cursor::new(Vec::new());
    umya_spreadsheet::writer::xlsx::write_writer(&book, &mut out)
        .map_err(|e| EngineError::Export(e.to_string()))?;
    Ok(out.into_inner())
}

/// First worksheet of a workbook, as text cells.
#[derive(Debug, Default)]
pub(crate) struct SheetTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl SheetTable {
    /// Index of `name` in the header row (exact, case-sensitive).
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

pub(crate) fn read_first_sheet(bytes: &[u8]) -> ResultEngine<SheetTable> {
    let book = umya_spreadsheet::reader::xlsx::read_reader(Cursor::new(bytes), true)
        .map_err(|e| EngineError::InvalidFormat(format!("cannot read spreadsheet: {e}")))?;
    let sheet = book
        .get_sheet_collection()
        .first()
        .ok_or_else(|| EngineError::InvalidFormat("workbook has no sheets".to_string()))?;

    let (max_col, max_row) = sheet.get_highest_column_and_row();
    if max_row == 0 {
        return Ok(SheetTable::default());
    }

    let read_row = |row: u32| -> Vec<String> {
        (1..=max_col)
            .map(|col| sheet.get_value((col, row)).trim().to_string())
            .collect()
    };

    Ok(SheetTable {
        headers: read_row(1),
        rows: (2..=max_row).map(read_row).collect(),
    })
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::MoneyCents;

    fn course(id: i32, name: &str, price: i64) -> Course {
        Course {
            id,
            name: name.to_string(),
            description: format!("About {name}"),
            price: MoneyCents::new(price),
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap(),
        }
    }

    #[test]
    fn csv_has_header_and_plain_prices() {
        let bytes = courses_to_csv(&[course(1, "Rust", 12_50), course(2, "Go, fast", 0)]).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("id,name,description,price,created_at"));
        assert_eq!(
            lines.next(),
            Some("1,Rust,About Rust,12.50,2024-03-01T09:30:00+00:00")
        );
        assert_eq!(
            lines.next(),
            Some("2,\"Go, fast\",\"About Go, fast\",0.00,2024-03-01T09:30:00+00:00")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn csv_of_nothing_still_has_header() {
        let text = String::from_utf8(courses_to_csv(&[]).unwrap()).unwrap();
        assert_eq!(text.trim_end(), "id,name,description,price,created_at");
    }

    #[test]
    fn xlsx_export_is_readable_back() {
        let bytes = courses_to_xlsx(&[course(3, "Python", 99_90)]).unwrap();
        let book = umya_spreadsheet::reader::xlsx::read_reader(Cursor::new(bytes.as_slice()), true)
            .unwrap();
        assert_eq!(book.get_sheet_collection().len(), 1);
        assert_eq!(book.get_sheet_collection()[0].get_name(), COURSES_SHEET);

        let table = read_first_sheet(&bytes).unwrap();
        assert_eq!(table.headers, COURSE_COLUMNS.to_vec());
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][1], "Python");
        assert_eq!(table.column("price"), Some(3));
    }

    #[test]
    fn garbage_is_a_format_error() {
        let err = read_first_sheet(b"not a zip file").unwrap_err();
        assert!(matches!(err, EngineError::InvalidFormat(_)));
    }

    #[test]
    fn export_format_parsing() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!(
            "excel".parse::<ExportFormat>().unwrap(),
            ExportFormat::Spreadsheet
        );
        assert!("pdf".parse::<ExportFormat>().is_err());
    }
}
