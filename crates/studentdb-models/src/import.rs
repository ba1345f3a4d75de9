//! CSV import of student records.
//!
//! The expected header is `Фамилия,Имя,Факультет,Курс,Оценка`; the English
//! field names are accepted too. Rows that fail to parse or validate are
//! skipped and logged, so one bad line does not reject the whole file.

use std::io::Read;

use tracing::warn;
use validator::Validate;

use crate::students::{CreateStudentDto, StudentCsvRow};

/// Outcome of parsing one CSV file.
#[derive(Debug, Default)]
pub struct CsvImport {
    pub students: Vec<CreateStudentDto>,
    pub skipped: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum CsvImportError {
    #[error("CSV file has no header row")]
    MissingHeader,

    #[error("CSV header is missing column {0}")]
    MissingColumn(&'static str),

    #[error("Failed to read CSV: {0}")]
    Read(#[from] csv::Error),
}

const REQUIRED_COLUMNS: [(&str, &str); 5] = [
    ("Фамилия", "last_name"),
    ("Имя", "first_name"),
    ("Факультет", "faculty"),
    ("Курс", "course"),
    ("Оценка", "score"),
];

pub fn parse_students_csv<R: Read>(reader: R) -> Result<CsvImport, CsvImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    if headers.is_empty() {
        return Err(CsvImportError::MissingHeader);
    }
    for (russian, english) in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == russian || h == english) {
            return Err(CsvImportError::MissingColumn(english));
        }
    }

    let mut import = CsvImport::default();
    for (index, row) in reader.deserialize::<StudentCsvRow>().enumerate() {
        // Header is line 1.
        let line = index + 2;
        let student = match row {
            Ok(row) => CreateStudentDto::from(row),
            Err(e) => {
                warn!(line, error = %e, "Skipping malformed CSV row");
                import.skipped += 1;
                continue;
            }
        };

        if let Err(e) = student.validate() {
            warn!(line, error = %e, "Skipping invalid CSV row");
            import.skipped += 1;
            continue;
        }

        import.students.push(student);
    }

    Ok(import)
}
