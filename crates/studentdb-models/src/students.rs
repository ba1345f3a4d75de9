//! Student domain models and DTOs.
//!
//! This module contains the student record as stored by the repository, the
//! request DTOs for creating and partially updating records, and the response
//! shapes of the aggregate queries.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// A student record.
///
/// The `id` is assigned by the store. Handlers only ever receive copies.
#[derive(Serialize, Deserialize, FromRow, Debug, Clone, PartialEq, Eq)]
pub struct StudentRecord {
    pub id: i64,
    pub last_name: String,
    pub first_name: String,
    pub faculty: String,
    pub course: String,
    pub score: i32,
}

impl std::fmt::Display for StudentRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} {} | Faculty: {} | Course: {} | Score: {}",
            self.last_name, self.first_name, self.faculty, self.course, self.score
        )
    }
}

/// DTO for creating a new student record. Every field is required and text
/// fields must be non-empty; any integer score is accepted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Validate)]
pub struct CreateStudentDto {
    #[validate(length(min = 1))]
    pub last_name: String,
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub faculty: String,
    #[validate(length(min = 1))]
    pub course: String,
    pub score: i32,
}

impl CreateStudentDto {
    /// Materializes the DTO as a record with the store-assigned `id`.
    pub fn into_record(self, id: i64) -> StudentRecord {
        StudentRecord {
            id,
            last_name: self.last_name,
            first_name: self.first_name,
            faculty: self.faculty,
            course: self.course,
            score: self.score,
        }
    }
}

/// DTO for a partial update.
///
/// All fields are optional; only provided fields will be updated.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, Validate)]
pub struct UpdateStudentDto {
    #[validate(length(min = 1))]
    pub last_name: Option<String>,
    #[validate(length(min = 1))]
    pub first_name: Option<String>,
    #[validate(length(min = 1))]
    pub faculty: Option<String>,
    #[validate(length(min = 1))]
    pub course: Option<String>,
    pub score: Option<i32>,
}

impl UpdateStudentDto {
    pub fn is_empty(&self) -> bool {
        self.last_name.is_none()
            && self.first_name.is_none()
            && self.faculty.is_none()
            && self.course.is_none()
            && self.score.is_none()
    }

    /// Applies the present fields to `record`, leaving the rest untouched.
    pub fn apply_to(&self, record: &mut StudentRecord) {
        if let Some(last_name) = &self.last_name {
            record.last_name = last_name.clone();
        }
        if let Some(first_name) = &self.first_name {
            record.first_name = first_name.clone();
        }
        if let Some(faculty) = &self.faculty {
            record.faculty = faculty.clone();
        }
        if let Some(course) = &self.course {
            record.course = course.clone();
        }
        if let Some(score) = self.score {
            record.score = score;
        }
    }
}

/// One row of an uploaded CSV file.
///
/// Accepts the Russian column headers of the original export
/// (`Фамилия,Имя,Факультет,Курс,Оценка`) as well as the English field names.
#[derive(Deserialize, Debug, Clone)]
pub struct StudentCsvRow {
    #[serde(alias = "Фамилия")]
    pub last_name: String,
    #[serde(alias = "Имя")]
    pub first_name: String,
    #[serde(alias = "Факультет")]
    pub faculty: String,
    #[serde(alias = "Курс")]
    pub course: String,
    #[serde(alias = "Оценка")]
    pub score: i32,
}

impl From<StudentCsvRow> for CreateStudentDto {
    fn from(row: StudentCsvRow) -> Self {
        Self {
            last_name: row.last_name,
            first_name: row.first_name,
            faculty: row.faculty,
            course: row.course,
            score: row.score,
        }
    }
}

/// Body of the batch delete endpoint: a bare JSON array of ids.
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
#[serde(transparent)]
pub struct BatchDeleteRequest {
    #[validate(length(min = 1, message = "at least one id is required"))]
    pub ids: Vec<i64>,
}

/// Response for the faculty average query.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FacultyAverage {
    pub faculty: String,
    pub avg_score: f64,
}

/// Response for a single-record mutation.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct StudentMutationResponse {
    pub message: String,
    pub student: StudentRecord,
}

/// Acknowledgement for work handed to the background task queue.
///
/// It only confirms that the work was scheduled. Poll a read endpoint to
/// observe completion.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ScheduledResponse {
    pub message: String,
    pub task_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_dto() -> CreateStudentDto {
        CreateStudentDto {
            last_name: "Ivanov".to_string(),
            first_name: "Ivan".to_string(),
            faculty: "Physics".to_string(),
            course: "1".to_string(),
            score: 85,
        }
    }

    #[test]
    fn test_create_student_dto_validation() {
        assert!(valid_dto().validate().is_ok());
    }

    #[test]
    fn test_create_student_dto_empty_name() {
        let dto = CreateStudentDto {
            last_name: "".to_string(),
            ..valid_dto()
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_create_student_dto_accepts_any_score() {
        for score in [150, -5, 0, i32::MAX] {
            let dto = CreateStudentDto {
                score,
                ..valid_dto()
            };
            assert!(dto.validate().is_ok(), "{}", score);
        }
    }

    #[test]
    fn test_create_student_dto_accepts_long_names() {
        let dto = CreateStudentDto {
            last_name: "x".repeat(500),
            ..valid_dto()
        };
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_create_student_dto_missing_field_fails_to_parse() {
        let result = serde_json::from_str::<CreateStudentDto>(r#"{"last_name":"Petrov"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_update_student_dto_empty() {
        let dto = UpdateStudentDto::default();
        assert!(dto.is_empty());
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_update_applies_only_present_fields() {
        let mut record = valid_dto().into_record(7);
        let patch = UpdateStudentDto {
            score: Some(42),
            ..Default::default()
        };

        patch.apply_to(&mut record);

        assert_eq!(record.id, 7);
        assert_eq!(record.score, 42);
        assert_eq!(record.last_name, "Ivanov");
        assert_eq!(record.first_name, "Ivan");
        assert_eq!(record.faculty, "Physics");
        assert_eq!(record.course, "1");
    }

    #[test]
    fn test_update_student_dto_empty_string_rejected() {
        let dto = UpdateStudentDto {
            faculty: Some(String::new()),
            ..Default::default()
        };
        assert!(dto.validate().is_err());

        let dto = UpdateStudentDto {
            score: Some(500),
            ..Default::default()
        };
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_display_format() {
        let record = valid_dto().into_record(1);
        assert_eq!(
            record.to_string(),
            "Ivanov Ivan | Faculty: Physics | Course: 1 | Score: 85"
        );
    }

    #[test]
    fn test_batch_delete_is_a_bare_array() {
        let request: BatchDeleteRequest = serde_json::from_str("[1, 2, 3]").unwrap();
        assert_eq!(request.ids, vec![1, 2, 3]);
        assert!(request.validate().is_ok());

        let empty: BatchDeleteRequest = serde_json::from_str("[]").unwrap();
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_csv_row_accepts_russian_headers() {
        let json = r#"{"Фамилия":"Иванов","Имя":"Иван","Факультет":"ФПМИ","Курс":"Информатика","Оценка":25}"#;
        let row: StudentCsvRow = serde_json::from_str(json).unwrap();
        let dto = CreateStudentDto::from(row);
        assert_eq!(dto.last_name, "Иванов");
        assert_eq!(dto.course, "Информатика");
        assert_eq!(dto.score, 25);
    }
}
