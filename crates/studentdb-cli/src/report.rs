//! The four student reports: students of a faculty, unique courses, the
//! faculty average, and the low scorers of a course.

use std::fmt;

use studentdb_core::StoreError;
use studentdb_db::StudentRepository;
use studentdb_models::students::StudentRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub faculty: String,
    pub course: String,
    pub threshold: i32,
    pub faculty_students: Vec<StudentRecord>,
    pub unique_courses: Vec<String>,
    pub faculty_average: f64,
    pub low_scorers: Vec<StudentRecord>,
}

impl Report {
    pub async fn build(
        repository: &dyn StudentRepository,
        faculty: &str,
        course: &str,
        threshold: i32,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            faculty: faculty.to_string(),
            course: course.to_string(),
            threshold,
            faculty_students: repository.list_by_faculty(faculty).await?,
            unique_courses: repository.list_unique_courses().await?,
            faculty_average: repository.average_score_by_faculty(faculty).await?,
            low_scorers: repository
                .list_by_course_below_score(course, threshold)
                .await?,
        })
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "1) Students of faculty '{}':", self.faculty)?;
        for student in &self.faculty_students {
            writeln!(f, "{}", student)?;
        }

        writeln!(f, "\n2) Unique courses:")?;
        for course in &self.unique_courses {
            writeln!(f, "{}", course)?;
        }

        writeln!(f, "\n3) Average score of faculty '{}':", self.faculty)?;
        writeln!(f, "{}", self.faculty_average)?;

        writeln!(
            f,
            "\n4) Students of course '{}' scoring below {}:",
            self.course, self.threshold
        )?;
        for student in &self.low_scorers {
            writeln!(f, "{}", student)?;
        }
        Ok(())
    }
}
