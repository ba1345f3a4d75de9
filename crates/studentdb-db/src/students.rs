//! Student record storage.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::RwLock;
use tracing::instrument;

use studentdb_core::StoreError;
use studentdb_models::students::{CreateStudentDto, StudentRecord, UpdateStudentDto};

/// CRUD and aggregate queries over student records.
///
/// Lists are ordered by `id`. Conflicting writes are serialized by the
/// implementation.
#[async_trait]
pub trait StudentRepository: Send + Sync + std::fmt::Debug {
    async fn insert(&self, student: CreateStudentDto) -> Result<StudentRecord, StoreError>;

    /// Inserts all rows at once. Returns the number of inserted records.
    async fn insert_many(&self, students: Vec<CreateStudentDto>) -> Result<u64, StoreError>;

    async fn list_all(&self) -> Result<Vec<StudentRecord>, StoreError>;

    async fn list_by_faculty(&self, faculty: &str) -> Result<Vec<StudentRecord>, StoreError>;

    /// Distinct course names, sorted.
    async fn list_unique_courses(&self) -> Result<Vec<String>, StoreError>;

    /// Mean score rounded to two decimals, `0` when the faculty has no records.
    async fn average_score_by_faculty(&self, faculty: &str) -> Result<f64, StoreError>;

    /// Records of `course` with `score < threshold`.
    async fn list_by_course_below_score(
        &self,
        course: &str,
        threshold: i32,
    ) -> Result<Vec<StudentRecord>, StoreError>;

    /// Applies the present fields of `patch`. `None` if no record has `id`.
    async fn update(
        &self,
        id: i64,
        patch: UpdateStudentDto,
    ) -> Result<Option<StudentRecord>, StoreError>;

    /// Returns `false` if no record has `id`.
    async fn delete(&self, id: i64) -> Result<bool, StoreError>;

    /// Deletes every listed record that exists. Returns how many were deleted.
    async fn delete_many(&self, ids: &[i64]) -> Result<u64, StoreError>;
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// PostgreSQL-backed repository.
#[derive(Clone, Debug)]
pub struct PgStudentRepository {
    pool: PgPool,
}

impl PgStudentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const STUDENT_COLUMNS: &str = "id, last_name, first_name, faculty, course, score";

#[async_trait]
impl StudentRepository for PgStudentRepository {
    #[instrument(skip(self, student))]
    async fn insert(&self, student: CreateStudentDto) -> Result<StudentRecord, StoreError> {
        let record = sqlx::query_as::<_, StudentRecord>(&format!(
            r#"
            INSERT INTO students (last_name, first_name, faculty, course, score)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {STUDENT_COLUMNS}
            "#
        ))
        .bind(&student.last_name)
        .bind(&student.first_name)
        .bind(&student.faculty)
        .bind(&student.course)
        .bind(student.score)
        .fetch_one(&self.pool)
        .await
        .context("Failed to insert student")?;

        Ok(record)
    }

    #[instrument(skip(self, students), fields(count = students.len()))]
    async fn insert_many(&self, students: Vec<CreateStudentDto>) -> Result<u64, StoreError> {
        if students.is_empty() {
            return Ok(0);
        }

        let mut last_names = Vec::with_capacity(students.len());
        let mut first_names = Vec::with_capacity(students.len());
        let mut faculties = Vec::with_capacity(students.len());
        let mut courses = Vec::with_capacity(students.len());
        let mut scores = Vec::with_capacity(students.len());

        for student in students {
            last_names.push(student.last_name);
            first_names.push(student.first_name);
            faculties.push(student.faculty);
            courses.push(student.course);
            scores.push(student.score);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO students (last_name, first_name, faculty, course, score)
            SELECT * FROM UNNEST($1::text[], $2::text[], $3::text[], $4::text[], $5::int4[])
            "#,
        )
        .bind(last_names)
        .bind(first_names)
        .bind(faculties)
        .bind(courses)
        .bind(scores)
        .execute(&self.pool)
        .await
        .context("Failed to insert students")?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn list_all(&self) -> Result<Vec<StudentRecord>, StoreError> {
        let students = sqlx::query_as::<_, StudentRecord>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch students")?;

        Ok(students)
    }

    #[instrument(skip(self))]
    async fn list_by_faculty(&self, faculty: &str) -> Result<Vec<StudentRecord>, StoreError> {
        let students = sqlx::query_as::<_, StudentRecord>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE faculty = $1 ORDER BY id"
        ))
        .bind(faculty)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch students by faculty")?;

        Ok(students)
    }

    #[instrument(skip(self))]
    async fn list_unique_courses(&self) -> Result<Vec<String>, StoreError> {
        let courses =
            sqlx::query_scalar::<_, String>("SELECT DISTINCT course FROM students ORDER BY course")
                .fetch_all(&self.pool)
                .await
                .context("Failed to fetch unique courses")?;

        Ok(courses)
    }

    #[instrument(skip(self))]
    async fn average_score_by_faculty(&self, faculty: &str) -> Result<f64, StoreError> {
        let average = sqlx::query_scalar::<_, Option<f64>>(
            "SELECT AVG(score)::float8 FROM students WHERE faculty = $1",
        )
        .bind(faculty)
        .fetch_one(&self.pool)
        .await
        .context("Failed to compute faculty average")?;

        Ok(average.map(round2).unwrap_or(0.0))
    }

    #[instrument(skip(self))]
    async fn list_by_course_below_score(
        &self,
        course: &str,
        threshold: i32,
    ) -> Result<Vec<StudentRecord>, StoreError> {
        let students = sqlx::query_as::<_, StudentRecord>(&format!(
            "SELECT {STUDENT_COLUMNS} FROM students WHERE course = $1 AND score < $2 ORDER BY id"
        ))
        .bind(course)
        .bind(threshold)
        .fetch_all(&self.pool)
        .await
        .context("Failed to fetch low-score students")?;

        Ok(students)
    }

    #[instrument(skip(self, patch))]
    async fn update(
        &self,
        id: i64,
        patch: UpdateStudentDto,
    ) -> Result<Option<StudentRecord>, StoreError> {
        // One statement, so the row lock covers the read of the old values.
        let record = sqlx::query_as::<_, StudentRecord>(&format!(
            r#"
            UPDATE students
            SET last_name = COALESCE($2, last_name),
                first_name = COALESCE($3, first_name),
                faculty = COALESCE($4, faculty),
                course = COALESCE($5, course),
                score = COALESCE($6, score)
            WHERE id = $1
            RETURNING {STUDENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(patch.last_name)
        .bind(patch.first_name)
        .bind(patch.faculty)
        .bind(patch.course)
        .bind(patch.score)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to update student")?;

        Ok(record)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM students WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete student")?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()))]
    async fn delete_many(&self, ids: &[i64]) -> Result<u64, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query("DELETE FROM students WHERE id = ANY($1)")
            .bind(ids.to_vec())
            .execute(&self.pool)
            .await
            .context("Failed to delete students")?;

        Ok(result.rows_affected())
    }
}

#[derive(Debug, Default)]
struct MemoryStudents {
    records: BTreeMap<i64, StudentRecord>,
    last_id: i64,
}

impl MemoryStudents {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }
}

/// Process-local repository used when no database is configured, and in tests.
#[derive(Clone, Debug, Default)]
pub struct MemoryStudentRepository {
    inner: Arc<RwLock<MemoryStudents>>,
}

impl MemoryStudentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn filtered<F>(students: &MemoryStudents, predicate: F) -> Vec<StudentRecord>
    where
        F: Fn(&StudentRecord) -> bool,
    {
        students
            .records
            .values()
            .filter(|record| predicate(record))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl StudentRepository for MemoryStudentRepository {
    async fn insert(&self, student: CreateStudentDto) -> Result<StudentRecord, StoreError> {
        let mut students = self.inner.write().await;
        let id = students.next_id();
        let record = student.into_record(id);
        students.records.insert(id, record.clone());
        Ok(record)
    }

    async fn insert_many(&self, rows: Vec<CreateStudentDto>) -> Result<u64, StoreError> {
        let mut students = self.inner.write().await;
        let mut inserted = 0;
        for row in rows {
            let id = students.next_id();
            students.records.insert(id, row.into_record(id));
            inserted += 1;
        }
        Ok(inserted)
    }

    async fn list_all(&self) -> Result<Vec<StudentRecord>, StoreError> {
        let students = self.inner.read().await;
        Ok(students.records.values().cloned().collect())
    }

    async fn list_by_faculty(&self, faculty: &str) -> Result<Vec<StudentRecord>, StoreError> {
        let students = self.inner.read().await;
        Ok(Self::filtered(&students, |r| r.faculty == faculty))
    }

    async fn list_unique_courses(&self) -> Result<Vec<String>, StoreError> {
        let students = self.inner.read().await;
        let courses: BTreeSet<&str> = students
            .records
            .values()
            .map(|r| r.course.as_str())
            .collect();
        Ok(courses.into_iter().map(str::to_string).collect())
    }

    async fn average_score_by_faculty(&self, faculty: &str) -> Result<f64, StoreError> {
        let students = self.inner.read().await;
        let (sum, count) = students
            .records
            .values()
            .filter(|r| r.faculty == faculty)
            .fold((0i64, 0u32), |(sum, count), r| {
                (sum + i64::from(r.score), count + 1)
            });

        if count == 0 {
            return Ok(0.0);
        }
        Ok(round2(sum as f64 / f64::from(count)))
    }

    async fn list_by_course_below_score(
        &self,
        course: &str,
        threshold: i32,
    ) -> Result<Vec<StudentRecord>, StoreError> {
        let students = self.inner.read().await;
        Ok(Self::filtered(&students, |r| {
            r.course == course && r.score < threshold
        }))
    }

    async fn update(
        &self,
        id: i64,
        patch: UpdateStudentDto,
    ) -> Result<Option<StudentRecord>, StoreError> {
        let mut students = self.inner.write().await;
        Ok(students.records.get_mut(&id).map(|record| {
            patch.apply_to(record);
            record.clone()
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let mut students = self.inner.write().await;
        Ok(students.records.remove(&id).is_some())
    }

    async fn delete_many(&self, ids: &[i64]) -> Result<u64, StoreError> {
        let mut students = self.inner.write().await;
        let deleted = ids
            .iter()
            .filter(|id| students.records.remove(*id).is_some())
            .count();
        Ok(deleted as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(last: &str, faculty: &str, course: &str, score: i32) -> CreateStudentDto {
        CreateStudentDto {
            last_name: last.to_string(),
            first_name: "Ivan".to_string(),
            faculty: faculty.to_string(),
            course: course.to_string(),
            score,
        }
    }

    async fn seeded() -> MemoryStudentRepository {
        let repo = MemoryStudentRepository::new();
        repo.insert_many(vec![
            student("Ivanov", "Physics", "Mechanics", 85),
            student("Petrov", "Physics", "Optics", 20),
            student("Sidorov", "Math", "Algebra", 29),
            student("Smirnov", "Math", "Algebra", 30),
            student("Kuznetsov", "Physics", "Mechanics", 90),
        ])
        .await
        .unwrap();
        repo
    }

    #[tokio::test]
    async fn test_insert_assigns_increasing_ids() {
        let repo = MemoryStudentRepository::new();
        let first = repo
            .insert(student("Ivanov", "Physics", "1", 85))
            .await
            .unwrap();
        let second = repo
            .insert(student("Petrov", "Physics", "1", 70))
            .await
            .unwrap();
        assert!(second.id > first.id);
        assert_eq!(repo.list_all().await.unwrap(), vec![first, second]);
    }

    #[tokio::test]
    async fn test_list_by_faculty() {
        let repo = seeded().await;
        let physics = repo.list_by_faculty("Physics").await.unwrap();
        assert_eq!(physics.len(), 3);
        assert!(physics.iter().all(|r| r.faculty == "Physics"));
        assert!(repo.list_by_faculty("History").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unique_courses_sorted() {
        let repo = seeded().await;
        assert_eq!(
            repo.list_unique_courses().await.unwrap(),
            vec!["Algebra", "Mechanics", "Optics"]
        );
    }

    #[tokio::test]
    async fn test_average_score_rounded() {
        let repo = seeded().await;
        // (85 + 20 + 90) / 3 = 65.0
        assert_eq!(repo.average_score_by_faculty("Physics").await.unwrap(), 65.0);
        // (29 + 30) / 2 = 29.5
        assert_eq!(repo.average_score_by_faculty("Math").await.unwrap(), 29.5);

        repo.insert(student("Orlov", "Chem", "1", 1)).await.unwrap();
        repo.insert(student("Volkov", "Chem", "1", 1)).await.unwrap();
        repo.insert(student("Lebedev", "Chem", "1", 2)).await.unwrap();
        assert_eq!(repo.average_score_by_faculty("Chem").await.unwrap(), 1.33);
    }

    #[tokio::test]
    async fn test_average_of_empty_faculty_is_zero() {
        let repo = MemoryStudentRepository::new();
        assert_eq!(repo.average_score_by_faculty("Nobody").await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn test_below_score_is_strict() {
        let repo = seeded().await;
        let low = repo.list_by_course_below_score("Algebra", 30).await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].last_name, "Sidorov");
    }

    #[tokio::test]
    async fn test_update_missing_returns_none() {
        let repo = seeded().await;
        let before = repo.list_all().await.unwrap();
        let patch = UpdateStudentDto {
            score: Some(1),
            ..Default::default()
        };
        assert_eq!(repo.update(999, patch).await.unwrap(), None);
        assert_eq!(repo.list_all().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_delete_only_touches_target() {
        let repo = seeded().await;
        assert!(!repo.delete(999).await.unwrap());
        assert_eq!(repo.list_all().await.unwrap().len(), 5);

        assert!(repo.delete(1).await.unwrap());
        let remaining = repo.list_all().await.unwrap();
        assert_eq!(remaining.len(), 4);
        assert!(remaining.iter().all(|r| r.id != 1));
    }

    #[tokio::test]
    async fn test_delete_many_skips_unknown_ids() {
        let repo = seeded().await;
        assert_eq!(repo.delete_many(&[1, 2, 999]).await.unwrap(), 2);
        assert_eq!(repo.list_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    #[ignore = "requires PostgreSQL (DATABASE_URL)"]
    async fn test_postgres_roundtrip() {
        let config = studentdb_config::DatabaseConfig::from_env();
        let pool = crate::init_db_pool(&config).await.unwrap();
        crate::run_migrations(&pool).await.unwrap();
        let repo = PgStudentRepository::new(pool);

        let record = repo
            .insert(student("Ivanov", "PgTestFaculty", "PgTestCourse", 10))
            .await
            .unwrap();
        let patch = UpdateStudentDto {
            score: Some(12),
            ..Default::default()
        };
        let updated = repo.update(record.id, patch).await.unwrap().unwrap();
        assert_eq!(updated.score, 12);
        assert_eq!(updated.last_name, "Ivanov");

        let low = repo
            .list_by_course_below_score("PgTestCourse", 30)
            .await
            .unwrap();
        assert!(low.iter().any(|r| r.id == record.id));

        assert!(repo.delete(record.id).await.unwrap());
        assert!(!repo.delete(record.id).await.unwrap());
    }
}
