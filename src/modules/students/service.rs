//! Student queries and mutations.
//!
//! Reads go through the query cache when one is configured: a hit returns the
//! cached JSON untouched, a miss loads from the repository, serializes once and
//! stores those exact bytes. Writes only touch the repository, then evict the
//! cached student queries if `CACHE_INVALIDATE_ON_WRITE` is set. A miss that
//! loaded its value before such an eviction does not store it.

use std::future::Future;

use anyhow::Context;
use serde::Serialize;
use tracing::{info, instrument};
use uuid::Uuid;

use studentdb_cache::CacheKeys;
use studentdb_core::{AppError, StoreError};
use studentdb_models::import::parse_students_csv;
use studentdb_models::students::{
    CreateStudentDto, FacultyAverage, StudentRecord, UpdateStudentDto,
};

use crate::metrics::track_student_write;
use crate::state::AppState;

pub struct StudentService;

impl StudentService {
    async fn read_through<T, K, F, Fut>(
        state: &AppState,
        key: K,
        load: F,
    ) -> Result<String, AppError>
    where
        T: Serialize,
        K: FnOnce(&CacheKeys) -> String,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let cached = state.cache.as_ref().map(|cache| (cache, key(cache.keys())));

        let mut generation = None;
        if let Some((cache, key)) = &cached {
            if let Some(body) = cache.get(key).await {
                return Ok(body);
            }
            generation = Some(cache.generation());
        }

        let value = load().await?;
        let body = serde_json::to_string(&value).context("Failed to serialize response")?;

        if let (Some((cache, key)), Some(generation)) = (&cached, generation) {
            cache.put_if_current(key, &body, generation).await;
        }

        Ok(body)
    }

    /// Evicts cached student queries after a committed write, if configured to.
    pub async fn after_write(state: &AppState) {
        if !state.cache_config.invalidate_on_write {
            return;
        }
        if let Some(cache) = &state.cache {
            cache.invalidate_students().await;
        }
    }

    #[instrument(skip(state, dto))]
    pub async fn create_student(
        state: &AppState,
        dto: CreateStudentDto,
    ) -> Result<StudentRecord, AppError> {
        let student = state.students.insert(dto).await?;
        Self::after_write(state).await;
        track_student_write("create");
        info!(student_id = student.id, "Student created");
        Ok(student)
    }

    #[instrument(skip(state))]
    pub async fn list_students(state: &AppState) -> Result<String, AppError> {
        Self::read_through(state, |keys| keys.all(), || state.students.list_all()).await
    }

    #[instrument(skip(state))]
    pub async fn list_by_faculty(state: &AppState, faculty: &str) -> Result<String, AppError> {
        Self::read_through(
            state,
            |keys| keys.by_faculty(faculty),
            || state.students.list_by_faculty(faculty),
        )
        .await
    }

    #[instrument(skip(state))]
    pub async fn unique_courses(state: &AppState) -> Result<String, AppError> {
        Self::read_through(
            state,
            |keys| keys.unique_courses(),
            || state.students.list_unique_courses(),
        )
        .await
    }

    #[instrument(skip(state))]
    pub async fn faculty_average(state: &AppState, faculty: &str) -> Result<String, AppError> {
        Self::read_through(
            state,
            |keys| keys.faculty_average(faculty),
            || async {
                let avg_score = state.students.average_score_by_faculty(faculty).await?;
                Ok::<_, StoreError>(FacultyAverage {
                    faculty: faculty.to_string(),
                    avg_score,
                })
            },
        )
        .await
    }

    #[instrument(skip(state))]
    pub async fn low_scores(state: &AppState, course: &str) -> Result<String, AppError> {
        let threshold = state.features.low_score_threshold;
        Self::read_through(
            state,
            |keys| keys.low_scores(course, threshold),
            || state.students.list_by_course_below_score(course, threshold),
        )
        .await
    }

    #[instrument(skip(state, dto))]
    pub async fn update_student(
        state: &AppState,
        id: i64,
        dto: UpdateStudentDto,
    ) -> Result<StudentRecord, AppError> {
        let student = state
            .students
            .update(id, dto)
            .await?
            .ok_or_else(|| AppError::not_found(anyhow::anyhow!("Student not found")))?;

        Self::after_write(state).await;
        track_student_write("update");
        Ok(student)
    }

    #[instrument(skip(state))]
    pub async fn delete_student(state: &AppState, id: i64) -> Result<(), AppError> {
        if !state.students.delete(id).await? {
            return Err(AppError::not_found(anyhow::anyhow!("Student not found")));
        }

        Self::after_write(state).await;
        track_student_write("delete");
        Ok(())
    }

    /// Schedules deletion of `ids`. Unknown ids are ignored by the job.
    #[instrument(skip(state, ids), fields(count = ids.len()))]
    pub fn schedule_batch_delete(state: &AppState, ids: Vec<i64>) -> Result<Uuid, AppError> {
        let job_state = state.clone();
        state.tasks.submit("batch_delete", async move {
            let deleted = job_state.students.delete_many(&ids).await?;
            Self::after_write(&job_state).await;
            track_student_write("batch_delete");
            info!(requested = ids.len(), deleted, "Batch delete finished");
            Ok(())
        })
    }

    /// Schedules parsing and insertion of an uploaded CSV file.
    #[instrument(skip(state, data), fields(bytes = data.len()))]
    pub fn schedule_csv_import(state: &AppState, data: Vec<u8>) -> Result<Uuid, AppError> {
        let job_state = state.clone();
        state.tasks.submit("csv_import", async move {
            let import = parse_students_csv(data.as_slice())?;
            let inserted = job_state.students.insert_many(import.students).await?;
            Self::after_write(&job_state).await;
            track_student_write("csv_import");
            info!(inserted, skipped = import.skipped, "CSV import finished");
            Ok(())
        })
    }
}
