use axum::{
    Json,
    extract::{
        Multipart, Path, State, multipart::MultipartRejection, rejection::PathRejection,
    },
    http::header,
    response::{IntoResponse, Response},
};
use tracing::{instrument, warn};

use studentdb_core::AppError;
use studentdb_models::auth::MessageResponse;
use studentdb_models::students::{
    BatchDeleteRequest, CreateStudentDto, ScheduledResponse, StudentMutationResponse,
    UpdateStudentDto,
};

use crate::middleware::auth::{AuthUser, WriteAccess};
use crate::state::AppState;
use crate::validator::ValidatedJson;

use super::service::StudentService;

/// Responds with an already serialized JSON body.
fn json_body(body: String) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

fn student_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, AppError> {
    path.map(|Path(id)| id)
        .map_err(|e| AppError::unprocessable(anyhow::anyhow!(e.body_text())))
}

fn path_param(path: Result<Path<String>, PathRejection>) -> Result<String, AppError> {
    path.map(|Path(value)| value)
        .map_err(|e| AppError::unprocessable(anyhow::anyhow!(e.body_text())))
}

#[instrument(skip(state, auth_user, dto), fields(username = %auth_user.0.username))]
pub async fn create_student(
    State(state): State<AppState>,
    auth_user: WriteAccess,
    ValidatedJson(dto): ValidatedJson<CreateStudentDto>,
) -> Result<Json<StudentMutationResponse>, AppError> {
    let student = StudentService::create_student(&state, dto).await?;
    Ok(Json(StudentMutationResponse {
        message: "Student added".to_string(),
        student,
    }))
}

#[instrument(skip(state, _auth_user))]
pub async fn get_students(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> Result<Response, AppError> {
    let body = StudentService::list_students(&state).await?;
    Ok(json_body(body))
}

#[instrument(skip(state, _auth_user, faculty))]
pub async fn get_students_by_faculty(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    faculty: Result<Path<String>, PathRejection>,
) -> Result<Response, AppError> {
    let faculty = path_param(faculty)?;
    let body = StudentService::list_by_faculty(&state, &faculty).await?;
    Ok(json_body(body))
}

#[instrument(skip(state, _auth_user))]
pub async fn get_unique_courses(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> Result<Response, AppError> {
    let body = StudentService::unique_courses(&state).await?;
    Ok(json_body(body))
}

#[instrument(skip(state, _auth_user, faculty))]
pub async fn get_faculty_average(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    faculty: Result<Path<String>, PathRejection>,
) -> Result<Response, AppError> {
    let faculty = path_param(faculty)?;
    let body = StudentService::faculty_average(&state, &faculty).await?;
    Ok(json_body(body))
}

#[instrument(skip(state, _auth_user, course))]
pub async fn get_low_scores(
    State(state): State<AppState>,
    _auth_user: AuthUser,
    course: Result<Path<String>, PathRejection>,
) -> Result<Response, AppError> {
    let course = path_param(course)?;
    let body = StudentService::low_scores(&state, &course).await?;
    Ok(json_body(body))
}

#[instrument(skip(state, auth_user, id, dto), fields(username = %auth_user.0.username))]
pub async fn update_student(
    State(state): State<AppState>,
    auth_user: WriteAccess,
    id: Result<Path<i64>, PathRejection>,
    ValidatedJson(dto): ValidatedJson<UpdateStudentDto>,
) -> Result<Json<StudentMutationResponse>, AppError> {
    let id = student_id(id)?;
    let student = StudentService::update_student(&state, id, dto).await?;
    Ok(Json(StudentMutationResponse {
        message: "Student updated".to_string(),
        student,
    }))
}

#[instrument(skip(state, auth_user, id), fields(username = %auth_user.0.username))]
pub async fn delete_student(
    State(state): State<AppState>,
    auth_user: WriteAccess,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = student_id(id)?;
    StudentService::delete_student(&state, id).await?;
    Ok(Json(MessageResponse::new("Student deleted")))
}

/// Schedule deletion of a list of ids. The response does not confirm the deletion.
#[instrument(skip(state, auth_user, request), fields(username = %auth_user.0.username))]
pub async fn batch_delete_students(
    State(state): State<AppState>,
    auth_user: WriteAccess,
    ValidatedJson(request): ValidatedJson<BatchDeleteRequest>,
) -> Result<Json<ScheduledResponse>, AppError> {
    let task_id = StudentService::schedule_batch_delete(&state, request.ids)?;
    Ok(Json(ScheduledResponse {
        message: "Batch delete scheduled".to_string(),
        task_id,
    }))
}

/// Schedule import of the multipart field `file`. The response does not confirm the import.
#[instrument(skip(state, auth_user, multipart), fields(username = %auth_user.0.username))]
pub async fn load_csv(
    State(state): State<AppState>,
    auth_user: WriteAccess,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ScheduledResponse>, AppError> {
    let mut multipart =
        multipart.map_err(|e| AppError::unprocessable(anyhow::anyhow!(e.body_text())))?;

    let mut data = None;
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!(error = %e, "Failed to read multipart body");
        AppError::unprocessable(anyhow::anyhow!("Invalid multipart body"))
    })? {
        if field.name() == Some("file") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::unprocessable(anyhow::anyhow!(e.body_text())))?;
            data = Some(bytes.to_vec());
            break;
        }
    }

    let data = data.ok_or_else(|| AppError::unprocessable(anyhow::anyhow!("file is required")))?;

    let task_id = StudentService::schedule_csv_import(&state, data)?;
    Ok(Json(ScheduledResponse {
        message: "CSV import scheduled".to_string(),
        task_id,
    }))
}
