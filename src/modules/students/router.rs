use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
};

use crate::state::AppState;

use super::controller::{
    batch_delete_students, create_student, delete_student, get_faculty_average, get_low_scores,
    get_students, get_students_by_faculty, get_unique_courses, load_csv, update_student,
};

const CSV_UPLOAD_LIMIT: usize = 10 * 1024 * 1024;

pub fn init_students_router() -> Router<AppState> {
    Router::new()
        .route("/students/", post(create_student).get(get_students))
        .route("/students/faculty/{faculty}", get(get_students_by_faculty))
        .route("/students/courses/unique", get(get_unique_courses))
        .route(
            "/students/faculty/{faculty}/average_score",
            get(get_faculty_average),
        )
        .route("/students/course/{course}/low_score", get(get_low_scores))
        .route("/students/batch_delete/", delete(batch_delete_students))
        .route(
            "/students/load_csv/",
            post(load_csv).layer(DefaultBodyLimit::max(CSV_UPLOAD_LIMIT)),
        )
        .route("/students/{id}", put(update_student).delete(delete_student))
}
