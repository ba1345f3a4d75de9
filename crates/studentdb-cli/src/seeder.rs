//! Fake student records for development databases.

use std::time::Instant;

use fake::Fake;
use fake::faker::name::en::{FirstName, LastName};

use studentdb_core::StoreError;
use studentdb_db::StudentRepository;
use studentdb_models::students::CreateStudentDto;

const FACULTIES: [&str; 5] = ["ФПМИ", "Физфак", "Химфак", "Биофак", "Истфак"];
const COURSES: [&str; 6] = [
    "Информатика",
    "Математика",
    "Физика",
    "Химия",
    "Биология",
    "История",
];

/// Generates `count` random, valid student records.
pub fn generate_students(count: usize) -> Vec<CreateStudentDto> {
    (0..count)
        .map(|_| CreateStudentDto {
            last_name: LastName().fake(),
            first_name: FirstName().fake(),
            faculty: FACULTIES[(0..FACULTIES.len()).fake::<usize>()].to_string(),
            course: COURSES[(0..COURSES.len()).fake::<usize>()].to_string(),
            score: (0..=100).fake(),
        })
        .collect()
}

/// Inserts `count` generated records in one batch and returns how many were stored.
pub async fn seed_students(
    repository: &dyn StudentRepository,
    count: usize,
) -> Result<u64, StoreError> {
    let start = Instant::now();
    let students = generate_students(count);
    let inserted = repository.insert_many(students).await?;

    println!(
        "✅ Created {} students in {:.2}s",
        inserted,
        start.elapsed().as_secs_f64()
    );
    Ok(inserted)
}
