//! Cache key generation for student queries.
//!
//! Free-form parameters (faculty and course names) are SHA-256 digested, so a
//! key never contains user-supplied `*`, `?` or `[` that would widen a pattern
//! invalidation.

use sha2::{Digest, Sha256};

/// Builds the keys of every cached student query under one prefix.
#[derive(Clone, Debug)]
pub struct CacheKeys {
    prefix: String,
}

impl CacheKeys {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn build_key(&self, parts: &[&str]) -> String {
        format!("{}:{}", self.prefix, parts.join(":"))
    }

    /// Key for the full record list.
    pub fn all(&self) -> String {
        self.build_key(&["students", "all"])
    }

    /// Key for the records of one faculty.
    pub fn by_faculty(&self, faculty: &str) -> String {
        self.build_key(&["students", "faculty", &digest(faculty)])
    }

    /// Key for the sorted list of distinct courses.
    pub fn unique_courses(&self) -> String {
        self.build_key(&["students", "courses"])
    }

    /// Key for the average score of one faculty.
    pub fn faculty_average(&self, faculty: &str) -> String {
        self.build_key(&["students", "faculty", &digest(faculty), "avg"])
    }

    /// Key for the records of one course scoring below `threshold`.
    pub fn low_scores(&self, course: &str, threshold: i32) -> String {
        self.build_key(&[
            "students",
            "course",
            &digest(course),
            "low",
            &threshold.to_string(),
        ])
    }

    /// Prefix shared by every student query key.
    pub fn students_prefix(&self) -> String {
        self.build_key(&["students"])
    }
}

/// Hex-encoded SHA-256 of `value`.
pub fn digest(value: &str) -> String {
    hex::encode(Sha256::digest(value.as_bytes()))
}
