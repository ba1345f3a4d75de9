//! # studentdb CLI
//!
//! Offline tools that work directly against the student store, without going
//! through the HTTP API.
//!
//! - [`report`]: the four student reports, printed one record per line
//! - [`seeder`]: fake student records for development databases
//!
//! ## Usage
//!
//! ```ignore
//! use studentdb_cli::report::Report;
//!
//! let report = Report::build(&repository, "Physics", "Mechanics", 30).await?;
//! println!("{report}");
//! ```

pub mod report;
pub mod seeder;
