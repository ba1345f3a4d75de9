//! # studentdb API
//!
//! A student-records service built with Axum: CRUD and aggregate queries over
//! student records, guarded by bearer-token authentication, with an optional
//! read-through cache in front of the reads.
//!
//! ## Architecture
//!
//! ```text
//! src/
//! ├── middleware/       # AuthUser / WriteAccess extractors
//! ├── modules/          # Feature modules
//! │   ├── auth/        # Registration, token issuance, logout, /auth/me
//! │   └── students/    # Student CRUD, aggregate queries, batch jobs
//! ├── tasks.rs          # Background task queue
//! └── validator.rs      # ValidatedJson extractor
//! ```
//!
//! Each feature module follows a consistent structure:
//!
//! - `controller.rs`: HTTP handlers
//! - `service.rs`: Business logic
//! - `router.rs`: Axum router configuration
//!
//! Domain types, storage, caching and tokens live in the `studentdb-*` crates.
//!
//! ## Request flow
//!
//! 1. `AuthUser` verifies the bearer token and confirms the subject still has a
//!    credential; any failure is a 401 `Not authenticated`.
//! 2. Reads consult the query cache first and fall back to the repository.
//! 3. Writes go to the repository only. Cached results stay until their TTL
//!    runs out unless `CACHE_INVALIDATE_ON_WRITE=true`.
//! 4. Batch deletes and CSV imports are handed to the [`tasks::TaskQueue`];
//!    their response only confirms scheduling.
//!
//! ## Quick Start
//!
//! ```bash
//! JWT_SECRET=change-me cargo run
//! curl -X POST localhost:8000/auth/register -H 'content-type: application/json' \
//!      -d '{"username":"alice","password":"pw1"}'
//! curl -X POST localhost:8000/auth/token -d 'username=alice&password=pw1'
//! ```
//!
//! Without `DATABASE_URL` the service keeps everything in memory.

pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod modules;
pub mod router;
pub mod state;
pub mod tasks;
pub mod validator;

// Re-export workspace crates for convenience
pub use studentdb_auth;
pub use studentdb_cache;
pub use studentdb_config;
pub use studentdb_core;
pub use studentdb_db;
pub use studentdb_models;
