//! SQLite persistence layer
//!
//! One backend; the schema lives in `schema.sql` and is applied on
//! first open. All cascade and uniqueness rules are enforced here.

mod sqlite;

pub use sqlite::{Database, DatabaseStats, Overview, ReleaseQuery, ReleaseSummary};
