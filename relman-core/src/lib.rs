pub mod dates;
pub mod db;
pub mod error;
pub mod export;
pub mod filter;
pub mod models;
pub mod project;
pub mod urls;

// Re-export commonly used types
pub use dates::{format_date, parse_date};
pub use db::{Database, DatabaseStats, Overview, ReleaseQuery, ReleaseSummary};
pub use error::{Error, Result};
pub use export::{collect_release, release_to_json, ItemExport, ReleaseExport};
pub use filter::{ItemFilter, ProductSelector};
pub use models::{
    ItemDraft, ItemStatus, MergeRequest, Product, ProductDraft, Release, ReleaseDraft, ReleaseItem,
};
pub use project::determine_db_path;
pub use urls::{extract_mr_ref, normalize_url, MrRef};
