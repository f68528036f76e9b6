//! SQLite persistence for products, releases, items and merge requests
//!
//! All referential integrity lives here: case-insensitive uniqueness of
//! product names and codes, and cascade deletion from release/product
//! down to items and from items down to merge requests. Cascades are
//! declared in the schema and rely on `PRAGMA foreign_keys=ON`.

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{Error, Result};
use crate::filter::ProductSelector;
use crate::models::{
    ItemDraft, ItemStatus, MergeRequest, Product, ProductDraft, Release, ReleaseDraft, ReleaseItem,
};
use crate::urls::{extract_mr_ref, normalize_url};

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Filters for the release listing
#[derive(Debug, Clone, Copy, Default)]
pub struct ReleaseQuery {
    /// Inclusive lower bound on the release date
    pub start: Option<NaiveDate>,
    /// Inclusive upper bound on the release date
    pub end: Option<NaiveDate>,
    /// Product selection applied to the per-release item counts
    pub product: ProductSelector,
}

impl ReleaseQuery {
    /// Builds a query from textual date bounds. Each bound is
    /// validated on its own: an invalid bound is returned as an error
    /// and left unset, so the listing can proceed with whatever
    /// bounds were valid.
    pub fn from_bounds(
        start: Option<&str>,
        end: Option<&str>,
        product: ProductSelector,
    ) -> (Self, Vec<Error>) {
        let mut query = ReleaseQuery {
            product,
            ..Default::default()
        };
        let mut errors = Vec::new();

        if let Some(raw) = start {
            match crate::dates::parse_date(raw) {
                Ok(d) => query.start = Some(d),
                Err(e) => errors.push(e),
            }
        }
        if let Some(raw) = end {
            match crate::dates::parse_date(raw) {
                Ok(d) => query.end = Some(d),
                Err(e) => errors.push(e),
            }
        }

        (query, errors)
    }
}

/// A release together with its (possibly filtered) item count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseSummary {
    pub release: Release,
    pub item_count: i64,
}

/// The next and most recent releases, for the landing page
#[derive(Debug, Clone)]
pub struct Overview {
    /// Up to 5 releases dated today or later, soonest first
    pub upcoming: Vec<ReleaseSummary>,
    /// Up to 5 past releases, most recent first
    pub recent: Vec<ReleaseSummary>,
}

/// Record counts, one per table
#[derive(Debug, Clone, Copy)]
pub struct DatabaseStats {
    pub product_count: i64,
    pub release_count: i64,
    pub item_count: i64,
    pub merge_request_count: i64,
}

/// SQLite-backed store for all release planning records
pub struct Database {
    path: PathBuf,
    conn: Mutex<Connection>,
}

impl Database {
    /// Opens (or creates) the database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        // Create parent directories if needed
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(&path)?;

        // Enable WAL mode for better concurrent access; cascades need
        // foreign key enforcement switched on per connection.
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;

        let db = Self {
            path,
            conn: Mutex::new(conn),
        };

        db.init_schema()?;
        Ok(db)
    }

    /// Returns the path to the database file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Initialize the database schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().unwrap();

        let current_version: i32 = conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);

        if current_version == 0 {
            conn.execute_batch(include_str!("schema.sql"))?;
        } else if current_version > SCHEMA_VERSION {
            return Err(Error::SchemaVersion {
                found: current_version,
                supported: SCHEMA_VERSION,
            });
        }

        Ok(())
    }

    /// Returns record counts for every table
    pub fn stats(&self) -> Result<DatabaseStats> {
        let conn = self.conn.lock().unwrap();
        let count = |sql: &str| -> Result<i64> {
            Ok(conn.query_row(sql, [], |row| row.get(0))?)
        };
        Ok(DatabaseStats {
            product_count: count("SELECT COUNT(*) FROM product")?,
            release_count: count("SELECT COUNT(*) FROM \"release\"")?,
            item_count: count("SELECT COUNT(*) FROM release_item")?,
            merge_request_count: count("SELECT COUNT(*) FROM merge_request")?,
        })
    }

    // =========================================================================
    // Product CRUD
    // =========================================================================

    /// Creates a product after validating required fields and uniqueness
    pub fn create_product(&self, draft: &ProductDraft) -> Result<Product> {
        let (name, code) = validate_product(draft)?;
        let conn = self.conn.lock().unwrap();
        ensure_product_unique(&conn, &name, &code, None)?;

        conn.execute(
            "INSERT INTO product (name, code, description, active) VALUES (?1, ?2, ?3, ?4)",
            params![name, code, draft.description, draft.active],
        )?;
        let id = conn.last_insert_rowid();

        Ok(Product {
            id,
            name,
            code,
            description: draft.description.clone(),
            active: draft.active,
        })
    }

    /// Gets a product by id
    pub fn get_product(&self, id: i64) -> Result<Product> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, name, code, description, active FROM product WHERE id = ?1",
            [id],
            product_from_row,
        )
        .optional()?
        .ok_or(Error::NotFound {
            entity: "product",
            id,
        })
    }

    /// Lists products, optionally restricted by a case-insensitive
    /// substring search over name or code. Active products come first,
    /// then alphabetical by name.
    pub fn list_products(&self, search: Option<&str>) -> Result<Vec<Product>> {
        let conn = self.conn.lock().unwrap();
        let term = search.map(str::trim).filter(|s| !s.is_empty());

        let mut stmt = conn.prepare(
            "SELECT id, name, code, description, active FROM product
             WHERE ?1 IS NULL
                OR instr(lower(name), lower(?1)) > 0
                OR instr(lower(code), lower(?1)) > 0
             ORDER BY active DESC, lower(name) ASC",
        )?;
        let rows = stmt.query_map([term], product_from_row)?;

        let mut products = Vec::new();
        for row in rows {
            products.push(row?);
        }
        Ok(products)
    }

    /// Lists only active products, alphabetical by name. This is the
    /// set offered when tagging an item with a product.
    pub fn list_active_products(&self) -> Result<Vec<Product>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, name, code, description, active FROM product
             WHERE active = 1 ORDER BY lower(name) ASC",
        )?;
        let rows = stmt.query_map([], product_from_row)?;

        let mut products = Vec::new();
        for row in rows {
            products.push(row?);
        }
        Ok(products)
    }

    /// Updates a product, re-checking uniqueness while excluding itself
    pub fn update_product(&self, id: i64, draft: &ProductDraft) -> Result<Product> {
        let (name, code) = validate_product(draft)?;
        let conn = self.conn.lock().unwrap();
        ensure_product_unique(&conn, &name, &code, Some(id))?;

        let changed = conn.execute(
            "UPDATE product SET name = ?1, code = ?2, description = ?3, active = ?4 WHERE id = ?5",
            params![name, code, draft.description, draft.active, id],
        )?;
        if changed == 0 {
            return Err(Error::NotFound {
                entity: "product",
                id,
            });
        }

        Ok(Product {
            id,
            name,
            code,
            description: draft.description.clone(),
            active: draft.active,
        })
    }

    /// Deletes a product; its items (and their merge requests) cascade away
    pub fn delete_product(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute("DELETE FROM product WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(Error::NotFound {
                entity: "product",
                id,
            });
        }
        Ok(())
    }

    // =========================================================================
    // Release CRUD
    // =========================================================================

    /// Creates a release
    pub fn create_release(&self, draft: &ReleaseDraft) -> Result<Release> {
        let title = validate_title(&draft.title)?;
        let conn = self.conn.lock().unwrap();

        conn.execute(
            "INSERT INTO \"release\" (release_date, title, notes) VALUES (?1, ?2, ?3)",
            params![date_to_sql(draft.release_date), title, draft.notes],
        )?;
        let id = conn.last_insert_rowid();

        Ok(Release {
            id,
            release_date: draft.release_date,
            title,
            notes: draft.notes.clone(),
        })
    }

    /// Gets a release by id
    pub fn get_release(&self, id: i64) -> Result<Release> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, release_date, title, notes FROM \"release\" WHERE id = ?1",
            [id],
            release_from_row,
        )
        .optional()?
        .ok_or(Error::NotFound {
            entity: "release",
            id,
        })
    }

    /// Lists releases within the (optional, inclusive) date range,
    /// newest first, each with an item count honoring the product
    /// selector.
    pub fn list_releases(&self, query: &ReleaseQuery) -> Result<Vec<ReleaseSummary>> {
        let conn = self.conn.lock().unwrap();
        let start = query.start.map(date_to_sql);
        let end = query.end.map(date_to_sql);

        let mut stmt = conn.prepare(
            "SELECT id, release_date, title, notes FROM \"release\"
             WHERE (?1 IS NULL OR release_date >= ?1)
               AND (?2 IS NULL OR release_date <= ?2)
             ORDER BY release_date DESC, id DESC",
        )?;
        let rows = stmt.query_map(params![start, end], release_from_row)?;

        let mut summaries = Vec::new();
        for row in rows {
            let release = row?;
            let item_count = count_items(&conn, release.id, query.product)?;
            summaries.push(ReleaseSummary {
                release,
                item_count,
            });
        }
        Ok(summaries)
    }

    /// Returns the next 5 upcoming and the 5 most recent past releases
    pub fn overview(&self, today: NaiveDate) -> Result<Overview> {
        let conn = self.conn.lock().unwrap();
        let today = date_to_sql(today);

        let collect = |sql: &str| -> Result<Vec<ReleaseSummary>> {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt.query_map([&today], release_from_row)?;
            let mut summaries = Vec::new();
            for row in rows {
                let release = row?;
                let item_count = count_items(&conn, release.id, ProductSelector::All)?;
                summaries.push(ReleaseSummary {
                    release,
                    item_count,
                });
            }
            Ok(summaries)
        };

        let upcoming = collect(
            "SELECT id, release_date, title, notes FROM \"release\"
             WHERE release_date >= ?1 ORDER BY release_date ASC, id ASC LIMIT 5",
        )?;
        let recent = collect(
            "SELECT id, release_date, title, notes FROM \"release\"
             WHERE release_date < ?1 ORDER BY release_date DESC, id DESC LIMIT 5",
        )?;

        Ok(Overview { upcoming, recent })
    }

    /// Updates a release in place
    pub fn update_release(&self, id: i64, draft: &ReleaseDraft) -> Result<Release> {
        let title = validate_title(&draft.title)?;
        let conn = self.conn.lock().unwrap();

        let changed = conn.execute(
            "UPDATE \"release\" SET release_date = ?1, title = ?2, notes = ?3 WHERE id = ?4",
            params![date_to_sql(draft.release_date), title, draft.notes, id],
        )?;
        if changed == 0 {
            return Err(Error::NotFound {
                entity: "release",
                id,
            });
        }

        Ok(Release {
            id,
            release_date: draft.release_date,
            title,
            notes: draft.notes.clone(),
        })
    }

    /// Deletes a release; its items and their merge requests cascade away
    pub fn delete_release(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute("DELETE FROM \"release\" WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(Error::NotFound {
                entity: "release",
                id,
            });
        }
        Ok(())
    }

    // =========================================================================
    // Release item CRUD
    // =========================================================================

    /// Creates an item under a release, together with its merge
    /// requests parsed from `mr_text` (one URL per line, blank lines
    /// skipped). Runs in a single transaction.
    pub fn create_item(
        &self,
        release_id: i64,
        draft: &ItemDraft,
        mr_text: &str,
    ) -> Result<ReleaseItem> {
        let title = validate_title(&draft.title)?;
        let clickup_url = normalize_url(draft.clickup_url.as_deref());

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let release_exists: bool = tx
            .query_row(
                "SELECT 1 FROM \"release\" WHERE id = ?1",
                [release_id],
                |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false);
        if !release_exists {
            return Err(Error::NotFound {
                entity: "release",
                id: release_id,
            });
        }

        tx.execute(
            "INSERT INTO release_item (release_id, product_id, title, description, clickup_url, status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                release_id,
                draft.product_id,
                title,
                draft.description,
                clickup_url,
                draft.status.as_str(),
            ],
        )?;
        let id = tx.last_insert_rowid();

        insert_merge_requests(&tx, id, mr_text)?;
        tx.commit()?;

        Ok(ReleaseItem {
            id,
            release_id,
            product_id: draft.product_id,
            title,
            description: draft.description.clone(),
            clickup_url,
            status: draft.status,
        })
    }

    /// Gets an item by id
    pub fn get_item(&self, id: i64) -> Result<ReleaseItem> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT id, release_id, product_id, title, description, clickup_url, status
             FROM release_item WHERE id = ?1",
            [id],
            item_from_row,
        )
        .optional()?
        .ok_or(Error::NotFound { entity: "item", id })
    }

    /// Lists a release's items in insertion order
    pub fn list_items(&self, release_id: i64) -> Result<Vec<ReleaseItem>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, release_id, product_id, title, description, clickup_url, status
             FROM release_item WHERE release_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([release_id], item_from_row)?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }

    /// Updates an item and replaces its entire merge-request set with
    /// the one parsed from `mr_text`. Full-replace semantics, not a
    /// diff. Runs in a single transaction.
    pub fn update_item(&self, id: i64, draft: &ItemDraft, mr_text: &str) -> Result<ReleaseItem> {
        let title = validate_title(&draft.title)?;
        let clickup_url = normalize_url(draft.clickup_url.as_deref());

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;

        let release_id: i64 = tx
            .query_row(
                "SELECT release_id FROM release_item WHERE id = ?1",
                [id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(Error::NotFound { entity: "item", id })?;

        tx.execute(
            "UPDATE release_item
             SET product_id = ?1, title = ?2, description = ?3, clickup_url = ?4, status = ?5
             WHERE id = ?6",
            params![
                draft.product_id,
                title,
                draft.description,
                clickup_url,
                draft.status.as_str(),
                id,
            ],
        )?;

        tx.execute("DELETE FROM merge_request WHERE item_id = ?1", [id])?;
        insert_merge_requests(&tx, id, mr_text)?;
        tx.commit()?;

        Ok(ReleaseItem {
            id,
            release_id,
            product_id: draft.product_id,
            title,
            description: draft.description.clone(),
            clickup_url,
            status: draft.status,
        })
    }

    /// Deletes an item; its merge requests cascade away
    pub fn delete_item(&self, id: i64) -> Result<()> {
        let conn = self.conn.lock().unwrap();
        let changed = conn.execute("DELETE FROM release_item WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(Error::NotFound { entity: "item", id });
        }
        Ok(())
    }

    /// Lists an item's merge requests in insertion order
    pub fn list_merge_requests(&self, item_id: i64) -> Result<Vec<MergeRequest>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, item_id, url, repo, iid FROM merge_request
             WHERE item_id = ?1 ORDER BY id ASC",
        )?;
        let rows = stmt.query_map([item_id], mr_from_row)?;

        let mut mrs = Vec::new();
        for row in rows {
            mrs.push(row?);
        }
        Ok(mrs)
    }
}

// =============================================================================
// Validation helpers
// =============================================================================

fn validate_title(title: &str) -> Result<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(Error::MissingField("title"));
    }
    Ok(title.to_string())
}

fn validate_product(draft: &ProductDraft) -> Result<(String, String)> {
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(Error::MissingField("name"));
    }
    let code = draft.code.trim();
    if code.is_empty() {
        return Err(Error::MissingField("code"));
    }
    Ok((name.to_string(), code.to_string()))
}

/// Checks case-insensitive uniqueness of a product's name and code,
/// excluding the product itself on update.
fn ensure_product_unique(
    conn: &Connection,
    name: &str,
    code: &str,
    exclude_id: Option<i64>,
) -> Result<()> {
    let exclude = exclude_id.unwrap_or(-1);

    let name_taken: bool = conn
        .query_row(
            "SELECT 1 FROM product WHERE lower(name) = lower(?1) AND id <> ?2",
            params![name, exclude],
            |_| Ok(true),
        )
        .optional()?
        .unwrap_or(false);
    if name_taken {
        return Err(Error::DuplicateName(name.to_string()));
    }

    let code_taken: bool = conn
        .query_row(
            "SELECT 1 FROM product WHERE lower(code) = lower(?1) AND id <> ?2",
            params![code, exclude],
            |_| Ok(true),
        )
        .optional()?
        .unwrap_or(false);
    if code_taken {
        return Err(Error::DuplicateCode(code.to_string()));
    }

    Ok(())
}

/// Counts a release's items under the given product selector
fn count_items(conn: &Connection, release_id: i64, selector: ProductSelector) -> Result<i64> {
    let count = match selector {
        ProductSelector::All => conn.query_row(
            "SELECT COUNT(*) FROM release_item WHERE release_id = ?1",
            [release_id],
            |row| row.get(0),
        )?,
        ProductSelector::Unassigned => conn.query_row(
            "SELECT COUNT(*) FROM release_item WHERE release_id = ?1 AND product_id IS NULL",
            [release_id],
            |row| row.get(0),
        )?,
        ProductSelector::Product(product_id) => conn.query_row(
            "SELECT COUNT(*) FROM release_item WHERE release_id = ?1 AND product_id = ?2",
            params![release_id, product_id],
            |row| row.get(0),
        )?,
    };
    Ok(count)
}

/// Inserts one merge request per non-blank line of `mr_text`, with
/// repo/iid inferred when the URL is a recognized GitLab link.
fn insert_merge_requests(conn: &Connection, item_id: i64, mr_text: &str) -> Result<()> {
    for line in mr_text.lines() {
        let Some(url) = normalize_url(Some(line)) else {
            continue;
        };
        let mr_ref = extract_mr_ref(&url);
        conn.execute(
            "INSERT INTO merge_request (item_id, url, repo, iid) VALUES (?1, ?2, ?3, ?4)",
            params![item_id, url, mr_ref.repo, mr_ref.iid],
        )?;
    }
    Ok(())
}

// =============================================================================
// Row mapping
// =============================================================================

fn date_to_sql(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn date_from_sql(idx: usize, raw: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn status_from_sql(idx: usize, raw: &str) -> rusqlite::Result<ItemStatus> {
    raw.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        name: row.get(1)?,
        code: row.get(2)?,
        description: row.get(3)?,
        active: row.get(4)?,
    })
}

fn release_from_row(row: &Row<'_>) -> rusqlite::Result<Release> {
    let raw_date: String = row.get(1)?;
    Ok(Release {
        id: row.get(0)?,
        release_date: date_from_sql(1, &raw_date)?,
        title: row.get(2)?,
        notes: row.get(3)?,
    })
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<ReleaseItem> {
    let raw_status: String = row.get(6)?;
    Ok(ReleaseItem {
        id: row.get(0)?,
        release_id: row.get(1)?,
        product_id: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        clickup_url: row.get(5)?,
        status: status_from_sql(6, &raw_status)?,
    })
}

fn mr_from_row(row: &Row<'_>) -> rusqlite::Result<MergeRequest> {
    Ok(MergeRequest {
        id: row.get(0)?,
        item_id: row.get(1)?,
        url: row.get(2)?,
        repo: row.get(3)?,
        iid: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    fn test_db() -> (NamedTempFile, Database) {
        let temp_file = NamedTempFile::with_suffix(".db").unwrap();
        let db = Database::open(temp_file.path()).unwrap();
        (temp_file, db)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn product_draft(name: &str, code: &str) -> ProductDraft {
        ProductDraft {
            name: name.to_string(),
            code: code.to_string(),
            description: None,
            active: true,
        }
    }

    fn release_draft(date: NaiveDate, title: &str) -> ReleaseDraft {
        ReleaseDraft {
            release_date: date,
            title: title.to_string(),
            notes: None,
        }
    }

    fn item_draft(title: &str, product_id: Option<i64>) -> ItemDraft {
        ItemDraft {
            product_id,
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_open_creates_empty_database() {
        let (_file, db) = test_db();
        let stats = db.stats().unwrap();
        assert_eq!(stats.product_count, 0);
        assert_eq!(stats.release_count, 0);
        assert_eq!(stats.item_count, 0);
        assert_eq!(stats.merge_request_count, 0);
    }

    #[test]
    fn test_reopen_keeps_data() {
        let temp_file = NamedTempFile::with_suffix(".db").unwrap();
        {
            let db = Database::open(temp_file.path()).unwrap();
            db.create_product(&product_draft("Alpha", "ALP")).unwrap();
        }
        let db = Database::open(temp_file.path()).unwrap();
        assert_eq!(db.stats().unwrap().product_count, 1);
    }

    #[test]
    fn test_product_name_unique_case_insensitive() {
        let (_file, db) = test_db();
        db.create_product(&product_draft("Alpha", "ALP")).unwrap();

        let err = db.create_product(&product_draft("alpha", "OTHER")).unwrap_err();
        assert!(matches!(err, Error::DuplicateName(_)));

        let err = db.create_product(&product_draft("Beta", "alp")).unwrap_err();
        assert!(matches!(err, Error::DuplicateCode(_)));

        // No partial state was persisted
        assert_eq!(db.stats().unwrap().product_count, 1);
    }

    #[test]
    fn test_product_update_excludes_itself_from_uniqueness() {
        let (_file, db) = test_db();
        let p = db.create_product(&product_draft("Alpha", "ALP")).unwrap();
        db.create_product(&product_draft("Beta", "BET")).unwrap();

        // Keeping its own name is fine
        let updated = db
            .update_product(p.id, &product_draft("Alpha", "ALP"))
            .unwrap();
        assert_eq!(updated.name, "Alpha");

        // Taking the other product's name is not
        let err = db
            .update_product(p.id, &product_draft("beta", "ALP"))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateName(_)));
    }

    #[test]
    fn test_product_requires_name_and_code() {
        let (_file, db) = test_db();
        assert!(matches!(
            db.create_product(&product_draft("", "ALP")),
            Err(Error::MissingField("name"))
        ));
        assert!(matches!(
            db.create_product(&product_draft("Alpha", "  ")),
            Err(Error::MissingField("code"))
        ));
    }

    #[test]
    fn test_product_listing_orders_active_first_then_name() {
        let (_file, db) = test_db();
        let mut inactive = product_draft("Aardvark", "AARD");
        inactive.active = false;
        db.create_product(&inactive).unwrap();
        db.create_product(&product_draft("zebra", "ZEB")).unwrap();
        db.create_product(&product_draft("Mango", "MAN")).unwrap();

        let names: Vec<String> = db
            .list_products(None)
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Mango", "zebra", "Aardvark"]);
    }

    #[test]
    fn test_product_search_matches_name_or_code() {
        let (_file, db) = test_db();
        db.create_product(&product_draft("Payments", "PAY")).unwrap();
        db.create_product(&product_draft("Portal", "WEB")).unwrap();

        let hits = db.list_products(Some("pay")).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Payments");

        let hits = db.list_products(Some("WEB")).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Portal");

        // Blank search means no restriction
        let hits = db.list_products(Some("  ")).unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[test]
    fn test_release_listing_date_range_and_order() {
        let (_file, db) = test_db();
        db.create_release(&release_draft(date(2024, 1, 10), "January")).unwrap();
        db.create_release(&release_draft(date(2024, 2, 10), "February")).unwrap();
        db.create_release(&release_draft(date(2024, 3, 10), "March")).unwrap();

        // No bounds: everything, newest first
        let all = db.list_releases(&ReleaseQuery::default()).unwrap();
        let titles: Vec<&str> = all.iter().map(|s| s.release.title.as_str()).collect();
        assert_eq!(titles, vec!["March", "February", "January"]);

        // Inclusive bounds
        let query = ReleaseQuery {
            start: Some(date(2024, 2, 10)),
            end: Some(date(2024, 3, 10)),
            product: ProductSelector::All,
        };
        let ranged = db.list_releases(&query).unwrap();
        let titles: Vec<&str> = ranged.iter().map(|s| s.release.title.as_str()).collect();
        assert_eq!(titles, vec!["March", "February"]);

        // Single bound
        let query = ReleaseQuery {
            end: Some(date(2024, 1, 31)),
            ..Default::default()
        };
        let ranged = db.list_releases(&query).unwrap();
        assert_eq!(ranged.len(), 1);
        assert_eq!(ranged[0].release.title, "January");
    }

    #[test]
    fn test_release_query_keeps_valid_bound_when_other_is_invalid() {
        let (_file, db) = test_db();
        db.create_release(&release_draft(date(2024, 1, 10), "January")).unwrap();
        db.create_release(&release_draft(date(2024, 3, 10), "March")).unwrap();

        // An impossible start date is reported but does not block the
        // listing; the valid end bound still applies.
        let (query, errors) =
            ReleaseQuery::from_bounds(Some("31/02/2024"), Some("31/01/2024"), ProductSelector::All);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], Error::InvalidDate(_)));
        assert_eq!(query.start, None);
        assert_eq!(query.end, Some(date(2024, 1, 31)));

        let listed = db.list_releases(&query).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].release.title, "January");

        // Both bounds valid parse cleanly
        let (query, errors) =
            ReleaseQuery::from_bounds(Some("01/01/2024"), None, ProductSelector::All);
        assert!(errors.is_empty());
        assert_eq!(query.start, Some(date(2024, 1, 1)));
    }

    #[test]
    fn test_release_counts_honor_product_selector() {
        let (_file, db) = test_db();
        let p = db.create_product(&product_draft("Payments", "PAY")).unwrap();
        let r = db.create_release(&release_draft(date(2024, 5, 1), "May")).unwrap();
        db.create_item(r.id, &item_draft("Tagged", Some(p.id)), "").unwrap();
        db.create_item(r.id, &item_draft("Untagged", None), "").unwrap();

        let count_with = |product| {
            let query = ReleaseQuery {
                product,
                ..Default::default()
            };
            db.list_releases(&query).unwrap()[0].item_count
        };

        assert_eq!(count_with(ProductSelector::All), 2);
        assert_eq!(count_with(ProductSelector::Unassigned), 1);
        assert_eq!(count_with(ProductSelector::Product(p.id)), 1);
        assert_eq!(count_with(ProductSelector::Product(p.id + 99)), 0);
    }

    #[test]
    fn test_release_requires_title() {
        let (_file, db) = test_db();
        assert!(matches!(
            db.create_release(&release_draft(date(2024, 1, 1), "  ")),
            Err(Error::MissingField("title"))
        ));
    }

    #[test]
    fn test_item_creation_normalizes_clickup_url_and_mrs() {
        let (_file, db) = test_db();
        let r = db.create_release(&release_draft(date(2024, 5, 1), "May")).unwrap();

        let draft = ItemDraft {
            title: "Work".to_string(),
            clickup_url: Some("  app.clickup.com/t/abc  ".to_string()),
            ..Default::default()
        };
        let mr_text = "\
https://gitlab.com/group/proj/-/merge_requests/42

example.com/mr/7
";
        let item = db.create_item(r.id, &draft, mr_text).unwrap();
        assert_eq!(
            item.clickup_url.as_deref(),
            Some("https://app.clickup.com/t/abc")
        );

        let mrs = db.list_merge_requests(item.id).unwrap();
        assert_eq!(mrs.len(), 2);

        assert_eq!(mrs[0].url, "https://gitlab.com/group/proj/-/merge_requests/42");
        assert_eq!(mrs[0].repo.as_deref(), Some("group/proj"));
        assert_eq!(mrs[0].iid.as_deref(), Some("!42"));

        assert_eq!(mrs[1].url, "https://example.com/mr/7");
        assert_eq!(mrs[1].repo, None);
        assert_eq!(mrs[1].iid, None);
    }

    #[test]
    fn test_item_update_replaces_merge_request_set() {
        let (_file, db) = test_db();
        let r = db.create_release(&release_draft(date(2024, 5, 1), "May")).unwrap();
        let item = db
            .create_item(
                r.id,
                &item_draft("Work", None),
                "https://example.com/a\nhttps://example.com/b",
            )
            .unwrap();
        assert_eq!(db.list_merge_requests(item.id).unwrap().len(), 2);

        db.update_item(item.id, &item_draft("Work", None), "https://example.com/c")
            .unwrap();

        let mrs = db.list_merge_requests(item.id).unwrap();
        assert_eq!(mrs.len(), 1);
        assert_eq!(mrs[0].url, "https://example.com/c");
    }

    #[test]
    fn test_delete_release_cascades_to_items_and_mrs() {
        let (_file, db) = test_db();
        let r = db.create_release(&release_draft(date(2024, 5, 1), "May")).unwrap();
        for i in 0..3 {
            db.create_item(
                r.id,
                &item_draft(&format!("Item {i}"), None),
                "https://example.com/mr",
            )
            .unwrap();
        }
        let before = db.stats().unwrap();
        assert_eq!(before.item_count, 3);
        assert_eq!(before.merge_request_count, 3);

        db.delete_release(r.id).unwrap();

        let after = db.stats().unwrap();
        assert_eq!(after.release_count, 0);
        assert_eq!(after.item_count, 0);
        assert_eq!(after.merge_request_count, 0);
    }

    #[test]
    fn test_delete_product_cascades_to_its_items_only() {
        let (_file, db) = test_db();
        let p = db.create_product(&product_draft("Payments", "PAY")).unwrap();
        let r = db.create_release(&release_draft(date(2024, 5, 1), "May")).unwrap();
        db.create_item(r.id, &item_draft("Tagged", Some(p.id)), "https://example.com/a")
            .unwrap();
        let untagged = db.create_item(r.id, &item_draft("Untagged", None), "").unwrap();

        db.delete_product(p.id).unwrap();

        let remaining = db.list_items(r.id).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, untagged.id);
        assert_eq!(db.stats().unwrap().merge_request_count, 0);
    }

    #[test]
    fn test_delete_item_cascades_to_mrs() {
        let (_file, db) = test_db();
        let r = db.create_release(&release_draft(date(2024, 5, 1), "May")).unwrap();
        let item = db
            .create_item(r.id, &item_draft("Work", None), "https://example.com/a")
            .unwrap();

        db.delete_item(item.id).unwrap();
        assert_eq!(db.stats().unwrap().merge_request_count, 0);
    }

    #[test]
    fn test_not_found_errors() {
        let (_file, db) = test_db();
        assert!(matches!(
            db.get_product(99),
            Err(Error::NotFound { entity: "product", .. })
        ));
        assert!(matches!(
            db.get_release(99),
            Err(Error::NotFound { entity: "release", .. })
        ));
        assert!(matches!(
            db.get_item(99),
            Err(Error::NotFound { entity: "item", .. })
        ));
        assert!(matches!(
            db.delete_release(99),
            Err(Error::NotFound { entity: "release", .. })
        ));
        assert!(matches!(
            db.create_item(99, &item_draft("Work", None), ""),
            Err(Error::NotFound { entity: "release", .. })
        ));
    }

    #[test]
    fn test_item_status_round_trips_through_storage() {
        let (_file, db) = test_db();
        let r = db.create_release(&release_draft(date(2024, 5, 1), "May")).unwrap();
        let draft = ItemDraft {
            title: "Work".to_string(),
            status: ItemStatus::InProgress,
            ..Default::default()
        };
        let item = db.create_item(r.id, &draft, "").unwrap();

        let loaded = db.get_item(item.id).unwrap();
        assert_eq!(loaded.status, ItemStatus::InProgress);
    }

    #[test]
    fn test_overview_splits_on_today() {
        let (_file, db) = test_db();
        for (d, title) in [
            (date(2024, 4, 1), "Past A"),
            (date(2024, 4, 20), "Past B"),
            (date(2024, 5, 1), "Today"),
            (date(2024, 6, 1), "Future"),
        ] {
            db.create_release(&release_draft(d, title)).unwrap();
        }

        let overview = db.overview(date(2024, 5, 1)).unwrap();
        let upcoming: Vec<&str> = overview
            .upcoming
            .iter()
            .map(|s| s.release.title.as_str())
            .collect();
        let recent: Vec<&str> = overview
            .recent
            .iter()
            .map(|s| s.release.title.as_str())
            .collect();

        assert_eq!(upcoming, vec!["Today", "Future"]);
        assert_eq!(recent, vec!["Past B", "Past A"]);
    }
}
