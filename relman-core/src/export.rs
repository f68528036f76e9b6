//! JSON export of a release with its items and merge requests

use serde::Serialize;

use crate::db::Database;
use crate::error::Result;
use crate::models::{MergeRequest, Release, ReleaseItem};

/// One release item together with its merge requests
#[derive(Debug, Serialize)]
pub struct ItemExport {
    #[serde(flatten)]
    pub item: ReleaseItem,
    pub merge_requests: Vec<MergeRequest>,
}

/// A full release snapshot suitable for serialization
#[derive(Debug, Serialize)]
pub struct ReleaseExport {
    #[serde(flatten)]
    pub release: Release,
    pub items: Vec<ItemExport>,
}

/// Collects a release, its items and their merge requests
pub fn collect_release(db: &Database, release_id: i64) -> Result<ReleaseExport> {
    let release = db.get_release(release_id)?;

    let mut items = Vec::new();
    for item in db.list_items(release_id)? {
        let merge_requests = db.list_merge_requests(item.id)?;
        items.push(ItemExport {
            item,
            merge_requests,
        });
    }

    Ok(ReleaseExport { release, items })
}

/// Renders a release as pretty-printed JSON
pub fn release_to_json(db: &Database, release_id: i64) -> Result<String> {
    let export = collect_release(db, release_id)?;
    Ok(serde_json::to_string_pretty(&export)?)
}
