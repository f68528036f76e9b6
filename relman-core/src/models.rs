use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Represents the delivery status of a release item
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum ItemStatus {
    #[default]
    Planned,
    InProgress,
    Delivered,
    Cancelled,
}

impl ItemStatus {
    /// All statuses, in display order
    pub const ALL: [ItemStatus; 4] = [
        ItemStatus::Planned,
        ItemStatus::InProgress,
        ItemStatus::Delivered,
        ItemStatus::Cancelled,
    ];

    /// Canonical string form, also used for storage
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Planned => "Planned",
            ItemStatus::InProgress => "In Progress",
            ItemStatus::Delivered => "Delivered",
            ItemStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ItemStatus {
    type Err = Error;

    /// Parses a status at the boundary; unknown strings are rejected,
    /// never defaulted.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "planned" => Ok(ItemStatus::Planned),
            "in progress" | "in-progress" | "inprogress" => Ok(ItemStatus::InProgress),
            "delivered" => Ok(ItemStatus::Delivered),
            "cancelled" | "canceled" => Ok(ItemStatus::Cancelled),
            _ => Err(Error::InvalidStatus(s.to_string())),
        }
    }
}

/// A purchasable/maintained system unit that release items can be tagged with
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Product {
    /// Database-assigned identifier
    pub id: i64,

    /// Display name, unique case-insensitively
    pub name: String,

    /// Short code, unique case-insensitively
    pub code: String,

    /// Optional free-text description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Inactive products are kept but no longer offered when tagging items
    pub active: bool,
}

/// Input for creating or updating a product
#[derive(Debug, Clone, Default)]
pub struct ProductDraft {
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub active: bool,
}

/// A planned, dated deployment event grouping work items
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Release {
    /// Database-assigned identifier
    pub id: i64,

    /// Planned calendar date; multiple releases may share a date
    pub release_date: NaiveDate,

    /// Short title for the release
    pub title: String,

    /// Optional free-text notes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Input for creating or updating a release
#[derive(Debug, Clone)]
pub struct ReleaseDraft {
    pub release_date: NaiveDate,
    pub title: String,
    pub notes: Option<String>,
}

/// One unit of work delivered within a release
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReleaseItem {
    /// Database-assigned identifier
    pub id: i64,

    /// Owning release
    pub release_id: i64,

    /// Optional product this work belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<i64>,

    /// Short title for the work item
    pub title: String,

    /// Optional free-text description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Optional link to the tracking card, normalized on input
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clickup_url: Option<String>,

    /// Delivery status
    pub status: ItemStatus,
}

/// Input for creating or updating a release item
///
/// `clickup_url` is taken raw and normalized by the storage layer.
#[derive(Debug, Clone, Default)]
pub struct ItemDraft {
    pub product_id: Option<i64>,
    pub title: String,
    pub description: Option<String>,
    pub clickup_url: Option<String>,
    pub status: ItemStatus,
}

/// A reference to an external code-review request, owned by one item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MergeRequest {
    /// Database-assigned identifier
    pub id: i64,

    /// Owning release item
    pub item_id: i64,

    /// Normalized link to the merge request
    pub url: String,

    /// Inferred `group/project` slug, when the URL is recognized
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,

    /// Inferred request number formatted as `!<number>`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iid: Option<String>,
}
