//! Pure, order-preserving filtering of a release's items
//!
//! The predicates mirror the toolbar on the release page: a free-text
//! search over item title and product name, a set of status toggles,
//! and a product dropdown with an "unassigned" sentinel.

use std::collections::{HashMap, HashSet};

use crate::models::{ItemStatus, Product, ReleaseItem};

/// Three-state product selection used by item filters and counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductSelector {
    /// No product restriction
    #[default]
    All,
    /// Only items with no associated product
    Unassigned,
    /// Only items tagged with this product
    Product(i64),
}

impl ProductSelector {
    /// Interprets a raw query value: absent means all, `0` is the
    /// unassigned sentinel, anything else is a product id.
    pub fn from_raw(raw: Option<i64>) -> Self {
        match raw {
            None => ProductSelector::All,
            Some(0) => ProductSelector::Unassigned,
            Some(id) => ProductSelector::Product(id),
        }
    }

    /// Whether an item with the given product reference passes
    pub fn matches(&self, product_id: Option<i64>) -> bool {
        match self {
            ProductSelector::All => true,
            ProductSelector::Unassigned => product_id.is_none(),
            ProductSelector::Product(id) => product_id == Some(*id),
        }
    }
}

/// Combined filter over a release's items; predicates AND together
#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    /// Case-insensitive text matched against item title and product name
    pub text: Option<String>,
    /// Statuses to keep; empty means all four
    pub statuses: HashSet<ItemStatus>,
    /// Product selection
    pub product: ProductSelector,
}

impl ItemFilter {
    /// Whether a single item passes all active predicates
    pub fn matches(&self, item: &ReleaseItem, product_name: Option<&str>) -> bool {
        if !self.product.matches(item.product_id) {
            return false;
        }

        if !self.statuses.is_empty() && !self.statuses.contains(&item.status) {
            return false;
        }

        if let Some(term) = &self.text {
            let term = term.trim().to_lowercase();
            if !term.is_empty() {
                let title_hit = item.title.to_lowercase().contains(&term);
                let product_hit = product_name
                    .map(|n| n.to_lowercase().contains(&term))
                    .unwrap_or(false);
                if !title_hit && !product_hit {
                    return false;
                }
            }
        }

        true
    }

    /// Applies the filter, preserving the input order
    pub fn apply<'a>(
        &self,
        items: &'a [ReleaseItem],
        products: &HashMap<i64, Product>,
    ) -> Vec<&'a ReleaseItem> {
        items
            .iter()
            .filter(|item| {
                let name = item
                    .product_id
                    .and_then(|id| products.get(&id))
                    .map(|p| p.name.as_str());
                self.matches(item, name)
            })
            .collect()
    }
}
