use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about = "Release planning record keeper")]
pub struct Cli {
    /// Path to the SQLite database file
    #[clap(long)]
    pub db: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the next and most recent releases
    Overview,

    /// Manage products
    #[clap(subcommand)]
    Product(ProductCommand),

    /// Manage releases
    #[clap(subcommand)]
    Release(ReleaseCommand),

    /// Manage release items
    #[clap(subcommand)]
    Item(ItemCommand),

    /// Export a release with its items and merge requests as JSON
    Export {
        /// Release id
        release: i64,

        /// Write to this file instead of stdout
        #[clap(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProductCommand {
    /// List products, active first
    List {
        /// Case-insensitive substring matched against name or code
        #[clap(long, short = 'q')]
        search: Option<String>,

        /// Only the active products (the set offered when tagging items)
        #[clap(long, conflicts_with = "search")]
        active: bool,
    },

    /// Add a new product
    Add {
        /// Product name (unique, case-insensitive)
        name: String,

        /// Short product code (unique, case-insensitive)
        code: String,

        /// Free-text description
        #[clap(long)]
        description: Option<String>,

        /// Create the product as inactive
        #[clap(long)]
        inactive: bool,
    },

    /// Edit an existing product; omitted fields keep their value
    Edit {
        /// Product id
        id: i64,

        /// New name
        #[clap(long)]
        name: Option<String>,

        /// New code
        #[clap(long)]
        code: Option<String>,

        /// New description (empty string clears it)
        #[clap(long)]
        description: Option<String>,

        /// New active state
        #[clap(long)]
        active: Option<bool>,
    },

    /// Delete a product and the release items tagged with it
    Del {
        /// Product id
        id: i64,

        /// Skip the confirmation check
        #[clap(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ReleaseCommand {
    /// List releases, newest first
    List {
        /// Inclusive start date (DD/MM/YYYY)
        #[clap(long)]
        start: Option<String>,

        /// Inclusive end date (DD/MM/YYYY)
        #[clap(long)]
        end: Option<String>,

        /// Count only items for this product id (0 = unassigned)
        #[clap(long)]
        product: Option<i64>,
    },

    /// Add a new release
    Add {
        /// Release date (DD/MM/YYYY)
        date: String,

        /// Release title
        title: String,

        /// Free-text notes
        #[clap(long)]
        notes: Option<String>,
    },

    /// Show one release and its items
    Show {
        /// Release id
        id: i64,

        /// Case-insensitive text matched against item title or product name
        #[clap(long, short = 'q')]
        search: Option<String>,

        /// Keep only these statuses (repeatable)
        #[clap(long)]
        status: Vec<String>,

        /// Keep only items for this product id (0 = unassigned)
        #[clap(long)]
        product: Option<i64>,
    },

    /// Edit an existing release; omitted fields keep their value
    Edit {
        /// Release id
        id: i64,

        /// New release date (DD/MM/YYYY)
        #[clap(long)]
        date: Option<String>,

        /// New title
        #[clap(long)]
        title: Option<String>,

        /// New notes (empty string clears them)
        #[clap(long)]
        notes: Option<String>,
    },

    /// Delete a release and everything it contains
    Del {
        /// Release id
        id: i64,

        /// Skip the confirmation check
        #[clap(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ItemCommand {
    /// Add an item to a release
    Add {
        /// Owning release id
        release: i64,

        /// Item title
        title: String,

        /// Product id to tag the item with
        #[clap(long)]
        product: Option<i64>,

        /// Free-text description
        #[clap(long)]
        description: Option<String>,

        /// Link to the tracking card (scheme added if missing)
        #[clap(long)]
        clickup: Option<String>,

        /// Status: planned, in-progress, delivered or cancelled
        #[clap(long)]
        status: Option<String>,

        /// Merge-request URL (repeatable)
        #[clap(long = "mr")]
        mrs: Vec<String>,
    },

    /// Show one item and its merge requests
    Show {
        /// Item id
        id: i64,
    },

    /// Edit an item; omitted fields keep their value. Passing any
    /// --mr replaces the whole merge-request set.
    Edit {
        /// Item id
        id: i64,

        /// New title
        #[clap(long)]
        title: Option<String>,

        /// New product id
        #[clap(long)]
        product: Option<i64>,

        /// Remove the product tag
        #[clap(long, conflicts_with = "product")]
        no_product: bool,

        /// New description (empty string clears it)
        #[clap(long)]
        description: Option<String>,

        /// New tracking-card link (empty string clears it)
        #[clap(long)]
        clickup: Option<String>,

        /// New status
        #[clap(long)]
        status: Option<String>,

        /// Replacement merge-request URL (repeatable)
        #[clap(long = "mr")]
        mrs: Vec<String>,

        /// Remove all merge requests
        #[clap(long, conflicts_with = "mrs")]
        clear_mrs: bool,
    },

    /// Delete an item and its merge requests
    Del {
        /// Item id
        id: i64,

        /// Skip the confirmation check
        #[clap(long, short = 'y')]
        yes: bool,
    },
}
