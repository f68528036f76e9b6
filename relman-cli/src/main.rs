mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::collections::{HashMap, HashSet};

use relman_core::{
    determine_db_path, format_date, parse_date, release_to_json, Database, ItemDraft, ItemFilter,
    ItemStatus, Product, ProductDraft, ProductSelector, Release, ReleaseDraft, ReleaseQuery,
    ReleaseSummary,
};

use crate::cli::{Cli, Command, ItemCommand, ProductCommand, ReleaseCommand};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let db_path = determine_db_path(cli.db.as_deref())?;
    let db = Database::open(&db_path)
        .with_context(|| format!("Failed to open database: {}", db_path.display()))?;

    match cli.command {
        Command::Overview => show_overview(&db)?,
        Command::Product(cmd) => handle_product_command(&db, cmd)?,
        Command::Release(cmd) => handle_release_command(&db, cmd)?,
        Command::Item(cmd) => handle_item_command(&db, cmd)?,
        Command::Export { release, output } => export_release(&db, release, output.as_deref())?,
    }

    Ok(())
}

/// Treats an empty or whitespace-only string as "clear this field"
fn blank_to_none(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

fn require_confirmation(yes: bool, what: &str) -> Result<()> {
    if !yes {
        anyhow::bail!("Deleting {what} cascades to its dependent records; pass --yes to confirm");
    }
    Ok(())
}

// =============================================================================
// Overview
// =============================================================================

fn show_overview(db: &Database) -> Result<()> {
    let today = chrono::Local::now().date_naive();
    let overview = db.overview(today)?;

    println!("{}", "Upcoming releases".bold());
    print_release_summaries(&overview.upcoming, "nothing planned");
    println!();
    println!("{}", "Recent releases".bold());
    print_release_summaries(&overview.recent, "no past releases");

    Ok(())
}

fn print_release_summaries(summaries: &[ReleaseSummary], empty_message: &str) {
    if summaries.is_empty() {
        println!("  {}", empty_message.dimmed());
        return;
    }
    for summary in summaries {
        let r = &summary.release;
        println!(
            "  [{}] {}  {}  ({} items)",
            r.id,
            format_date(Some(r.release_date)),
            r.title,
            summary.item_count
        );
    }
}

// =============================================================================
// Products
// =============================================================================

fn handle_product_command(db: &Database, cmd: ProductCommand) -> Result<()> {
    match cmd {
        ProductCommand::List { search, active } => {
            let products = if active {
                db.list_active_products()?
            } else {
                db.list_products(search.as_deref())?
            };
            if products.is_empty() {
                println!("{}", "No products found.".dimmed());
            }
            for p in products {
                print_product(&p);
            }
        }
        ProductCommand::Add {
            name,
            code,
            description,
            inactive,
        } => {
            let draft = ProductDraft {
                name,
                code,
                description: description.and_then(blank_to_none),
                active: !inactive,
            };
            let product = db.create_product(&draft)?;
            println!(
                "{} {} (id {})",
                "Product created:".green(),
                product.name,
                product.id
            );
        }
        ProductCommand::Edit {
            id,
            name,
            code,
            description,
            active,
        } => {
            let existing = db.get_product(id)?;
            let draft = ProductDraft {
                name: name.unwrap_or(existing.name),
                code: code.unwrap_or(existing.code),
                description: match description {
                    Some(d) => blank_to_none(d),
                    None => existing.description,
                },
                active: active.unwrap_or(existing.active),
            };
            let product = db.update_product(id, &draft)?;
            println!("{} {}", "Product updated:".green(), product.name);
        }
        ProductCommand::Del { id, yes } => {
            require_confirmation(yes, "a product")?;
            db.delete_product(id)?;
            println!("{}", "Product deleted.".green());
        }
    }
    Ok(())
}

fn print_product(p: &Product) {
    let state = if p.active {
        "active".green()
    } else {
        "inactive".dimmed()
    };
    println!("  [{}] {}  ({})  {}", p.id, p.name, p.code, state);
    if let Some(desc) = &p.description {
        println!("      {}", desc.dimmed());
    }
}

// =============================================================================
// Releases
// =============================================================================

fn handle_release_command(db: &Database, cmd: ReleaseCommand) -> Result<()> {
    match cmd {
        ReleaseCommand::List {
            start,
            end,
            product,
        } => list_releases(db, start.as_deref(), end.as_deref(), product)?,
        ReleaseCommand::Add { date, title, notes } => {
            let draft = ReleaseDraft {
                release_date: parse_date(&date)?,
                title,
                notes: notes.and_then(blank_to_none),
            };
            let release = db.create_release(&draft)?;
            println!(
                "{} {} (id {})",
                "Release created:".green(),
                release.title,
                release.id
            );
        }
        ReleaseCommand::Show {
            id,
            search,
            status,
            product,
        } => show_release(db, id, search, &status, product)?,
        ReleaseCommand::Edit {
            id,
            date,
            title,
            notes,
        } => {
            let existing = db.get_release(id)?;
            let draft = ReleaseDraft {
                release_date: match date {
                    Some(d) => parse_date(&d)?,
                    None => existing.release_date,
                },
                title: title.unwrap_or(existing.title),
                notes: match notes {
                    Some(n) => blank_to_none(n),
                    None => existing.notes,
                },
            };
            let release = db.update_release(id, &draft)?;
            println!("{} {}", "Release updated:".green(), release.title);
        }
        ReleaseCommand::Del { id, yes } => {
            require_confirmation(yes, "a release")?;
            db.delete_release(id)?;
            println!("{}", "Release deleted.".green());
        }
    }
    Ok(())
}

/// Lists releases. Each date bound is validated on its own: an invalid
/// bound is reported and the listing proceeds with the valid one(s).
fn list_releases(
    db: &Database,
    start: Option<&str>,
    end: Option<&str>,
    product: Option<i64>,
) -> Result<()> {
    let (query, errors) = ReleaseQuery::from_bounds(start, end, ProductSelector::from_raw(product));
    for e in errors {
        eprintln!("{} {}", "Invalid date bound:".red(), e);
    }

    let summaries = db.list_releases(&query)?;
    print_release_summaries(&summaries, "no releases found");
    Ok(())
}

fn show_release(
    db: &Database,
    id: i64,
    search: Option<String>,
    status_args: &[String],
    product: Option<i64>,
) -> Result<()> {
    let release = db.get_release(id)?;
    print_release_header(&release);

    let mut statuses = HashSet::new();
    for raw in status_args {
        statuses.insert(raw.parse::<ItemStatus>()?);
    }
    let filter = ItemFilter {
        text: search,
        statuses,
        product: ProductSelector::from_raw(product),
    };

    let items = db.list_items(id)?;
    let products: HashMap<i64, Product> = db
        .list_products(None)?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    let shown = filter.apply(&items, &products);
    println!(
        "{} of {} items shown",
        shown.len().to_string().bold(),
        items.len()
    );

    for item in shown {
        let product_name = item
            .product_id
            .and_then(|pid| products.get(&pid))
            .map_or("unassigned", |p| p.name.as_str());
        println!(
            "  [{}] {}  {}  ({})",
            item.id,
            item.status.to_string().cyan(),
            item.title,
            product_name
        );
        if let Some(url) = &item.clickup_url {
            println!("      card: {}", url.dimmed());
        }
        for mr in db.list_merge_requests(item.id)? {
            match (&mr.repo, &mr.iid) {
                (Some(repo), Some(iid)) => {
                    println!("      mr: {} {}  {}", repo, iid.bold(), mr.url.dimmed())
                }
                _ => println!("      mr: {}", mr.url.dimmed()),
            }
        }
    }
    Ok(())
}

fn print_release_header(release: &Release) {
    println!(
        "{} {}  {}",
        format!("[{}]", release.id).bold(),
        format_date(Some(release.release_date)),
        release.title.bold()
    );
    if let Some(notes) = &release.notes {
        println!("{}", notes.dimmed());
    }
}

// =============================================================================
// Items
// =============================================================================

fn handle_item_command(db: &Database, cmd: ItemCommand) -> Result<()> {
    match cmd {
        ItemCommand::Add {
            release,
            title,
            product,
            description,
            clickup,
            status,
            mrs,
        } => {
            let draft = ItemDraft {
                product_id: product,
                title,
                description: description.and_then(blank_to_none),
                clickup_url: clickup,
                status: match status {
                    Some(raw) => raw.parse()?,
                    None => ItemStatus::default(),
                },
            };
            let item = db.create_item(release, &draft, &mrs.join("\n"))?;
            println!(
                "{} {} (id {})",
                "Item created:".green(),
                item.title,
                item.id
            );
        }
        ItemCommand::Show { id } => {
            let item = db.get_item(id)?;
            println!(
                "[{}] {}  {}  (release {})",
                item.id,
                item.status.to_string().cyan(),
                item.title.bold(),
                item.release_id
            );
            if let Some(desc) = &item.description {
                println!("{}", desc.dimmed());
            }
            if let Some(url) = &item.clickup_url {
                println!("card: {url}");
            }
            for mr in db.list_merge_requests(id)? {
                match (&mr.repo, &mr.iid) {
                    (Some(repo), Some(iid)) => println!("mr: {repo} {iid}  {}", mr.url),
                    _ => println!("mr: {}", mr.url),
                }
            }
        }
        ItemCommand::Edit {
            id,
            title,
            product,
            no_product,
            description,
            clickup,
            status,
            mrs,
            clear_mrs,
        } => {
            let existing = db.get_item(id)?;
            let draft = ItemDraft {
                product_id: if no_product {
                    None
                } else {
                    product.or(existing.product_id)
                },
                title: title.unwrap_or(existing.title),
                description: match description {
                    Some(d) => blank_to_none(d),
                    None => existing.description,
                },
                clickup_url: match clickup {
                    Some(u) => blank_to_none(u),
                    None => existing.clickup_url,
                },
                status: match status {
                    Some(raw) => raw.parse()?,
                    None => existing.status,
                },
            };

            // The merge-request set is replaced wholesale: either with
            // the newly submitted URLs, or with the current set when
            // none were given.
            let mr_text = if clear_mrs {
                String::new()
            } else if !mrs.is_empty() {
                mrs.join("\n")
            } else {
                db.list_merge_requests(id)?
                    .into_iter()
                    .map(|mr| mr.url)
                    .collect::<Vec<_>>()
                    .join("\n")
            };

            let item = db.update_item(id, &draft, &mr_text)?;
            println!("{} {}", "Item updated:".green(), item.title);
        }
        ItemCommand::Del { id, yes } => {
            require_confirmation(yes, "an item")?;
            db.delete_item(id)?;
            println!("{}", "Item deleted.".green());
        }
    }
    Ok(())
}

// =============================================================================
// Export
// =============================================================================

fn export_release(db: &Database, release_id: i64, output: Option<&std::path::Path>) -> Result<()> {
    let json = release_to_json(db, release_id)?;
    match output {
        Some(path) => {
            std::fs::write(path, &json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("{} {}", "Exported to".green(), path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
