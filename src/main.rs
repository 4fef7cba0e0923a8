//! Command-line front end.
//!
//! Loads a catalog (and optionally a category tree), starts a session at the
//! given address, then reads one intent per line from stdin:
//!
//! ```text
//! $ facetsync --catalog items.json --categories tree.json --address '/catalog?sort=popular'
//! /catalog?sort=popular                   page 1/4  (80 of 120)  ready
//! sort priceAsc
//! /catalog?sort=priceAsc                  page 1/4  (80 of 120)  ready
//! min 100
//! /catalog?sort=priceAsc&priceMin=100     page 1/2  (31 of 120)  ready
//! refetch!
//! ```
//!
//! `refetch` reloads the current request; `refetch!` invalidates the cached
//! entry first. After each line the runtime settles (debounce windows
//! included) before the address and page summary are printed.

#![allow(clippy::multiple_crate_versions)]

use clap::Parser;
use facetsync::app::{FilterSession, Intent, MemoryAddress};
use facetsync::domain::CategoryTree;
use facetsync::fetch::{LoadStatus, Runtime};
use facetsync::source::MemoryCatalog;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "facetsync")]
#[command(about = "Catalog filter session driven by textual intents", long_about = None)]
struct Cli {
    /// Catalog JSON file (`{"items": [...]}`)
    #[arg(long)]
    catalog: PathBuf,

    /// Category tree JSON file
    #[arg(long)]
    categories: Option<PathBuf>,

    /// Apply the category tree only after the initial load settles
    #[arg(long, requires = "categories")]
    defer_categories: bool,

    /// Configuration file (TOML); defaults to config.toml in the data directory
    #[arg(long)]
    config: Option<PathBuf>,

    /// Initial address, path plus optional query string
    #[arg(long, default_value = "/catalog")]
    address: String,
}

#[tokio::main]
async fn main() -> facetsync::Result<()> {
    let cli = Cli::parse();
    let config = facetsync::initialize(cli.config.as_deref())?;

    let catalog = Arc::new(MemoryCatalog::from_json_file(&cli.catalog)?);
    let tree = cli
        .categories
        .as_deref()
        .map(CategoryTree::from_json_file)
        .transpose()?
        .map(Arc::new);

    let (initial_tree, late_tree) = if cli.defer_categories {
        (None, tree)
    } else {
        (tree, None)
    };

    let session = FilterSession::new(&config, MemoryAddress::parse(&cli.address), initial_tree);
    let mut runtime = Runtime::new(session, catalog, &config);

    runtime.start();
    runtime.settle().await;
    if let Some(tree) = late_tree {
        runtime.set_category_tree(tree);
        runtime.settle().await;
    }
    print_summary(&runtime);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        match line {
            "refetch" => runtime.refetch(false),
            "refetch!" => runtime.refetch(true),
            "quit" | "exit" => break,
            _ => match line.parse::<Intent>() {
                Ok(intent) => runtime.dispatch(&intent),
                Err(e) => {
                    eprintln!("{e}");
                    continue;
                }
            },
        }

        runtime.settle().await;
        print_summary(&runtime);
    }

    Ok(())
}

fn print_summary(runtime: &Runtime<MemoryCatalog, MemoryAddress>) {
    let session = runtime.session();
    let view = session.view();
    let status = match view.status {
        LoadStatus::Idle => "idle",
        LoadStatus::Loading => "loading",
        LoadStatus::Refreshing => "refreshing",
        LoadStatus::Ready => "ready",
        LoadStatus::Failed => "failed",
    };

    let page = view.results.as_ref().map_or_else(String::new, |page| {
        format!(
            "page {}/{}  ({} of {})",
            page.meta.page, page.meta.total_pages, page.meta.filtered, page.meta.total
        )
    });

    println!("{:<40}{page:<24}{status}", session.address().href());
    if let Some(error) = &view.error {
        println!("  error: {}", error.message());
    }
    if let Some(name) = session.deferred_category() {
        println!("  pending category: {name}");
    }
}
