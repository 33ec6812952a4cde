//! Categories command - list categories, add custom ones, assign overrides.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;

use passbook_core::categorize::CategoryStore;

use super::{data_dir, load_config};

/// Arguments for the categories command.
#[derive(Args)]
pub struct CategoriesArgs {
    /// Directory holding custom categories and overrides
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: CategoriesCommand,
}

#[derive(Subcommand)]
enum CategoriesCommand {
    /// List selectable categories and current overrides
    List {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a custom category
    Add {
        /// Display label, e.g. "Home Rent"
        label: String,
    },

    /// Pin a duplicate group to a category
    Assign {
        /// Group key from a reconcile report, e.g. "2024-02-01:250.00"
        group_key: String,
        /// Category slug, or "auto" to clear the override
        category: String,
    },
}

pub async fn run(args: CategoriesArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let dir = data_dir(&config, args.data_dir.as_deref());
    let store = CategoryStore::open(dir, config.categories.definitions.clone());

    match args.command {
        CategoriesCommand::List { json } => list_categories(&store, json),
        CategoriesCommand::Add { label } => {
            let added = store.add_custom_category(&label)?;
            println!(
                "{} Added category {} ({})",
                style("✓").green(),
                added.label,
                added.value
            );
            Ok(())
        }
        CategoriesCommand::Assign { group_key, category } => {
            let group_key = group_key.trim();
            store.set_override(group_key, Some(&category))?;
            if category.trim().is_empty() || category.trim().eq_ignore_ascii_case("auto") {
                println!("{} Cleared override for {}", style("✓").green(), group_key);
            } else {
                println!(
                    "{} {} -> {}",
                    style("✓").green(),
                    group_key,
                    category.trim().to_lowercase()
                );
            }
            Ok(())
        }
    }
}

fn list_categories(store: &CategoryStore, json: bool) -> anyhow::Result<()> {
    let snapshot = store.snapshot();

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!("{}", style("Categories").bold());
    for def in &snapshot.definitions {
        println!("  {:<16} {}", def.value, def.label);
    }

    if !snapshot.overrides.is_empty() {
        println!();
        println!("{}", style("Overrides").bold());
        let labels = snapshot.label_map();
        for (key, slug) in &snapshot.overrides {
            match labels.get(slug) {
                Some(label) => println!("  {:<24} {}", key, label),
                None => println!("  {:<24} {} {}", key, slug, style("(unknown)").yellow()),
            }
        }
    }

    Ok(())
}
