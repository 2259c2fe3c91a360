//! screenfab - order entry and worksheet CLI for screen-panel fabrication.

mod entry;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use fab_core::file_io::{list_orders, load_order, save_order, FileLock};
use fab_core::formula::CutSheet;
use fab_core::order::OrderStatus;
use fab_core::worksheet::render_order_pdf;

/// Manage fabrication orders for custom insect-screen panels.
#[derive(Parser, Debug)]
#[command(name = "screenfab")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new order and enter panels interactively
    New {
        /// Order file to create (.sfo)
        file: PathBuf,
    },

    /// List the orders in a directory
    List {
        /// Directory to scan
        #[arg(default_value = ".")]
        dir: PathBuf,
    },

    /// Show one order with its full cut sheets
    Show {
        /// Order file (.sfo)
        file: PathBuf,

        /// Dump the order as JSON instead of the readable listing
        #[arg(long)]
        json: bool,
    },

    /// Append panels to an existing order
    Add {
        /// Order file (.sfo)
        file: PathBuf,
    },

    /// Rename an order and/or change its status
    Edit {
        /// Order file (.sfo)
        file: PathBuf,

        /// New site/customer name
        #[arg(long)]
        name: Option<String>,

        /// New status: pending, completed or cancelled
        #[arg(long)]
        status: Option<String>,
    },

    /// Remove one line item from an order
    RemoveItem {
        /// Order file (.sfo)
        file: PathBuf,

        /// Line item id (shown by `show`)
        item_id: Uuid,
    },

    /// Render the worksheet PDF for an order
    Export {
        /// Order file (.sfo)
        file: PathBuf,

        /// Output PDF path (defaults next to the order file)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Command::New { file } => cmd_new(&file),
        Command::List { dir } => cmd_list(&dir),
        Command::Show { file, json } => cmd_show(&file, json),
        Command::Add { file } => cmd_add(&file),
        Command::Edit { file, name, status } => cmd_edit(&file, name, status),
        Command::RemoveItem { file, item_id } => cmd_remove_item(&file, item_id),
        Command::Export { file, output } => cmd_export(&file, output),
    }
}

/// Operator identity used for lock metadata.
fn operator_id() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "operator".to_string())
}

fn cmd_new(file: &Path) -> Result<()> {
    if file.exists() {
        bail!(
            "{} already exists; use `add` to append panels",
            file.display()
        );
    }

    let mut order = entry::prompt_order_header();
    let added = entry::prompt_items(&mut order);

    let lock = FileLock::acquire(file, operator_id())
        .with_context(|| format!("Failed to lock {}", file.display()))?;
    save_order(&order, file).with_context(|| format!("Failed to save {}", file.display()))?;
    drop(lock);

    info!("Saved {} with {} panel(s)", file.display(), added);
    Ok(())
}

fn cmd_list(dir: &Path) -> Result<()> {
    let summaries =
        list_orders(dir).with_context(|| format!("Failed to list orders in {}", dir.display()))?;

    if summaries.is_empty() {
        println!("No orders found in {}", dir.display());
        return Ok(());
    }

    println!(
        "{:<30} {:<12} {:<10} {:>6}  {}",
        "SITE", "START", "STATUS", "ITEMS", "FILE"
    );
    for summary in &summaries {
        println!(
            "{:<30} {:<12} {:<10} {:>6}  {}",
            summary.site_name,
            summary.start_date.format("%Y-%m-%d"),
            summary.status,
            summary.item_count,
            summary.path.display()
        );
    }
    Ok(())
}

fn cmd_show(file: &Path, json: bool) -> Result<()> {
    let order =
        load_order(file).with_context(|| format!("Failed to load {}", file.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&order)?);
        return Ok(());
    }

    println!("Order: {}", order.meta.site_name);
    println!(
        "Start: {}   Due: {}   Status: {}",
        order.meta.start_date.format("%Y-%m-%d"),
        order
            .meta
            .due_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string()),
        order.status
    );
    println!(
        "Panels: {} ({} door, {} window)",
        order.item_count(),
        order.door_count(),
        order.window_count()
    );

    for (index, item) in order.items.iter().enumerate() {
        println!();
        println!(
            "#{} [{}] {} - frame {}, mesh {}",
            index + 1,
            item.id,
            item.cuts.label(),
            item.frame_color,
            item.mesh_color
        );
        println!(
            "    size {:.1} x {:.1} cm, {} drill phases",
            item.spec.width, item.spec.height, item.spec.phase_count
        );
        if let Some(side) = item.spec.side {
            println!("    hinge side: {}", side);
        }
        match &item.cuts {
            CutSheet::Framed(cuts) => {
                println!(
                    "    handle {:.1}  frame rail {:.1}  top/bottom {:.1}",
                    cuts.handle, cuts.frame_rail, cuts.top_bottom_rail
                );
                if let Some(short) = cuts.short_rail {
                    println!("    short rail {:.1}", short);
                }
                println!(
                    "    net {:.1}  pleats {}  drill pitch {:.2}",
                    cuts.net_size, cuts.cut_count, cuts.drill_pitch
                );
                println!(
                    "    rope {:.1} cm x {}",
                    cuts.rope_length, cuts.rope_count
                );
            }
            CutSheet::FreeForm(est) => {
                println!("    coverage {:.0} cm2", est.coverage);
            }
            CutSheet::Unsized => {
                println!("    size not set");
            }
        }
    }
    Ok(())
}

fn cmd_add(file: &Path) -> Result<()> {
    let lock = FileLock::acquire(file, operator_id())
        .with_context(|| format!("Failed to lock {}", file.display()))?;

    let mut order =
        load_order(file).with_context(|| format!("Failed to load {}", file.display()))?;
    let added = entry::prompt_items(&mut order);
    save_order(&order, file).with_context(|| format!("Failed to save {}", file.display()))?;
    drop(lock);

    info!("Added {} panel(s) to {}", added, file.display());
    Ok(())
}

fn cmd_edit(file: &Path, name: Option<String>, status: Option<String>) -> Result<()> {
    if name.is_none() && status.is_none() {
        bail!("nothing to change; pass --name and/or --status");
    }

    let status = status
        .map(|s| s.parse::<OrderStatus>())
        .transpose()
        .context("Unknown status (expected pending, completed or cancelled)")?;

    let lock = FileLock::acquire(file, operator_id())
        .with_context(|| format!("Failed to lock {}", file.display()))?;

    let mut order =
        load_order(file).with_context(|| format!("Failed to load {}", file.display()))?;
    if let Some(name) = name {
        order.rename(name);
    }
    if let Some(status) = status {
        order.set_status(status);
    }
    save_order(&order, file).with_context(|| format!("Failed to save {}", file.display()))?;
    drop(lock);

    info!("Updated {}", file.display());
    Ok(())
}

fn cmd_remove_item(file: &Path, item_id: Uuid) -> Result<()> {
    let lock = FileLock::acquire(file, operator_id())
        .with_context(|| format!("Failed to lock {}", file.display()))?;

    let mut order =
        load_order(file).with_context(|| format!("Failed to load {}", file.display()))?;
    let removed = order.remove_item(&item_id);
    if removed.is_none() {
        bail!("No line item {} in {}", item_id, file.display());
    }
    save_order(&order, file).with_context(|| format!("Failed to save {}", file.display()))?;
    drop(lock);

    info!("Removed item {} from {}", item_id, file.display());
    Ok(())
}

fn cmd_export(file: &Path, output: Option<PathBuf>) -> Result<()> {
    let order =
        load_order(file).with_context(|| format!("Failed to load {}", file.display()))?;

    let pdf = render_order_pdf(&order)
        .with_context(|| format!("Failed to render worksheet for {}", file.display()))?;

    let output_path = output.unwrap_or_else(|| {
        let mut path = file.to_path_buf();
        path.set_extension("pdf");
        path
    });

    std::fs::write(&output_path, &pdf)
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    info!("Generated: {}", output_path.display());
    Ok(())
}
