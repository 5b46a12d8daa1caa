use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use uuid::Uuid;

use crate::application::BillService;
use crate::domain::{format_currency, parse_cents, BillId, BillSummary, Cents, SavedBill};
use crate::io::{Exporter, Importer};

/// Conto - Bill Splitting
#[derive(Parser)]
#[command(name = "conto")]
#[command(about = "A local-first tool for splitting a bill down to the exact penny")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "conto.db")]
    pub database: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Manage the people at the table
    #[command(subcommand)]
    Person(PersonCommands),

    /// Manage the receipt items
    #[command(subcommand)]
    Item(ItemCommands),

    /// Assign an item to one or more people (order decides who gets the
    /// rounding pennies)
    Assign {
        /// Item name
        item: String,

        /// People sharing the item, in order
        people: Vec<String>,

        /// Remove the item's assignment instead
        #[arg(long)]
        nobody: bool,
    },

    /// Override or restore an item's equal split
    #[command(subcommand)]
    Split(SplitCommands),

    /// Configure the bill's tax
    #[command(subcommand)]
    Tax(TaxCommands),

    /// Set the tip rate as a decimal (e.g. 0.18 for 18%)
    Tip {
        rate: f64,
    },

    /// Show who owes what
    Summary {
        /// Output format: table, json
        #[arg(short, long, default_value = "table")]
        format: String,

        /// Show each person's item lines
        #[arg(long)]
        detailed: bool,
    },

    /// Save the current bill to history
    Save {
        /// A label for the saved bill (e.g. "Dinner at Luigi's")
        #[arg(short, long)]
        label: Option<String>,
    },

    /// Browse saved bills
    #[command(subcommand)]
    History(HistoryCommands),

    /// Empty the current bill back to defaults
    Reset,

    /// Export data to CSV or JSON
    Export {
        /// What to export: summary, history
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Format: csv, json (default: csv)
        #[arg(short, long)]
        format: Option<String>,
    },

    /// Import a bill snapshot from JSON, replacing the current bill
    Import {
        /// Input file
        input: String,

        /// Validate and report without importing
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Subcommand)]
pub enum PersonCommands {
    /// Add a person
    Add {
        name: String,
    },

    /// List people
    List,

    /// Remove a person and scrub them from all assignments
    Remove {
        name: String,
    },
}

#[derive(Subcommand)]
pub enum ItemCommands {
    /// Add an item with a price like "12.50"
    Add {
        name: String,
        price: String,
    },

    /// List items
    List,

    /// Remove an item and its assignment
    Remove {
        name: String,
    },
}

#[derive(Subcommand)]
pub enum SplitCommands {
    /// Set explicit amounts, e.g. `split set Steak Alice=6.00 Bob=4.00`.
    /// The amounts must add up to the item's price.
    Set {
        /// Item name
        item: String,

        /// person=amount pairs
        entries: Vec<String>,
    },

    /// Revert an item to an equal split
    Clear {
        /// Item name
        item: String,
    },
}

#[derive(Subcommand)]
pub enum TaxCommands {
    /// Set tax as a decimal rate on the subtotal (e.g. 0.0825)
    Rate {
        rate: f64,
    },

    /// Set tax as the exact amount from the receipt (e.g. "8.25")
    Exact {
        amount: String,
    },

    /// Remove the tax configuration
    Clear,
}

#[derive(Subcommand)]
pub enum HistoryCommands {
    /// List saved bills, newest first
    List,

    /// Replay a saved bill's full breakdown
    Show {
        /// Saved bill ID
        id: String,

        /// Show each person's item lines
        #[arg(long)]
        detailed: bool,
    },

    /// Delete a saved bill
    Delete {
        /// Saved bill ID
        id: String,
    },

    /// Delete all saved bills
    Clear,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        // Every command except `init` expects an existing database
        if !matches!(self.command, Commands::Init) && !std::path::Path::new(&self.database).exists()
        {
            anyhow::bail!(
                "Database '{}' not found. Run 'conto init' first.",
                self.database
            );
        }

        match self.command {
            Commands::Init => {
                BillService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Person(person_cmd) => {
                let service = BillService::connect(&self.database).await?;
                run_person_command(&service, person_cmd).await?;
            }

            Commands::Item(item_cmd) => {
                let service = BillService::connect(&self.database).await?;
                run_item_command(&service, item_cmd).await?;
            }

            Commands::Assign {
                item,
                people,
                nobody,
            } => {
                let service = BillService::connect(&self.database).await?;
                if nobody {
                    let item = service.unassign_item(&item).await?;
                    println!("Unassigned: {}", item.name);
                } else if people.is_empty() {
                    anyhow::bail!("Name at least one person, or pass --nobody to unassign");
                } else {
                    let assigned = service.assign_item(&item, &people).await?;
                    let names: Vec<&str> = assigned.iter().map(|p| p.name.as_str()).collect();
                    println!("Assigned {} to: {}", item, names.join(", "));
                }
            }

            Commands::Split(split_cmd) => {
                let service = BillService::connect(&self.database).await?;
                run_split_command(&service, split_cmd).await?;
            }

            Commands::Tax(tax_cmd) => {
                let service = BillService::connect(&self.database).await?;
                run_tax_command(&service, tax_cmd).await?;
            }

            Commands::Tip { rate } => {
                let service = BillService::connect(&self.database).await?;
                service.set_tip_rate(rate).await?;
                println!("Tip rate set to {:.2}%", rate * 100.0);
            }

            Commands::Summary { format, detailed } => {
                let service = BillService::connect(&self.database).await?;
                let summary = service.summary().await?;
                match format.as_str() {
                    "json" => println!("{}", serde_json::to_string_pretty(&summary)?),
                    "table" => print_summary(&summary, detailed),
                    other => anyhow::bail!("Unknown format '{}'. Use: table, json", other),
                }
            }

            Commands::Save { label } => {
                let service = BillService::connect(&self.database).await?;
                let saved = service.save_bill(label).await?;
                match &saved.label {
                    Some(label) => println!(
                        "Saved bill '{}' ({}) as {}",
                        label,
                        format_currency(saved.total_cents),
                        saved.id
                    ),
                    None => println!(
                        "Saved bill ({}) as {}",
                        format_currency(saved.total_cents),
                        saved.id
                    ),
                }
            }

            Commands::History(history_cmd) => {
                let service = BillService::connect(&self.database).await?;
                run_history_command(&service, history_cmd).await?;
            }

            Commands::Reset => {
                let service = BillService::connect(&self.database).await?;
                service.reset().await?;
                println!("Bill reset.");
            }

            Commands::Export {
                export_type,
                output,
                format,
            } => {
                let service = BillService::connect(&self.database).await?;
                run_export_command(&service, &export_type, output.as_deref(), format.as_deref())
                    .await?;
            }

            Commands::Import { input, dry_run } => {
                let service = BillService::connect(&self.database).await?;
                run_import_command(&service, &input, dry_run).await?;
            }
        }

        Ok(())
    }
}

async fn run_person_command(service: &BillService, cmd: PersonCommands) -> Result<()> {
    match cmd {
        PersonCommands::Add { name } => {
            let person = service.add_person(&name).await?;
            println!("Added person: {}", person.name);
        }

        PersonCommands::List => {
            let people = service.list_people().await?;
            if people.is_empty() {
                println!("Nobody at the table yet.");
            } else {
                println!("{:<20} {}", "NAME", "ID");
                println!("{}", "-".repeat(58));
                for person in people {
                    println!("{:<20} {}", person.name, person.id);
                }
            }
        }

        PersonCommands::Remove { name } => {
            let person = service.remove_person(&name).await?;
            println!("Removed person: {}", person.name);
        }
    }
    Ok(())
}

async fn run_item_command(service: &BillService, cmd: ItemCommands) -> Result<()> {
    match cmd {
        ItemCommands::Add { name, price } => {
            let price_cents = parse_money_arg(&price)?;
            let item = service.add_item(&name, price_cents).await?;
            println!("Added item: {} ({})", item.name, format_currency(item.price_cents));
        }

        ItemCommands::List => {
            let items = service.list_items().await?;
            if items.is_empty() {
                println!("No items on the bill yet.");
            } else {
                println!("{:<24} {:>10}", "NAME", "PRICE");
                println!("{}", "-".repeat(35));
                let mut total: Cents = 0;
                for item in &items {
                    println!("{:<24} {:>10}", item.name, format_currency(item.price_cents));
                    total += item.price_cents;
                }
                println!("{}", "-".repeat(35));
                println!("{:<24} {:>10}", "Subtotal", format_currency(total));
            }
        }

        ItemCommands::Remove { name } => {
            let item = service.remove_item(&name).await?;
            println!("Removed item: {}", item.name);
        }
    }
    Ok(())
}

async fn run_split_command(service: &BillService, cmd: SplitCommands) -> Result<()> {
    match cmd {
        SplitCommands::Set { item, entries } => {
            if entries.is_empty() {
                anyhow::bail!("Provide at least one person=amount pair");
            }
            let entries = entries
                .iter()
                .map(|raw| parse_split_entry(raw))
                .collect::<Result<Vec<_>>>()?;
            service.set_custom_split(&item, &entries).await?;
            println!("Custom split set for {}.", item);
        }

        SplitCommands::Clear { item } => {
            service.clear_custom_split(&item).await?;
            println!("{} reverted to an equal split.", item);
        }
    }
    Ok(())
}

async fn run_tax_command(service: &BillService, cmd: TaxCommands) -> Result<()> {
    match cmd {
        TaxCommands::Rate { rate } => {
            service.set_tax_rate(rate).await?;
            println!("Tax rate set to {:.2}%", rate * 100.0);
        }

        TaxCommands::Exact { amount } => {
            let amount_cents = parse_money_arg(&amount)?;
            service.set_tax_exact(amount_cents).await?;
            println!("Tax set to {}", format_currency(amount_cents));
        }

        TaxCommands::Clear => {
            service.clear_tax().await?;
            println!("Tax removed.");
        }
    }
    Ok(())
}

async fn run_history_command(service: &BillService, cmd: HistoryCommands) -> Result<()> {
    match cmd {
        HistoryCommands::List => {
            let entries = service.history().await?;
            if entries.is_empty() {
                println!("No saved bills.");
            } else {
                println!(
                    "{:<38} {:<20} {:>10}  {}",
                    "ID", "SAVED", "TOTAL", "LABEL"
                );
                println!("{}", "-".repeat(84));
                for entry in entries {
                    println!(
                        "{:<38} {:<20} {:>10}  {}",
                        entry.id,
                        entry.saved_at.format("%Y-%m-%d %H:%M:%S"),
                        format_currency(entry.total_cents),
                        entry.label.as_deref().unwrap_or("")
                    );
                }
            }
        }

        HistoryCommands::Show { id, detailed } => {
            let id = parse_bill_id(&id)?;
            let (saved, summary) = service.replay(id).await?;
            print_saved_header(&saved);
            print_summary(&summary, detailed);
        }

        HistoryCommands::Delete { id } => {
            let id = parse_bill_id(&id)?;
            service.delete_saved(id).await?;
            println!("Deleted saved bill {}", id);
        }

        HistoryCommands::Clear => {
            let removed = service.clear_history().await?;
            println!("Deleted {} saved bill(s).", removed);
        }
    }
    Ok(())
}

async fn run_export_command(
    service: &BillService,
    export_type: &str,
    output: Option<&str>,
    format: Option<&str>,
) -> Result<()> {
    let exporter = Exporter::new(service);
    let format = format.unwrap_or("csv");
    let writer = open_output(output)?;

    match (export_type, format) {
        ("summary", "csv") => {
            let count = exporter.export_summary_csv(writer).await?;
            if output.is_some() {
                println!("Exported {} person row(s)", count);
            }
        }
        ("summary", "json") => {
            exporter.export_summary_json(writer).await?;
        }
        ("history", "csv") => {
            let count = exporter.export_history_csv(writer).await?;
            if output.is_some() {
                println!("Exported {} saved bill(s)", count);
            }
        }
        ("history", "json") => {
            let export = exporter.export_history_json(writer).await?;
            if output.is_some() {
                println!("Exported {} saved bill(s)", export.bills.len());
            }
        }
        (other_type, other_format) => {
            anyhow::bail!(
                "Unknown export '{} {}'. Types: summary, history. Formats: csv, json",
                other_type,
                other_format
            );
        }
    }

    Ok(())
}

async fn run_import_command(service: &BillService, input: &str, dry_run: bool) -> Result<()> {
    let file = std::fs::File::open(input)
        .with_context(|| format!("Failed to open '{}'", input))?;

    let importer = Importer::new(service);
    let result = importer.import_bill_json(file, dry_run).await?;

    if result.applied {
        println!(
            "Imported bill: {} people, {} items, {} assignments",
            result.people, result.items, result.assignments
        );
    } else {
        println!(
            "Dry run: snapshot is valid ({} people, {} items, {} assignments)",
            result.people, result.items, result.assignments
        );
    }
    Ok(())
}

fn open_output(path: Option<&str>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create '{}'", path))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(std::io::stdout())),
    }
}

fn parse_bill_id(id: &str) -> Result<BillId> {
    Uuid::parse_str(id).with_context(|| format!("Invalid saved bill id '{}'", id))
}

fn parse_money_arg(raw: &str) -> Result<Cents> {
    let cents =
        parse_cents(raw).with_context(|| format!("Invalid amount '{}' (try e.g. 12.50)", raw))?;
    Ok(cents)
}

fn parse_split_entry(raw: &str) -> Result<(String, Cents)> {
    let (name, amount) = raw
        .split_once('=')
        .with_context(|| format!("Expected person=amount, got '{}'", raw))?;
    let cents = parse_money_arg(amount)?;
    Ok((name.to_string(), cents))
}

fn print_saved_header(saved: &SavedBill) {
    match &saved.label {
        Some(label) => println!("Saved bill: {}", label),
        None => println!("Saved bill: {}", saved.id),
    }
    println!("Saved at:   {}", saved.saved_at.format("%Y-%m-%d %H:%M:%S"));
    println!();
}

fn print_summary(summary: &BillSummary, detailed: bool) {
    if summary.person_breakdowns.is_empty() {
        println!("Nobody at the table yet.");
    } else {
        println!(
            "{:<20} {:>10} {:>9} {:>9} {:>10}",
            "PERSON", "ITEMS", "TAX", "TIP", "TOTAL"
        );
        println!("{}", "-".repeat(61));
        for breakdown in &summary.person_breakdowns {
            println!(
                "{:<20} {:>10} {:>9} {:>9} {:>10}",
                breakdown.person_name,
                format_currency(breakdown.items_subtotal),
                format_currency(breakdown.tax_share),
                format_currency(breakdown.tip_share),
                format_currency(breakdown.total)
            );

            if detailed {
                for detail in &breakdown.items {
                    println!(
                        "  {:<22} {:>10}  (of {} among {}{})",
                        detail.item_name,
                        format_currency(detail.share_cents),
                        format_currency(detail.full_price_cents),
                        detail.split_count,
                        if detail.is_custom_split { ", custom" } else { "" }
                    );
                }
            }
        }
    }

    println!();
    println!("Subtotal: {:>10}", format_currency(summary.bill_subtotal));
    println!("Tax:      {:>10}", format_currency(summary.total_tax));
    println!("Tip:      {:>10}", format_currency(summary.total_tip));
    println!("Total:    {:>10}", format_currency(summary.grand_total));
}
