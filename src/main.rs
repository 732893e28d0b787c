//! Farm ROI Calculator
//!
//! Command-line front end for estimating Minecraft farm returns.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use rusqlite::Connection;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use farm_calculator::calculator::{format_amount, format_break_even, format_comparison};
use farm_calculator::{
    db, exports, storage, AppState, CostTable, DesignParameters, LayoutOverrides, Material,
    PlantProfile, ShopItem,
};

#[derive(Parser)]
#[command(name = "farm-calculator")]
#[command(about = "ROI calculator for automated Minecraft farm layouts")]
struct Cli {
    /// Path to the SQLite database holding saved state
    #[arg(short, long, default_value = "farm_calculator.db")]
    database: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database and save the default data
    Init,

    /// Manage plant profiles
    Plants {
        #[command(subcommand)]
        action: PlantAction,
    },

    /// Show or edit material prices
    Costs {
        #[command(subcommand)]
        action: CostAction,
    },

    /// Manage custom shop items
    Shop {
        #[command(subcommand)]
        action: ShopAction,
    },

    /// Show or edit the active farm design
    Design {
        #[command(subcommand)]
        action: DesignAction,
    },

    /// Calculate ROI for a plant on the active design
    Calc {
        /// Plant profile name (e.g., "Wheat", "Sugar Cane")
        plant: String,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Compare several farm configurations side by side
    Compare {
        #[command(subcommand)]
        action: CompareAction,
    },

    /// Show the latest calculation and recent history
    Dashboard,

    /// Submit or list feedback
    Suggest {
        #[command(subcommand)]
        action: SuggestAction,
    },

    /// Export all data to farm-calculator-<date>.json
    Export {
        /// Directory to write the export into
        #[arg(short, long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Import data from an export file
    Import {
        /// Export file to import
        #[arg(required_unless_present = "latest_in", conflicts_with = "latest_in")]
        file: Option<PathBuf>,

        /// Import the newest export found under this directory
        #[arg(long)]
        latest_in: Option<PathBuf>,
    },

    /// List export files found under a directory
    Exports {
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
}

#[derive(Subcommand)]
enum PlantAction {
    /// List all plant profiles
    List,

    /// Show one plant profile
    Show { name: String },

    /// Add or replace a plant profile
    Add {
        name: String,

        /// Sell price per harvested item
        #[arg(long, value_parser = non_negative)]
        sell_price: f64,

        /// Plants per block of floor area
        #[arg(long, value_parser = non_negative)]
        density: f64,

        /// Items each plant yields per hour
        #[arg(long = "yield", value_parser = non_negative)]
        yield_per_hour: f64,

        /// Product needs a processing station (smoker, furnace, ...)
        #[arg(long)]
        processed: bool,

        /// Processing station cost per layer
        #[arg(long, default_value = "0", value_parser = non_negative)]
        process_cost: f64,
    },

    /// Delete a plant profile
    Remove { name: String },
}

#[derive(Subcommand)]
enum CostAction {
    /// Show all material and shop item prices
    Show,

    /// Set the price of one material or shop item
    Set {
        /// Material key or label (e.g., "hopper", "Lever/Button") or shop item name
        name: String,

        #[arg(value_parser = non_negative)]
        price: f64,
    },

    /// Replace the whole price list; materials not given cost nothing
    Save {
        /// Entries as name=price
        #[arg(value_parser = parse_price_entry, required = true)]
        entries: Vec<(String, f64)>,
    },

    /// Restore default prices
    Reset,
}

#[derive(Subcommand)]
enum ShopAction {
    /// List custom shop items
    List,

    /// Add or replace a shop item
    Add {
        name: String,

        #[arg(long, value_parser = non_negative)]
        price: f64,

        #[arg(long, default_value = "general")]
        category: String,

        #[arg(long, default_value = "")]
        description: String,
    },

    /// Delete a shop item
    Remove { name: String },
}

#[derive(Subcommand)]
enum DesignAction {
    /// Show the active design
    Show,

    /// Change fields of the active design
    Set {
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        plot_width: Option<u32>,

        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        plot_depth: Option<u32>,

        #[arg(long, value_parser = non_negative)]
        budget: Option<f64>,

        #[command(flatten)]
        layout: LayoutArgs,
    },
}

#[derive(Subcommand)]
enum CompareAction {
    /// Evaluate a plant and add it to the comparison
    Add {
        plant: String,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Show the comparison table
    Show,

    /// Remove all comparison entries
    Clear,
}

#[derive(Subcommand)]
enum SuggestAction {
    /// Submit a suggestion
    Add {
        title: String,

        description: String,

        /// Kind of feedback (feature, bug, plant, ...)
        #[arg(long = "type", default_value = "feature")]
        kind: String,

        #[arg(long, default_value = "medium")]
        priority: String,
    },

    /// List submitted suggestions
    List,
}

/// Layout fields that can override the active design
#[derive(Args)]
struct LayoutArgs {
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    layers: Option<u32>,

    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    lanes: Option<u32>,

    /// Plants sharing one observer (piston harvester only)
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    observer_share: Option<u32>,

    /// Use a piston/observer harvester instead of rails only
    #[arg(long)]
    pistons_per_plant: Option<bool>,

    /// Include a comparator unloader per layer
    #[arg(long)]
    include_unloaders: Option<bool>,
}

impl From<&LayoutArgs> for LayoutOverrides {
    fn from(args: &LayoutArgs) -> Self {
        LayoutOverrides {
            layers: args.layers,
            lanes: args.lanes,
            observer_share: args.observer_share,
            pistons_per_plant: args.pistons_per_plant,
            include_unloaders: args.include_unloaders,
        }
    }
}

fn non_negative(s: &str) -> Result<f64, String> {
    let value: f64 = s.parse().map_err(|_| format!("'{s}' is not a number"))?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("'{s}' must be zero or more"))
    }
}

fn parse_price_entry(s: &str) -> Result<(String, f64), String> {
    let (name, price) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=price, got '{s}'"))?;
    Ok((name.trim().to_string(), non_negative(price.trim())?))
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "farm_calculator=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let conn = Connection::open(&cli.database)
        .with_context(|| format!("Failed to open {}", cli.database.display()))?;
    db::init_schema(&conn)?;

    let mut state = AppState::default();
    storage::load_from_storage(&conn, &mut state)?;

    if run(cli.command, &conn, &mut state, &cli.database)? {
        storage::save_to_storage(&conn, &state)?;
    }

    Ok(())
}

/// Execute one command. Returns true when the state changed and must be saved.
fn run(command: Commands, conn: &Connection, state: &mut AppState, database: &Path) -> Result<bool> {
    match command {
        Commands::Init => {
            println!("Database initialized at: {}", database.display());
            Ok(true)
        }

        Commands::Plants { action } => run_plants(action, state),
        Commands::Costs { action } => run_costs(action, state),
        Commands::Shop { action } => run_shop(action, state),
        Commands::Design { action } => run_design(action, state),

        Commands::Calc { plant, layout } => {
            let result = state.calculate(&plant, &(&layout).into(), Utc::now())?;
            println!("{}", result);
            Ok(true)
        }

        Commands::Compare { action } => match action {
            CompareAction::Add { plant, layout } => {
                let result = state.add_to_comparison(&plant, &(&layout).into())?;
                println!("Added {} to comparison.\n", result.farm_type);
                print!("{}", format_comparison(state.comparison()));
                Ok(true)
            }
            CompareAction::Show => {
                print!("{}", format_comparison(state.comparison()));
                Ok(false)
            }
            CompareAction::Clear => {
                state.clear_comparison();
                println!("Comparison cleared.");
                Ok(true)
            }
        },

        Commands::Dashboard => {
            let dashboard = state.dashboard();
            match dashboard.latest {
                None => println!("No recent calculations"),
                Some(latest) => {
                    let r = &latest.result;
                    println!("=== Dashboard ===");
                    println!("Total plants:   {}", format_amount(r.total_plants as f64));
                    println!("Total cost:     ${}", format_amount(r.total_cost));
                    println!("Hourly revenue: ${}", format_amount(r.revenue_per_hour_total));
                    println!("Break-even:     {}", format_break_even(r.break_even_hours));
                    println!();
                    println!("Recent calculations:");
                    for calc in dashboard.recent {
                        let r = &calc.result;
                        println!(
                            "  {:<16} {} layers • ${} • {} break-even  ({})",
                            r.farm_type,
                            r.layers,
                            format_amount(r.total_cost),
                            format_break_even(r.break_even_hours),
                            calc.timestamp.format("%Y-%m-%d %H:%M")
                        );
                    }
                }
            }
            Ok(false)
        }

        Commands::Suggest { action } => match action {
            SuggestAction::Add {
                title,
                description,
                kind,
                priority,
            } => {
                state.submit_suggestion(kind, title, description, priority, Utc::now());
                println!("Suggestion submitted. Thank you for your feedback!");
                Ok(true)
            }
            SuggestAction::List => {
                if state.suggestions().is_empty() {
                    println!("No suggestions submitted yet");
                }
                for s in state.suggestions() {
                    println!(
                        "[{}] {} ({}, {} priority)",
                        s.timestamp.format("%Y-%m-%d"),
                        s.title,
                        s.kind,
                        s.priority
                    );
                    println!("    {}", s.description);
                }
                Ok(false)
            }
        },

        Commands::Export { out_dir } => {
            let path = storage::export_to_dir(state, &out_dir, Utc::now())?;
            println!("Exported data to {}", path.display());
            Ok(false)
        }

        Commands::Import { file, latest_in } => {
            let path = match (file, latest_in) {
                (Some(file), _) => file,
                (None, Some(dir)) => match exports::latest_export(&dir)? {
                    Some(export) => export.path,
                    None => bail!("No export files found under {}", dir.display()),
                },
                (None, None) => bail!("Give an export file or --latest-in <DIR>"),
            };

            storage::import_file(conn, state, &path)
                .with_context(|| format!("Failed to import {}. Please check the file format", path.display()))?;
            println!("Data imported successfully from {}", path.display());
            // import_file already saved
            Ok(false)
        }

        Commands::Exports { dir } => {
            let found = exports::find_exports(&dir)?;
            if found.is_empty() {
                println!("No export files under {}", dir.display());
            }
            for export in found {
                println!("{}", export);
            }
            Ok(false)
        }
    }
}

fn run_plants(action: PlantAction, state: &mut AppState) -> Result<bool> {
    match action {
        PlantAction::List => {
            println!("{:<20} {:>10} {:>8} {:>8}  {}", "Plant", "Price", "Density", "Yield/h", "Processed");
            println!("{}", "-".repeat(60));
            for p in state.plants() {
                println!(
                    "{:<20} {:>10.2} {:>8.2} {:>8.3}  {}",
                    p.name,
                    p.sell_price,
                    p.density_per_block,
                    p.yield_per_plant_per_hour,
                    if p.derived_product { "yes" } else { "no" }
                );
            }
            Ok(false)
        }

        PlantAction::Show { name } => {
            let Some(p) = state.plant(&name) else {
                bail!("Plant '{}' not found", name);
            };
            println!("Plant: {}", p.name);
            println!("  Sell price:      ${:.2} per item", p.sell_price);
            println!("  Density:         {} per block", p.density_per_block);
            println!("  Yield:           {} per plant/hour", p.yield_per_plant_per_hour);
            if p.derived_product {
                println!(
                    "  Processing cost: ${} per layer",
                    format_amount(p.extra_process_station_per_layer_cost)
                );
            }
            Ok(false)
        }

        PlantAction::Add {
            name,
            sell_price,
            density,
            yield_per_hour,
            processed,
            process_cost,
        } => {
            let plant = PlantProfile {
                name,
                sell_price,
                density_per_block: density,
                yield_per_plant_per_hour: yield_per_hour,
                derived_product: processed,
                extra_process_station_per_layer_cost: process_cost,
            };
            let name = plant.name.clone();
            if state.upsert_plant(plant) {
                println!("Plant profile '{}' added.", name);
            } else {
                println!("Plant profile '{}' updated.", name);
            }
            Ok(true)
        }

        PlantAction::Remove { name } => match state.remove_plant(&name) {
            Some(_) => {
                println!("Plant profile '{}' deleted.", name);
                Ok(true)
            }
            None => bail!("Plant '{}' not found", name),
        },
    }
}

fn run_costs(action: CostAction, state: &mut AppState) -> Result<bool> {
    match action {
        CostAction::Show => {
            println!("{:<20} {:>12}", "Material", "Price");
            println!("{}", "-".repeat(33));
            for (material, price) in state.costs().entries() {
                println!("{:<20} {:>12}", material.label(), format_amount(price));
            }
            if !state.shop_items().is_empty() {
                println!("\nCustom Shop Items");
                for item in state.shop_items() {
                    println!("{:<20} {:>12}", item.name, format_amount(item.price));
                }
            }
            Ok(false)
        }

        CostAction::Set { name, price } => {
            state.set_cost(&name, price)?;
            println!("Price of '{}' set to {}.", name, format_amount(price));
            Ok(true)
        }

        CostAction::Save { entries } => {
            let mut table = CostTable::zeroed();
            for (name, price) in entries {
                match name.parse::<Material>() {
                    Ok(material) => table.set_price(material, price),
                    // Shop item prices are edited in the same form
                    Err(_) => state.set_cost(&name, price)?,
                }
            }
            state.save_costs(table);
            println!("Cost profile saved.");
            Ok(true)
        }

        CostAction::Reset => {
            state.reset_costs();
            println!("Costs reset to default values.");
            Ok(true)
        }
    }
}

fn run_shop(action: ShopAction, state: &mut AppState) -> Result<bool> {
    match action {
        ShopAction::List => {
            if state.shop_items().is_empty() {
                println!("No shop items. Add one with 'shop add'.");
            }
            for item in state.shop_items() {
                println!("{:<20} ${:>10.2}  [{}]", item.name, item.price, item.category);
                if !item.description.is_empty() {
                    println!("    {}", item.description);
                }
            }
            Ok(false)
        }

        ShopAction::Add {
            name,
            price,
            category,
            description,
        } => {
            let created = state.upsert_shop_item(ShopItem {
                name: name.clone(),
                price,
                category,
                description,
            })?;
            println!("Shop item '{}' {}.", name, if created { "added" } else { "updated" });
            Ok(true)
        }

        ShopAction::Remove { name } => match state.remove_shop_item(&name) {
            Some(_) => {
                println!("Shop item '{}' deleted.", name);
                Ok(true)
            }
            None => bail!("Shop item '{}' not found", name),
        },
    }
}

fn run_design(action: DesignAction, state: &mut AppState) -> Result<bool> {
    match action {
        DesignAction::Show => {
            print_design(state.design());
            Ok(false)
        }

        DesignAction::Set {
            plot_width,
            plot_depth,
            budget,
            layout,
        } => {
            let current = *state.design();
            let merged = current.layout_with(&(&layout).into());
            let design = DesignParameters {
                plot_width: plot_width.unwrap_or(current.plot_width),
                plot_depth: plot_depth.unwrap_or(current.plot_depth),
                layers: merged.layers,
                lanes: merged.lanes,
                observer_share: merged.observer_share,
                pistons_per_plant: merged.pistons_per_plant,
                include_unloaders: merged.include_unloaders,
                budget: budget.unwrap_or(current.budget),
            };
            state.save_design(design);
            println!("Design parameters saved.\n");
            print_design(state.design());
            Ok(true)
        }
    }
}

fn print_design(design: &DesignParameters) {
    let plot = design.plot();
    println!("Plot size:        {} x {}", plot.width, plot.depth);
    println!("Total area:       {} blocks", format_amount(plot.area() as f64));
    println!("Layers:           {}", design.layers);
    println!("Lanes:            {} per layer", design.lanes);
    println!("Observer share:   {}", design.observer_share);
    println!("Pistons per plant: {}", if design.pistons_per_plant { "yes" } else { "no" });
    println!("Unloaders:        {}", if design.include_unloaders { "yes" } else { "no" });
    println!("Budget:           ${}", format_amount(design.budget));
}
