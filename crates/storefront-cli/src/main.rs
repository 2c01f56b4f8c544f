//! Storefront CLI - sync and inspect the local storefront cache.
//!
//! Loads configuration, wires the configured remote API and local store, and
//! runs one command. Every listing says where its data came from: the remote
//! API, the local snapshot (with its age), or the built-in seed set.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use storefront_core::{
    Config, Customer, Fetched, LocalBackend, Product, RemoteBackend, Sale, SaleStatus, Storefront,
    WriteOutcome,
};
use storefront_core::utils::truncate_string;

#[derive(Parser, Debug)]
#[command(name = "storefront")]
#[command(about = "Sync and inspect the storefront catalog, customers and sales")]
#[command(version)]
struct Args {
    /// Path to config file (default: $XDG_CONFIG_HOME/storefront/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Refresh every collection from the API into the local store
    Sync,
    /// List products
    Products {
        /// Case-insensitive search on name and description
        #[arg(short, long)]
        search: Option<String>,
        /// Exact category
        #[arg(short, long)]
        category: Option<String>,
    },
    /// List customers
    Customers {
        /// Case-insensitive search on name, email and phone
        #[arg(short, long)]
        search: Option<String>,
    },
    /// List sales
    Sales {
        #[arg(long)]
        customer: Option<String>,
        #[arg(long)]
        status: Option<SaleStatus>,
    },
    /// Set a product's stock
    Stock { id: String, quantity: u32 },
}

type App = Storefront<RemoteBackend, LocalBackend>;

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr, and also to a daily file under `log_dir` when set.
/// The returned guard flushes the file writer on drop.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "storefront.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_ansi(false).with_writer(writer)), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    config.apply_env()?;

    let _guard = init_tracing(config.log_dir.as_deref());
    info!(storage = ?config.storage, api = ?config.api_base_url, "Storefront starting");

    let app = Storefront::from_config(&config).context("Failed to open storefront backends")?;

    match args.command {
        Command::Sync => sync(&app).await,
        Command::Products { search, category } => {
            let products = match (search, category) {
                (Some(query), _) => app.products.search(&query).await,
                (None, Some(category)) => app.products.by_category(&category).await,
                (None, None) => app.products.all().await,
            };
            print_products(&products);
        }
        Command::Customers { search } => {
            let customers = match search {
                Some(query) => app.customers.search(&query).await,
                None => app.customers.all().await,
            };
            print_customers(&customers);
        }
        Command::Sales { customer, status } => {
            let sales = match (customer, status) {
                (Some(id), status) => app
                    .sales
                    .by_customer(&id)
                    .await
                    .map(|sales| filter_status(sales, status)),
                (None, Some(status)) => app.sales.by_status(status).await,
                (None, None) => app.sales.all().await,
            };
            print_sales(&sales);
        }
        Command::Stock { id, quantity } => {
            let patched = app.products.set_stock(&id, quantity).await;
            match patched.entity {
                Some(product) => {
                    println!("{}: stock {}", product.name, product.stock);
                    print_outcome(&patched.outcome);
                }
                None => println!("No product with id {}", id),
            }
        }
    }

    info!("Storefront finished");
    Ok(())
}

async fn sync(app: &App) {
    let report = app.refresh_all().await;
    for (name, sync) in [
        ("products", report.products),
        ("customers", report.customers),
        ("sales", report.sales),
    ] {
        println!("{:<10} {:>4} from {}", name, sync.count, sync.source);
    }
    if !report.is_complete() {
        println!("Some collections could not be refreshed; showing cached data.");
    }
}

fn filter_status(sales: Vec<Sale>, status: Option<SaleStatus>) -> Vec<Sale> {
    match status {
        Some(status) => sales.into_iter().filter(|sale| sale.status == status).collect(),
        None => sales,
    }
}

fn print_products(products: &Fetched<Vec<Product>>) {
    println!("{} products ({})", products.data.len(), products.describe());
    for p in &products.data {
        println!(
            "  {:<6} {:<30} {:>10} {:>5} in stock  [{}] {}",
            p.id,
            truncate_string(&p.name, 30),
            p.price.to_string(),
            p.stock,
            p.category,
            p.kind
        );
    }
}

fn print_customers(customers: &Fetched<Vec<Customer>>) {
    println!("{} customers ({})", customers.data.len(), customers.describe());
    for c in &customers.data {
        println!(
            "  {:<6} {:<30} {:<30} {}",
            c.id,
            truncate_string(&c.name, 30),
            c.email,
            c.phone.as_deref().unwrap_or("-")
        );
    }
}

fn print_sales(sales: &Fetched<Vec<Sale>>) {
    println!("{} sales ({})", sales.data.len(), sales.describe());
    for s in &sales.data {
        println!(
            "  {:<36} customer {:<6} {:>3} items {:>10} {}",
            s.id,
            s.customer_id,
            s.item_count(),
            s.total.to_string(),
            s.status
        );
    }
}

fn print_outcome(outcome: &WriteOutcome) {
    if outcome.is_synced() {
        println!("Saved.");
    } else if outcome.is_applied() {
        println!("Saved locally; the API did not accept the change.");
    } else {
        println!("Could not save the change locally.");
    }
}
