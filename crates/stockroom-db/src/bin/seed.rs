//! # Seed Data Generator
//!
//! Populates a store with sample products for development.
//!
//! ## Usage
//! ```bash
//! # Generate 500 products (default)
//! cargo run -p stockroom-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p stockroom-db --bin seed -- --count 2000
//!
//! # Specify database URL
//! cargo run -p stockroom-db --bin seed -- --db sqlite://./data/stockroom.db
//! ```
//!
//! ## Generated Products
//! Deterministic products spread across categories (tv, audio, kitchen,
//! appliances, gaming), ids 1..=count, prices 5.00 - 999.00. All rows are
//! inserted with a single `create_batch`, so a failed seed leaves the table
//! untouched.

use std::env;

use stockroom_core::Product;
use stockroom_db::{schema, ConnectionPool, PoolConfig};

/// Product categories for realistic test data
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "tv",
        &["Samsung QLED", "LG OLED", "Sony Bravia", "TCL Roku", "Hisense ULED"],
    ),
    (
        "audio",
        &["Sonos One", "Bose QC45", "JBL Flip", "Sennheiser HD600", "Marshall Stanmore"],
    ),
    (
        "kitchen",
        &["Kettle", "Toaster", "Blender", "Espresso Machine", "Air Fryer"],
    ),
    (
        "appliances",
        &["Dyson V11", "Roomba", "Dishwasher", "Washing Machine", "Dryer"],
    ),
    (
        "gaming",
        &["PlayStation 5", "Xbox Series X", "Switch OLED", "Steam Deck", "DualSense"],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 500;
    let mut db_url = "sqlite://./stockroom_dev.db".to_string();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(500);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_url = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Stockroom Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of products to generate (default: 500)");
                println!("  -d, --db <URL>     Database URL (default: sqlite://./stockroom_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Stockroom Seed Data Generator");
    println!("================================");
    println!("Database: {}", db_url);
    println!("Products: {}", count);
    println!();

    let pool = match ConnectionPool::connect(PoolConfig::new(&db_url)).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("{}", e.full_message());
            std::process::exit(e.code());
        }
    };
    println!("✓ Connected to database");

    if let Err(e) = schema::bootstrap(&pool).await {
        eprintln!("{}", e.full_message());
        std::process::exit(e.code());
    }
    println!("✓ Schema ready");

    let repo = pool.products();

    // Check existing products
    let existing = repo.count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicate ids.");
        println!("  Run with a fresh database to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating products...");

    let start = std::time::Instant::now();
    let products: Vec<Product> = (0..count).map(generate_product).collect();

    if let Err(e) = repo.create_batch(&products).await {
        eprintln!("{}", e.full_message());
        std::process::exit(e.code());
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} products in {:?}", products.len(), elapsed);
    println!(
        "  Rate: {:.0} products/second",
        products.len() as f64 / elapsed.as_secs_f64()
    );

    println!();
    println!("Verifying...");
    let most_expensive = repo.get_most_expensive().await?;
    if let Some(top) = most_expensive.first() {
        println!("  Most expensive: {} ({:.2})", top.good, top.price);
    }
    let budget = repo.get_products_with_price_range(5.0, 50.0).await?;
    println!("  Priced 5.00 - 50.00: {} products", budget.len());

    pool.close().await;

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates a single product with deterministic data.
fn generate_product(seed: usize) -> Product {
    let (category, names) = CATEGORIES[seed % CATEGORIES.len()];
    let name = names[(seed / CATEGORIES.len()) % names.len()];

    // Price: 5.00 - 999.00 in 0.50 steps
    let price = 5.0 + ((seed * 37) % 1989) as f64 * 0.5;

    Product::new(
        seed as i32 + 1,
        format!("{} #{}", name, seed + 1),
        price,
        category,
    )
}
