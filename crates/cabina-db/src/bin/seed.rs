//! # Seed Data Generator
//!
//! Populates the database with a small floor and catalog for development.
//!
//! ## Usage
//! ```bash
//! # Default database path (./cabina_dev.db)
//! cargo run -p cabina-db --bin seed
//!
//! # Custom path and seat count
//! cargo run -p cabina-db --bin seed -- --db ./data/cabina.db --seats 30
//! ```

use std::env;

use cabina_db::{Database, DbConfig};

/// Pricing tiers beyond the built-in general tier.
const TIERS: &[(i64, &str)] = &[(2, "Gamer"), (3, "Streaming")];

/// Catalog: (name, price in céntimos, tier).
const PRODUCTS: &[(&str, i64, i64)] = &[
    ("Hora estándar", 200, 1),
    ("Media hora", 100, 1),
    ("Inca Kola 500ml", 300, 1),
    ("Coca Cola 500ml", 300, 1),
    ("Agua San Luis 625ml", 150, 1),
    ("Galletas Soda Field", 120, 1),
    ("Chifles", 180, 1),
    ("Impresión B/N", 30, 1),
    ("Impresión color", 100, 1),
    ("Hora gamer", 350, 2),
    ("Combo gamer (hora + bebida)", 550, 2),
    ("Hora streaming", 500, 3),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=debug surfaces the repository statements while seeding.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();

    let args: Vec<String> = env::args().collect();

    let mut seats: usize = 20;
    let mut db_path = String::from("./cabina_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--seats" | "-s" => {
                if i + 1 < args.len() {
                    seats = args[i + 1].parse().unwrap_or(20);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Cabina Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -s, --seats <N>    Number of seats to create (default: 20)");
                println!("  -d, --db <PATH>    Database file path (default: ./cabina_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Cabina Seed Data Generator");
    println!("==========================");
    println!("Database: {}", db_path);
    println!("Seats:    {}", seats);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected, migrations applied");

    let existing = db.seats().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} seats", existing);
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    for (id, name) in TIERS {
        db.seats().insert_group(*id, name).await?;
    }
    println!("✓ Created {} pricing tiers", TIERS.len() + 1);

    // Every third seat is a gamer seat; the rest are general tier.
    for n in 1..=seats {
        let tier: i64 = if n % 3 == 0 { 2 } else { 1 };
        let number = format!("PC{:02}", n);
        let seat = db.seats().insert(&number, tier).await?;
        // Lay the floor out in rows of five.
        let col = ((n - 1) % 5) as f64;
        let row = ((n - 1) / 5) as f64;
        db.seats()
            .update_position(&seat.id, col * 140.0, row * 120.0)
            .await?;
    }
    println!("✓ Created {} seats", seats);

    for (name, price, tier) in PRODUCTS {
        db.products().insert(name, *price, *tier).await?;
    }
    println!("✓ Created {} catalog products", PRODUCTS.len());

    db.clients().insert("Cliente mostrador", Some("Mostrador")).await?;
    println!("✓ Created walk-in counter client");

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
