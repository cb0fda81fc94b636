use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::env;
use tracing::info;

struct SampleMedicine {
    name: &'static str,
    category: &'static str,
    description: &'static str,
    price: Decimal,
    stock_quantity: i32,
    prescription_type: &'static str,
    manufacturer: &'static str,
}

const SAMPLE_CATEGORIES: [(&str, &str); 5] = [
    ("Pain Relief", "Medicines for pain management and relief"),
    ("Cold & Flu", "Treatments for cold and flu symptoms"),
    ("Digestive Health", "Medicines for digestive issues"),
    ("Vitamins & Supplements", "Health supplements and vitamins"),
    ("First Aid", "First aid and wound care products"),
];

fn sample_medicines() -> Vec<SampleMedicine> {
    vec![
        SampleMedicine {
            name: "Ibuprofen 200mg",
            category: "Pain Relief",
            description: "Effective pain relief for headaches, muscle pain, and inflammation.",
            price: Decimal::new(14999, 2),
            stock_quantity: 50,
            prescription_type: "OTC",
            manufacturer: "HealthCorp",
        },
        SampleMedicine {
            name: "Paracetamol 500mg",
            category: "Pain Relief",
            description: "Fast-acting pain reliever and fever reducer.",
            price: Decimal::new(8999, 2),
            stock_quantity: 75,
            prescription_type: "OTC",
            manufacturer: "MediPharm",
        },
        SampleMedicine {
            name: "Cough Syrup",
            category: "Cold & Flu",
            description: "Soothes cough and throat irritation.",
            price: Decimal::new(22550, 2),
            stock_quantity: 30,
            prescription_type: "OTC",
            manufacturer: "ColdCare",
        },
        SampleMedicine {
            name: "Vitamin C 1000mg",
            category: "Vitamins & Supplements",
            description: "Immune system support with high-potency Vitamin C.",
            price: Decimal::new(29999, 2),
            stock_quantity: 100,
            prescription_type: "OTC",
            manufacturer: "VitaLife",
        },
        SampleMedicine {
            name: "Antacid Tablets",
            category: "Digestive Health",
            description: "Fast relief from heartburn and acid indigestion.",
            price: Decimal::new(17999, 2),
            stock_quantity: 60,
            prescription_type: "OTC",
            manufacturer: "DigestEase",
        },
        SampleMedicine {
            name: "Antibiotic Cream",
            category: "First Aid",
            description: "Prevents infection in minor cuts and scrapes.",
            price: Decimal::new(12550, 2),
            stock_quantity: 40,
            prescription_type: "OTC",
            manufacturer: "FirstAid Plus",
        },
        SampleMedicine {
            name: "Prescription Pain Relief",
            category: "Pain Relief",
            description: "Strong pain medication for severe pain management.",
            price: Decimal::new(49999, 2),
            stock_quantity: 20,
            prescription_type: "RX",
            manufacturer: "PharmaCorp",
        },
    ]
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let database_url = env::var("DATABASE_URL").context("DATABASE_URL environment variable is required")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("up");

    match command {
        "up" => {
            info!("Running database migrations...");
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run migrations")?;
            info!("Database migrations completed successfully");
        }
        "status" => {
            show_migration_status(&pool).await?;
        }
        "seed" => {
            seed_sample_data(&pool).await?;
            info!("Sample data created successfully");
        }
        _ => {
            eprintln!("Usage: migrate [up|status|seed]");
            eprintln!("  up      - Run all pending migrations (default)");
            eprintln!("  status  - Show applied migrations");
            eprintln!("  seed    - Create sample categories and medicines");
            std::process::exit(1);
        }
    }

    Ok(())
}

async fn show_migration_status(pool: &PgPool) -> Result<()> {
    let applied: Vec<(i64, String, DateTime<Utc>, bool)> = sqlx::query_as(
        "SELECT version, description, installed_on, success FROM _sqlx_migrations ORDER BY version",
    )
    .fetch_all(pool)
    .await
    .context("Failed to read migration history (has `migrate up` been run?)")?;

    println!("Applied migrations:");
    for (version, description, installed_on, success) in &applied {
        let state = if *success { "ok" } else { "FAILED" };
        println!("  {} {:<30} {} [{}]", version, description, installed_on.format("%Y-%m-%d %H:%M:%S"), state);
    }
    println!("Total: {}", applied.len());

    Ok(())
}

/// Idempotent: existing categories and medicines are matched by name
async fn seed_sample_data(pool: &PgPool) -> Result<()> {
    let mut tx = pool.begin().await?;

    for (name, description) in SAMPLE_CATEGORIES {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE name = $1)")
            .bind(name)
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            sqlx::query("INSERT INTO categories (name, description) VALUES ($1, $2)")
                .bind(name)
                .bind(description)
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to create category {}", name))?;
            info!("Created category: {}", name);
        }
    }

    let expiry_date = (Utc::now() + Duration::days(365)).date_naive();

    for medicine in sample_medicines() {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM medicines WHERE name = $1)")
            .bind(medicine.name)
            .fetch_one(&mut *tx)
            .await?;
        if exists {
            continue;
        }

        // Sample prices are listed at MRP
        sqlx::query(
            r#"
            INSERT INTO medicines
                (name, category_id, description, mrp, price, stock_quantity,
                 prescription_type, manufacturer, expiry_date)
            SELECT $1, id, $3, $4, $4, $5, $6::prescription_type, $7, $8
            FROM categories WHERE name = $2
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(medicine.name)
        .bind(medicine.category)
        .bind(medicine.description)
        .bind(medicine.price)
        .bind(medicine.stock_quantity)
        .bind(medicine.prescription_type)
        .bind(medicine.manufacturer)
        .bind(expiry_date)
        .execute(&mut *tx)
        .await
        .with_context(|| format!("Failed to create medicine {}", medicine.name))?;
        info!("Created medicine: {}", medicine.name);
    }

    tx.commit().await?;
    Ok(())
}
