use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{ArgGroup, Parser, Subcommand};

mod aggregate;
mod cold_chain;
mod error;
mod geo;
mod ledger;
mod models;
mod patterns;
mod report;

use crate::cold_chain::ColdChainConfig;
use crate::geo::{BoundingBox, RegionPredicate};
use crate::ledger::{JsonLedger, ProductLedger};
use crate::models::{
    ColdChainEnvelope, ColdChainRecord, ExpectedProfile, GeoPoint, ProductRecord, ScanEvent,
    ScanFrequency, ScanSource, SensorReading,
};
use crate::patterns::ScanConfig;

#[derive(Parser)]
#[command(name = "chainguardian-risk")]
#[command(about = "Scan-pattern and cold-chain risk analysis for ChainGuardian", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write demo products into a ledger file
    Seed {
        #[arg(long, default_value = "ledger.json")]
        ledger: PathBuf,
    },
    /// Register a product in the ledger
    Register {
        #[arg(long, default_value = "ledger.json")]
        ledger: PathBuf,
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        name: String,
        #[arg(long)]
        category: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        manufacturer: String,
        #[arg(long)]
        batch_number: String,
        #[arg(long, default_value_t = 0)]
        quantity: u32,
        #[arg(long)]
        manufacturing_date: DateTime<Utc>,
        #[arg(long)]
        expiry_date: DateTime<Utc>,
        #[arg(long)]
        min_temp: Option<f64>,
        #[arg(long)]
        max_temp: Option<f64>,
    },
    /// List registered products
    List {
        #[arg(long, default_value = "ledger.json")]
        ledger: PathBuf,
    },
    /// Check whether a product id is registered
    Verify {
        id: String,
        #[arg(long, default_value = "ledger.json")]
        ledger: PathBuf,
    },
    /// Analyze scan patterns from a CSV export
    Analyze {
        #[arg(long)]
        scans: PathBuf,
        #[arg(long, value_enum)]
        frequency: ScanFrequency,
        #[arg(long)]
        region: Option<String>,
        #[arg(long)]
        region_bounds: Option<BoundingBox>,
        #[arg(long)]
        json: bool,
    },
    /// Evaluate sensor readings against a cold-chain envelope
    ColdChain {
        #[arg(long)]
        readings: PathBuf,
        #[arg(long)]
        min_temp: f64,
        #[arg(long)]
        max_temp: f64,
        #[arg(long)]
        json: bool,
    },
    /// Combine scan-pattern and cold-chain signals for one product
    #[command(group(
        ArgGroup::new("output")
            .args(["json", "out"])
            .multiple(false)
    ))]
    Assess {
        id: String,
        #[arg(long, default_value = "ledger.json")]
        ledger: PathBuf,
        #[arg(long)]
        scans: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = ScanFrequency::Weekly)]
        frequency: ScanFrequency,
        #[arg(long)]
        region_bounds: Option<BoundingBox>,
        #[arg(long)]
        json: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Seed { ledger } => {
            let inserted = ledger::seed(&ledger)?;
            println!("Seeded {inserted} products into {}.", ledger.display());
        }
        Commands::Register {
            ledger,
            id,
            name,
            category,
            description,
            manufacturer,
            batch_number,
            quantity,
            manufacturing_date,
            expiry_date,
            min_temp,
            max_temp,
        } => {
            let cold_chain = match (min_temp, max_temp) {
                (Some(min_temp), Some(max_temp)) => Some(ColdChainRecord {
                    min_temp,
                    max_temp,
                    sensor_readings: Vec::new(),
                }),
                (None, None) => None,
                _ => anyhow::bail!("--min-temp and --max-temp must be provided together"),
            };
            let record = ProductRecord {
                id: id.unwrap_or_default(),
                name,
                category,
                description,
                manufacturer,
                batch_number,
                quantity,
                manufacturing_date,
                expiry_date,
                supply_chain: Vec::new(),
                cold_chain,
            };
            let mut store = JsonLedger::open(&ledger)?;
            let assigned = store.register_product(record)?;
            println!("Registered product {assigned}.");
        }
        Commands::List { ledger } => {
            let store = JsonLedger::open(&ledger)?;
            if store.products().is_empty() {
                println!("No products registered in {}.", ledger.display());
            } else {
                for product in store.products().iter() {
                    println!(
                        "- {} ({}, {}) batch {} qty {}",
                        product.name, product.id, product.category, product.batch_number,
                        product.quantity
                    );
                }
            }
        }
        Commands::Verify { id, ledger } => {
            let store = JsonLedger::open(&ledger)?;
            match store.get_product(&id)? {
                Some(product) => println!(
                    "{} is AUTHENTIC. Batch {} from {}. Expires {}.",
                    product.name,
                    product.batch_number,
                    product.manufacturer,
                    product.expiry_date.format("%Y-%m-%d")
                ),
                None => println!(
                    "Product {id} is not registered. LIKELY COUNTERFEIT. Do not use and report it."
                ),
            }
        }
        Commands::Analyze {
            scans,
            frequency,
            region,
            region_bounds,
            json,
        } => {
            let events = load_scans(&scans)?;
            let expected = ExpectedProfile {
                frequency,
                geo_description: region,
            };
            let predicate = region_bounds
                .as_ref()
                .map(|bounds| bounds as &dyn RegionPredicate);
            let assessment =
                patterns::analyze(&events, &expected, predicate, &ScanConfig::default())?;

            if json {
                println!("{}", serde_json::to_string_pretty(&assessment)?);
            } else if assessment.is_risk {
                println!(
                    "Counterfeit risk detected (confidence {:.2}).",
                    assessment.confidence
                );
                for factor in assessment.factors.iter() {
                    println!("- {} ({})", factor.describe(), factor);
                }
            } else {
                println!("No counterfeit risk indicators found.");
            }
        }
        Commands::ColdChain {
            readings,
            min_temp,
            max_temp,
            json,
        } => {
            let series = load_readings(&readings)?;
            let envelope = ColdChainEnvelope { min_temp, max_temp };
            let breaches = cold_chain::monitor(&series, &envelope, &ColdChainConfig::default())?;

            if json {
                println!("{}", serde_json::to_string_pretty(&breaches)?);
            } else if breaches.is_empty() {
                println!("All readings within the envelope.");
            } else {
                println!("Cold-chain breaches:");
                for breach in breaches.iter() {
                    println!(
                        "- readings {}-{}: peak deviation {:.1} deg C ({})",
                        breach.start_index,
                        breach.end_index,
                        breach.peak_deviation,
                        breach.severity
                    );
                }
            }
        }
        Commands::Assess {
            id,
            ledger,
            scans,
            frequency,
            region_bounds,
            json,
            out,
        } => {
            let store = JsonLedger::open(&ledger)?;
            let product = store
                .get_product(&id)?
                .with_context(|| format!("product {id} is not registered"))?;

            let scan_assessment = match scans {
                Some(path) => {
                    let events = load_scans(&path)?;
                    let expected = ExpectedProfile {
                        frequency,
                        geo_description: None,
                    };
                    let predicate = region_bounds
                        .as_ref()
                        .map(|bounds| bounds as &dyn RegionPredicate);
                    Some(patterns::analyze(
                        &events,
                        &expected,
                        predicate,
                        &ScanConfig::default(),
                    )?)
                }
                None => None,
            };

            let breaches = match product.cold_chain.as_ref() {
                Some(record) => cold_chain::monitor(
                    &record.sensor_readings,
                    &record.envelope(),
                    &ColdChainConfig::default(),
                )?,
                None => Vec::new(),
            };

            let composite = aggregate::aggregate(scan_assessment.as_ref(), &breaches);

            if json {
                println!("{}", serde_json::to_string_pretty(&composite)?);
            } else if let Some(out) = out {
                let rendered = report::build_report(Some(&product), &composite);
                std::fs::write(&out, rendered)?;
                println!("Report written to {}.", out.display());
            } else {
                println!("Overall risk for {}: {}", product.name, composite.overall_risk);
                for factor in composite.factors.iter() {
                    println!("- {} ({})", factor.describe(), factor);
                }
                for breach in composite.breaches.iter() {
                    println!(
                        "- readings {}-{}: peak deviation {:.1} deg C ({})",
                        breach.start_index,
                        breach.end_index,
                        breach.peak_deviation,
                        breach.severity
                    );
                }
                for action in composite.suggested_actions.iter() {
                    println!("- suggested: {}", action.describe());
                }
            }
        }
    }

    Ok(())
}

fn load_scans(path: &Path) -> anyhow::Result<Vec<ScanEvent>> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        product_id: String,
        timestamp: DateTime<Utc>,
        lat: f64,
        lon: f64,
        source: ScanSource,
    }

    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut events = Vec::new();

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        events.push(ScanEvent {
            product_id: row.product_id,
            timestamp: row.timestamp,
            location: GeoPoint {
                lat: row.lat,
                lon: row.lon,
            },
            source: row.source,
        });
    }

    log::debug!("loaded {} scan events from {}", events.len(), path.display());
    Ok(events)
}

fn load_readings(path: &Path) -> anyhow::Result<Vec<SensorReading>> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        label: String,
        temperature: f64,
    }

    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut readings = Vec::new();

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        readings.push(SensorReading {
            label: row.label,
            temperature: row.temperature,
        });
    }

    log::debug!(
        "loaded {} sensor readings from {}",
        readings.len(),
        path.display()
    );
    Ok(readings)
}
