use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{ColdChainRecord, ProductRecord, SensorReading, SupplyChainEvent};

/// The externally-owned product record store. The engine only ever reads
/// records out of it; registration appends and nothing is rewritten.
pub trait ProductLedger {
    fn get_product(&self, id: &str) -> anyhow::Result<Option<ProductRecord>>;
    /// Returns the id under which the record was registered.
    fn register_product(&mut self, record: ProductRecord) -> anyhow::Result<String>;
}

/// File-backed stand-in for the production ledger, so the CLI works
/// end-to-end without the external store.
pub struct JsonLedger {
    path: PathBuf,
    products: Vec<ProductRecord>,
}

impl JsonLedger {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        let products = if path.exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read ledger {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("ledger {} is not valid JSON", path.display()))?
        } else {
            Vec::new()
        };
        log::debug!("loaded {} products from {}", products.len(), path.display());
        Ok(Self {
            path: path.to_path_buf(),
            products,
        })
    }

    pub fn products(&self) -> &[ProductRecord] {
        &self.products
    }

    fn persist(&self) -> anyhow::Result<()> {
        let raw = serde_json::to_string_pretty(&self.products)?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("failed to write ledger {}", self.path.display()))?;
        Ok(())
    }
}

impl ProductLedger for JsonLedger {
    fn get_product(&self, id: &str) -> anyhow::Result<Option<ProductRecord>> {
        Ok(self
            .products
            .iter()
            .find(|product| product.id.eq_ignore_ascii_case(id))
            .cloned())
    }

    fn register_product(&mut self, mut record: ProductRecord) -> anyhow::Result<String> {
        if record.id.is_empty() {
            record.id = format!("prd-{}", Uuid::new_v4());
        }
        if self.products.iter().any(|product| product.id == record.id) {
            anyhow::bail!("product {} is already registered", record.id);
        }
        let id = record.id.clone();
        self.products.push(record);
        self.persist()?;
        Ok(id)
    }
}

/// Writes demo products into the ledger, skipping ids already present.
pub fn seed(path: &Path) -> anyhow::Result<usize> {
    let mut ledger = JsonLedger::open(path)?;
    let mut inserted = 0usize;
    for record in seed_products()? {
        if ledger.get_product(&record.id)?.is_none() {
            ledger.register_product(record)?;
            inserted += 1;
        }
    }
    Ok(inserted)
}

fn ts(raw: &str) -> anyhow::Result<DateTime<Utc>> {
    raw.parse::<DateTime<Utc>>()
        .with_context(|| format!("invalid timestamp {raw}"))
}

fn seed_products() -> anyhow::Result<Vec<ProductRecord>> {
    Ok(vec![
        ProductRecord {
            id: "amx-2024-1105".to_string(),
            name: "Amoxicillin 500mg".to_string(),
            category: "Pharmaceuticals".to_string(),
            description: "Broad-spectrum antibiotic capsules for treating bacterial infections."
                .to_string(),
            manufacturer: "HealthFirst Pharma Inc.".to_string(),
            batch_number: "AMX-2024-1105".to_string(),
            quantity: 10_000,
            manufacturing_date: ts("2024-03-15T08:00:00Z")?,
            expiry_date: ts("2025-09-15T08:00:00Z")?,
            supply_chain: vec![
                event(
                    "Manufacturing Completed",
                    "2024-03-15T10:00:00Z",
                    "HealthFirst Pharma Inc.",
                    "Lagos, Nigeria",
                )?,
                event(
                    "Quality Control Passed",
                    "2024-03-15T14:30:00Z",
                    "QA Department",
                    "Lagos, Nigeria",
                )?,
                event(
                    "Stored in Warehouse",
                    "2024-03-16T09:00:00Z",
                    "Lagos Central Warehouse",
                    "Lagos, Nigeria",
                )?,
                event("In Transit", "2024-03-18T11:00:00Z", "DHL Supply Chain", "Departed Lagos")?,
                event(
                    "Arrived at Port",
                    "2024-03-25T17:00:00Z",
                    "Apapa Port Authority",
                    "Lagos Port Complex",
                )?,
                event(
                    "Arrived at Retail",
                    "2024-03-28T10:00:00Z",
                    "MediCure Pharmacy",
                    "Abuja, Nigeria",
                )?,
                event("Sold to Consumer", "2024-04-02T13:45:00Z", "Consumer", "Abuja, Nigeria")?,
            ],
            cold_chain: Some(ColdChainRecord {
                min_temp: 2.0,
                max_temp: 8.0,
                sensor_readings: day_series(&[4.5, 5.1, 4.8, 5.3, 5.0, 4.7, 5.2]),
            }),
        },
        ProductRecord {
            id: "vaccine-xyz-2024-b2".to_string(),
            name: "Polio Vaccine Batch B2".to_string(),
            category: "Pharmaceuticals".to_string(),
            description: "Inactivated Poliovirus Vaccine (IPV) for immunization programs."
                .to_string(),
            manufacturer: "Global Health United".to_string(),
            batch_number: "VACCINE-XYZ-2024-B2".to_string(),
            quantity: 50_000,
            manufacturing_date: ts("2024-01-10T00:00:00Z")?,
            expiry_date: ts("2025-01-10T00:00:00Z")?,
            supply_chain: vec![
                event(
                    "Manufacturing",
                    "2024-01-10T12:00:00Z",
                    "GHU Biologics",
                    "Geneva, Switzerland",
                )?,
                event(
                    "Shipped via Cold Chain",
                    "2024-01-12T08:00:00Z",
                    "CoolCargo Logistics",
                    "Geneva Airport",
                )?,
                event(
                    "Arrived at Central Store",
                    "2024-01-13T20:00:00Z",
                    "National Medical Stores",
                    "Accra, Ghana",
                )?,
                event(
                    "Distributed to Clinic",
                    "2024-01-15T11:00:00Z",
                    "Regional Health Service",
                    "Kumasi, Ghana",
                )?,
            ],
            cold_chain: Some(ColdChainRecord {
                min_temp: 2.0,
                max_temp: 8.0,
                sensor_readings: vec![
                    reading("10h", 4.1),
                    reading("20h", 3.9),
                    reading("30h", 5.5),
                    reading("40h", 9.2),
                    reading("50h", 15.1),
                    reading("60h", 14.5),
                    reading("70h", 5.0),
                ],
            }),
        },
        ProductRecord {
            id: "eth-cof-2024-007".to_string(),
            name: "Ethiopian Yirgacheffe Coffee Beans".to_string(),
            category: "Agricultural Products".to_string(),
            description: "Single-origin, fair trade certified coffee beans with bright, fruity notes."
                .to_string(),
            manufacturer: "Yirgacheffe Coffee Farmers Cooperative Union".to_string(),
            batch_number: "ETH-COF-2024-007".to_string(),
            quantity: 500,
            manufacturing_date: ts("2024-02-01T00:00:00Z")?,
            expiry_date: ts("2025-02-01T00:00:00Z")?,
            supply_chain: vec![
                event("Harvested", "2024-02-01T09:00:00Z", "Local Farm", "Yirgacheffe, Ethiopia")?,
                event(
                    "Washed and Dried",
                    "2024-02-03T15:00:00Z",
                    "Washing Station",
                    "Yirgacheffe, Ethiopia",
                )?,
                event(
                    "Stored at Cooperative",
                    "2024-02-10T11:00:00Z",
                    "YCFCU Warehouse",
                    "Addis Ababa, Ethiopia",
                )?,
                event(
                    "Shipped to Roaster",
                    "2024-02-15T08:00:00Z",
                    "Global Shipping Co.",
                    "Port of Djibouti",
                )?,
                event("Roasted", "2024-03-05T14:00:00Z", "Artisan Roasters", "London, UK")?,
                event("Arrived at Cafe", "2024-03-10T09:00:00Z", "The Daily Grind", "London, UK")?,
            ],
            cold_chain: None,
        },
        ProductRecord {
            id: "syn-oil-2024-q1".to_string(),
            name: "Full Synthetic 5W-30 Engine Oil".to_string(),
            category: "Auto Spare Parts".to_string(),
            description: "Premium synthetic engine oil for modern gasoline engines.".to_string(),
            manufacturer: "AutoGuard Lubricants".to_string(),
            batch_number: "SYN-OIL-2024-Q1".to_string(),
            quantity: 25_000,
            manufacturing_date: ts("2024-01-20T00:00:00Z")?,
            expiry_date: ts("2029-01-20T00:00:00Z")?,
            supply_chain: vec![
                event(
                    "Production",
                    "2024-01-20T12:00:00Z",
                    "AutoGuard Plant",
                    "Durban, South Africa",
                )?,
                event(
                    "Quality Assurance",
                    "2024-01-21T10:00:00Z",
                    "QA Lab",
                    "Durban, South Africa",
                )?,
                event(
                    "Distribution Center",
                    "2024-01-25T16:00:00Z",
                    "Gauteng DC",
                    "Johannesburg, South Africa",
                )?,
                event(
                    "Shipped to Retailer",
                    "2024-02-05T09:00:00Z",
                    "Freightliners SA",
                    "On route to Nairobi",
                )?,
                event(
                    "Received at Auto Shop",
                    "2024-02-15T14:00:00Z",
                    "Nairobi Auto Parts",
                    "Nairobi, Kenya",
                )?,
            ],
            cold_chain: None,
        },
    ])
}

fn event(
    status: &str,
    timestamp: &str,
    handler: &str,
    location: &str,
) -> anyhow::Result<SupplyChainEvent> {
    Ok(SupplyChainEvent {
        status: status.to_string(),
        timestamp: ts(timestamp)?,
        handler: handler.to_string(),
        location: location.to_string(),
    })
}

fn day_series(temperatures: &[f64]) -> Vec<SensorReading> {
    temperatures
        .iter()
        .enumerate()
        .map(|(i, &temperature)| SensorReading {
            label: format!("Day {}", i + 1),
            temperature,
        })
        .collect()
}

fn reading(label: &str, temperature: f64) -> SensorReading {
    SensorReading {
        label: label.to_string(),
        temperature,
    }
}
