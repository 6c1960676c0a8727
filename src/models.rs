use std::fmt;

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn in_range(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanSource {
    ConsumerApp,
    RetailerApp,
    DistributorPortal,
    UssdGateway,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanEvent {
    pub product_id: String,
    pub timestamp: DateTime<Utc>,
    pub location: GeoPoint,
    pub source: ScanSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ScanFrequency {
    Hourly,
    Daily,
    Weekly,
    Monthly,
    Quarterly,
}

impl ScanFrequency {
    /// Canonical nominal inter-arrival interval, in seconds.
    pub fn nominal_seconds(&self) -> f64 {
        match self {
            ScanFrequency::Hourly => 3_600.0,
            ScanFrequency::Daily => 86_400.0,
            ScanFrequency::Weekly => 7.0 * 86_400.0,
            ScanFrequency::Monthly => 30.0 * 86_400.0,
            ScanFrequency::Quarterly => 90.0 * 86_400.0,
        }
    }
}

impl fmt::Display for ScanFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ScanFrequency::Hourly => "hourly",
            ScanFrequency::Daily => "daily",
            ScanFrequency::Weekly => "weekly",
            ScanFrequency::Monthly => "monthly",
            ScanFrequency::Quarterly => "quarterly",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedProfile {
    pub frequency: ScanFrequency,
    pub geo_description: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingCode {
    BurstAfterDormancy,
    AbnormalFrequency,
    GeoOutlier,
    GeoDistributionMismatch,
    SingleSourceSaturation,
    DuplicateIdDivergentLocation,
}

impl FindingCode {
    pub fn describe(&self) -> &'static str {
        match self {
            FindingCode::BurstAfterDormancy => {
                "sudden spike in scans after a period of inactivity"
            }
            FindingCode::AbnormalFrequency => {
                "scan cadence deviates from the declared frequency"
            }
            FindingCode::GeoOutlier => "isolated scan far outside the observed cluster",
            FindingCode::GeoDistributionMismatch => {
                "scans fall outside the declared distribution region"
            }
            FindingCode::SingleSourceSaturation => {
                "nearly all scans originate from a single source"
            }
            FindingCode::DuplicateIdDivergentLocation => {
                "same product id scanned in locations too far apart to travel between"
            }
        }
    }
}

impl fmt::Display for FindingCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            FindingCode::BurstAfterDormancy => "BURST_AFTER_DORMANCY",
            FindingCode::AbnormalFrequency => "ABNORMAL_FREQUENCY",
            FindingCode::GeoOutlier => "GEO_OUTLIER",
            FindingCode::GeoDistributionMismatch => "GEO_DISTRIBUTION_MISMATCH",
            FindingCode::SingleSourceSaturation => "SINGLE_SOURCE_SATURATION",
            FindingCode::DuplicateIdDivergentLocation => "DUPLICATE_ID_DIVERGENT_LOCATION",
        };
        f.write_str(code)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanAssessment {
    pub is_risk: bool,
    pub factors: Vec<FindingCode>,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub label: String,
    pub temperature: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColdChainEnvelope {
    pub min_temp: f64,
    pub max_temp: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreachSeverity {
    Minor,
    Major,
    Critical,
}

impl fmt::Display for BreachSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            BreachSeverity::Minor => "minor",
            BreachSeverity::Major => "major",
            BreachSeverity::Critical => "critical",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreachInterval {
    pub start_index: usize,
    pub end_index: usize,
    pub peak_deviation: f64,
    pub severity: BreachSeverity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionCode {
    InvestigateLocation,
    AuditDistributionRecords,
    VerifyRetailChannel,
    InspectStorageConditions,
    AlertManufacturer,
    AlertManufacturerAndLawEnforcement,
    QuarantineBatch,
}

impl ActionCode {
    pub fn describe(&self) -> &'static str {
        match self {
            ActionCode::InvestigateLocation => "investigate the flagged scan locations",
            ActionCode::AuditDistributionRecords => {
                "audit distribution records against the declared schedule"
            }
            ActionCode::VerifyRetailChannel => "verify authorised retail channels for this batch",
            ActionCode::InspectStorageConditions => "inspect storage and transport conditions",
            ActionCode::AlertManufacturer => "alert the manufacturer",
            ActionCode::AlertManufacturerAndLawEnforcement => {
                "alert the manufacturer and law enforcement"
            }
            ActionCode::QuarantineBatch => "quarantine the affected batch",
        }
    }
}

impl fmt::Display for ActionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            ActionCode::InvestigateLocation => "INVESTIGATE_LOCATION",
            ActionCode::AuditDistributionRecords => "AUDIT_DISTRIBUTION_RECORDS",
            ActionCode::VerifyRetailChannel => "VERIFY_RETAIL_CHANNEL",
            ActionCode::InspectStorageConditions => "INSPECT_STORAGE_CONDITIONS",
            ActionCode::AlertManufacturer => "ALERT_MANUFACTURER",
            ActionCode::AlertManufacturerAndLawEnforcement => {
                "ALERT_MANUFACTURER_AND_LAW_ENFORCEMENT"
            }
            ActionCode::QuarantineBatch => "QUARANTINE_BATCH",
        };
        f.write_str(code)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeRiskReport {
    pub overall_risk: RiskLevel,
    pub factors: Vec<FindingCode>,
    pub breaches: Vec<BreachInterval>,
    pub suggested_actions: Vec<ActionCode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupplyChainEvent {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub handler: String,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColdChainRecord {
    pub min_temp: f64,
    pub max_temp: f64,
    pub sensor_readings: Vec<SensorReading>,
}

impl ColdChainRecord {
    pub fn envelope(&self) -> ColdChainEnvelope {
        ColdChainEnvelope {
            min_temp: self.min_temp,
            max_temp: self.max_temp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRecord {
    pub id: String,
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    pub manufacturer: String,
    pub batch_number: String,
    pub quantity: u32,
    pub manufacturing_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    #[serde(default)]
    pub supply_chain: Vec<SupplyChainEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cold_chain: Option<ColdChainRecord>,
}
