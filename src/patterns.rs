use std::collections::HashMap;

use crate::error::EngineError;
use crate::geo::{self, RegionPredicate};
use crate::models::{ExpectedProfile, FindingCode, GeoPoint, ScanAssessment, ScanEvent};

/// Scans of the same product id at the same instant may sit this far apart
/// before they count as divergent.
const COLOCATION_TOLERANCE_KM: f64 = 1.0;

/// Severity weight per finding. The duplicate-id collision is the strongest
/// counterfeiting signal and carries the full weight.
#[derive(Debug, Clone)]
pub struct FindingWeights {
    pub burst_after_dormancy: f64,
    pub abnormal_frequency: f64,
    pub geo_outlier: f64,
    pub geo_distribution_mismatch: f64,
    pub single_source_saturation: f64,
    pub duplicate_id_divergent_location: f64,
}

impl FindingWeights {
    pub fn get(&self, code: FindingCode) -> f64 {
        match code {
            FindingCode::BurstAfterDormancy => self.burst_after_dormancy,
            FindingCode::AbnormalFrequency => self.abnormal_frequency,
            FindingCode::GeoOutlier => self.geo_outlier,
            FindingCode::GeoDistributionMismatch => self.geo_distribution_mismatch,
            FindingCode::SingleSourceSaturation => self.single_source_saturation,
            FindingCode::DuplicateIdDivergentLocation => self.duplicate_id_divergent_location,
        }
    }

    pub fn total(&self) -> f64 {
        self.burst_after_dormancy
            + self.abnormal_frequency
            + self.geo_outlier
            + self.geo_distribution_mismatch
            + self.single_source_saturation
            + self.duplicate_id_divergent_location
    }
}

impl Default for FindingWeights {
    fn default() -> Self {
        Self {
            burst_after_dormancy: 0.8,
            abnormal_frequency: 0.5,
            geo_outlier: 0.7,
            geo_distribution_mismatch: 0.6,
            single_source_saturation: 0.4,
            duplicate_id_divergent_location: 1.0,
        }
    }
}

/// Every threshold of the analyzer, tunable per deployment.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// A gap longer than this multiple of the nominal interval counts as
    /// dormancy.
    pub dormancy_gap_multiple: f64,
    /// Width of the post-dormancy burst window, as a fraction of the
    /// nominal interval.
    pub burst_window_fraction: f64,
    /// Minimum scans inside the burst window for the flood signature.
    pub burst_min_scans: usize,
    /// Allowed median-gap deviation from nominal, as a fraction of nominal.
    pub median_gap_tolerance: f64,
    /// Spread multiplier for the spatial outlier test.
    pub outlier_sigma: f64,
    /// Absolute distance floor for the outlier test; guards tight clusters
    /// whose own spread is near zero.
    pub outlier_floor_km: f64,
    /// Fraction of scans outside the declared region that counts as a
    /// distribution mismatch.
    pub region_mismatch_fraction: f64,
    /// Share of scans from one source that counts as saturation.
    pub source_saturation_fraction: f64,
    /// Saturation is only evaluated above this many scans.
    pub source_saturation_min_scans: usize,
    /// Fastest plausible travel between two scans of the same product id.
    pub max_plausible_velocity_kmh: f64,
    /// Weighted-score threshold above which the assessment is a risk even
    /// without any single flag.
    pub risk_threshold: f64,
    pub weights: FindingWeights,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            dormancy_gap_multiple: 3.0,
            burst_window_fraction: 0.10,
            burst_min_scans: 3,
            median_gap_tolerance: 0.50,
            outlier_sigma: 3.0,
            outlier_floor_km: 100.0,
            region_mismatch_fraction: 0.20,
            source_saturation_fraction: 0.90,
            source_saturation_min_scans: 5,
            max_plausible_velocity_kmh: 900.0,
            risk_threshold: 0.35,
            weights: FindingWeights::default(),
        }
    }
}

/// Assesses a bag of scan events against the declared profile.
///
/// Caller ordering is not trusted; events are sorted by timestamp before any
/// sequential reasoning, so permuting the input cannot change the result.
/// Each deterministic test contributes at most one finding, in fixed
/// evaluation order.
pub fn analyze(
    scans: &[ScanEvent],
    expected: &ExpectedProfile,
    region: Option<&dyn RegionPredicate>,
    config: &ScanConfig,
) -> Result<ScanAssessment, EngineError> {
    if scans.is_empty() {
        return Err(EngineError::InvalidInput("scan list is empty".to_string()));
    }
    for (i, scan) in scans.iter().enumerate() {
        if !scan.location.in_range() {
            return Err(EngineError::InvalidInput(format!(
                "scan {} has coordinates outside lat [-90, 90] / lon [-180, 180]: ({}, {})",
                i, scan.location.lat, scan.location.lon
            )));
        }
    }

    let mut ordered: Vec<&ScanEvent> = scans.iter().collect();
    ordered.sort_by_key(|scan| scan.timestamp);

    let nominal = expected.frequency.nominal_seconds();
    let gaps = inter_arrival_gaps(&ordered);
    let mut factors = Vec::new();

    if has_burst_after_dormancy(&ordered, &gaps, nominal, config) {
        factors.push(FindingCode::BurstAfterDormancy);
    }
    if let Some(median) = median_gap(&gaps) {
        if (median - nominal).abs() > config.median_gap_tolerance * nominal {
            factors.push(FindingCode::AbnormalFrequency);
        }
    }
    if has_geo_outlier(&ordered, config) {
        factors.push(FindingCode::GeoOutlier);
    }
    if let Some(region) = region {
        if region_mismatch(&ordered, region, config) {
            factors.push(FindingCode::GeoDistributionMismatch);
        }
    }
    if source_saturated(&ordered, config) {
        factors.push(FindingCode::SingleSourceSaturation);
    }
    if implausible_travel(&ordered, config) {
        factors.push(FindingCode::DuplicateIdDivergentLocation);
    }

    let score: f64 = factors.iter().map(|&code| config.weights.get(code)).sum();
    let confidence = (score / config.weights.total()).clamp(0.0, 1.0);
    let is_risk = !factors.is_empty() || score > config.risk_threshold;

    Ok(ScanAssessment {
        is_risk,
        factors,
        confidence,
    })
}

fn seconds_between(earlier: &ScanEvent, later: &ScanEvent) -> f64 {
    (later.timestamp - earlier.timestamp).num_milliseconds() as f64 / 1_000.0
}

fn inter_arrival_gaps(ordered: &[&ScanEvent]) -> Vec<f64> {
    ordered
        .windows(2)
        .map(|pair| seconds_between(pair[0], pair[1]))
        .collect()
}

fn median_gap(gaps: &[f64]) -> Option<f64> {
    if gaps.is_empty() {
        return None;
    }
    let mut sorted = gaps.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// Dormancy-then-flood signature: a gap beyond the dormancy multiple,
/// immediately followed by a pile of scans inside a narrow window.
fn has_burst_after_dormancy(
    ordered: &[&ScanEvent],
    gaps: &[f64],
    nominal: f64,
    config: &ScanConfig,
) -> bool {
    let window = config.burst_window_fraction * nominal;
    for (i, &gap) in gaps.iter().enumerate() {
        if gap <= config.dormancy_gap_multiple * nominal {
            continue;
        }
        let resume = ordered[i + 1];
        let burst = ordered[i + 1..]
            .iter()
            .take_while(|scan| seconds_between(resume, scan) <= window)
            .count();
        if burst >= config.burst_min_scans {
            return true;
        }
    }
    false
}

/// A candidate is an outlier when it sits far from the centroid of the
/// remaining points relative to their own spread. The candidate is excluded
/// from centroid and spread so a single extreme point cannot mask itself,
/// and the absolute floor keeps metre-scale jitter in a tight cluster from
/// flagging.
fn has_geo_outlier(ordered: &[&ScanEvent], config: &ScanConfig) -> bool {
    if ordered.len() < 3 {
        return false;
    }
    for (i, scan) in ordered.iter().enumerate() {
        let rest: Vec<GeoPoint> = ordered
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(_, other)| other.location)
            .collect();
        let center = geo::centroid(&rest);
        let spread = geo::radius_of_gyration(&rest, &center);
        let distance = geo::distance_km(&scan.location, &center);
        if distance > config.outlier_floor_km && distance > config.outlier_sigma * spread {
            return true;
        }
    }
    false
}

fn region_mismatch(
    ordered: &[&ScanEvent],
    region: &dyn RegionPredicate,
    config: &ScanConfig,
) -> bool {
    let outside = ordered
        .iter()
        .filter(|scan| !region.contains(&scan.location))
        .count();
    outside as f64 / ordered.len() as f64 > config.region_mismatch_fraction
}

fn source_saturated(ordered: &[&ScanEvent], config: &ScanConfig) -> bool {
    if ordered.len() <= config.source_saturation_min_scans {
        return false;
    }
    let mut counts: HashMap<_, usize> = HashMap::new();
    for scan in ordered {
        *counts.entry(scan.source).or_insert(0) += 1;
    }
    let dominant = counts.values().copied().max().unwrap_or(0);
    dominant as f64 / ordered.len() as f64 >= config.source_saturation_fraction
}

/// Consecutive scans of one product id implying travel faster than any
/// plausible carrier point to a cloned code.
fn implausible_travel(ordered: &[&ScanEvent], config: &ScanConfig) -> bool {
    let mut last_seen: HashMap<&str, &ScanEvent> = HashMap::new();
    for &scan in ordered {
        if let Some(&prev) = last_seen.get(scan.product_id.as_str()) {
            let km = geo::distance_km(&prev.location, &scan.location);
            let hours = (scan.timestamp - prev.timestamp).num_milliseconds() as f64 / 3_600_000.0;
            let divergent = if hours <= 0.0 {
                km > COLOCATION_TOLERANCE_KM
            } else {
                km / hours > config.max_plausible_velocity_kmh
            };
            if divergent {
                return true;
            }
        }
        last_seen.insert(scan.product_id.as_str(), scan);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ScanFrequency, ScanSource};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    fn scan_at(offset_hours: f64, lat: f64, lon: f64, source: ScanSource) -> ScanEvent {
        ScanEvent {
            product_id: "amx-2024-1105".to_string(),
            timestamp: start() + Duration::minutes((offset_hours * 60.0) as i64),
            location: GeoPoint { lat, lon },
            source,
        }
    }

    fn alternating(index: usize) -> ScanSource {
        if index % 2 == 0 {
            ScanSource::ConsumerApp
        } else {
            ScanSource::RetailerApp
        }
    }

    fn weekly_profile() -> ExpectedProfile {
        ExpectedProfile {
            frequency: ScanFrequency::Weekly,
            geo_description: None,
        }
    }

    fn clean_weekly_scans() -> Vec<ScanEvent> {
        (0..6)
            .map(|i| {
                scan_at(
                    i as f64 * 168.0,
                    6.5244 + 0.001 * i as f64,
                    3.3792,
                    alternating(i),
                )
            })
            .collect()
    }

    #[test]
    fn clean_uniform_scans_carry_no_risk() {
        let scans = clean_weekly_scans();
        let assessment =
            analyze(&scans, &weekly_profile(), None, &ScanConfig::default()).unwrap();
        assert!(!assessment.is_risk);
        assert!(assessment.factors.is_empty());
        assert_eq!(assessment.confidence, 0.0);
    }

    #[test]
    fn repeated_calls_are_deterministic() {
        let scans = clean_weekly_scans();
        let first = analyze(&scans, &weekly_profile(), None, &ScanConfig::default()).unwrap();
        let second = analyze(&scans, &weekly_profile(), None, &ScanConfig::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn input_order_does_not_change_the_result() {
        let mut scans = clean_weekly_scans();
        scans[2].location.lat = 55.7558;
        scans[2].location.lon = 37.6173;
        let sorted = analyze(&scans, &weekly_profile(), None, &ScanConfig::default()).unwrap();
        scans.reverse();
        let reversed = analyze(&scans, &weekly_profile(), None, &ScanConfig::default()).unwrap();
        assert_eq!(sorted, reversed);
    }

    #[test]
    fn distant_single_scan_is_a_geo_outlier() {
        let mut scans = clean_weekly_scans();
        // Moscow, several thousand km from the Lagos cluster.
        scans[3].location = GeoPoint { lat: 55.7558, lon: 37.6173 };
        let assessment =
            analyze(&scans, &weekly_profile(), None, &ScanConfig::default()).unwrap();
        assert_eq!(assessment.factors, vec![FindingCode::GeoOutlier]);
        assert!(assessment.is_risk);
    }

    #[test]
    fn divergent_duplicate_id_is_flagged() {
        let scans = vec![
            scan_at(0.0, 6.5244, 3.3792, ScanSource::ConsumerApp),
            // One minute later, roughly 100 km east.
            scan_at(1.0 / 60.0, 6.5244, 4.2792, ScanSource::ConsumerApp),
        ];
        let assessment =
            analyze(&scans, &weekly_profile(), None, &ScanConfig::default()).unwrap();
        assert!(assessment
            .factors
            .contains(&FindingCode::DuplicateIdDivergentLocation));
        assert!(assessment.is_risk);
    }

    #[test]
    fn distinct_ids_do_not_collide() {
        let mut scans = vec![
            scan_at(0.0, 6.5244, 3.3792, ScanSource::ConsumerApp),
            scan_at(1.0 / 60.0, 6.5244, 4.2792, ScanSource::RetailerApp),
        ];
        scans[1].product_id = "eth-cof-2024-007".to_string();
        let assessment =
            analyze(&scans, &weekly_profile(), None, &ScanConfig::default()).unwrap();
        assert!(!assessment
            .factors
            .contains(&FindingCode::DuplicateIdDivergentLocation));
    }

    #[test]
    fn dormancy_then_flood_is_flagged() {
        let offsets = [0.0, 168.0, 336.0, 504.0, 1440.0, 1442.4, 1444.8, 1447.2];
        let scans: Vec<ScanEvent> = offsets
            .iter()
            .enumerate()
            .map(|(i, &hours)| scan_at(hours, 6.5244, 3.3792, alternating(i)))
            .collect();
        let assessment =
            analyze(&scans, &weekly_profile(), None, &ScanConfig::default()).unwrap();
        assert_eq!(assessment.factors, vec![FindingCode::BurstAfterDormancy]);
    }

    #[test]
    fn off_cadence_scans_are_flagged() {
        let scans: Vec<ScanEvent> = (0..4)
            .map(|i| scan_at(i as f64 * 24.0, 6.5244, 3.3792, alternating(i)))
            .collect();
        let assessment =
            analyze(&scans, &weekly_profile(), None, &ScanConfig::default()).unwrap();
        assert_eq!(assessment.factors, vec![FindingCode::AbnormalFrequency]);
        assert!((assessment.confidence - 0.125).abs() < 1e-9);
    }

    #[test]
    fn scans_outside_declared_region_are_flagged() {
        let mut scans: Vec<ScanEvent> = (0..5)
            .map(|i| scan_at(i as f64 * 168.0, 6.5244, 3.3792, alternating(i)))
            .collect();
        // Two of five scans in Abuja, outside the declared Lagos region.
        scans[3].location = GeoPoint { lat: 9.0765, lon: 7.3986 };
        scans[4].location = GeoPoint { lat: 9.0765, lon: 7.3986 };
        let lagos_region = |point: &GeoPoint| point.lat < 7.0;
        let assessment = analyze(
            &scans,
            &weekly_profile(),
            Some(&lagos_region),
            &ScanConfig::default(),
        )
        .unwrap();
        assert_eq!(
            assessment.factors,
            vec![FindingCode::GeoDistributionMismatch]
        );
    }

    #[test]
    fn one_dominant_source_saturates() {
        let scans: Vec<ScanEvent> = (0..6)
            .map(|i| scan_at(i as f64 * 168.0, 6.5244, 3.3792, ScanSource::ConsumerApp))
            .collect();
        let assessment =
            analyze(&scans, &weekly_profile(), None, &ScanConfig::default()).unwrap();
        assert_eq!(
            assessment.factors,
            vec![FindingCode::SingleSourceSaturation]
        );
        assert!((assessment.confidence - 0.1).abs() < 1e-9);
    }

    #[test]
    fn empty_scan_list_is_rejected() {
        let err = analyze(&[], &weekly_profile(), None, &ScanConfig::default()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn out_of_range_coordinates_are_rejected() {
        let mut scans = clean_weekly_scans();
        scans[1].location.lat = 95.0;
        let err = analyze(&scans, &weekly_profile(), None, &ScanConfig::default()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidInput(_)));
    }

    #[test]
    fn confidence_is_the_weighted_share_of_firing_flags() {
        let scans = vec![
            scan_at(0.0, 6.5244, 3.3792, ScanSource::ConsumerApp),
            scan_at(1.0 / 60.0, 6.5244, 4.2792, ScanSource::ConsumerApp),
        ];
        let assessment =
            analyze(&scans, &weekly_profile(), None, &ScanConfig::default()).unwrap();
        // Abnormal frequency (0.5) plus duplicate id (1.0) out of 4.0 total.
        assert_eq!(
            assessment.factors,
            vec![
                FindingCode::AbnormalFrequency,
                FindingCode::DuplicateIdDivergentLocation,
            ]
        );
        assert!((assessment.confidence - 0.375).abs() < 1e-9);
    }
}
