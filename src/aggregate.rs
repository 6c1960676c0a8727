use crate::models::{
    ActionCode, BreachInterval, BreachSeverity, CompositeRiskReport, FindingCode, RiskLevel,
    ScanAssessment,
};

/// Scan assessments at or above this confidence escalate to high risk on
/// their own.
const HIGH_CONFIDENCE: f64 = 0.6;

/// Merges analyzer verdicts for one product into a composite assessment.
///
/// Precedence is a fixed total order so the verdict stays auditable: a
/// critical breach always wins, then a confident scan risk, then any
/// remaining signal, then low. No numeric blending across the two signal
/// types. Either input may be absent.
pub fn aggregate(
    scan: Option<&ScanAssessment>,
    breaches: &[BreachInterval],
) -> CompositeRiskReport {
    let any_critical = breaches
        .iter()
        .any(|breach| breach.severity == BreachSeverity::Critical);
    let scan_risk = scan.map(|s| s.is_risk).unwrap_or(false);
    let confident_scan_risk =
        scan.map(|s| s.is_risk && s.confidence >= HIGH_CONFIDENCE).unwrap_or(false);

    let overall_risk = if any_critical || confident_scan_risk {
        RiskLevel::High
    } else if !breaches.is_empty() || scan_risk {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    };

    let factors: Vec<FindingCode> = scan.map(|s| s.factors.clone()).unwrap_or_default();

    let mut suggested_actions = Vec::new();
    for &factor in &factors {
        push_unique(&mut suggested_actions, finding_action(factor));
    }
    for breach in breaches {
        push_unique(&mut suggested_actions, breach_action(breach.severity));
    }

    CompositeRiskReport {
        overall_risk,
        factors,
        breaches: breaches.to_vec(),
        suggested_actions,
    }
}

fn finding_action(code: FindingCode) -> ActionCode {
    match code {
        FindingCode::BurstAfterDormancy => ActionCode::AuditDistributionRecords,
        FindingCode::AbnormalFrequency => ActionCode::AuditDistributionRecords,
        FindingCode::GeoOutlier => ActionCode::InvestigateLocation,
        FindingCode::GeoDistributionMismatch => ActionCode::VerifyRetailChannel,
        FindingCode::SingleSourceSaturation => ActionCode::VerifyRetailChannel,
        FindingCode::DuplicateIdDivergentLocation => {
            ActionCode::AlertManufacturerAndLawEnforcement
        }
    }
}

fn breach_action(severity: BreachSeverity) -> ActionCode {
    match severity {
        BreachSeverity::Minor => ActionCode::InspectStorageConditions,
        BreachSeverity::Major => ActionCode::AlertManufacturer,
        BreachSeverity::Critical => ActionCode::QuarantineBatch,
    }
}

fn push_unique(actions: &mut Vec<ActionCode>, action: ActionCode) {
    if !actions.contains(&action) {
        actions.push(action);
    }
}
