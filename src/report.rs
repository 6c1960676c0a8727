use std::fmt::Write;

use crate::models::{CompositeRiskReport, ProductRecord};

pub fn build_report(product: Option<&ProductRecord>, composite: &CompositeRiskReport) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Product Integrity Report");
    if let Some(product) = product {
        let _ = writeln!(
            output,
            "Generated for {} (batch {}, {})",
            product.name, product.batch_number, product.manufacturer
        );
        if !product.description.is_empty() {
            let _ = writeln!(output, "{}", product.description);
        }
    } else {
        let _ = writeln!(output, "Generated for an unregistered product");
    }
    let _ = writeln!(output);
    let _ = writeln!(output, "## Verdict");
    let _ = writeln!(output, "Overall risk: **{}**", composite.overall_risk);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Risk Factors");
    if composite.factors.is_empty() {
        let _ = writeln!(output, "No scan-pattern risk factors detected.");
    } else {
        for factor in composite.factors.iter() {
            let _ = writeln!(output, "- {} ({})", factor.describe(), factor);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Cold Chain");
    if composite.breaches.is_empty() {
        let _ = writeln!(output, "No breaches recorded.");
    } else {
        for breach in composite.breaches.iter() {
            let _ = writeln!(
                output,
                "- readings {}-{}: peak deviation {:.1} deg C ({})",
                breach.start_index, breach.end_index, breach.peak_deviation, breach.severity
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Suggested Actions");
    if composite.suggested_actions.is_empty() {
        let _ = writeln!(output, "No action required.");
    } else {
        for action in composite.suggested_actions.iter() {
            let _ = writeln!(output, "- {} ({})", action.describe(), action);
        }
    }

    if let Some(product) = product {
        let mut recent = product.supply_chain.clone();
        recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        let _ = writeln!(output);
        let _ = writeln!(output, "## Supply Chain Trail");
        if recent.is_empty() {
            let _ = writeln!(output, "No supply chain events recorded.");
        } else {
            for event in recent.iter().take(5) {
                let _ = writeln!(
                    output,
                    "- {} by {} at {} on {}",
                    event.status,
                    event.handler,
                    event.location,
                    event.timestamp.format("%Y-%m-%d")
                );
            }
        }
    }

    output
}
