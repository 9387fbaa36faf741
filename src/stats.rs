use std::collections::BTreeMap;

use crate::model::{Finding, Moscow, MoscowBreakdown, Statistics, Status, TestCoverage};

/// Aggregate a set of findings into rate metrics and breakdowns.
///
/// Total function: an empty input yields an all-zero `Statistics`.
pub fn compute_statistics(findings: &[Finding]) -> Statistics {
    if findings.is_empty() {
        return Statistics::default();
    }

    let mut by_status: BTreeMap<String, usize> = BTreeMap::new();
    let mut test_coverage: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_moscow: BTreeMap<String, MoscowBreakdown> = BTreeMap::new();

    for finding in findings {
        *by_status.entry(finding.status.as_str().to_string()).or_default() += 1;
        *test_coverage
            .entry(finding.test_coverage.as_str().to_string())
            .or_default() += 1;

        let breakdown = by_moscow
            .entry(finding.moscow.as_str().to_string())
            .or_default();
        breakdown.total += 1;
        match finding.status {
            Status::Implemented => breakdown.implemented += 1,
            Status::Partial => breakdown.partial += 1,
            Status::NotImplemented => breakdown.not_implemented += 1,
            Status::Na => breakdown.na += 1,
        }
    }

    let implementation_rate = calc_rate(findings, implementation_weight, |_| true);
    let test_rate = calc_rate(findings, test_weight, |_| true);
    let must_implementation_rate = calc_rate(findings, implementation_weight, |finding| {
        finding.moscow == Moscow::Must
    });

    Statistics {
        total_requirements: findings.len(),
        by_status,
        by_moscow,
        test_coverage,
        implementation_rate,
        test_rate,
        must_implementation_rate,
    }
}

/// Weighted rate over the non-na subset of `findings` that passes
/// `include`. An empty subset yields exactly 0.0.
fn calc_rate(
    findings: &[Finding],
    weight_of: impl Fn(&Finding) -> f64,
    include: impl Fn(&Finding) -> bool,
) -> f64 {
    let subset: Vec<&Finding> = findings
        .iter()
        .filter(|finding| include(finding))
        .filter(|finding| finding.status != Status::Na)
        .collect();

    if subset.is_empty() {
        return 0.0;
    }

    let total: f64 = subset.iter().map(|finding| weight_of(finding)).sum();
    round3(total / subset.len() as f64)
}

fn implementation_weight(finding: &Finding) -> f64 {
    match finding.status {
        Status::Implemented => 1.0,
        Status::Partial => 0.5,
        Status::NotImplemented | Status::Na => 0.0,
    }
}

fn test_weight(finding: &Finding) -> f64 {
    match finding.test_coverage {
        TestCoverage::Full => 1.0,
        TestCoverage::Partial => 0.5,
        TestCoverage::None => 0.0,
    }
}

// Round half away from zero.
fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
