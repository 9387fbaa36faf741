use crate::model::{Finding, Moscow, Priority, PriorityGap, Status, TestCoverage};

/// Flag every non-conforming finding as a prioritized gap.
///
/// Na findings are never gaps; neither is a finding that is implemented
/// with full test coverage. The result is ordered high, medium, low, with
/// ties keeping the input order.
pub fn classify_priority_gaps(findings: &[Finding]) -> Vec<PriorityGap> {
    let mut gaps: Vec<PriorityGap> = Vec::new();

    for finding in findings {
        if finding.status == Status::Na {
            continue;
        }
        if finding.status == Status::Implemented && finding.test_coverage == TestCoverage::Full {
            continue;
        }

        gaps.push(PriorityGap {
            priority: classify_gap(finding),
            v_item_id: finding.v_item_id.clone(),
            section_ref: finding.section_ref.clone(),
            title: finding.title.clone(),
            moscow: finding.moscow,
            status: finding.status,
            test_coverage: finding.test_coverage,
            reason: build_reason(finding),
        });
    }

    gaps.sort_by_key(|gap| match gap.priority {
        Priority::High => 0,
        Priority::Medium => 1,
        Priority::Low => 2,
    });
    gaps
}

// First matching rule wins; callers have already excluded na and
// implemented-with-full-coverage findings.
fn classify_gap(finding: &Finding) -> Priority {
    if finding.moscow == Moscow::Must {
        if finding.status == Status::NotImplemented {
            return Priority::High;
        }
        if finding.status == Status::Partial && finding.test_coverage == TestCoverage::None {
            return Priority::High;
        }
        if finding.status == Status::Partial || finding.status == Status::Implemented {
            return Priority::Medium;
        }
    }

    if finding.moscow == Moscow::Should && finding.status == Status::NotImplemented {
        return Priority::Medium;
    }

    // SHOULD with a partial gap, COULD, WONT.
    Priority::Low
}

fn build_reason(finding: &Finding) -> String {
    let mut parts: Vec<&str> = Vec::new();

    match finding.status {
        Status::NotImplemented => parts.push("not implemented"),
        Status::Partial => parts.push("partially implemented"),
        Status::Implemented => parts.push("implemented"),
        Status::Na => {}
    }

    match finding.test_coverage {
        TestCoverage::None => parts.push("no test coverage"),
        TestCoverage::Partial => parts.push("partial test coverage"),
        TestCoverage::Full => {}
    }

    format!("{} requirement: {}", finding.moscow.as_str(), parts.join("; "))
}
