use crate::model::{
    FileRef, Finding, Priority, Resolution, Status, TestCoverage, VerificationReport,
};
use crate::vitems::extract_v_number;

fn fmt_status(status: Status) -> &'static str {
    match status {
        Status::Implemented => "Implemented",
        Status::Partial => "Partial",
        Status::NotImplemented => "Not Implemented",
        Status::Na => "N/A",
    }
}

fn fmt_test_coverage(test_coverage: TestCoverage) -> &'static str {
    match test_coverage {
        TestCoverage::Full => "Full",
        TestCoverage::Partial => "Partial",
        TestCoverage::None => "None",
    }
}

fn fmt_resolution(resolution: Option<Resolution>) -> &'static str {
    match resolution {
        None => "\u{2014}",
        Some(Resolution::Fixed) => "FIXED",
        Some(Resolution::PartiallyFixed) => "PARTIALLY FIXED",
        Some(Resolution::NotFixed) => "NOT FIXED",
        Some(Resolution::Regressed) => "REGRESSED",
    }
}

fn fmt_file_ref(file_ref: &FileRef) -> String {
    let code = if file_ref.lines.is_empty() {
        format!("`{}`", file_ref.path)
    } else {
        format!("`{}:{}`", file_ref.path, file_ref.lines)
    };
    if file_ref.description.is_empty() {
        code
    } else {
        format!("{code} \u{2014} {}", file_ref.description)
    }
}

fn fmt_file_refs(file_refs: &[FileRef]) -> String {
    if file_refs.is_empty() {
        return "\u{2014}".to_string();
    }
    file_refs
        .iter()
        .map(fmt_file_ref)
        .collect::<Vec<_>>()
        .join(", ")
}

fn fmt_string_list(items: &[String]) -> String {
    if items.is_empty() {
        return "\u{2014}".to_string();
    }
    items.join(", ")
}

fn pct(numerator: usize, denominator: usize) -> String {
    if denominator == 0 {
        return "0%".to_string();
    }
    format!("{}%", (numerator as f64 / denominator as f64 * 100.0).round())
}

/// Render a report as a formatted markdown document.
pub fn render_markdown(report: &VerificationReport) -> String {
    let mut lines: Vec<String> = Vec::new();
    let meta = &report.metadata;
    let stats = &report.statistics;
    let gaps = &report.priority_gaps;
    let is_reverify = report.resolution_summary.is_some();

    lines.push(format!("# Implementation Verification: {}", meta.project_name));
    lines.push(String::new());
    lines.push(format!("**Spec**: {}", meta.spec_path));
    lines.push(format!("**Implementation**: {}", meta.implementation_path));
    lines.push(format!("**Date**: {}", meta.date));
    if !meta.spec_version.is_empty() {
        lines.push(format!("**Spec Version**: {}", meta.spec_version));
    }
    match &meta.previous_report {
        Some(previous_report) if is_reverify => {
            lines.push(format!("**Previous Verification**: {previous_report}"));
            lines.push(format!("**Run**: {}", meta.run));
            if !meta.mode.is_empty() {
                lines.push(format!("**Mode**: {}", meta.mode));
            }
        }
        _ => {
            lines.push("**Previous Verification**: None \u{2014} initial verification".to_string());
            lines.push(format!("**Run**: {}", meta.run));
        }
    }

    lines.push(String::new());
    lines.push("## Summary".to_string());
    lines.push(String::new());
    let non_na: Vec<&Finding> = report
        .findings
        .iter()
        .filter(|finding| finding.status != Status::Na)
        .collect();
    let implemented = non_na
        .iter()
        .filter(|finding| finding.status == Status::Implemented)
        .count();
    lines.push(format!(
        "**Overall Implementation Status**: {implemented} of {} requirements verified",
        non_na.len()
    ));
    let tested = non_na
        .iter()
        .filter(|finding| finding.test_coverage != TestCoverage::None)
        .count();
    lines.push(format!(
        "**Test Coverage**: {tested} of {} testable requirements have tests",
        non_na.len()
    ));

    lines.push(String::new());
    lines.push("## Requirement-by-Requirement Verification".to_string());

    let mut sorted_findings: Vec<&Finding> = report.findings.iter().collect();
    sorted_findings.sort_by_key(|finding| extract_v_number(&finding.v_item_id));
    for finding in &sorted_findings {
        lines.push(String::new());
        lines.push(format!(
            "### {} \u{2014} {} \u{2014} {}",
            finding.v_item_id, finding.section_ref, finding.title
        ));
        lines.push(String::new());
        lines.push(format!("**Spec says**: {}", finding.requirement_text));
        lines.push(format!("**Status**: {}", fmt_status(finding.status)));
        lines.push(format!(
            "**Implementation**: {}",
            fmt_file_refs(&finding.implementation.files)
        ));
        lines.push(format!(
            "**Test coverage**: {}",
            fmt_test_coverage(finding.test_coverage)
        ));
        lines.push(format!("**Tests**: {}", fmt_file_refs(&finding.tests)));
        lines.push(format!(
            "**Missing tests**: {}",
            fmt_string_list(&finding.missing_tests)
        ));
    }

    if is_reverify {
        let reverify_findings: Vec<&&Finding> = sorted_findings
            .iter()
            .filter(|finding| finding.previous_status.is_some())
            .collect();
        if !reverify_findings.is_empty() {
            lines.push(String::new());
            lines.push("## Previous V-Item Resolution".to_string());
            lines.push(String::new());
            for finding in reverify_findings {
                let previous = finding
                    .previous_status
                    .map(fmt_status)
                    .unwrap_or("\u{2014}");
                lines.push(format!(
                    "- **{}** \u{2014} {} \u{2014} {}: {} \u{2192} {} \u{2014} {}",
                    finding.v_item_id,
                    finding.section_ref,
                    finding.title,
                    previous,
                    fmt_status(finding.status),
                    fmt_resolution(finding.resolution)
                ));
            }
        }
    }

    lines.push(String::new());
    lines.push("## Test Coverage Summary".to_string());
    lines.push(String::new());
    lines.push(
        "| V-Item | Section | Requirement | Impl Status | Test Coverage | Missing Tests |"
            .to_string(),
    );
    lines.push(
        "|--------|---------|-------------|-------------|---------------|---------------|"
            .to_string(),
    );
    for finding in &sorted_findings {
        lines.push(format!(
            "| {} | {} | {} | {} | {} | {} |",
            finding.v_item_id,
            finding.section_ref,
            finding.title,
            fmt_status(finding.status),
            fmt_test_coverage(finding.test_coverage),
            fmt_string_list(&finding.missing_tests)
        ));
    }

    if !gaps.is_empty() {
        lines.push(String::new());
        lines.push("## Items Requiring Tests".to_string());
        lines.push(String::new());
        for (index, gap) in gaps.iter().enumerate() {
            lines.push(format!(
                "{}. [{}] {} \u{2014} {} \u{2014} {} \u{2014} {}",
                index + 1,
                gap.priority.as_str().to_uppercase(),
                gap.v_item_id,
                gap.section_ref,
                gap.title,
                gap.reason
            ));
        }
    }

    lines.push(String::new());
    if let Some(summary) = &report.resolution_summary {
        lines.push("## Updated Scorecard".to_string());
        lines.push(String::new());
        lines.push("| Metric | Previous | Current | Delta |".to_string());
        lines.push("|--------|----------|---------|-------|".to_string());
        let previous_total = summary.previous_total;
        let current_total = stats.total_requirements;
        lines.push(format!(
            "| Total Requirements | {previous_total} | {current_total} | {:+} |",
            current_total as i64 - previous_total as i64
        ));
        lines.push(format!("| Fixed | | {} | |", summary.fixed));
        lines.push(format!("| Partially Fixed | | {} | |", summary.partially_fixed));
        lines.push(format!("| Not Fixed | | {} | |", summary.not_fixed));
        lines.push(format!("| Regressed | | {} | |", summary.regressed));
        lines.push(format!("| New Items | | {} | |", summary.new_items));
        lines.push(String::new());
    }

    lines.push("## Scorecard".to_string());
    lines.push(String::new());
    lines.push("| Metric | Score |".to_string());
    lines.push("|--------|-------|".to_string());

    let implemented_count = stats.by_status.get("implemented").copied().unwrap_or(0);
    let partial_count = stats.by_status.get("partial").copied().unwrap_or(0);
    let not_implemented_count = stats.by_status.get("not_implemented").copied().unwrap_or(0);
    let total_non_na = implemented_count + partial_count + not_implemented_count;
    lines.push(format!(
        "| Requirements Implemented | {implemented_count} / {total_non_na} ({}) |",
        pct(implemented_count, total_non_na)
    ));

    let full_tested = stats.test_coverage.get("full").copied().unwrap_or(0);
    let partial_tested = stats.test_coverage.get("partial").copied().unwrap_or(0);
    let no_tests = stats.test_coverage.get("none").copied().unwrap_or(0);
    let testable_total = full_tested + partial_tested + no_tests;
    lines.push(format!(
        "| Fully Tested | {full_tested} / {testable_total} ({}) |",
        pct(full_tested, testable_total)
    ));
    lines.push(format!("| Partially Tested | {partial_tested} |"));
    lines.push(format!("| No Tests | {no_tests} |"));

    let critical = gaps
        .iter()
        .filter(|gap| gap.priority == Priority::High)
        .count();
    lines.push(format!("| Critical Gaps | {critical} |"));

    if is_reverify {
        let unresolved: Vec<&&Finding> = sorted_findings
            .iter()
            .filter(|finding| {
                finding
                    .resolution
                    .is_some_and(|resolution| resolution != Resolution::Fixed)
            })
            .collect();
        if !unresolved.is_empty() {
            lines.push(String::new());
            lines.push("## Still Open".to_string());
            lines.push(String::new());
            for finding in unresolved {
                lines.push(format!(
                    "- **{}** \u{2014} {} \u{2014} {} \u{2014} {}",
                    finding.v_item_id,
                    finding.section_ref,
                    finding.title,
                    fmt_resolution(finding.resolution)
                ));
            }
        }
    }

    lines.push(String::new());
    lines.push("## Recommendations".to_string());
    lines.push(String::new());

    let mut recommendation = 1;

    let untested: Vec<&&Finding> = sorted_findings
        .iter()
        .filter(|finding| {
            finding.status == Status::Implemented && finding.test_coverage != TestCoverage::Full
        })
        .collect();
    if !untested.is_empty() {
        let items = itemize(&untested);
        lines.push(format!("{recommendation}. **Must add tests for**: {items}"));
        recommendation += 1;
    }

    let not_implemented: Vec<&&Finding> = sorted_findings
        .iter()
        .filter(|finding| finding.status == Status::NotImplemented)
        .collect();
    if !not_implemented.is_empty() {
        let items = itemize(&not_implemented);
        lines.push(format!("{recommendation}. **Implementation gaps**: {items}"));
        recommendation += 1;
    }

    let partials: Vec<&&Finding> = sorted_findings
        .iter()
        .filter(|finding| finding.status == Status::Partial)
        .collect();
    if !partials.is_empty() {
        let items = itemize(&partials);
        lines.push(format!("{recommendation}. **Partial implementations**: {items}"));
        recommendation += 1;
    }

    if recommendation == 1 {
        lines.push(
            "No recommendations \u{2014} all requirements verified with full test coverage."
                .to_string(),
        );
    }

    lines.push(String::new());
    lines.join("\n")
}

fn itemize(findings: &[&&Finding]) -> String {
    findings
        .iter()
        .map(|finding| format!("{} ({})", finding.v_item_id, finding.section_ref))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{AssembleRequest, assemble_report};
    use serde_json::{Value, json};
    use std::fs;
    use std::path::Path;

    fn minimal_fragment(fragment_id: &str, moscow: &str, status: &str, test_coverage: &str) -> Value {
        json!({
            "schema_version": "1.0.0",
            "fragment_id": fragment_id,
            "section_ref": format!("\u{a7}{}", fragment_id.replace('-', ".")),
            "title": format!("Requirement {fragment_id}"),
            "requirement_text": format!("The system {moscow} do {fragment_id}"),
            "moscow": moscow,
            "status": status,
            "implementation": {"files": [], "notes": ""},
            "test_coverage": test_coverage,
            "tests": [],
            "missing_tests": [],
            "missing_implementation": [],
            "notes": ""
        })
    }

    fn write_fragment(dir: &Path, data: &Value) {
        let fragment_id = data["fragment_id"].as_str().unwrap();
        fs::write(dir.join(format!("{fragment_id}.json")), data.to_string()).unwrap();
    }

    fn assemble(dir: &Path, previous: Option<&Path>, spec_version: &str) -> VerificationReport {
        let mut warnings = Vec::new();
        assemble_report(
            &AssembleRequest {
                fragments_dir: dir,
                project_name: "test-project",
                spec_path: "/specs/test",
                impl_path: "/src",
                previous_report_path: previous,
                spec_version,
                date: Some("2026-02-16"),
            },
            &mut warnings,
        )
        .unwrap()
    }

    #[test]
    fn renders_initial_report_sections() {
        let dir = tempfile::tempdir().unwrap();
        write_fragment(dir.path(), &minimal_fragment("01-01", "MUST", "implemented", "full"));
        write_fragment(dir.path(), &minimal_fragment("02-01", "SHOULD", "partial", "partial"));
        write_fragment(dir.path(), &minimal_fragment("03-01", "COULD", "not_implemented", "none"));

        let report = assemble(dir.path(), None, "1.2.0");
        let markdown = render_markdown(&report);

        assert!(markdown.contains("# Implementation Verification: test-project"));
        assert!(markdown.contains("**Spec**: /specs/test"));
        assert!(markdown.contains("**Spec Version**: 1.2.0"));
        assert!(markdown.contains("**Previous Verification**: None"));
        assert!(markdown.contains("## Summary"));
        assert!(markdown.contains("## Requirement-by-Requirement Verification"));
        assert!(markdown.contains("### V1"));
        assert!(markdown.contains("## Test Coverage Summary"));
        assert!(markdown.contains("| V-Item |"));
        assert!(markdown.contains("## Scorecard"));
        assert!(markdown.contains("Requirements Implemented"));
    }

    #[test]
    fn renders_reverification_resolution_sections() {
        let dir = tempfile::tempdir().unwrap();
        let prev_dir = dir.path().join("prev_fragments");
        fs::create_dir(&prev_dir).unwrap();
        write_fragment(&prev_dir, &minimal_fragment("01-01", "MUST", "partial", "partial"));
        let previous = assemble(&prev_dir, None, "");

        let previous_path = dir.path().join("prev_report.json");
        fs::write(&previous_path, serde_json::to_string_pretty(&previous).unwrap()).unwrap();

        let new_dir = dir.path().join("new_fragments");
        fs::create_dir(&new_dir).unwrap();
        let mut resolved = minimal_fragment("01-01", "MUST", "implemented", "full");
        resolved["previous_status"] = json!("partial");
        resolved["resolution"] = json!("fixed");
        write_fragment(&new_dir, &resolved);

        let report = assemble(&new_dir, Some(&previous_path), "");
        let markdown = render_markdown(&report);

        assert!(markdown.contains("## Previous V-Item Resolution"));
        assert!(markdown.contains("FIXED"));
        assert!(markdown.contains("## Updated Scorecard"));
        assert!(markdown.contains("## Scorecard"));
    }

    #[test]
    fn renders_priority_gap_tags() {
        let dir = tempfile::tempdir().unwrap();
        write_fragment(dir.path(), &minimal_fragment("01-01", "MUST", "not_implemented", "none"));

        let report = assemble(dir.path(), None, "");
        let markdown = render_markdown(&report);

        assert!(markdown.contains("## Items Requiring Tests"));
        assert!(markdown.contains("[HIGH]"));
        assert!(markdown.contains("## Recommendations"));
        assert!(markdown.contains("**Implementation gaps**"));
    }

    #[test]
    fn clean_report_renders_no_recommendations_line() {
        let dir = tempfile::tempdir().unwrap();
        write_fragment(dir.path(), &minimal_fragment("01-01", "MUST", "implemented", "full"));

        let report = assemble(dir.path(), None, "");
        let markdown = render_markdown(&report);

        assert!(markdown.contains("No recommendations"));
        assert!(!markdown.contains("## Items Requiring Tests"));
    }

    #[test]
    fn file_refs_format_with_lines_and_description() {
        let file_ref = FileRef {
            path: "src/capture.rs".to_string(),
            lines: "30-45".to_string(),
            description: "Barcode scan view".to_string(),
        };
        assert_eq!(
            fmt_file_ref(&file_ref),
            "`src/capture.rs:30-45` \u{2014} Barcode scan view"
        );

        let bare = FileRef {
            path: "src/capture.rs".to_string(),
            lines: String::new(),
            description: String::new(),
        };
        assert_eq!(fmt_file_ref(&bare), "`src/capture.rs`");
        assert_eq!(fmt_file_refs(&[]), "\u{2014}");
    }
}
