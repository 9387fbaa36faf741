use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::{SchemaError, SchemaResult};
use crate::fragment::{self, FragmentWarning};
use crate::gaps::classify_priority_gaps;
use crate::model::{
    Finding, REPORT_SCHEMA_VERSION, REPORT_TYPE_INITIAL, REPORT_TYPE_REVERIFY_DELTA,
    ReportMetadata, Resolution, ResolutionSummary, VerificationReport,
};
use crate::stats::compute_statistics;
use crate::util::today_string;
use crate::vitems::{assign_v_items, map_v_items_from_previous};

pub struct AssembleRequest<'a> {
    pub fragments_dir: &'a Path,
    pub project_name: &'a str,
    pub spec_path: &'a str,
    pub impl_path: &'a str,
    pub previous_report_path: Option<&'a Path>,
    pub spec_version: &'a str,
    /// `YYYY-MM-DD`; today when absent.
    pub date: Option<&'a str>,
}

/// Assemble a verification report from the fragment files in a directory.
///
/// All-or-nothing: every failing fragment is collected and reported in one
/// aggregated error; a partial report is never produced. Validation
/// warnings land in the sink and do not block assembly.
pub fn assemble_report(
    request: &AssembleRequest<'_>,
    warnings: &mut Vec<FragmentWarning>,
) -> SchemaResult<VerificationReport> {
    let fragment_paths = fragment::discover_fragments(request.fragments_dir)?;

    let mut findings: Vec<Finding> = Vec::new();
    let mut failures: Vec<String> = Vec::new();
    for path in &fragment_paths {
        match fragment::load_fragment(path, warnings) {
            Ok(finding) => findings.push(finding),
            Err(err) => failures.push(err.to_string()),
        }
    }

    if !failures.is_empty() {
        let details = failures
            .iter()
            .map(|failure| format!("  - {failure}"))
            .collect::<Vec<_>>()
            .join("\n");
        return Err(SchemaError::InvalidBatch { details });
    }

    let mut report_type = REPORT_TYPE_INITIAL;
    let mut run = 1;
    let mut mode = String::new();
    let mut previous_report = None;
    let mut resolution_summary = None;

    match request.previous_report_path {
        Some(previous_path) => {
            let previous = load_report(previous_path)?;
            previous_report = Some(previous_path.display().to_string());
            run = previous.metadata.run + 1;
            mode = "delta".to_string();
            report_type = REPORT_TYPE_REVERIFY_DELTA;

            map_v_items_from_previous(&mut findings, &previous.findings);
            resolution_summary = Some(summarize_resolutions(&findings, &previous.findings));
        }
        None => assign_v_items(&mut findings),
    }

    let statistics = compute_statistics(&findings);
    let priority_gaps = classify_priority_gaps(&findings);

    let date = match request.date {
        Some(date) => date.to_string(),
        None => today_string(),
    };

    let metadata = ReportMetadata {
        project_name: request.project_name.to_string(),
        spec_path: request.spec_path.to_string(),
        implementation_path: request.impl_path.to_string(),
        date,
        run,
        previous_report,
        spec_version: request.spec_version.to_string(),
        mode,
    };

    Ok(VerificationReport {
        schema_version: REPORT_SCHEMA_VERSION.to_string(),
        report_type: report_type.to_string(),
        metadata,
        findings,
        statistics,
        priority_gaps,
        resolution_summary,
    })
}

// A finding counts as new only when it carries neither a resolution nor a
// previous status AND its section was unseen in the previous run. A
// carried-over finding with a previous_status but no resolution lands in
// no tally at all.
fn summarize_resolutions(findings: &[Finding], previous_findings: &[Finding]) -> ResolutionSummary {
    let previous_sections: HashSet<&str> = previous_findings
        .iter()
        .map(|finding| finding.section_ref.as_str())
        .collect();

    let mut summary = ResolutionSummary {
        previous_total: previous_findings.len(),
        fixed: 0,
        partially_fixed: 0,
        not_fixed: 0,
        regressed: 0,
        new_items: 0,
    };

    for finding in findings {
        match finding.resolution {
            Some(Resolution::Fixed) => summary.fixed += 1,
            Some(Resolution::PartiallyFixed) => summary.partially_fixed += 1,
            Some(Resolution::NotFixed) => summary.not_fixed += 1,
            Some(Resolution::Regressed) => summary.regressed += 1,
            None => {}
        }

        if finding.resolution.is_none()
            && finding.previous_status.is_none()
            && !previous_sections.contains(finding.section_ref.as_str())
        {
            summary.new_items += 1;
        }
    }

    summary
}

/// Read a persisted report back into the typed form.
///
/// The exact inverse of serializing a `VerificationReport`; an out-of-set
/// enumerated value or malformed JSON is fatal.
pub fn load_report(path: &Path) -> SchemaResult<VerificationReport> {
    let text = fs::read_to_string(path).map_err(|err| SchemaError::Io {
        path: path.display().to_string(),
        detail: err.to_string(),
    })?;

    serde_json::from_str(&text).map_err(|err| SchemaError::MalformedReport {
        path: path.display().to_string(),
        detail: err.to_string(),
    })
}
